/// GlStateCache - shadow copy of the GL context state
///
/// Every setter compares the requested value with the cached one and only
/// calls the driver when they differ. The cache starts from the GL defaults;
/// bindings whose value cannot be known (the element buffer after a VAO
/// switch) are held as `UNKNOWN` so the next bind always reaches the driver.
///
/// Deleting a GL object must go through the matching `forget_*` so a name
/// recycled by the driver is not mistaken for a live binding.

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use cobalt_gfx::cobalt::gfx::Rect2D;

use crate::gl::{self, GLenum};
use crate::gles_driver::GlDriver;

/// Binding value that never matches a real name
const UNKNOWN: u32 = u32::MAX;

bitflags! {
    /// Server-side capabilities toggled with glEnable/glDisable
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlCaps: u32 {
        const CULL_FACE = 1 << 0;
        const DEPTH_TEST = 1 << 1;
        const STENCIL_TEST = 1 << 2;
        const BLEND = 1 << 3;
        const SCISSOR_TEST = 1 << 4;
        const POLYGON_OFFSET_FILL = 1 << 5;
        const SAMPLE_ALPHA_TO_COVERAGE = 1 << 6;
    }
}

impl GlCaps {
    /// GL enumerant of a single capability
    fn gl_enum(self) -> Option<GLenum> {
        let cap = match self {
            GlCaps::CULL_FACE => gl::CULL_FACE,
            GlCaps::DEPTH_TEST => gl::DEPTH_TEST,
            GlCaps::STENCIL_TEST => gl::STENCIL_TEST,
            GlCaps::BLEND => gl::BLEND,
            GlCaps::SCISSOR_TEST => gl::SCISSOR_TEST,
            GlCaps::POLYGON_OFFSET_FILL => gl::POLYGON_OFFSET_FILL,
            GlCaps::SAMPLE_ALPHA_TO_COVERAGE => gl::SAMPLE_ALPHA_TO_COVERAGE,
            _ => return None,
        };
        Some(cap)
    }
}

/// Stencil face addressed by the separate stencil setters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilFace {
    Front,
    Back,
}

impl StencilFace {
    fn gl_enum(self) -> GLenum {
        match self {
            StencilFace::Front => gl::FRONT,
            StencilFace::Back => gl::BACK,
        }
    }
}

// ===== SUB-STATES =====

#[derive(Debug, Clone, Copy, PartialEq)]
struct RasterCache {
    cull_face: GLenum,
    front_face: GLenum,
    line_width: f32,
    /// (factor, units)
    polygon_offset: (f32, f32),
}

impl Default for RasterCache {
    fn default() -> Self {
        Self {
            cull_face: gl::BACK,
            front_face: gl::CCW,
            line_width: 1.0,
            polygon_offset: (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StencilFaceCache {
    func: GLenum,
    reference: i32,
    compare_mask: u32,
    fail: GLenum,
    depth_fail: GLenum,
    pass: GLenum,
    write_mask: u32,
}

impl Default for StencilFaceCache {
    fn default() -> Self {
        Self {
            func: gl::ALWAYS,
            reference: 0,
            compare_mask: u32::MAX,
            fail: gl::KEEP,
            depth_fail: gl::KEEP,
            pass: gl::KEEP,
            write_mask: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DepthStencilCache {
    depth_func: GLenum,
    depth_mask: bool,
    front: StencilFaceCache,
    back: StencilFaceCache,
}

impl Default for DepthStencilCache {
    fn default() -> Self {
        Self {
            depth_func: gl::LESS,
            depth_mask: true,
            front: StencilFaceCache::default(),
            back: StencilFaceCache::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BlendCache {
    /// (rgb, alpha)
    equation: (GLenum, GLenum),
    /// (src_rgb, dst_rgb, src_alpha, dst_alpha)
    func: (GLenum, GLenum, GLenum, GLenum),
    color: [f32; 4],
    color_mask: [bool; 4],
}

impl Default for BlendCache {
    fn default() -> Self {
        Self {
            equation: (gl::FUNC_ADD, gl::FUNC_ADD),
            func: (gl::ONE, gl::ZERO, gl::ONE, gl::ZERO),
            color: [0.0; 4],
            color_mask: [true; 4],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextureUnit {
    target: GLenum,
    texture: u32,
    sampler: u32,
}

impl Default for TextureUnit {
    fn default() -> Self {
        Self {
            target: gl::TEXTURE_2D,
            texture: 0,
            sampler: 0,
        }
    }
}

/// (buffer, offset, size) bound to an indexed uniform binding point
type BufferRange = (u32, u32, u32);

// ===== CACHE =====

#[derive(Debug)]
pub struct GlStateCache {
    caps: GlCaps,
    array_buffer: u32,
    element_array_buffer: u32,
    uniform_buffer: u32,
    uniform_ranges: FxHashMap<u32, BufferRange>,
    vertex_array: u32,
    active_unit: u32,
    texture_units: Vec<TextureUnit>,
    framebuffer: u32,
    program: u32,
    viewport: Option<(i32, i32, i32, i32)>,
    depth_range: (f32, f32),
    scissor: Option<Rect2D>,
    raster: RasterCache,
    depth_stencil: DepthStencilCache,
    blend: BlendCache,
    /// Bit `n` set when attribute array `n` is enabled
    enabled_attributes: u64,
    attribute_divisors: FxHashMap<u32, u32>,
}

impl Default for GlStateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GlStateCache {
    pub fn new() -> Self {
        Self {
            caps: GlCaps::empty(),
            array_buffer: 0,
            element_array_buffer: 0,
            uniform_buffer: 0,
            uniform_ranges: FxHashMap::default(),
            vertex_array: 0,
            active_unit: 0,
            texture_units: Vec::new(),
            framebuffer: 0,
            program: 0,
            viewport: None,
            depth_range: (0.0, 1.0),
            scissor: None,
            raster: RasterCache::default(),
            depth_stencil: DepthStencilCache::default(),
            blend: BlendCache::default(),
            enabled_attributes: 0,
            attribute_divisors: FxHashMap::default(),
        }
    }

    // ===== CAPABILITIES =====

    /// Enable or disable one capability
    pub fn set_enabled(&mut self, driver: &mut dyn GlDriver, cap: GlCaps, enabled: bool) {
        if self.caps.contains(cap) == enabled {
            return;
        }
        let Some(name) = cap.gl_enum() else {
            return;
        };
        if enabled {
            driver.enable(name);
        } else {
            driver.disable(name);
        }
        self.caps.set(cap, enabled);
    }

    pub fn is_enabled(&self, cap: GlCaps) -> bool {
        self.caps.contains(cap)
    }

    // ===== BUFFERS =====

    pub fn bind_buffer(&mut self, driver: &mut dyn GlDriver, target: GLenum, buffer: u32) {
        let slot = match target {
            gl::ARRAY_BUFFER => &mut self.array_buffer,
            gl::ELEMENT_ARRAY_BUFFER => &mut self.element_array_buffer,
            gl::UNIFORM_BUFFER => &mut self.uniform_buffer,
            _ => {
                driver.bind_buffer(target, buffer);
                return;
            }
        };
        if *slot != buffer {
            driver.bind_buffer(target, buffer);
            *slot = buffer;
        }
    }

    /// Bind a range of `buffer` to uniform binding point `index`
    pub fn bind_uniform_range(&mut self, driver: &mut dyn GlDriver, index: u32, buffer: u32, offset: u32, size: u32) {
        let range = (buffer, offset, size);
        if self.uniform_ranges.get(&index) == Some(&range) {
            return;
        }
        driver.bind_buffer_range(gl::UNIFORM_BUFFER, index, buffer, offset, size);
        self.uniform_ranges.insert(index, range);
        // glBindBufferRange also sets the generic binding
        self.uniform_buffer = buffer;
    }

    pub fn bind_vertex_array(&mut self, driver: &mut dyn GlDriver, vao: u32) {
        if self.vertex_array != vao {
            driver.bind_vertex_array(vao);
            self.vertex_array = vao;
            // The element binding is VAO state
            self.element_array_buffer = UNKNOWN;
        }
    }

    pub fn vertex_array(&self) -> u32 {
        self.vertex_array
    }

    // ===== TEXTURES / SAMPLERS =====

    fn unit_mut(&mut self, unit: u32) -> &mut TextureUnit {
        let index = unit as usize;
        if self.texture_units.len() <= index {
            self.texture_units.resize(index + 1, TextureUnit::default());
        }
        &mut self.texture_units[index]
    }

    pub fn active_texture(&mut self, driver: &mut dyn GlDriver, unit: u32) {
        if self.active_unit != unit {
            driver.active_texture(unit);
            self.active_unit = unit;
        }
    }

    /// Bind `texture` to `target` on texture unit `unit`
    pub fn bind_texture(&mut self, driver: &mut dyn GlDriver, unit: u32, target: GLenum, texture: u32) {
        let current = *self.unit_mut(unit);
        if current.target == target && current.texture == texture {
            return;
        }
        self.active_texture(driver, unit);
        if current.target != target && current.texture != 0 {
            // Unbind the old target so the unit does not sample two textures
            driver.bind_texture(current.target, 0);
        }
        driver.bind_texture(target, texture);
        let slot = self.unit_mut(unit);
        slot.target = target;
        slot.texture = texture;
    }

    pub fn bind_sampler(&mut self, driver: &mut dyn GlDriver, unit: u32, sampler: u32) {
        let slot = self.unit_mut(unit);
        if slot.sampler != sampler {
            slot.sampler = sampler;
            driver.bind_sampler(unit, sampler);
        }
    }

    // ===== FRAMEBUFFER / PROGRAM =====

    pub fn bind_framebuffer(&mut self, driver: &mut dyn GlDriver, framebuffer: u32) {
        if self.framebuffer != framebuffer {
            driver.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
            self.framebuffer = framebuffer;
        }
    }

    pub fn framebuffer(&self) -> u32 {
        self.framebuffer
    }

    pub fn use_program(&mut self, driver: &mut dyn GlDriver, program: u32) {
        if self.program != program {
            driver.use_program(program);
            self.program = program;
        }
    }

    pub fn program(&self) -> u32 {
        self.program
    }

    // ===== VIEWPORT / SCISSOR =====

    pub fn viewport(&mut self, driver: &mut dyn GlDriver, x: i32, y: i32, width: i32, height: i32) {
        let viewport = Some((x, y, width, height));
        if self.viewport != viewport {
            driver.viewport(x, y, width, height);
            self.viewport = viewport;
        }
    }

    pub fn depth_range(&mut self, driver: &mut dyn GlDriver, near: f32, far: f32) {
        if self.depth_range != (near, far) {
            driver.depth_range(near, far);
            self.depth_range = (near, far);
        }
    }

    pub fn scissor(&mut self, driver: &mut dyn GlDriver, rect: Rect2D) {
        if self.scissor != Some(rect) {
            driver.scissor(rect.x, rect.y, rect.width as i32, rect.height as i32);
            self.scissor = Some(rect);
        }
    }

    // ===== RASTERIZER =====

    pub fn cull_face(&mut self, driver: &mut dyn GlDriver, face: GLenum) {
        if self.raster.cull_face != face {
            driver.cull_face(face);
            self.raster.cull_face = face;
        }
    }

    pub fn front_face(&mut self, driver: &mut dyn GlDriver, mode: GLenum) {
        if self.raster.front_face != mode {
            driver.front_face(mode);
            self.raster.front_face = mode;
        }
    }

    pub fn line_width(&mut self, driver: &mut dyn GlDriver, width: f32) {
        if self.raster.line_width != width {
            driver.line_width(width);
            self.raster.line_width = width;
        }
    }

    pub fn polygon_offset(&mut self, driver: &mut dyn GlDriver, factor: f32, units: f32) {
        if self.raster.polygon_offset != (factor, units) {
            driver.polygon_offset(factor, units);
            self.raster.polygon_offset = (factor, units);
        }
    }

    // ===== DEPTH / STENCIL =====

    pub fn depth_func(&mut self, driver: &mut dyn GlDriver, func: GLenum) {
        if self.depth_stencil.depth_func != func {
            driver.depth_func(func);
            self.depth_stencil.depth_func = func;
        }
    }

    pub fn depth_mask(&mut self, driver: &mut dyn GlDriver, write: bool) {
        if self.depth_stencil.depth_mask != write {
            driver.depth_mask(write);
            self.depth_stencil.depth_mask = write;
        }
    }

    fn stencil_face(&mut self, face: StencilFace) -> &mut StencilFaceCache {
        match face {
            StencilFace::Front => &mut self.depth_stencil.front,
            StencilFace::Back => &mut self.depth_stencil.back,
        }
    }

    pub fn stencil_func(&mut self, driver: &mut dyn GlDriver, face: StencilFace, func: GLenum, reference: i32, mask: u32) {
        let cached = self.stencil_face(face);
        if (cached.func, cached.reference, cached.compare_mask) != (func, reference, mask) {
            cached.func = func;
            cached.reference = reference;
            cached.compare_mask = mask;
            driver.stencil_func_separate(face.gl_enum(), func, reference, mask);
        }
    }

    /// Reference and compare mask only, keeping the compare function
    pub fn stencil_compare(&mut self, driver: &mut dyn GlDriver, face: StencilFace, reference: i32, mask: u32) {
        let func = self.stencil_face(face).func;
        self.stencil_func(driver, face, func, reference, mask);
    }

    pub fn stencil_op(&mut self, driver: &mut dyn GlDriver, face: StencilFace, fail: GLenum, depth_fail: GLenum, pass: GLenum) {
        let cached = self.stencil_face(face);
        if (cached.fail, cached.depth_fail, cached.pass) != (fail, depth_fail, pass) {
            cached.fail = fail;
            cached.depth_fail = depth_fail;
            cached.pass = pass;
            driver.stencil_op_separate(face.gl_enum(), fail, depth_fail, pass);
        }
    }

    pub fn stencil_write_mask(&mut self, driver: &mut dyn GlDriver, face: StencilFace, mask: u32) {
        let cached = self.stencil_face(face);
        if cached.write_mask != mask {
            cached.write_mask = mask;
            driver.stencil_mask_separate(face.gl_enum(), mask);
        }
    }

    // ===== BLEND =====

    pub fn blend_equation(&mut self, driver: &mut dyn GlDriver, rgb: GLenum, alpha: GLenum) {
        if self.blend.equation != (rgb, alpha) {
            driver.blend_equation_separate(rgb, alpha);
            self.blend.equation = (rgb, alpha);
        }
    }

    pub fn blend_func(&mut self, driver: &mut dyn GlDriver, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        let func = (src_rgb, dst_rgb, src_alpha, dst_alpha);
        if self.blend.func != func {
            driver.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);
            self.blend.func = func;
        }
    }

    pub fn blend_color(&mut self, driver: &mut dyn GlDriver, color: [f32; 4]) {
        if self.blend.color != color {
            driver.blend_color(color[0], color[1], color[2], color[3]);
            self.blend.color = color;
        }
    }

    pub fn color_mask(&mut self, driver: &mut dyn GlDriver, mask: [bool; 4]) {
        if self.blend.color_mask != mask {
            driver.color_mask(mask[0], mask[1], mask[2], mask[3]);
            self.blend.color_mask = mask;
        }
    }

    // ===== VERTEX ATTRIBUTES =====

    /// Enabled attribute arrays of the current (VAO-less) context, as a bit set
    pub fn enabled_attributes(&self) -> u64 {
        self.enabled_attributes
    }

    pub fn set_attribute_enabled(&mut self, driver: &mut dyn GlDriver, location: u32, enabled: bool) {
        let bit = 1u64 << location;
        if (self.enabled_attributes & bit != 0) == enabled {
            return;
        }
        if enabled {
            driver.enable_vertex_attrib_array(location);
            self.enabled_attributes |= bit;
        } else {
            driver.disable_vertex_attrib_array(location);
            self.enabled_attributes &= !bit;
        }
    }

    pub fn attribute_divisor(&mut self, driver: &mut dyn GlDriver, location: u32, divisor: u32) {
        let current = self.attribute_divisors.get(&location).copied().unwrap_or(0);
        if current != divisor {
            driver.vertex_attrib_divisor(location, divisor);
            self.attribute_divisors.insert(location, divisor);
        }
    }

    // ===== DELETED OBJECTS =====

    pub fn forget_buffer(&mut self, buffer: u32) {
        for slot in [&mut self.array_buffer, &mut self.element_array_buffer, &mut self.uniform_buffer] {
            if *slot == buffer {
                *slot = UNKNOWN;
            }
        }
        self.uniform_ranges.retain(|_, range| range.0 != buffer);
    }

    pub fn forget_texture(&mut self, texture: u32) {
        for unit in self.texture_units.iter_mut().filter(|unit| unit.texture == texture) {
            unit.texture = UNKNOWN;
        }
    }

    pub fn forget_sampler(&mut self, sampler: u32) {
        for unit in self.texture_units.iter_mut().filter(|unit| unit.sampler == sampler) {
            unit.sampler = UNKNOWN;
        }
    }

    pub fn forget_framebuffer(&mut self, framebuffer: u32) {
        if self.framebuffer == framebuffer {
            self.framebuffer = UNKNOWN;
        }
    }

    pub fn forget_program(&mut self, program: u32) {
        if self.program == program {
            self.program = UNKNOWN;
        }
    }

    pub fn forget_vertex_array(&mut self, vao: u32) {
        if self.vertex_array == vao {
            self.vertex_array = UNKNOWN;
            self.element_array_buffer = UNKNOWN;
        }
    }
}

#[cfg(test)]
#[path = "gles_state_cache_tests.rs"]
mod tests;
