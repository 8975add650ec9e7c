/// GlowDriver - GlDriver over a live `glow` context
///
/// GL names travel through the backend as `u32` and are turned back into
/// glow's native handles at each call. Sync objects are pointers, so they
/// are kept in a table keyed by a local counter.
///
/// The caller owns the context: it must be current on the calling thread
/// for every driver call, and `present` is how the platform layer swaps.

use std::num::NonZeroU32;

use glow::HasContext;
use rustc_hash::FxHashMap;

use cobalt_gfx::gfx_debug;

use crate::gl::GLenum;
use crate::gles_driver::{DriverResult, GlDriver};

const SOURCE: &str = "cobalt::gles::Glow";

pub struct GlowDriver {
    gl: glow::Context,
    syncs: FxHashMap<u32, glow::Fence>,
    next_sync: u32,
    present: Option<Box<dyn FnMut()>>,
}

impl GlowDriver {
    /// Wrap a context; `swap_buffers` is a no-op until `set_present` is called
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            syncs: FxHashMap::default(),
            next_sync: 1,
            present: None,
        }
    }

    /// Install the platform swap (EGL, glutin, ...) run on every present
    pub fn set_present(&mut self, present: impl FnMut() + 'static) {
        self.present = Some(Box::new(present));
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

impl Drop for GlowDriver {
    fn drop(&mut self) {
        if !self.syncs.is_empty() {
            gfx_debug!(SOURCE, "Releasing {} pending sync objects", self.syncs.len());
        }
        for (_, sync) in self.syncs.drain() {
            unsafe { self.gl.delete_sync(sync) };
        }
    }
}

// Name conversions. Zero means "no object".

fn buffer(name: u32) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(name).map(glow::NativeBuffer)
}

fn texture(name: u32) -> Option<glow::NativeTexture> {
    NonZeroU32::new(name).map(glow::NativeTexture)
}

fn sampler(name: u32) -> Option<glow::NativeSampler> {
    NonZeroU32::new(name).map(glow::NativeSampler)
}

fn shader(name: u32) -> Option<glow::NativeShader> {
    NonZeroU32::new(name).map(glow::NativeShader)
}

fn program(name: u32) -> Option<glow::NativeProgram> {
    NonZeroU32::new(name).map(glow::NativeProgram)
}

fn framebuffer(name: u32) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(name).map(glow::NativeFramebuffer)
}

fn vertex_array(name: u32) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(name).map(glow::NativeVertexArray)
}

impl GlDriver for GlowDriver {
    fn name(&self) -> &str {
        "glow"
    }

    // ===== QUERIES =====

    fn get_integer(&mut self, pname: GLenum) -> i32 {
        unsafe { self.gl.get_parameter_i32(pname) }
    }

    fn get_string(&mut self, pname: GLenum) -> String {
        unsafe { self.gl.get_parameter_string(pname) }
    }

    fn extensions(&mut self) -> Vec<String> {
        self.gl.supported_extensions().iter().cloned().collect()
    }

    fn get_error(&mut self) -> GLenum {
        unsafe { self.gl.get_error() }
    }

    fn supports_vertex_array_objects(&self) -> bool {
        self.gl.version().major >= 3
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> DriverResult<u32> {
        unsafe { self.gl.create_buffer() }.map(|buffer| buffer.0.get())
    }

    fn delete_buffer(&mut self, name: u32) {
        if let Some(buffer) = buffer(name) {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }

    fn bind_buffer(&mut self, target: GLenum, name: u32) {
        unsafe { self.gl.bind_buffer(target, buffer(name)) };
    }

    fn bind_buffer_range(&mut self, target: GLenum, index: u32, name: u32, offset: u32, size: u32) {
        unsafe {
            self.gl
                .bind_buffer_range(target, index, buffer(name), offset as i32, size as i32)
        };
    }

    fn buffer_data_size(&mut self, target: GLenum, size: u32, usage: GLenum) {
        unsafe { self.gl.buffer_data_size(target, size as i32, usage) };
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: u32, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target, offset as i32, data) };
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> DriverResult<u32> {
        unsafe { self.gl.create_texture() }.map(|texture| texture.0.get())
    }

    fn delete_texture(&mut self, name: u32) {
        if let Some(texture) = texture(name) {
            unsafe { self.gl.delete_texture(texture) };
        }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, target: GLenum, name: u32) {
        unsafe { self.gl.bind_texture(target, texture(name)) };
    }

    fn tex_storage_2d(&mut self, target: GLenum, levels: u32, internal_format: GLenum, width: u32, height: u32) {
        unsafe {
            self.gl
                .tex_storage_2d(target, levels as i32, internal_format, width as i32, height as i32)
        };
    }

    fn tex_storage_3d(
        &mut self,
        target: GLenum,
        levels: u32,
        internal_format: GLenum,
        width: u32,
        height: u32,
        depth: u32,
    ) {
        unsafe {
            self.gl.tex_storage_3d(
                target,
                levels as i32,
                internal_format,
                width as i32,
                height as i32,
                depth as i32,
            )
        };
    }

    fn tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        unsafe {
            self.gl.tex_sub_image_2d(
                target,
                level as i32,
                x,
                y,
                width as i32,
                height as i32,
                format,
                ty,
                glow::PixelUnpackData::Slice(Some(data)),
            )
        };
    }

    fn tex_sub_image_3d(
        &mut self,
        target: GLenum,
        level: u32,
        x: i32,
        y: i32,
        z: i32,
        width: u32,
        height: u32,
        depth: u32,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        unsafe {
            self.gl.tex_sub_image_3d(
                target,
                level as i32,
                x,
                y,
                z,
                width as i32,
                height as i32,
                depth as i32,
                format,
                ty,
                glow::PixelUnpackData::Slice(Some(data)),
            )
        };
    }

    fn compressed_tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        format: GLenum,
        data: &[u8],
    ) {
        unsafe {
            self.gl.compressed_tex_sub_image_2d(
                target,
                level as i32,
                x,
                y,
                width as i32,
                height as i32,
                format,
                glow::CompressedPixelUnpackData::Slice(data),
            )
        };
    }

    fn compressed_tex_sub_image_3d(
        &mut self,
        target: GLenum,
        level: u32,
        x: i32,
        y: i32,
        z: i32,
        width: u32,
        height: u32,
        depth: u32,
        format: GLenum,
        data: &[u8],
    ) {
        unsafe {
            self.gl.compressed_tex_sub_image_3d(
                target,
                level as i32,
                x,
                y,
                z,
                width as i32,
                height as i32,
                depth as i32,
                format,
                glow::CompressedPixelUnpackData::Slice(data),
            )
        };
    }

    fn tex_parameter_i32(&mut self, target: GLenum, pname: GLenum, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, pname, value) };
    }

    fn generate_mipmap(&mut self, target: GLenum) {
        unsafe { self.gl.generate_mipmap(target) };
    }

    fn pixel_store_i32(&mut self, pname: GLenum, value: i32) {
        unsafe { self.gl.pixel_store_i32(pname, value) };
    }

    // ===== SAMPLERS =====

    fn create_sampler(&mut self) -> DriverResult<u32> {
        unsafe { self.gl.create_sampler() }.map(|sampler| sampler.0.get())
    }

    fn delete_sampler(&mut self, name: u32) {
        if let Some(sampler) = sampler(name) {
            unsafe { self.gl.delete_sampler(sampler) };
        }
    }

    fn bind_sampler(&mut self, unit: u32, name: u32) {
        unsafe { self.gl.bind_sampler(unit, sampler(name)) };
    }

    fn sampler_parameter_i32(&mut self, name: u32, pname: GLenum, value: i32) {
        if let Some(sampler) = sampler(name) {
            unsafe { self.gl.sampler_parameter_i32(sampler, pname, value) };
        }
    }

    fn sampler_parameter_f32(&mut self, name: u32, pname: GLenum, value: f32) {
        if let Some(sampler) = sampler(name) {
            unsafe { self.gl.sampler_parameter_f32(sampler, pname, value) };
        }
    }

    // ===== PROGRAMS =====

    fn create_shader(&mut self, stage: GLenum) -> DriverResult<u32> {
        unsafe { self.gl.create_shader(stage) }.map(|shader| shader.0.get())
    }

    fn compile_shader(&mut self, name: u32, source: &str) -> DriverResult<()> {
        let shader = shader(name).ok_or_else(|| "null shader".to_string())?;
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(shader))
            }
        }
    }

    fn delete_shader(&mut self, name: u32) {
        if let Some(shader) = shader(name) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    fn create_program(&mut self) -> DriverResult<u32> {
        unsafe { self.gl.create_program() }.map(|program| program.0.get())
    }

    fn attach_shader(&mut self, program_name: u32, shader_name: u32) {
        if let (Some(program), Some(shader)) = (program(program_name), shader(shader_name)) {
            unsafe { self.gl.attach_shader(program, shader) };
        }
    }

    fn detach_shader(&mut self, program_name: u32, shader_name: u32) {
        if let (Some(program), Some(shader)) = (program(program_name), shader(shader_name)) {
            unsafe { self.gl.detach_shader(program, shader) };
        }
    }

    fn link_program(&mut self, name: u32) -> DriverResult<()> {
        let program = program(name).ok_or_else(|| "null program".to_string())?;
        unsafe {
            self.gl.link_program(program);
            if self.gl.get_program_link_status(program) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn delete_program(&mut self, name: u32) {
        if let Some(program) = program(name) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn use_program(&mut self, name: u32) {
        unsafe { self.gl.use_program(program(name)) };
    }

    fn get_attrib_location(&mut self, name: u32, attribute: &str) -> Option<u32> {
        let program = program(name)?;
        unsafe { self.gl.get_attrib_location(program, attribute) }
    }

    fn get_uniform_block_index(&mut self, name: u32, block: &str) -> Option<u32> {
        let program = program(name)?;
        unsafe { self.gl.get_uniform_block_index(program, block) }
    }

    fn uniform_block_binding(&mut self, name: u32, index: u32, binding: u32) {
        if let Some(program) = program(name) {
            unsafe { self.gl.uniform_block_binding(program, index, binding) };
        }
    }

    fn uniform_sampler_units(&mut self, name: u32, uniform: &str, units: &[i32]) -> bool {
        let Some(program) = program(name) else {
            return false;
        };
        unsafe {
            match self.gl.get_uniform_location(program, uniform) {
                Some(location) => {
                    self.gl.uniform_1_i32_slice(Some(&location), units);
                    true
                }
                None => false,
            }
        }
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> DriverResult<u32> {
        unsafe { self.gl.create_framebuffer() }.map(|framebuffer| framebuffer.0.get())
    }

    fn delete_framebuffer(&mut self, name: u32) {
        if let Some(framebuffer) = framebuffer(name) {
            unsafe { self.gl.delete_framebuffer(framebuffer) };
        }
    }

    fn bind_framebuffer(&mut self, target: GLenum, name: u32) {
        unsafe { self.gl.bind_framebuffer(target, framebuffer(name)) };
    }

    fn framebuffer_texture_2d(&mut self, target: GLenum, attachment: GLenum, tex_target: GLenum, name: u32, level: u32) {
        unsafe {
            self.gl
                .framebuffer_texture_2d(target, attachment, tex_target, texture(name), level as i32)
        };
    }

    fn framebuffer_texture_layer(&mut self, target: GLenum, attachment: GLenum, name: u32, level: u32, layer: u32) {
        unsafe {
            self.gl
                .framebuffer_texture_layer(target, attachment, texture(name), level as i32, layer as i32)
        };
    }

    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        unsafe { self.gl.check_framebuffer_status(target) }
    }

    fn draw_buffers(&mut self, buffers: &[GLenum]) {
        unsafe { self.gl.draw_buffers(buffers) };
    }

    fn invalidate_framebuffer(&mut self, target: GLenum, attachments: &[GLenum]) {
        unsafe { self.gl.invalidate_framebuffer(target, attachments) };
    }

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> DriverResult<u32> {
        unsafe { self.gl.create_vertex_array() }.map(|vao| vao.0.get())
    }

    fn delete_vertex_array(&mut self, name: u32) {
        if let Some(vao) = vertex_array(name) {
            unsafe { self.gl.delete_vertex_array(vao) };
        }
    }

    fn bind_vertex_array(&mut self, name: u32) {
        unsafe { self.gl.bind_vertex_array(vertex_array(name)) };
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: u32,
        data_type: GLenum,
        normalized: bool,
        stride: u32,
        offset: u32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                size as i32,
                data_type,
                normalized,
                stride as i32,
                offset as i32,
            )
        };
    }

    fn vertex_attrib_pointer_i32(&mut self, index: u32, size: u32, data_type: GLenum, stride: u32, offset: u32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_i32(index, size as i32, data_type, stride as i32, offset as i32)
        };
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(index, divisor) };
    }

    // ===== FIXED FUNCTION =====

    fn enable(&mut self, cap: GLenum) {
        unsafe { self.gl.enable(cap) };
    }

    fn disable(&mut self, cap: GLenum) {
        unsafe { self.gl.disable(cap) };
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        unsafe { self.gl.depth_range_f32(near, far) };
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) };
    }

    fn cull_face(&mut self, face: GLenum) {
        unsafe { self.gl.cull_face(face) };
    }

    fn front_face(&mut self, mode: GLenum) {
        unsafe { self.gl.front_face(mode) };
    }

    fn line_width(&mut self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { self.gl.polygon_offset(factor, units) };
    }

    fn depth_func(&mut self, func: GLenum) {
        unsafe { self.gl.depth_func(func) };
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) };
    }

    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: i32, mask: u32) {
        unsafe { self.gl.stencil_func_separate(face, func, reference, mask) };
    }

    fn stencil_op_separate(&mut self, face: GLenum, fail: GLenum, depth_fail: GLenum, pass: GLenum) {
        unsafe { self.gl.stencil_op_separate(face, fail, depth_fail, pass) };
    }

    fn stencil_mask_separate(&mut self, face: GLenum, mask: u32) {
        unsafe { self.gl.stencil_mask_separate(face, mask) };
    }

    fn blend_equation_separate(&mut self, mode_rgb: GLenum, mode_alpha: GLenum) {
        unsafe { self.gl.blend_equation_separate(mode_rgb, mode_alpha) };
    }

    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        unsafe { self.gl.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha) };
    }

    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.blend_color(r, g, b, a) };
    }

    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        unsafe { self.gl.color_mask(r, g, b, a) };
    }

    // ===== CLEARS / DRAWS =====

    fn clear_buffer_f32(&mut self, target: GLenum, draw_buffer: u32, values: &[f32]) {
        unsafe { self.gl.clear_buffer_f32_slice(target, draw_buffer, values) };
    }

    fn clear_buffer_i32(&mut self, target: GLenum, draw_buffer: u32, values: &[i32]) {
        unsafe { self.gl.clear_buffer_i32_slice(target, draw_buffer, values) };
    }

    fn clear_buffer_depth_stencil(&mut self, depth: f32, stencil: i32) {
        unsafe { self.gl.clear_buffer_depth_stencil(glow::DEPTH_STENCIL, 0, depth, stencil) };
    }

    fn draw_arrays(&mut self, mode: GLenum, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(mode, first as i32, count as i32) };
    }

    fn draw_arrays_instanced(&mut self, mode: GLenum, first: u32, count: u32, instances: u32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(mode, first as i32, count as i32, instances as i32)
        };
    }

    fn draw_elements(&mut self, mode: GLenum, count: u32, index_type: GLenum, offset: u32) {
        unsafe { self.gl.draw_elements(mode, count as i32, index_type, offset as i32) };
    }

    fn draw_elements_instanced(&mut self, mode: GLenum, count: u32, index_type: GLenum, offset: u32, instances: u32) {
        unsafe {
            self.gl.draw_elements_instanced(
                mode,
                count as i32,
                index_type,
                offset as i32,
                instances as i32,
            )
        };
    }

    // ===== SYNC =====

    fn fence_sync(&mut self) -> DriverResult<u32> {
        let sync = unsafe { self.gl.fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0) }?;
        let name = self.next_sync;
        self.next_sync = self.next_sync.wrapping_add(1).max(1);
        self.syncs.insert(name, sync);
        Ok(name)
    }

    fn delete_sync(&mut self, name: u32) {
        if let Some(sync) = self.syncs.remove(&name) {
            unsafe { self.gl.delete_sync(sync) };
        }
    }

    fn client_wait_sync(&mut self, name: u32, flags: GLenum, timeout_ns: i32) -> GLenum {
        match self.syncs.get(&name) {
            Some(&sync) => unsafe { self.gl.client_wait_sync(sync, flags, timeout_ns) },
            None => glow::WAIT_FAILED,
        }
    }

    fn flush(&mut self) {
        unsafe { self.gl.flush() };
    }

    fn swap_buffers(&mut self) {
        if let Some(present) = self.present.as_mut() {
            present();
        }
    }
}
