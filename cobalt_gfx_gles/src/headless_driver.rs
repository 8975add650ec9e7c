/// HeadlessDriver - a GlDriver without a GL context
///
/// Every call is appended to `calls` as a short string (`"bind_buffer 0x8892 3"`)
/// and object names are handed out from a counter, so tests and tooling can
/// run the full backend and assert on the exact driver traffic it produced.

use rustc_hash::FxHashMap;

use crate::gl::{self, GLenum};
use crate::gles_driver::{DriverResult, GlDriver};

#[derive(Debug)]
pub struct HeadlessDriver {
    pub calls: Vec<String>,
    /// Values answered by `get_integer`; unknown names answer 0
    pub integers: FxHashMap<GLenum, i32>,
    pub extension_list: Vec<String>,
    pub vertex_array_objects: bool,
    /// Returned by the next `get_error` call, then cleared
    pub pending_error: GLenum,
    pub framebuffer_status: GLenum,
    pub fail_compile: bool,
    pub fail_link: bool,
    /// Make the next object creation fail
    pub fail_next_create: bool,
    /// Attribute locations reported by the linker; unknown names are inactive
    pub attrib_locations: FxHashMap<String, u32>,
    /// Live GL objects (created minus deleted)
    pub live_objects: i32,
    next_name: u32,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDriver {
    pub fn new() -> Self {
        let integers = [
            (gl::MAX_VERTEX_ATTRIBS, 16),
            (gl::MAX_VERTEX_UNIFORM_VECTORS, 256),
            (gl::MAX_FRAGMENT_UNIFORM_VECTORS, 224),
            (gl::MAX_TEXTURE_IMAGE_UNITS, 16),
            (gl::MAX_VERTEX_TEXTURE_IMAGE_UNITS, 16),
            (gl::MAX_UNIFORM_BUFFER_BINDINGS, 36),
            (gl::MAX_UNIFORM_BLOCK_SIZE, 65536),
            (gl::MAX_TEXTURE_SIZE, 4096),
            (gl::MAX_CUBE_MAP_TEXTURE_SIZE, 4096),
            (gl::MAX_ARRAY_TEXTURE_LAYERS, 256),
            (gl::MAX_3D_TEXTURE_SIZE, 256),
            (gl::MAX_COLOR_ATTACHMENTS, 4),
            (gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT, 256),
            (gl::DEPTH_BITS, 24),
            (gl::STENCIL_BITS, 8),
        ]
        .into_iter()
        .collect();

        Self {
            calls: Vec::new(),
            integers,
            extension_list: vec![
                "GL_EXT_color_buffer_float".to_string(),
                "GL_OES_texture_float_linear".to_string(),
            ],
            vertex_array_objects: true,
            pending_error: gl::NO_ERROR,
            framebuffer_status: gl::FRAMEBUFFER_COMPLETE,
            fail_compile: false,
            fail_link: false,
            fail_next_create: false,
            attrib_locations: FxHashMap::default(),
            live_objects: 0,
            next_name: 0,
        }
    }

    /// Recorded calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|call| call.starts_with(prefix)).count()
    }

    /// Position of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.iter().position(|call| call.starts_with(prefix))
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn create(&mut self, kind: &str) -> DriverResult<u32> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(format!("{} refused", kind));
        }
        self.next_name += 1;
        self.live_objects += 1;
        self.record(format!("{} {}", kind, self.next_name));
        Ok(self.next_name)
    }

    fn delete(&mut self, kind: &str, name: u32) {
        self.live_objects -= 1;
        self.record(format!("{} {}", kind, name));
    }
}

impl GlDriver for HeadlessDriver {
    fn name(&self) -> &str {
        "headless"
    }

    // ===== QUERIES =====

    fn get_integer(&mut self, pname: GLenum) -> i32 {
        self.integers.get(&pname).copied().unwrap_or(0)
    }

    fn get_string(&mut self, pname: GLenum) -> String {
        match pname {
            gl::VENDOR => "Cobalt".to_string(),
            gl::RENDERER => "Headless".to_string(),
            gl::VERSION => "OpenGL ES 3.0 (headless)".to_string(),
            _ => String::new(),
        }
    }

    fn extensions(&mut self) -> Vec<String> {
        self.extension_list.clone()
    }

    fn get_error(&mut self) -> GLenum {
        std::mem::replace(&mut self.pending_error, gl::NO_ERROR)
    }

    fn supports_vertex_array_objects(&self) -> bool {
        self.vertex_array_objects
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> DriverResult<u32> {
        self.create("create_buffer")
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.delete("delete_buffer", buffer);
    }

    fn bind_buffer(&mut self, target: GLenum, buffer: u32) {
        self.record(format!("bind_buffer {:#x} {}", target, buffer));
    }

    fn bind_buffer_range(&mut self, target: GLenum, index: u32, buffer: u32, offset: u32, size: u32) {
        self.record(format!("bind_buffer_range {:#x} {} {} {}+{}", target, index, buffer, offset, size));
    }

    fn buffer_data_size(&mut self, target: GLenum, size: u32, _usage: GLenum) {
        self.record(format!("buffer_data {:#x} {}", target, size));
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: u32, data: &[u8]) {
        self.record(format!("buffer_sub_data {:#x} {}@{}", target, data.len(), offset));
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> DriverResult<u32> {
        self.create("create_texture")
    }

    fn delete_texture(&mut self, texture: u32) {
        self.delete("delete_texture", texture);
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(format!("active_texture {}", unit));
    }

    fn bind_texture(&mut self, target: GLenum, texture: u32) {
        self.record(format!("bind_texture {:#x} {}", target, texture));
    }

    fn tex_storage_2d(&mut self, target: GLenum, levels: u32, internal_format: GLenum, width: u32, height: u32) {
        self.record(format!(
            "tex_storage_2d {:#x} {} {:#x} {}x{}",
            target, levels, internal_format, width, height
        ));
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
        self.record(format!(
            "tex_storage_3d {:#x} {} {:#x} {}x{}x{}",
            target, levels, internal_format, width, height, depth
        ));
    }

    fn tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        _format: GLenum,
        _ty: GLenum,
        data: &[u8],
    ) {
        self.record(format!(
            "tex_sub_image_2d {:#x} {} ({},{}) {}x{} {}",
            target,
            level,
            x,
            y,
            width,
            height,
            data.len()
        ));
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
        _format: GLenum,
        _ty: GLenum,
        data: &[u8],
    ) {
        self.record(format!(
            "tex_sub_image_3d {:#x} {} ({},{},{}) {}x{}x{} {}",
            target,
            level,
            x,
            y,
            z,
            width,
            height,
            depth,
            data.len()
        ));
    }

    fn compressed_tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        _format: GLenum,
        data: &[u8],
    ) {
        self.record(format!(
            "compressed_tex_sub_image_2d {:#x} {} ({},{}) {}x{} {}",
            target,
            level,
            x,
            y,
            width,
            height,
            data.len()
        ));
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
        _format: GLenum,
        data: &[u8],
    ) {
        self.record(format!(
            "compressed_tex_sub_image_3d {:#x} {} ({},{},{}) {}x{}x{} {}",
            target,
            level,
            x,
            y,
            z,
            width,
            height,
            depth,
            data.len()
        ));
    }

    fn tex_parameter_i32(&mut self, target: GLenum, pname: GLenum, value: i32) {
        self.record(format!("tex_parameter {:#x} {:#x} {}", target, pname, value));
    }

    fn generate_mipmap(&mut self, target: GLenum) {
        self.record(format!("generate_mipmap {:#x}", target));
    }

    fn pixel_store_i32(&mut self, pname: GLenum, value: i32) {
        self.record(format!("pixel_store {:#x} {}", pname, value));
    }

    // ===== SAMPLERS =====

    fn create_sampler(&mut self) -> DriverResult<u32> {
        self.create("create_sampler")
    }

    fn delete_sampler(&mut self, sampler: u32) {
        self.delete("delete_sampler", sampler);
    }

    fn bind_sampler(&mut self, unit: u32, sampler: u32) {
        self.record(format!("bind_sampler {} {}", unit, sampler));
    }

    fn sampler_parameter_i32(&mut self, sampler: u32, pname: GLenum, value: i32) {
        self.record(format!("sampler_parameter {} {:#x} {}", sampler, pname, value));
    }

    fn sampler_parameter_f32(&mut self, sampler: u32, pname: GLenum, value: f32) {
        self.record(format!("sampler_parameter {} {:#x} {}", sampler, pname, value));
    }

    // ===== PROGRAMS =====

    fn create_shader(&mut self, stage: GLenum) -> DriverResult<u32> {
        let name = self.create("create_shader")?;
        self.record(format!("shader_stage {} {:#x}", name, stage));
        Ok(name)
    }

    fn compile_shader(&mut self, shader: u32, source: &str) -> DriverResult<()> {
        self.record(format!("compile_shader {} {}", shader, source.len()));
        if self.fail_compile {
            return Err("0:1: syntax error".to_string());
        }
        Ok(())
    }

    fn delete_shader(&mut self, shader: u32) {
        self.delete("delete_shader", shader);
    }

    fn create_program(&mut self) -> DriverResult<u32> {
        self.create("create_program")
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        self.record(format!("attach_shader {} {}", program, shader));
    }

    fn detach_shader(&mut self, program: u32, shader: u32) {
        self.record(format!("detach_shader {} {}", program, shader));
    }

    fn link_program(&mut self, program: u32) -> DriverResult<()> {
        self.record(format!("link_program {}", program));
        if self.fail_link {
            return Err("link failed: varying mismatch".to_string());
        }
        Ok(())
    }

    fn delete_program(&mut self, program: u32) {
        self.delete("delete_program", program);
    }

    fn use_program(&mut self, program: u32) {
        self.record(format!("use_program {}", program));
    }

    fn get_attrib_location(&mut self, _program: u32, name: &str) -> Option<u32> {
        self.attrib_locations.get(name).copied()
    }

    fn get_uniform_block_index(&mut self, _program: u32, _name: &str) -> Option<u32> {
        Some(0)
    }

    fn uniform_block_binding(&mut self, program: u32, index: u32, binding: u32) {
        self.record(format!("uniform_block_binding {} {} {}", program, index, binding));
    }

    fn uniform_sampler_units(&mut self, program: u32, name: &str, units: &[i32]) -> bool {
        self.record(format!("uniform_sampler_units {} {} {:?}", program, name, units));
        true
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> DriverResult<u32> {
        self.create("create_framebuffer")
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) {
        self.delete("delete_framebuffer", framebuffer);
    }

    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: u32) {
        self.record(format!("bind_framebuffer {:#x} {}", target, framebuffer));
    }

    fn framebuffer_texture_2d(&mut self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: u32, level: u32) {
        self.record(format!(
            "framebuffer_texture_2d {:#x} {:#x} {:#x} {} {}",
            target, attachment, tex_target, texture, level
        ));
    }

    fn framebuffer_texture_layer(&mut self, target: GLenum, attachment: GLenum, texture: u32, level: u32, layer: u32) {
        self.record(format!(
            "framebuffer_texture_layer {:#x} {:#x} {} {} {}",
            target, attachment, texture, level, layer
        ));
    }

    fn check_framebuffer_status(&mut self, _target: GLenum) -> GLenum {
        self.framebuffer_status
    }

    fn draw_buffers(&mut self, buffers: &[GLenum]) {
        self.record(format!("draw_buffers {}", buffers.len()));
    }

    fn invalidate_framebuffer(&mut self, target: GLenum, attachments: &[GLenum]) {
        let names: Vec<String> = attachments.iter().map(|a| format!("{:#x}", a)).collect();
        self.record(format!("invalidate_framebuffer {:#x} [{}]", target, names.join(",")));
    }

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> DriverResult<u32> {
        self.create("create_vertex_array")
    }

    fn delete_vertex_array(&mut self, vao: u32) {
        self.delete("delete_vertex_array", vao);
    }

    fn bind_vertex_array(&mut self, vao: u32) {
        self.record(format!("bind_vertex_array {}", vao));
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record(format!("enable_vertex_attrib_array {}", index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record(format!("disable_vertex_attrib_array {}", index));
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
        self.record(format!(
            "vertex_attrib_pointer {} {} {:#x} {} {} {}",
            index, size, data_type, normalized, stride, offset
        ));
    }

    fn vertex_attrib_pointer_i32(&mut self, index: u32, size: u32, data_type: GLenum, stride: u32, offset: u32) {
        self.record(format!(
            "vertex_attrib_i_pointer {} {} {:#x} {} {}",
            index, size, data_type, stride, offset
        ));
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        self.record(format!("vertex_attrib_divisor {} {}", index, divisor));
    }

    // ===== FIXED FUNCTION =====

    fn enable(&mut self, cap: GLenum) {
        self.record(format!("enable {:#x}", cap));
    }

    fn disable(&mut self, cap: GLenum) {
        self.record(format!("disable {:#x}", cap));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(format!("viewport {} {} {} {}", x, y, width, height));
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        self.record(format!("depth_range {} {}", near, far));
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(format!("scissor {} {} {} {}", x, y, width, height));
    }

    fn cull_face(&mut self, face: GLenum) {
        self.record(format!("cull_face {:#x}", face));
    }

    fn front_face(&mut self, mode: GLenum) {
        self.record(format!("front_face {:#x}", mode));
    }

    fn line_width(&mut self, width: f32) {
        self.record(format!("line_width {}", width));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record(format!("polygon_offset {} {}", factor, units));
    }

    fn depth_func(&mut self, func: GLenum) {
        self.record(format!("depth_func {:#x}", func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(format!("depth_mask {}", write));
    }

    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: i32, mask: u32) {
        self.record(format!("stencil_func_separate {:#x} {:#x} {} {:#x}", face, func, reference, mask));
    }

    fn stencil_op_separate(&mut self, face: GLenum, fail: GLenum, depth_fail: GLenum, pass: GLenum) {
        self.record(format!(
            "stencil_op_separate {:#x} {:#x} {:#x} {:#x}",
            face, fail, depth_fail, pass
        ));
    }

    fn stencil_mask_separate(&mut self, face: GLenum, mask: u32) {
        self.record(format!("stencil_mask_separate {:#x} {:#x}", face, mask));
    }

    fn blend_equation_separate(&mut self, mode_rgb: GLenum, mode_alpha: GLenum) {
        self.record(format!("blend_equation_separate {:#x} {:#x}", mode_rgb, mode_alpha));
    }

    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        self.record(format!(
            "blend_func_separate {:#x} {:#x} {:#x} {:#x}",
            src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }

    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.record(format!("blend_color {} {} {} {}", r, g, b, a));
    }

    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.record(format!("color_mask {} {} {} {}", r, g, b, a));
    }

    // ===== CLEARS / DRAWS =====

    fn clear_buffer_f32(&mut self, buffer: GLenum, draw_buffer: u32, values: &[f32]) {
        self.record(format!("clear_buffer_f32 {:#x} {} {:?}", buffer, draw_buffer, values));
    }

    fn clear_buffer_i32(&mut self, buffer: GLenum, draw_buffer: u32, values: &[i32]) {
        self.record(format!("clear_buffer_i32 {:#x} {} {:?}", buffer, draw_buffer, values));
    }

    fn clear_buffer_depth_stencil(&mut self, depth: f32, stencil: i32) {
        self.record(format!("clear_buffer_depth_stencil {} {}", depth, stencil));
    }

    fn draw_arrays(&mut self, mode: GLenum, first: u32, count: u32) {
        self.record(format!("draw_arrays {:#x} {} {}", mode, first, count));
    }

    fn draw_arrays_instanced(&mut self, mode: GLenum, first: u32, count: u32, instances: u32) {
        self.record(format!("draw_arrays_instanced {:#x} {} {} x{}", mode, first, count, instances));
    }

    fn draw_elements(&mut self, mode: GLenum, count: u32, index_type: GLenum, offset: u32) {
        self.record(format!("draw_elements {:#x} {} {:#x} {}", mode, count, index_type, offset));
    }

    fn draw_elements_instanced(&mut self, mode: GLenum, count: u32, index_type: GLenum, offset: u32, instances: u32) {
        self.record(format!(
            "draw_elements_instanced {:#x} {} {:#x} {} x{}",
            mode, count, index_type, offset, instances
        ));
    }

    // ===== SYNC =====

    fn fence_sync(&mut self) -> DriverResult<u32> {
        self.create("fence_sync")
    }

    fn delete_sync(&mut self, sync: u32) {
        self.delete("delete_sync", sync);
    }

    fn client_wait_sync(&mut self, sync: u32, flags: GLenum, _timeout_ns: i32) -> GLenum {
        self.record(format!("client_wait_sync {} {:#x}", sync, flags));
        gl::ALREADY_SIGNALED
    }

    fn flush(&mut self) {
        self.record("flush".to_string());
    }

    fn swap_buffers(&mut self) {
        self.record("swap_buffers".to_string());
    }
}
