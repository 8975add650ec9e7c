/// GlDriver - the raw OpenGL ES 3.0 entry points used by the backend
///
/// Object names are plain `u32`, 0 meaning "no object", so the backend and its
/// state cache never depend on a binding crate's handle types. Sync objects
/// are named the same way; the driver owns the mapping to native syncs.
///
/// Every call has the semantics of the GL function of the same name. The
/// backend never calls a driver function with an object it did not create.

use crate::gl::GLenum;

pub type DriverResult<T> = std::result::Result<T, String>;

pub trait GlDriver {
    /// Short identifier used in logs ("glow", "headless")
    fn name(&self) -> &str;

    // ===== QUERIES =====

    fn get_integer(&mut self, pname: GLenum) -> i32;
    fn get_string(&mut self, pname: GLenum) -> String;
    fn extensions(&mut self) -> Vec<String>;
    fn get_error(&mut self) -> GLenum;

    /// False on contexts where vertex array objects are unusable
    fn supports_vertex_array_objects(&self) -> bool {
        true
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> DriverResult<u32>;
    fn delete_buffer(&mut self, buffer: u32);
    fn bind_buffer(&mut self, target: GLenum, buffer: u32);
    fn bind_buffer_range(&mut self, target: GLenum, index: u32, buffer: u32, offset: u32, size: u32);
    fn buffer_data_size(&mut self, target: GLenum, size: u32, usage: GLenum);
    fn buffer_sub_data(&mut self, target: GLenum, offset: u32, data: &[u8]);

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> DriverResult<u32>;
    fn delete_texture(&mut self, texture: u32);
    /// Select texture unit `unit` (0-based, the driver adds `TEXTURE0`)
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: GLenum, texture: u32);
    fn tex_storage_2d(&mut self, target: GLenum, levels: u32, internal_format: GLenum, width: u32, height: u32);
    fn tex_storage_3d(
        &mut self,
        target: GLenum,
        levels: u32,
        internal_format: GLenum,
        width: u32,
        height: u32,
        depth: u32,
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    fn tex_parameter_i32(&mut self, target: GLenum, pname: GLenum, value: i32);
    fn generate_mipmap(&mut self, target: GLenum);
    fn pixel_store_i32(&mut self, pname: GLenum, value: i32);

    // ===== SAMPLERS =====

    fn create_sampler(&mut self) -> DriverResult<u32>;
    fn delete_sampler(&mut self, sampler: u32);
    fn bind_sampler(&mut self, unit: u32, sampler: u32);
    fn sampler_parameter_i32(&mut self, sampler: u32, pname: GLenum, value: i32);
    fn sampler_parameter_f32(&mut self, sampler: u32, pname: GLenum, value: f32);

    // ===== PROGRAMS =====

    fn create_shader(&mut self, stage: GLenum) -> DriverResult<u32>;
    /// Upload and compile; the error carries the info log
    fn compile_shader(&mut self, shader: u32, source: &str) -> DriverResult<()>;
    fn delete_shader(&mut self, shader: u32);
    fn create_program(&mut self) -> DriverResult<u32>;
    fn attach_shader(&mut self, program: u32, shader: u32);
    fn detach_shader(&mut self, program: u32, shader: u32);
    /// Link; the error carries the info log
    fn link_program(&mut self, program: u32) -> DriverResult<()>;
    fn delete_program(&mut self, program: u32);
    fn use_program(&mut self, program: u32);
    fn get_attrib_location(&mut self, program: u32, name: &str) -> Option<u32>;
    fn get_uniform_block_index(&mut self, program: u32, name: &str) -> Option<u32>;
    fn uniform_block_binding(&mut self, program: u32, index: u32, binding: u32);
    /// Assign the sampler uniform `name` of the current program; false if it is not active
    fn uniform_sampler_units(&mut self, program: u32, name: &str, units: &[i32]) -> bool;

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> DriverResult<u32>;
    fn delete_framebuffer(&mut self, framebuffer: u32);
    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: u32);
    fn framebuffer_texture_2d(&mut self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: u32, level: u32);
    fn framebuffer_texture_layer(&mut self, target: GLenum, attachment: GLenum, texture: u32, level: u32, layer: u32);
    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum;
    fn draw_buffers(&mut self, buffers: &[GLenum]);
    fn invalidate_framebuffer(&mut self, target: GLenum, attachments: &[GLenum]);

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> DriverResult<u32>;
    fn delete_vertex_array(&mut self, vao: u32);
    fn bind_vertex_array(&mut self, vao: u32);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: u32,
        data_type: GLenum,
        normalized: bool,
        stride: u32,
        offset: u32,
    );
    fn vertex_attrib_pointer_i32(&mut self, index: u32, size: u32, data_type: GLenum, stride: u32, offset: u32);
    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32);

    // ===== FIXED FUNCTION =====

    fn enable(&mut self, cap: GLenum);
    fn disable(&mut self, cap: GLenum);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn depth_range(&mut self, near: f32, far: f32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn cull_face(&mut self, face: GLenum);
    fn front_face(&mut self, mode: GLenum);
    fn line_width(&mut self, width: f32);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn depth_func(&mut self, func: GLenum);
    fn depth_mask(&mut self, write: bool);
    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: i32, mask: u32);
    fn stencil_op_separate(&mut self, face: GLenum, fail: GLenum, depth_fail: GLenum, pass: GLenum);
    fn stencil_mask_separate(&mut self, face: GLenum, mask: u32);
    fn blend_equation_separate(&mut self, mode_rgb: GLenum, mode_alpha: GLenum);
    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool);

    // ===== CLEARS / DRAWS =====

    fn clear_buffer_f32(&mut self, buffer: GLenum, draw_buffer: u32, values: &[f32]);
    fn clear_buffer_i32(&mut self, buffer: GLenum, draw_buffer: u32, values: &[i32]);
    fn clear_buffer_depth_stencil(&mut self, depth: f32, stencil: i32);
    fn draw_arrays(&mut self, mode: GLenum, first: u32, count: u32);
    fn draw_arrays_instanced(&mut self, mode: GLenum, first: u32, count: u32, instances: u32);
    fn draw_elements(&mut self, mode: GLenum, count: u32, index_type: GLenum, offset: u32);
    fn draw_elements_instanced(&mut self, mode: GLenum, count: u32, index_type: GLenum, offset: u32, instances: u32);

    // ===== SYNC =====

    fn fence_sync(&mut self) -> DriverResult<u32>;
    fn delete_sync(&mut self, sync: u32);
    fn client_wait_sync(&mut self, sync: u32, flags: GLenum, timeout_ns: i32) -> GLenum;
    fn flush(&mut self);

    /// Present the default framebuffer (no-op when the platform layer swaps)
    fn swap_buffers(&mut self) {}
}
