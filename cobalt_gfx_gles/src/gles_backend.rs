/// GlesBackend - OpenGL ES 3.0 implementation of the Backend trait
///
/// Owns the driver and the state cache. Resource creation talks to the driver
/// directly; command replay lives in `gles_replay.rs`.

use cobalt_gfx::cobalt::gfx::{
    max_mip_levels, format_size, Backend, BindingMappingInfo, BufferInfo, BufferTextureCopy,
    CommandAllocator, CommandPackage, CommandType, Descriptor, DescriptorSetLayout,
    DescriptorSetLayoutInfo, DescriptorType, DeviceCaps, DeviceInfo, Extent3D, Features,
    FramebufferInfo, InputAssemblerInfo, IndexType, Offset3D, PipelineLayoutInfo,
    PipelineStateInfo, PolygonMode, RenderPassInfo, SampleCount, SamplerInfo, ShaderInfo,
    ShaderStage, StencilOpState, Texture, TextureFlags, TextureInfo, VertexInputRate,
};
use cobalt_gfx::cobalt::{Error, Result};
use cobalt_gfx::{gfx_bail, gfx_debug, gfx_err, gfx_error, gfx_info, gfx_trace, gfx_warn};

use crate::gl::{self, GLenum};
use crate::gles_conversions::{
    address_to_gl, attribute_format_to_gl, blend_factor_to_gl, blend_op_to_gl, buffer_target,
    buffer_usage_hint, compare_op_to_gl, cull_mode_to_gl, format_to_gl, front_face_to_gl,
    index_type_to_gl, mag_filter_to_gl, min_filter_to_gl, shader_stage_to_gl, stencil_op_to_gl,
    texture_target, topology_to_gl, GlAttributeFormat,
};
use crate::gles_driver::GlDriver;
use crate::gles_objects::{
    GlesAttribute, GlesBlendState, GlesBuffer, GlesDepthStencilOps, GlesDepthStencilState,
    GlesDescriptor, GlesDescriptorSet, GlesDescriptorSetLayout, GlesFence, GlesFramebuffer,
    GlesInputAssembler, GlesPipelineLayout, GlesPipelineState, GlesRasterState, GlesRenderPass,
    GlesSampler, GlesShader, GlesShaderAttribute, GlesSlot, GlesStencilFace, GlesTexture, SharedName,
};
use crate::gles_state_cache::{GlCaps, GlStateCache};

const SOURCE: &str = "cobalt::gles::Backend";

/// Timeout of one `glClientWaitSync` round
const FENCE_TIMEOUT_NS: i32 = 1_000_000_000;

/// OpenGL ES 3.0 backend over a `GlDriver`
pub struct GlesBackend<D: GlDriver> {
    pub(crate) driver: D,
    pub(crate) cache: GlStateCache,
    pub(crate) caps: DeviceCaps,
    pub(crate) features: Features,
    pub(crate) binding_mapping: BindingMappingInfo,
    pub(crate) validation: bool,
    anisotropy: bool,
}

impl<D: GlDriver> GlesBackend<D> {
    /// Backend over `driver`; the context must be current on this thread
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            cache: GlStateCache::new(),
            caps: DeviceCaps::default(),
            features: Features::empty(),
            binding_mapping: BindingMappingInfo::default(),
            validation: false,
            anisotropy: false,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn state_cache(&self) -> &GlStateCache {
        &self.cache
    }

    /// Log pending driver errors raised by `cmd_type` (validation only)
    pub(crate) fn check_error(&mut self, cmd_type: CommandType) {
        if !self.validation {
            return;
        }
        let code = self.driver.get_error();
        if code != gl::NO_ERROR {
            gfx_error!("cobalt::gles::Replay", "{:?} raised {}", cmd_type, gl::error_name(code));
        }
    }

    /// Pop the error raised by a storage allocation
    fn allocation_error(&mut self, what: &str) -> Option<Error> {
        match self.driver.get_error() {
            gl::NO_ERROR => None,
            gl::OUT_OF_MEMORY => {
                gfx_error!(SOURCE, "Out of memory allocating {}", what);
                Some(Error::OutOfMemory)
            }
            code => {
                gfx_warn!(SOURCE, "Allocating {} raised {}", what, gl::error_name(code));
                None
            }
        }
    }

    // ===== BUFFER HELPERS =====

    fn bind_for_upload(&mut self, target: GLenum, buffer: u32) {
        // Element bindings are VAO state; upload through the default VAO
        if target == gl::ELEMENT_ARRAY_BUFFER {
            self.cache.bind_vertex_array(&mut self.driver, 0);
        }
        self.cache.bind_buffer(&mut self.driver, target, buffer);
    }

    pub(crate) fn upload_buffer(&mut self, buffer: &GlesBuffer, data: &[u8], offset: u32) {
        // Indirect buffers only live on the CPU side
        let Some(target) = buffer.target else {
            return;
        };
        self.bind_for_upload(target, buffer.id);
        self.driver.buffer_sub_data(target, offset, data);
    }

    // ===== TEXTURE HELPERS =====

    fn allocate_texture(&mut self, info: &TextureInfo) -> Result<GlesTexture> {
        let Some(format) = format_to_gl(info.format) else {
            gfx_error!(SOURCE, "Texture format {:?} has no GLES equivalent", info.format);
            return Err(Error::Unsupported(format!("texture format {:?}", info.format)));
        };
        if info.samples != SampleCount::S1 {
            gfx_warn!(SOURCE, "Multisampled textures are not supported, {:?} created single-sampled", info.format);
        }

        let target = texture_target(info);
        let gen_mipmap = info.flags.contains(TextureFlags::GEN_MIPMAP);
        let levels = if gen_mipmap {
            max_mip_levels(info.width, info.height, info.depth)
        } else {
            info.level_count.max(1)
        };

        let id = self
            .driver
            .create_texture()
            .map_err(|err| gfx_err!(SOURCE, "Failed to create texture: {}", err))?;
        self.cache.bind_texture(&mut self.driver, 0, target, id);

        let (width, height) = (info.width.max(1), info.height.max(1));
        match target {
            gl::TEXTURE_3D => {
                self.driver.tex_storage_3d(target, levels, format.internal_format, width, height, info.depth.max(1))
            }
            gl::TEXTURE_2D_ARRAY => {
                self.driver.tex_storage_3d(target, levels, format.internal_format, width, height, info.layer_count)
            }
            _ => self.driver.tex_storage_2d(target, levels, format.internal_format, width, height),
        }
        if let Some(err) = self.allocation_error("texture storage") {
            self.cache.forget_texture(id);
            self.driver.delete_texture(id);
            return Err(err);
        }

        gfx_debug!(SOURCE, "Texture {} {}x{} {:?}, {} levels", id, width, height, info.format, levels);
        Ok(GlesTexture {
            name: SharedName::new(id),
            target,
            hal_format: info.format,
            format,
            compressed: info.format.is_compressed(),
            levels,
            gen_mipmap,
        })
    }

    fn delete_texture(&mut self, texture: &GlesTexture) {
        self.cache.forget_texture(texture.id());
        self.driver.delete_texture(texture.id());
    }

    /// Upload `regions` into `texture`, one source buffer per region
    pub(crate) fn upload_texture(&mut self, texture: &GlesTexture, buffers: &[&[u8]], regions: &[BufferTextureCopy]) {
        self.cache.bind_texture(&mut self.driver, 0, texture.target, texture.id());

        for (index, region) in regions.iter().enumerate() {
            let start = region.buffer_offset as usize;
            let Some(data) = buffers.get(index).and_then(|buffer| buffer.get(start..)) else {
                gfx_error!(SOURCE, "Copy region {} has no source data at offset {}", index, start);
                continue;
            };

            if region.buffer_stride != 0 {
                self.driver.pixel_store_i32(gl::UNPACK_ROW_LENGTH, region.buffer_stride as i32);
            }
            if region.buffer_texture_height != 0 {
                self.driver.pixel_store_i32(gl::UNPACK_IMAGE_HEIGHT, region.buffer_texture_height as i32);
            }

            self.upload_region(texture, region, data);

            if region.buffer_stride != 0 {
                self.driver.pixel_store_i32(gl::UNPACK_ROW_LENGTH, 0);
            }
            if region.buffer_texture_height != 0 {
                self.driver.pixel_store_i32(gl::UNPACK_IMAGE_HEIGHT, 0);
            }
        }

        if texture.gen_mipmap {
            self.driver.generate_mipmap(texture.target);
        }
    }

    fn upload_region(&mut self, texture: &GlesTexture, region: &BufferTextureCopy, data: &[u8]) {
        let level = region.tex_subres.mip_level;
        let offset = region.tex_offset;
        let extent = region.tex_extent;

        match texture.target {
            gl::TEXTURE_CUBE_MAP => {
                let row_length = if region.buffer_stride != 0 { region.buffer_stride } else { extent.width };
                let image_height =
                    if region.buffer_texture_height != 0 { region.buffer_texture_height } else { extent.height };
                let face_size = format_size(texture.hal_format, row_length, image_height, 1) as usize;

                for face in 0..region.tex_subres.layer_count {
                    let start = face as usize * face_size;
                    let Some(face_data) = data.get(start..start + face_size) else {
                        gfx_error!(SOURCE, "Cube face {} is missing from the source data", face);
                        break;
                    };
                    let face_target = gl::TEXTURE_CUBE_MAP_POSITIVE_X + region.tex_subres.base_array_layer + face;
                    self.sub_image_2d(texture, face_target, level, offset, extent, face_data);
                }
            }
            gl::TEXTURE_2D_ARRAY => {
                let layers_offset = Offset3D { z: region.tex_subres.base_array_layer as i32, ..offset };
                let layers_extent = Extent3D { depth: region.tex_subres.layer_count, ..extent };
                self.sub_image_3d(texture, level, layers_offset, layers_extent, data);
            }
            gl::TEXTURE_3D => self.sub_image_3d(texture, level, offset, extent, data),
            target => self.sub_image_2d(texture, target, level, offset, extent, data),
        }
    }

    fn sub_image_2d(
        &mut self,
        texture: &GlesTexture,
        target: GLenum,
        level: u32,
        offset: Offset3D,
        extent: Extent3D,
        data: &[u8],
    ) {
        let format = texture.format;
        if texture.compressed {
            self.driver.compressed_tex_sub_image_2d(
                target,
                level,
                offset.x,
                offset.y,
                extent.width,
                extent.height,
                format.internal_format,
                data,
            );
        } else {
            self.driver.tex_sub_image_2d(
                target,
                level,
                offset.x,
                offset.y,
                extent.width,
                extent.height,
                format.format,
                format.ty,
                data,
            );
        }
    }

    fn sub_image_3d(&mut self, texture: &GlesTexture, level: u32, offset: Offset3D, extent: Extent3D, data: &[u8]) {
        let format = texture.format;
        if texture.compressed {
            self.driver.compressed_tex_sub_image_3d(
                texture.target,
                level,
                offset.x,
                offset.y,
                offset.z,
                extent.width,
                extent.height,
                extent.depth,
                format.internal_format,
                data,
            );
        } else {
            self.driver.tex_sub_image_3d(
                texture.target,
                level,
                offset.x,
                offset.y,
                offset.z,
                extent.width,
                extent.height,
                extent.depth,
                format.format,
                format.ty,
                data,
            );
        }
    }

    // ===== PROGRAM HELPERS =====

    fn compile_stages(&mut self, program: u32, info: &ShaderInfo) -> Result<Vec<u32>> {
        let mut shaders = Vec::with_capacity(info.stages.len());
        for stage in &info.stages {
            if stage.stage == ShaderStage::Compute {
                self.delete_shaders(&shaders);
                gfx_error!(SOURCE, "Shader '{}': compute stages need GLES 3.1", info.name);
                return Err(Error::Unsupported("compute shader stage".to_string()));
            }
            let shader = match self.driver.create_shader(shader_stage_to_gl(stage.stage)) {
                Ok(shader) => shader,
                Err(err) => {
                    self.delete_shaders(&shaders);
                    gfx_bail!(SOURCE, "Shader '{}': failed to create {:?} stage: {}", info.name, stage.stage, err);
                }
            };
            shaders.push(shader);
            if let Err(log) = self.driver.compile_shader(shader, &stage.source) {
                self.delete_shaders(&shaders);
                gfx_bail!(SOURCE, "Shader '{}': {:?} stage failed to compile:\n{}", info.name, stage.stage, log);
            }
            self.driver.attach_shader(program, shader);
        }
        Ok(shaders)
    }

    fn delete_shaders(&mut self, shaders: &[u32]) {
        for &shader in shaders {
            self.driver.delete_shader(shader);
        }
    }

    /// Point uniform blocks and samplers at their flattened binding slots
    fn assign_bindings(&mut self, program: u32, info: &ShaderInfo) {
        for block in &info.blocks {
            let first_slot = self.binding_mapping.buffer_slot(block.set, block.binding);
            for element in 0..block.count.max(1) {
                let name = if block.count > 1 {
                    format!("{}[{}]", block.name, element)
                } else {
                    block.name.clone()
                };
                match self.driver.get_uniform_block_index(program, &name) {
                    Some(index) => self.driver.uniform_block_binding(program, index, first_slot + element),
                    None => gfx_debug!(SOURCE, "Shader '{}': uniform block {} is inactive", info.name, name),
                }
            }
        }

        if info.samplers.is_empty() {
            return;
        }
        self.cache.use_program(&mut self.driver, program);
        for sampler in &info.samplers {
            let first_unit = self.binding_mapping.sampler_slot(sampler.set, sampler.binding);
            let units: Vec<i32> = (0..sampler.count.max(1)).map(|element| (first_unit + element) as i32).collect();
            if !self.driver.uniform_sampler_units(program, &sampler.name, &units) {
                gfx_debug!(SOURCE, "Shader '{}': sampler {} is inactive", info.name, sampler.name);
            }
        }
    }

    // ===== FRAMEBUFFER HELPERS =====

    fn attach_texture(&mut self, attachment: GLenum, texture: &GlesTexture) {
        match texture.target {
            gl::TEXTURE_2D_ARRAY | gl::TEXTURE_3D => {
                self.driver.framebuffer_texture_layer(gl::FRAMEBUFFER, attachment, texture.id(), 0, 0)
            }
            gl::TEXTURE_CUBE_MAP => self.driver.framebuffer_texture_2d(
                gl::FRAMEBUFFER,
                attachment,
                gl::TEXTURE_CUBE_MAP_POSITIVE_X,
                texture.id(),
                0,
            ),
            target => self.driver.framebuffer_texture_2d(gl::FRAMEBUFFER, attachment, target, texture.id(), 0),
        }
    }

    fn delete_framebuffer_object(&mut self, fbo: u32) {
        self.cache.forget_framebuffer(fbo);
        self.driver.delete_framebuffer(fbo);
    }
}

// ===== CAPABILITIES =====

fn query_caps(driver: &mut dyn GlDriver) -> DeviceCaps {
    let mut get = |pname: GLenum| driver.get_integer(pname).max(0) as u32;
    DeviceCaps {
        max_vertex_attributes: get(gl::MAX_VERTEX_ATTRIBS),
        max_vertex_uniform_vectors: get(gl::MAX_VERTEX_UNIFORM_VECTORS),
        max_fragment_uniform_vectors: get(gl::MAX_FRAGMENT_UNIFORM_VECTORS),
        max_texture_units: get(gl::MAX_TEXTURE_IMAGE_UNITS),
        max_vertex_texture_units: get(gl::MAX_VERTEX_TEXTURE_IMAGE_UNITS),
        max_uniform_buffer_bindings: get(gl::MAX_UNIFORM_BUFFER_BINDINGS),
        max_uniform_block_size: get(gl::MAX_UNIFORM_BLOCK_SIZE),
        max_texture_size: get(gl::MAX_TEXTURE_SIZE),
        max_cube_map_texture_size: get(gl::MAX_CUBE_MAP_TEXTURE_SIZE),
        max_array_texture_layers: get(gl::MAX_ARRAY_TEXTURE_LAYERS),
        max_3d_texture_size: get(gl::MAX_3D_TEXTURE_SIZE),
        max_color_attachments: get(gl::MAX_COLOR_ATTACHMENTS),
        uniform_buffer_offset_alignment: get(gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT),
        depth_bits: get(gl::DEPTH_BITS),
        stencil_bits: get(gl::STENCIL_BITS),
    }
}

/// Features of a GLES 3.0 context with `extensions`
pub(crate) fn detect_features(extensions: &[String], vertex_array_objects: bool) -> Features {
    let has = |name: &str| extensions.iter().any(|extension| extension == name);

    let mut features = Features::TEXTURE_FLOAT
        | Features::TEXTURE_HALF_FLOAT
        | Features::FORMAT_ETC2
        | Features::FORMAT_D24S8
        | Features::ELEMENT_INDEX_UINT
        | Features::INSTANCED_ARRAYS
        | Features::MULTIPLE_RENDER_TARGETS
        | Features::BLEND_MINMAX
        | Features::INVALIDATE_FRAMEBUFFER;

    if has("GL_EXT_color_buffer_float") {
        features |= Features::COLOR_FLOAT | Features::COLOR_HALF_FLOAT;
    }
    if has("GL_EXT_color_buffer_half_float") {
        features |= Features::COLOR_HALF_FLOAT;
    }
    if has("GL_OES_texture_float_linear") {
        features |= Features::TEXTURE_FLOAT_LINEAR;
    }
    if has("GL_KHR_texture_compression_astc_ldr") {
        features |= Features::FORMAT_ASTC;
    }
    if has("GL_EXT_texture_compression_s3tc") {
        features |= Features::FORMAT_BC;
    }
    if vertex_array_objects {
        features |= Features::VERTEX_ARRAY_OBJECT;
    }
    features
}

// ===== STATE CONVERSIONS =====

fn stencil_face(state: &StencilOpState) -> GlesStencilFace {
    GlesStencilFace {
        func: compare_op_to_gl(state.compare_op),
        reference: state.reference as i32,
        compare_mask: state.compare_mask,
        write_mask: state.write_mask,
        fail: stencil_op_to_gl(state.fail_op),
        depth_fail: stencil_op_to_gl(state.depth_fail_op),
        pass: stencil_op_to_gl(state.pass_op),
    }
}

fn resolve_descriptor<D: GlDriver + 'static>(
    slot: GlesSlot,
    descriptor: &Descriptor<GlesBackend<D>>,
) -> GlesDescriptor {
    let GlesSlot { binding, element, dynamic_index } = slot;
    if descriptor.is_empty() {
        return GlesDescriptor::Empty;
    }

    let resolved = match descriptor.descriptor_type {
        DescriptorType::UniformBuffer | DescriptorType::DynamicUniformBuffer => {
            descriptor.buffer.as_ref().and_then(|buffer| {
                let native = buffer.native()?;
                let stride = if dynamic_index.is_some() && buffer.stride() > 1 { buffer.stride() } else { 0 };
                Some(GlesDescriptor::UniformBuffer {
                    binding,
                    element,
                    buffer: native.id,
                    size: buffer.size(),
                    stride,
                    dynamic_index,
                })
            })
        }
        DescriptorType::StorageBuffer | DescriptorType::DynamicStorageBuffer => {
            gfx_warn!(SOURCE, "Storage buffers need GLES 3.1, binding {} left empty", binding);
            return GlesDescriptor::Empty;
        }
        DescriptorType::SamplerTexture | DescriptorType::Texture => {
            descriptor.texture.as_ref().and_then(|texture| {
                let native = texture.native()?;
                let sampler = descriptor
                    .sampler
                    .as_ref()
                    .and_then(|sampler| sampler.native().map(|native| native.id))
                    .unwrap_or(0);
                Some(GlesDescriptor::Texture {
                    binding,
                    element,
                    target: native.target,
                    texture: native.name.clone(),
                    sampler,
                })
            })
        }
        DescriptorType::Sampler => descriptor.sampler.as_ref().and_then(|sampler| {
            sampler.native().map(|native| GlesDescriptor::Sampler { binding, element, sampler: native.id })
        }),
    };

    resolved.unwrap_or_else(|| {
        gfx_error!(SOURCE, "Descriptor at binding {}[{}] has no native object", binding, element);
        GlesDescriptor::Empty
    })
}

// ===== BACKEND =====

impl<D: GlDriver + 'static> Backend for GlesBackend<D> {
    type Buffer = GlesBuffer;
    type Texture = GlesTexture;
    type Sampler = GlesSampler;
    type Shader = GlesShader;
    type RenderPass = GlesRenderPass;
    type Framebuffer = GlesFramebuffer;
    type DescriptorSetLayout = GlesDescriptorSetLayout;
    type PipelineLayout = GlesPipelineLayout;
    type DescriptorSet = GlesDescriptorSet;
    type PipelineState = GlesPipelineState;
    type InputAssembler = GlesInputAssembler;
    type Fence = GlesFence;

    fn name(&self) -> &str {
        "GLES3"
    }

    fn initialize(&mut self, info: &DeviceInfo) -> Result<()> {
        let vendor = self.driver.get_string(gl::VENDOR);
        let renderer = self.driver.get_string(gl::RENDERER);
        let version = self.driver.get_string(gl::VERSION);
        gfx_info!(SOURCE, "{} driver: {} / {} / {}", self.driver.name(), vendor, renderer, version);

        self.caps = query_caps(&mut self.driver);
        let extensions = self.driver.extensions();
        self.features = detect_features(&extensions, self.driver.supports_vertex_array_objects());
        self.anisotropy = extensions.iter().any(|extension| extension == "GL_EXT_texture_filter_anisotropic");
        gfx_debug!(SOURCE, "{} extensions, features {:?}", extensions.len(), self.features);

        self.validation = info.validation;
        self.binding_mapping = info.binding_mapping.clone();

        // Render areas are applied through the scissor
        self.cache.set_enabled(&mut self.driver, GlCaps::SCISSOR_TEST, true);
        self.driver.pixel_store_i32(gl::UNPACK_ALIGNMENT, 1);

        let code = self.driver.get_error();
        if code != gl::NO_ERROR {
            gfx_bail!(SOURCE, "Context setup raised {}", gl::error_name(code));
        }
        Ok(())
    }

    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn features(&self) -> Features {
        self.features
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, info: &BufferInfo) -> Result<GlesBuffer> {
        let usage_hint = buffer_usage_hint(info.memory_usage);
        let Some(target) = buffer_target(info.usage) else {
            return Ok(GlesBuffer { id: 0, target: None, size: info.size, usage_hint });
        };

        let id = self
            .driver
            .create_buffer()
            .map_err(|err| gfx_err!(SOURCE, "Failed to create buffer: {}", err))?;
        self.bind_for_upload(target, id);
        self.driver.buffer_data_size(target, info.size, usage_hint);
        if let Some(err) = self.allocation_error("buffer storage") {
            self.cache.forget_buffer(id);
            self.driver.delete_buffer(id);
            return Err(err);
        }
        Ok(GlesBuffer { id, target: Some(target), size: info.size, usage_hint })
    }

    fn update_buffer(&mut self, buffer: &mut GlesBuffer, data: &[u8], offset: u32) -> Result<()> {
        self.upload_buffer(buffer, data, offset);
        Ok(())
    }

    fn resize_buffer(&mut self, buffer: &mut GlesBuffer, size: u32) -> Result<()> {
        if let Some(target) = buffer.target {
            self.bind_for_upload(target, buffer.id);
            self.driver.buffer_data_size(target, size, buffer.usage_hint);
            if let Some(err) = self.allocation_error("buffer storage") {
                return Err(err);
            }
        }
        buffer.size = size;
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: GlesBuffer) {
        if buffer.id != 0 {
            self.cache.forget_buffer(buffer.id);
            self.driver.delete_buffer(buffer.id);
        }
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, info: &TextureInfo) -> Result<GlesTexture> {
        self.allocate_texture(info)
    }

    fn resize_texture(&mut self, texture: &mut GlesTexture, info: &TextureInfo) -> Result<()> {
        // Immutable storage cannot be resized, the object is replaced
        let resized = self.allocate_texture(info)?;
        let old = texture.name.replace(resized.id());
        self.cache.forget_texture(old);
        self.driver.delete_texture(old);
        *texture = GlesTexture { name: texture.name.clone(), ..resized };
        Ok(())
    }

    fn copy_buffers_to_texture(
        &mut self,
        buffers: &[&[u8]],
        texture: &Texture<Self>,
        regions: &[BufferTextureCopy],
    ) -> Result<()> {
        let Some(native) = texture.native() else {
            gfx_bail!(SOURCE, "copy_buffers_to_texture: texture has no native object");
        };
        self.upload_texture(&native, buffers, regions);
        Ok(())
    }

    fn destroy_texture(&mut self, texture: GlesTexture) {
        self.delete_texture(&texture);
    }

    // ===== SAMPLERS =====

    fn create_sampler(&mut self, info: &SamplerInfo) -> Result<GlesSampler> {
        let id = self
            .driver
            .create_sampler()
            .map_err(|err| gfx_err!(SOURCE, "Failed to create sampler: {}", err))?;

        let parameters = [
            (gl::TEXTURE_MIN_FILTER, min_filter_to_gl(info.min_filter, info.mip_filter)),
            (gl::TEXTURE_MAG_FILTER, mag_filter_to_gl(info.mag_filter)),
            (gl::TEXTURE_WRAP_S, address_to_gl(info.address_u)),
            (gl::TEXTURE_WRAP_T, address_to_gl(info.address_v)),
            (gl::TEXTURE_WRAP_R, address_to_gl(info.address_w)),
        ];
        for (pname, value) in parameters {
            self.driver.sampler_parameter_i32(id, pname, value as i32);
        }

        if let Some(compare_op) = info.compare_op {
            self.driver.sampler_parameter_i32(id, gl::TEXTURE_COMPARE_MODE, gl::COMPARE_REF_TO_TEXTURE as i32);
            self.driver.sampler_parameter_i32(id, gl::TEXTURE_COMPARE_FUNC, compare_op_to_gl(compare_op) as i32);
        }
        if self.anisotropy && info.max_anisotropy > 1 {
            self.driver.sampler_parameter_f32(id, gl::TEXTURE_MAX_ANISOTROPY_EXT, info.max_anisotropy as f32);
        }
        Ok(GlesSampler { id })
    }

    fn destroy_sampler(&mut self, sampler: GlesSampler) {
        self.cache.forget_sampler(sampler.id);
        self.driver.delete_sampler(sampler.id);
    }

    // ===== SHADERS =====

    fn create_shader(&mut self, info: &ShaderInfo) -> Result<GlesShader> {
        let program = self
            .driver
            .create_program()
            .map_err(|err| gfx_err!(SOURCE, "Shader '{}': failed to create program: {}", info.name, err))?;

        let shaders = match self.compile_stages(program, info) {
            Ok(shaders) => shaders,
            Err(err) => {
                self.driver.delete_program(program);
                return Err(err);
            }
        };

        let linked = self.driver.link_program(program);
        for &shader in &shaders {
            self.driver.detach_shader(program, shader);
        }
        self.delete_shaders(&shaders);
        if let Err(log) = linked {
            self.driver.delete_program(program);
            gfx_bail!(SOURCE, "Shader '{}' failed to link:\n{}", info.name, log);
        }

        let attributes = info
            .attributes
            .iter()
            .map(|attribute| GlesShaderAttribute {
                declared: attribute.location,
                location: self
                    .driver
                    .get_attrib_location(program, &attribute.name)
                    .unwrap_or(attribute.location),
            })
            .collect();

        self.assign_bindings(program, info);
        gfx_debug!(SOURCE, "Shader '{}' linked as program {}", info.name, program);
        Ok(GlesShader { program, attributes })
    }

    fn destroy_shader(&mut self, shader: GlesShader) {
        self.cache.forget_program(shader.program);
        self.driver.delete_program(shader.program);
    }

    // ===== RENDER PASSES / FRAMEBUFFERS =====

    fn create_render_pass(&mut self, info: &RenderPassInfo) -> Result<GlesRenderPass> {
        Ok(GlesRenderPass {
            colors: info
                .color_attachments
                .iter()
                .map(|attachment| (attachment.load_op, attachment.store_op))
                .collect(),
            depth_stencil: info.depth_stencil_attachment.as_ref().map(|attachment| GlesDepthStencilOps {
                has_depth: attachment.format.has_depth(),
                has_stencil: attachment.format.has_stencil(),
                depth_load: attachment.depth_load_op,
                depth_store: attachment.depth_store_op,
                stencil_load: attachment.stencil_load_op,
                stencil_store: attachment.stencil_store_op,
            }),
        })
    }

    fn destroy_render_pass(&mut self, _render_pass: GlesRenderPass) {}

    fn create_framebuffer(&mut self, info: &FramebufferInfo<Self>) -> Result<GlesFramebuffer> {
        if info.is_surface() {
            return Ok(GlesFramebuffer { fbo: None, color_count: 1 });
        }

        let fbo = self
            .driver
            .create_framebuffer()
            .map_err(|err| gfx_err!(SOURCE, "Failed to create framebuffer: {}", err))?;
        self.cache.bind_framebuffer(&mut self.driver, fbo);

        let mut draw_buffers = Vec::with_capacity(info.color_textures.len());
        for (index, texture) in info.color_textures.iter().enumerate() {
            let Some(native) = texture.native() else {
                self.delete_framebuffer_object(fbo);
                gfx_bail!(SOURCE, "Color attachment {} has no native texture", index);
            };
            let attachment = gl::COLOR_ATTACHMENT0 + index as u32;
            self.attach_texture(attachment, &native);
            draw_buffers.push(attachment);
        }

        if let Some(texture) = &info.depth_stencil_texture {
            let Some(native) = texture.native() else {
                self.delete_framebuffer_object(fbo);
                gfx_bail!(SOURCE, "Depth-stencil attachment has no native texture");
            };
            let format = texture.format();
            let attachment = match (format.has_depth(), format.has_stencil()) {
                (true, true) => gl::DEPTH_STENCIL_ATTACHMENT,
                (true, false) => gl::DEPTH_ATTACHMENT,
                _ => gl::STENCIL_ATTACHMENT,
            };
            self.attach_texture(attachment, &native);
        }

        if draw_buffers.is_empty() {
            self.driver.draw_buffers(&[gl::NONE]);
        } else {
            self.driver.draw_buffers(&draw_buffers);
        }

        let status = self.driver.check_framebuffer_status(gl::FRAMEBUFFER);
        if status != gl::FRAMEBUFFER_COMPLETE {
            self.delete_framebuffer_object(fbo);
            gfx_bail!(SOURCE, "Framebuffer is incomplete (status {:#x})", status);
        }
        Ok(GlesFramebuffer { fbo: Some(fbo), color_count: draw_buffers.len() as u32 })
    }

    fn destroy_framebuffer(&mut self, framebuffer: GlesFramebuffer) {
        if let Some(fbo) = framebuffer.fbo {
            self.delete_framebuffer_object(fbo);
        }
    }

    // ===== BINDINGS =====

    fn create_descriptor_set_layout(&mut self, _info: &DescriptorSetLayoutInfo) -> Result<GlesDescriptorSetLayout> {
        Ok(GlesDescriptorSetLayout)
    }

    fn destroy_descriptor_set_layout(&mut self, _layout: GlesDescriptorSetLayout) {}

    fn create_pipeline_layout(&mut self, _info: &PipelineLayoutInfo<Self>) -> Result<GlesPipelineLayout> {
        Ok(GlesPipelineLayout)
    }

    fn destroy_pipeline_layout(&mut self, _layout: GlesPipelineLayout) {}

    fn create_descriptor_set(&mut self, layout: &DescriptorSetLayout<Self>) -> Result<GlesDescriptorSet> {
        let count = layout.descriptor_count();
        let mut slots = Vec::with_capacity(count);
        let mut dynamic_count = 0;
        for index in 0..count {
            let Some(binding) = layout.binding_of_descriptor(index) else {
                gfx_bail!(SOURCE, "Descriptor {} of the layout has no binding", index);
            };
            let first = layout.descriptor_index(binding.binding, 0).unwrap_or(index);
            let dynamic_index = if binding.descriptor_type.is_dynamic() {
                dynamic_count += 1;
                Some(dynamic_count - 1)
            } else {
                None
            };
            slots.push(GlesSlot {
                binding: binding.binding,
                element: (index - first) as u32,
                dynamic_index,
            });
        }
        Ok(GlesDescriptorSet {
            slots,
            descriptors: vec![GlesDescriptor::Empty; count],
        })
    }

    fn update_descriptor_set(&mut self, set: &mut GlesDescriptorSet, descriptors: &[Descriptor<Self>]) -> Result<()> {
        if descriptors.len() != set.slots.len() {
            gfx_bail!(
                SOURCE,
                "{} descriptors given for a set of {} slots",
                descriptors.len(),
                set.slots.len()
            );
        }
        set.descriptors = set
            .slots
            .iter()
            .zip(descriptors)
            .map(|(&slot, descriptor)| resolve_descriptor(slot, descriptor))
            .collect();
        Ok(())
    }

    fn destroy_descriptor_set(&mut self, _set: GlesDescriptorSet) {}

    // ===== PIPELINES / INPUT ASSEMBLERS =====

    fn create_pipeline_state(&mut self, info: &PipelineStateInfo<Self>) -> Result<GlesPipelineState> {
        let Some(shader) = info.shader.native() else {
            gfx_bail!(SOURCE, "Pipeline state: shader '{}' has no program", info.shader.name());
        };

        let rasterizer = &info.rasterizer;
        if rasterizer.polygon_mode != PolygonMode::Fill {
            gfx_warn!(SOURCE, "Polygon mode {:?} is not available on GLES, filling", rasterizer.polygon_mode);
        }
        let raster = GlesRasterState {
            cull_face: cull_mode_to_gl(rasterizer.cull_mode),
            front_face: front_face_to_gl(rasterizer.front_face),
            polygon_offset: rasterizer
                .depth_bias_enabled
                .then_some((rasterizer.depth_bias.slope_factor, rasterizer.depth_bias.constant_factor)),
            line_width: rasterizer.line_width,
        };

        let depth_stencil = GlesDepthStencilState {
            depth_test: info.depth_stencil.depth_test_enable,
            depth_write: info.depth_stencil.depth_write_enable,
            depth_func: compare_op_to_gl(info.depth_stencil.depth_compare_op),
            stencil_test: info.depth_stencil.stencil_test_enable,
            front: stencil_face(&info.depth_stencil.front),
            back: stencil_face(&info.depth_stencil.back),
        };

        let target = info.blend.targets.first().copied().unwrap_or_default();
        if info.blend.targets.iter().skip(1).any(|other| *other != target) {
            gfx_warn!(SOURCE, "GLES3 has one blend state for all attachments, using target 0");
        }
        let mask = target.color_write_mask;
        let blend = GlesBlendState {
            alpha_to_coverage: info.blend.alpha_to_coverage,
            enabled: target.blend_enable,
            equation: (blend_op_to_gl(target.color_blend_op), blend_op_to_gl(target.alpha_blend_op)),
            func: (
                blend_factor_to_gl(target.src_color_factor),
                blend_factor_to_gl(target.dst_color_factor),
                blend_factor_to_gl(target.src_alpha_factor),
                blend_factor_to_gl(target.dst_alpha_factor),
            ),
            color: info.blend.blend_color.to_array(),
            color_mask: [mask.r, mask.g, mask.b, mask.a],
        };

        Ok(GlesPipelineState {
            mode: topology_to_gl(info.primitive),
            program: shader.program,
            attributes: shader.attributes.clone(),
            raster,
            depth_stencil,
            blend,
            dynamic_states: info.dynamic_states,
        })
    }

    fn destroy_pipeline_state(&mut self, _pipeline: GlesPipelineState) {}

    fn create_input_assembler(&mut self, info: &InputAssemblerInfo<Self>) -> Result<GlesInputAssembler> {
        let mut attributes = Vec::with_capacity(info.attributes.len());
        for attribute in &info.attributes {
            let Some(buffer) = info.vertex_buffers.get(attribute.stream as usize) else {
                gfx_bail!(SOURCE, "Attribute {} reads missing stream {}", attribute.location, attribute.stream);
            };
            let Some(native) = buffer.native() else {
                gfx_bail!(SOURCE, "Vertex stream {} has no native buffer", attribute.stream);
            };
            let Some(format) = attribute_format_to_gl(attribute.format) else {
                gfx_bail!(SOURCE, "{:?} cannot be used as a vertex attribute", attribute.format);
            };
            attributes.push(GlesAttribute {
                location: attribute.location,
                buffer: native.id,
                stride: buffer.stride(),
                offset: attribute.offset,
                format: GlAttributeFormat {
                    normalized: format.normalized || (attribute.normalized && !format.integer),
                    ..format
                },
                divisor: match attribute.input_rate {
                    VertexInputRate::Vertex => 0,
                    VertexInputRate::Instance => 1,
                },
            });
        }

        let mut input_assembler = GlesInputAssembler { attributes, ..Default::default() };
        if let Some(buffer) = &info.index_buffer {
            let Some(native) = buffer.native() else {
                gfx_bail!(SOURCE, "Index buffer has no native buffer");
            };
            let Some(index_type) = IndexType::from_stride(buffer.stride()) else {
                gfx_bail!(SOURCE, "Index stride {} is not 1, 2 or 4", buffer.stride());
            };
            input_assembler.index_buffer = native.id;
            input_assembler.index_type = Some(index_type_to_gl(index_type));
            input_assembler.index_size = index_type.size();
        }
        Ok(input_assembler)
    }

    fn destroy_input_assembler(&mut self, input_assembler: GlesInputAssembler) {
        for &vao in input_assembler.vaos.values() {
            self.cache.forget_vertex_array(vao);
            self.driver.delete_vertex_array(vao);
        }
    }

    // ===== SYNCHRONIZATION =====

    fn create_fence(&mut self) -> Result<GlesFence> {
        Ok(GlesFence::default())
    }

    fn signal_fence(&mut self, fence: &mut GlesFence) -> Result<()> {
        if let Some(old) = fence.sync.take() {
            self.driver.delete_sync(old);
        }
        let sync = self
            .driver
            .fence_sync()
            .map_err(|err| gfx_err!(SOURCE, "glFenceSync failed: {}", err))?;
        fence.sync = Some(sync);
        Ok(())
    }

    fn wait_fence(&mut self, fence: &mut GlesFence) -> Result<()> {
        let Some(sync) = fence.sync else {
            return Ok(());
        };
        loop {
            match self.driver.client_wait_sync(sync, gl::SYNC_FLUSH_COMMANDS_BIT, FENCE_TIMEOUT_NS) {
                gl::ALREADY_SIGNALED | gl::CONDITION_SATISFIED => return Ok(()),
                gl::TIMEOUT_EXPIRED => gfx_warn!(SOURCE, "Fence {} still pending after 1s", sync),
                status => gfx_bail!(SOURCE, "glClientWaitSync failed on fence {} ({:#x})", sync, status),
            }
        }
    }

    fn reset_fence(&mut self, fence: &mut GlesFence) {
        if let Some(sync) = fence.sync.take() {
            self.driver.delete_sync(sync);
        }
    }

    fn destroy_fence(&mut self, mut fence: GlesFence) {
        self.reset_fence(&mut fence);
    }

    // ===== FRAME =====

    fn acquire(&mut self) -> Result<()> {
        gfx_trace!(SOURCE, "acquire");
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.driver.swap_buffers();
        Ok(())
    }

    fn execute(&mut self, package: &CommandPackage<Self>, allocator: &CommandAllocator<Self>) -> Result<()> {
        self.replay(package, allocator)
    }
}

#[cfg(test)]
#[path = "gles_backend_tests.rs"]
mod tests;
