/// Backend trait: the seam between the device API and a concrete graphics driver
///
/// A backend owns every native object. The HAL stores those natives inside its
/// resource objects (one associated type per resource kind) and hands them back
/// to the backend by reference, so a backend never inspects a foreign handle
/// and never downcasts.
///
/// The backend is owned by the `Device` and borrowed mutably for every call;
/// implementations keep their driver state cache as plain fields.

use crate::error::Result;
use crate::gfx::{
    BufferInfo, BufferTextureCopy, CommandAllocator, CommandPackage, DescriptorSetLayout,
    Descriptor, DeviceCaps, DeviceInfo, Features, FramebufferInfo, InputAssemblerInfo,
    PipelineLayoutInfo, PipelineStateInfo, RenderPassInfo, SamplerInfo, ShaderInfo, Texture,
    TextureInfo, DescriptorSetLayoutInfo,
};

/// Concrete graphics backend
pub trait Backend: Sized + 'static {
    type Buffer;
    type Texture;
    type Sampler;
    type Shader;
    type RenderPass;
    type Framebuffer;
    type DescriptorSetLayout;
    type PipelineLayout;
    type DescriptorSet;
    type PipelineState;
    type InputAssembler;
    type Fence;

    /// Human-readable backend name ("GLES3", "Mock", ...)
    fn name(&self) -> &str;

    /// Bring up the driver for the given surface and settings
    fn initialize(&mut self, info: &DeviceInfo) -> Result<()>;

    /// Numeric limits reported by the driver
    fn caps(&self) -> DeviceCaps;

    /// Optional features reported by the driver
    fn features(&self) -> Features;

    /// True when submitted work executes after `Queue::submit` returns
    fn is_async(&self) -> bool {
        false
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, info: &BufferInfo) -> Result<Self::Buffer>;
    fn update_buffer(&mut self, buffer: &mut Self::Buffer, data: &[u8], offset: u32) -> Result<()>;
    fn resize_buffer(&mut self, buffer: &mut Self::Buffer, size: u32) -> Result<()>;
    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    // ===== TEXTURES =====

    fn create_texture(&mut self, info: &TextureInfo) -> Result<Self::Texture>;
    /// Reallocate storage for the resized description `info`
    fn resize_texture(&mut self, texture: &mut Self::Texture, info: &TextureInfo) -> Result<()>;

    /// Immediate upload outside of any command buffer
    fn copy_buffers_to_texture(
        &mut self,
        buffers: &[&[u8]],
        texture: &Texture<Self>,
        regions: &[BufferTextureCopy],
    ) -> Result<()>;

    fn destroy_texture(&mut self, texture: Self::Texture);

    // ===== SAMPLERS / SHADERS =====

    fn create_sampler(&mut self, info: &SamplerInfo) -> Result<Self::Sampler>;
    fn destroy_sampler(&mut self, sampler: Self::Sampler);

    fn create_shader(&mut self, info: &ShaderInfo) -> Result<Self::Shader>;
    fn destroy_shader(&mut self, shader: Self::Shader);

    // ===== RENDER PASSES / FRAMEBUFFERS =====

    fn create_render_pass(&mut self, info: &RenderPassInfo) -> Result<Self::RenderPass>;
    fn destroy_render_pass(&mut self, render_pass: Self::RenderPass);

    fn create_framebuffer(&mut self, info: &FramebufferInfo<Self>) -> Result<Self::Framebuffer>;
    fn destroy_framebuffer(&mut self, framebuffer: Self::Framebuffer);

    // ===== BINDINGS =====

    fn create_descriptor_set_layout(
        &mut self,
        info: &DescriptorSetLayoutInfo,
    ) -> Result<Self::DescriptorSetLayout>;
    fn destroy_descriptor_set_layout(&mut self, layout: Self::DescriptorSetLayout);

    fn create_pipeline_layout(&mut self, info: &PipelineLayoutInfo<Self>) -> Result<Self::PipelineLayout>;
    fn destroy_pipeline_layout(&mut self, layout: Self::PipelineLayout);

    fn create_descriptor_set(&mut self, layout: &DescriptorSetLayout<Self>) -> Result<Self::DescriptorSet>;

    /// Materialize the current descriptors of a set
    fn update_descriptor_set(
        &mut self,
        set: &mut Self::DescriptorSet,
        descriptors: &[Descriptor<Self>],
    ) -> Result<()>;

    fn destroy_descriptor_set(&mut self, set: Self::DescriptorSet);

    // ===== PIPELINES / INPUT ASSEMBLERS =====

    fn create_pipeline_state(&mut self, info: &PipelineStateInfo<Self>) -> Result<Self::PipelineState>;
    fn destroy_pipeline_state(&mut self, pipeline: Self::PipelineState);

    fn create_input_assembler(&mut self, info: &InputAssemblerInfo<Self>) -> Result<Self::InputAssembler>;
    fn destroy_input_assembler(&mut self, input_assembler: Self::InputAssembler);

    // ===== SYNCHRONIZATION =====

    fn create_fence(&mut self) -> Result<Self::Fence>;

    /// Arm the fence behind all work submitted so far
    fn signal_fence(&mut self, fence: &mut Self::Fence) -> Result<()>;

    /// Block until the fence is signaled
    fn wait_fence(&mut self, fence: &mut Self::Fence) -> Result<()>;

    fn reset_fence(&mut self, fence: &mut Self::Fence);
    fn destroy_fence(&mut self, fence: Self::Fence);

    // ===== FRAME =====

    fn acquire(&mut self) -> Result<()>;
    fn present(&mut self) -> Result<()>;

    /// Replay a recorded command package
    fn execute(&mut self, package: &CommandPackage<Self>, allocator: &CommandAllocator<Self>) -> Result<()>;
}
