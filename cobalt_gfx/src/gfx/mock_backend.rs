/// Mock backend for unit tests (no driver required)
///
/// Every call is appended to `calls` as a short string so tests can assert on
/// the exact sequence the HAL produced. Native objects are plain handles.

use std::rc::Rc;

use crate::error::Result;
use crate::gfx::{
    Backend, BufferInfo, BufferTextureCopy, BufferUsage, ColorAttachment, Command, CommandAllocator,
    CommandPackage, Descriptor, DescriptorSetLayout, DescriptorSetLayoutBinding, DescriptorSetLayoutInfo,
    DescriptorType, Device, DeviceCaps, DeviceInfo, Features, Format, Framebuffer, FramebufferInfo,
    InputAssembler, InputAssemblerInfo, PipelineLayout, PipelineLayoutInfo, PipelineState,
    PipelineStateInfo, PrimitiveTopology, RenderPass, RenderPassInfo, SamplerInfo, Shader, ShaderInfo,
    ShaderStage, ShaderStageFlags, ShaderStageInfo, Texture, TextureInfo, VertexAttribute,
};
use crate::gfx_bail;

// ============================================================================
// Mock natives
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockHandle(pub u32);

#[derive(Debug)]
pub struct MockBuffer {
    pub handle: MockHandle,
    pub data: Vec<u8>,
}

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Debug, Default)]
pub struct MockBackend {
    pub calls: Vec<String>,
    /// Make the next `create_*` call fail
    pub fail_next_create: bool,
    pub fail_initialize: bool,
    pub live_objects: i32,
    pub(crate) next_handle: u32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|call| call.starts_with(prefix)).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn create(&mut self, call: String) -> Result<MockHandle> {
        if std::mem::take(&mut self.fail_next_create) {
            gfx_bail!("cobalt::MockBackend", "{} refused", call);
        }
        self.calls.push(call);
        self.next_handle += 1;
        self.live_objects += 1;
        Ok(MockHandle(self.next_handle))
    }

    fn destroy(&mut self, call: &str) {
        self.calls.push(call.to_string());
        self.live_objects -= 1;
    }
}

impl Backend for MockBackend {
    type Buffer = MockBuffer;
    type Texture = MockHandle;
    type Sampler = MockHandle;
    type Shader = MockHandle;
    type RenderPass = MockHandle;
    type Framebuffer = MockHandle;
    type DescriptorSetLayout = MockHandle;
    type PipelineLayout = MockHandle;
    type DescriptorSet = MockHandle;
    type PipelineState = MockHandle;
    type InputAssembler = MockHandle;
    type Fence = MockHandle;

    fn name(&self) -> &str {
        "Mock"
    }

    fn initialize(&mut self, _info: &DeviceInfo) -> Result<()> {
        if self.fail_initialize {
            gfx_bail!("cobalt::MockBackend", "initialization refused");
        }
        Ok(())
    }

    fn caps(&self) -> DeviceCaps {
        DeviceCaps::default()
    }

    fn features(&self) -> Features {
        Features::INSTANCED_ARRAYS | Features::ELEMENT_INDEX_UINT
    }

    fn create_buffer(&mut self, info: &BufferInfo) -> Result<MockBuffer> {
        let handle = self.create(format!("create_buffer {}", info.size))?;
        Ok(MockBuffer { handle, data: vec![0; info.size as usize] })
    }

    fn update_buffer(&mut self, buffer: &mut MockBuffer, data: &[u8], offset: u32) -> Result<()> {
        self.calls.push(format!("update_buffer {}@{}", data.len(), offset));
        let start = offset as usize;
        buffer.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn resize_buffer(&mut self, buffer: &mut MockBuffer, size: u32) -> Result<()> {
        self.calls.push(format!("resize_buffer {size}"));
        buffer.data = vec![0; size as usize];
        Ok(())
    }

    fn destroy_buffer(&mut self, _buffer: MockBuffer) {
        self.destroy("destroy_buffer");
    }

    fn create_texture(&mut self, info: &TextureInfo) -> Result<MockHandle> {
        self.create(format!("create_texture {}x{}", info.width, info.height))
    }

    fn resize_texture(&mut self, _texture: &mut MockHandle, info: &TextureInfo) -> Result<()> {
        self.calls.push(format!("resize_texture {}x{}", info.width, info.height));
        Ok(())
    }

    fn copy_buffers_to_texture(
        &mut self,
        _buffers: &[&[u8]],
        _texture: &Texture<Self>,
        regions: &[BufferTextureCopy],
    ) -> Result<()> {
        self.calls.push(format!("copy_buffers_to_texture {}", regions.len()));
        Ok(())
    }

    fn destroy_texture(&mut self, _texture: MockHandle) {
        self.destroy("destroy_texture");
    }

    fn create_sampler(&mut self, _info: &SamplerInfo) -> Result<MockHandle> {
        self.create("create_sampler".to_string())
    }

    fn destroy_sampler(&mut self, _sampler: MockHandle) {
        self.destroy("destroy_sampler");
    }

    fn create_shader(&mut self, info: &ShaderInfo) -> Result<MockHandle> {
        self.create(format!("create_shader {}", info.name))
    }

    fn destroy_shader(&mut self, _shader: MockHandle) {
        self.destroy("destroy_shader");
    }

    fn create_render_pass(&mut self, _info: &RenderPassInfo) -> Result<MockHandle> {
        self.create("create_render_pass".to_string())
    }

    fn destroy_render_pass(&mut self, _render_pass: MockHandle) {
        self.destroy("destroy_render_pass");
    }

    fn create_framebuffer(&mut self, _info: &FramebufferInfo<Self>) -> Result<MockHandle> {
        self.create("create_framebuffer".to_string())
    }

    fn destroy_framebuffer(&mut self, _framebuffer: MockHandle) {
        self.destroy("destroy_framebuffer");
    }

    fn create_descriptor_set_layout(&mut self, _info: &DescriptorSetLayoutInfo) -> Result<MockHandle> {
        self.create("create_descriptor_set_layout".to_string())
    }

    fn destroy_descriptor_set_layout(&mut self, _layout: MockHandle) {
        self.destroy("destroy_descriptor_set_layout");
    }

    fn create_pipeline_layout(&mut self, _info: &PipelineLayoutInfo<Self>) -> Result<MockHandle> {
        self.create("create_pipeline_layout".to_string())
    }

    fn destroy_pipeline_layout(&mut self, _layout: MockHandle) {
        self.destroy("destroy_pipeline_layout");
    }

    fn create_descriptor_set(&mut self, _layout: &DescriptorSetLayout<Self>) -> Result<MockHandle> {
        self.create("create_descriptor_set".to_string())
    }

    fn update_descriptor_set(&mut self, _set: &mut MockHandle, descriptors: &[Descriptor<Self>]) -> Result<()> {
        let bound = descriptors.iter().filter(|descriptor| !descriptor.is_empty()).count();
        self.calls.push(format!("update_descriptor_set {bound}"));
        Ok(())
    }

    fn destroy_descriptor_set(&mut self, _set: MockHandle) {
        self.destroy("destroy_descriptor_set");
    }

    fn create_pipeline_state(&mut self, _info: &PipelineStateInfo<Self>) -> Result<MockHandle> {
        self.create("create_pipeline_state".to_string())
    }

    fn destroy_pipeline_state(&mut self, _pipeline: MockHandle) {
        self.destroy("destroy_pipeline_state");
    }

    fn create_input_assembler(&mut self, _info: &InputAssemblerInfo<Self>) -> Result<MockHandle> {
        self.create("create_input_assembler".to_string())
    }

    fn destroy_input_assembler(&mut self, _input_assembler: MockHandle) {
        self.destroy("destroy_input_assembler");
    }

    fn create_fence(&mut self) -> Result<MockHandle> {
        self.create("create_fence".to_string())
    }

    fn signal_fence(&mut self, _fence: &mut MockHandle) -> Result<()> {
        self.calls.push("signal_fence".to_string());
        Ok(())
    }

    fn wait_fence(&mut self, _fence: &mut MockHandle) -> Result<()> {
        self.calls.push("wait_fence".to_string());
        Ok(())
    }

    fn reset_fence(&mut self, _fence: &mut MockHandle) {
        self.calls.push("reset_fence".to_string());
    }

    fn destroy_fence(&mut self, _fence: MockHandle) {
        self.destroy("destroy_fence");
    }

    fn acquire(&mut self) -> Result<()> {
        self.calls.push("acquire".to_string());
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.calls.push("present".to_string());
        Ok(())
    }

    fn execute(&mut self, package: &CommandPackage<Self>, allocator: &CommandAllocator<Self>) -> Result<()> {
        for command in package.iter(allocator) {
            let call = match command {
                Command::BeginRenderPass(cmd) => format!("cmd begin_render_pass {}", cmd.clear_colors.len()),
                Command::EndRenderPass(_) => "cmd end_render_pass".to_string(),
                Command::BindStates(cmd) => format!("cmd bind_states {:?}", cmd.touched),
                Command::Draw(cmd) => format!(
                    "cmd draw v{} i{} x{}",
                    cmd.info.vertex_count, cmd.info.index_count, cmd.info.instance_count
                ),
                Command::UpdateBuffer(cmd) => format!("cmd update_buffer {}@{}", cmd.data.len(), cmd.offset),
                Command::CopyBuffersToTexture(cmd) => {
                    format!("cmd copy_buffers_to_texture {}", cmd.regions.len())
                }
            };
            self.calls.push(call);
        }
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn mock_device() -> Device<MockBackend> {
    let info = DeviceInfo {
        width: 800,
        height: 600,
        ..Default::default()
    };
    Device::new(MockBackend::new(), info).expect("mock device")
}

pub fn test_shader(device: &Device<MockBackend>) -> Rc<Shader<MockBackend>> {
    let info = ShaderInfo {
        name: "test".to_string(),
        stages: vec![
            ShaderStageInfo { stage: ShaderStage::Vertex, source: "void main() {}".to_string() },
            ShaderStageInfo { stage: ShaderStage::Fragment, source: "void main() {}".to_string() },
        ],
        ..Default::default()
    };
    device.create_shader(&info).expect("shader")
}

pub fn test_render_pass(device: &Device<MockBackend>) -> Rc<RenderPass<MockBackend>> {
    let info = RenderPassInfo {
        color_attachments: vec![ColorAttachment::new(Format::R8G8B8A8_UNORM)],
        depth_stencil_attachment: None,
    };
    device.create_render_pass(&info).expect("render pass")
}

/// Render pass, surface framebuffer, pipeline and a 4-vertex input assembler
pub struct DrawFixture {
    pub render_pass: Rc<RenderPass<MockBackend>>,
    pub framebuffer: Rc<Framebuffer<MockBackend>>,
    pub pipeline_layout: Rc<PipelineLayout<MockBackend>>,
    pub pipeline_state: Rc<PipelineState<MockBackend>>,
    pub input_assembler: Rc<InputAssembler<MockBackend>>,
}

impl DrawFixture {
    pub fn new(device: &Device<MockBackend>, primitive: PrimitiveTopology) -> Self {
        let render_pass = test_render_pass(device);
        let framebuffer = device
            .create_framebuffer(&FramebufferInfo::surface(render_pass.clone()))
            .expect("framebuffer");

        let set_layout = device
            .create_descriptor_set_layout(&DescriptorSetLayoutInfo {
                bindings: vec![DescriptorSetLayoutBinding::new(
                    0,
                    DescriptorType::UniformBuffer,
                    ShaderStageFlags::VERTEX,
                )],
            })
            .expect("set layout");
        let pipeline_layout = device
            .create_pipeline_layout(&PipelineLayoutInfo { set_layouts: vec![set_layout] })
            .expect("pipeline layout");

        let pipeline_state = device
            .create_pipeline_state(&PipelineStateInfo::new(
                test_shader(device),
                pipeline_layout.clone(),
                render_pass.clone(),
                primitive,
            ))
            .expect("pipeline state");

        let vertices = device
            .create_buffer(&BufferInfo::new(BufferUsage::VERTEX, 48, 12))
            .expect("vertex buffer");
        let input_assembler = device
            .create_input_assembler(&InputAssemblerInfo::new(
                vec![VertexAttribute::new(0, Format::R32G32B32_SFLOAT, 0)],
                vec![vertices],
            ))
            .expect("input assembler");

        Self {
            render_pass,
            framebuffer,
            pipeline_layout,
            pipeline_state,
            input_assembler,
        }
    }
}
