//! Shared fixtures for the GLES unit tests
//!
//! Devices run on a `HeadlessDriver`; assertions read its call log through
//! `device.backend().driver()`.

use std::rc::Rc;

use cobalt_gfx::cobalt::gfx::{
    BufferInfo, BufferUsage, ColorAttachment, CommandBuffer, DescriptorSetLayout,
    DescriptorSetLayoutBinding, DescriptorSetLayoutInfo, DescriptorType, Device, DeviceInfo,
    Format, Framebuffer, FramebufferInfo, InputAssembler, InputAssemblerInfo, PipelineLayout,
    PipelineLayoutInfo, PipelineState, PipelineStateInfo, PrimitiveTopology, Rect2D, RenderPass,
    RenderPassInfo, Shader, ShaderAttribute, ShaderInfo, ShaderStage, ShaderStageFlags,
    ShaderStageInfo, UniformBlock, VertexAttribute, Buffer,
};

use crate::gles_backend::GlesBackend;
use crate::headless_driver::HeadlessDriver;

pub type HeadlessBackend = GlesBackend<HeadlessDriver>;
pub type HeadlessDevice = Device<HeadlessBackend>;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub fn headless_device() -> HeadlessDevice {
    headless_device_with(HeadlessDriver::new(), DeviceInfo::default())
}

/// Device over `driver`; a zero size in `info` becomes 800x600
pub fn headless_device_with(driver: HeadlessDriver, info: DeviceInfo) -> HeadlessDevice {
    let info = DeviceInfo {
        width: if info.width == 0 { WIDTH } else { info.width },
        height: if info.height == 0 { HEIGHT } else { info.height },
        ..info
    };
    Device::new(GlesBackend::new(driver), info).expect("headless device")
}

pub fn full_area() -> Rect2D {
    Rect2D { x: 0, y: 0, width: WIDTH, height: HEIGHT }
}

pub fn count(device: &HeadlessDevice, prefix: &str) -> usize {
    device.backend().driver().count(prefix)
}

pub fn calls(device: &HeadlessDevice) -> Vec<String> {
    device.backend().driver().calls.clone()
}

pub fn clear_calls(device: &HeadlessDevice) {
    device.backend_mut().driver_mut().clear_calls();
}

/// Record one frame on the device command buffer and submit it
pub fn submit_frame(device: &HeadlessDevice, record: impl FnOnce(&CommandBuffer<HeadlessBackend>)) {
    let command_buffer = device.command_buffer().clone();
    command_buffer.begin().expect("begin");
    record(&command_buffer);
    command_buffer.end().expect("end");
    device.queue().submit(&[command_buffer], None).expect("submit");
}

pub fn test_shader(device: &HeadlessDevice) -> Rc<Shader<HeadlessBackend>> {
    let info = ShaderInfo {
        name: "test".to_string(),
        stages: vec![
            ShaderStageInfo { stage: ShaderStage::Vertex, source: "void main() {}".to_string() },
            ShaderStageInfo { stage: ShaderStage::Fragment, source: "void main() {}".to_string() },
        ],
        attributes: vec![ShaderAttribute {
            name: "a_position".to_string(),
            location: 0,
            format: Format::R32G32B32_SFLOAT,
        }],
        blocks: vec![UniformBlock {
            set: 0,
            binding: 0,
            name: "Globals".to_string(),
            size: 64,
            count: 1,
        }],
        ..Default::default()
    };
    device.create_shader(&info).expect("shader")
}

/// Surface render pass, one uniform block layout, a 4-vertex input assembler
pub struct DrawFixture {
    pub render_pass: Rc<RenderPass<HeadlessBackend>>,
    pub framebuffer: Rc<Framebuffer<HeadlessBackend>>,
    pub set_layout: Rc<DescriptorSetLayout<HeadlessBackend>>,
    pub pipeline_layout: Rc<PipelineLayout<HeadlessBackend>>,
    pub shader: Rc<Shader<HeadlessBackend>>,
    pub pipeline_state: Rc<PipelineState<HeadlessBackend>>,
    pub vertex_buffer: Rc<Buffer<HeadlessBackend>>,
    pub input_assembler: Rc<InputAssembler<HeadlessBackend>>,
}

impl DrawFixture {
    pub fn new(device: &HeadlessDevice, primitive: PrimitiveTopology) -> Self {
        let render_pass = device
            .create_render_pass(&RenderPassInfo {
                color_attachments: vec![ColorAttachment::new(Format::R8G8B8A8_UNORM)],
                depth_stencil_attachment: None,
            })
            .expect("render pass");
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
            .create_pipeline_layout(&PipelineLayoutInfo { set_layouts: vec![set_layout.clone()] })
            .expect("pipeline layout");

        let shader = test_shader(device);
        let pipeline_state = device
            .create_pipeline_state(&PipelineStateInfo::new(
                shader.clone(),
                pipeline_layout.clone(),
                render_pass.clone(),
                primitive,
            ))
            .expect("pipeline state");

        let vertex_buffer = device
            .create_buffer(&BufferInfo::new(BufferUsage::VERTEX, 48, 12))
            .expect("vertex buffer");
        let input_assembler = device
            .create_input_assembler(&InputAssemblerInfo::new(
                vec![VertexAttribute::new(0, Format::R32G32B32_SFLOAT, 0)],
                vec![vertex_buffer.clone()],
            ))
            .expect("input assembler");

        Self {
            render_pass,
            framebuffer,
            set_layout,
            pipeline_layout,
            shader,
            pipeline_state,
            vertex_buffer,
            input_assembler,
        }
    }

    /// Pipeline state of the fixture with `configure` applied to its info
    pub fn pipeline(
        &self,
        device: &HeadlessDevice,
        configure: impl FnOnce(&mut PipelineStateInfo<HeadlessBackend>),
    ) -> Rc<PipelineState<HeadlessBackend>> {
        let mut info = PipelineStateInfo::new(
            self.shader.clone(),
            self.pipeline_layout.clone(),
            self.render_pass.clone(),
            PrimitiveTopology::TriangleList,
        );
        configure(&mut info);
        device.create_pipeline_state(&info).expect("pipeline state")
    }
}
