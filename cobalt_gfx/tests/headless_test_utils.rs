#![allow(dead_code)]
//! Headless test utilities - devices for integration tests without a GL context
//!
//! Every device runs the real GLES backend over a `HeadlessDriver`, so tests
//! exercise the complete record / submit / replay path and can assert on the
//! driver calls it produced.

use std::rc::Rc;

use cobalt_gfx::cobalt::gfx::{
    Buffer, BufferInfo, BufferUsage, ColorAttachment, CommandBuffer, DescriptorSetLayout,
    DescriptorSetLayoutBinding, DescriptorSetLayoutInfo, DescriptorType, Device, DeviceInfo,
    Format, Framebuffer, FramebufferInfo, InputAssembler, InputAssemblerInfo, PipelineLayout,
    PipelineLayoutInfo, PipelineState, PipelineStateInfo, PrimitiveTopology, Rect2D, RenderPass,
    RenderPassInfo, Shader, ShaderAttribute, ShaderInfo, ShaderStage, ShaderStageFlags,
    ShaderStageInfo, UniformBlock, VertexAttribute,
};
use cobalt_gfx_gles::{GlesBackend, HeadlessDriver};

pub type TestBackend = GlesBackend<HeadlessDriver>;
pub type TestDevice = Device<TestBackend>;

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;

/// Create a headless device with a 1280x720 surface
pub fn create_test_device() -> TestDevice {
    create_test_device_with(DeviceInfo::default())
}

/// Create a headless device, forcing the 1280x720 surface size
pub fn create_test_device_with(info: DeviceInfo) -> TestDevice {
    let info = DeviceInfo { width: WIDTH, height: HEIGHT, ..info };
    Device::new(GlesBackend::new(HeadlessDriver::new()), info).expect("Failed to create headless device")
}

pub fn full_area() -> Rect2D {
    Rect2D { x: 0, y: 0, width: WIDTH, height: HEIGHT }
}

/// Number of recorded driver calls starting with `prefix`
pub fn driver_calls(device: &TestDevice, prefix: &str) -> usize {
    device.backend().driver().count(prefix)
}

pub fn clear_driver_calls(device: &TestDevice) {
    device.backend_mut().driver_mut().clear_calls();
}

/// Everything needed to draw a triangle list to the surface
pub struct Scene {
    pub render_pass: Rc<RenderPass<TestBackend>>,
    pub framebuffer: Rc<Framebuffer<TestBackend>>,
    pub set_layout: Rc<DescriptorSetLayout<TestBackend>>,
    pub pipeline_layout: Rc<PipelineLayout<TestBackend>>,
    pub shader: Rc<Shader<TestBackend>>,
    pub pipeline_state: Rc<PipelineState<TestBackend>>,
    pub vertex_buffer: Rc<Buffer<TestBackend>>,
    pub input_assembler: Rc<InputAssembler<TestBackend>>,
}

/// Build a surface scene: one uniform block, a 6-vertex position buffer
pub fn create_scene(device: &TestDevice) -> Scene {
    let render_pass = device
        .create_render_pass(&RenderPassInfo {
            color_attachments: vec![ColorAttachment::new(Format::R8G8B8A8_UNORM)],
            depth_stencil_attachment: None,
        })
        .expect("Failed to create render pass");
    let framebuffer = device
        .create_framebuffer(&FramebufferInfo::surface(render_pass.clone()))
        .expect("Failed to create framebuffer");

    let set_layout = device
        .create_descriptor_set_layout(&DescriptorSetLayoutInfo {
            bindings: vec![DescriptorSetLayoutBinding::new(
                0,
                DescriptorType::UniformBuffer,
                ShaderStageFlags::VERTEX,
            )],
        })
        .expect("Failed to create descriptor set layout");
    let pipeline_layout = device
        .create_pipeline_layout(&PipelineLayoutInfo { set_layouts: vec![set_layout.clone()] })
        .expect("Failed to create pipeline layout");

    let shader = device
        .create_shader(&ShaderInfo {
            name: "scene".to_string(),
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
                name: "Camera".to_string(),
                size: 64,
                count: 1,
            }],
            ..Default::default()
        })
        .expect("Failed to create shader");

    let pipeline_state = device
        .create_pipeline_state(&PipelineStateInfo::new(
            shader.clone(),
            pipeline_layout.clone(),
            render_pass.clone(),
            PrimitiveTopology::TriangleList,
        ))
        .expect("Failed to create pipeline state");

    let vertex_buffer = device
        .create_buffer(&BufferInfo::new(BufferUsage::VERTEX, 72, 12))
        .expect("Failed to create vertex buffer");
    let input_assembler = device
        .create_input_assembler(&InputAssemblerInfo::new(
            vec![VertexAttribute::new(0, Format::R32G32B32_SFLOAT, 0)],
            vec![vertex_buffer.clone()],
        ))
        .expect("Failed to create input assembler");

    Scene {
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

/// Record `frame` into the device command buffer and submit it
pub fn submit_frame(device: &TestDevice, frame: impl FnOnce(&CommandBuffer<TestBackend>)) {
    let command_buffer = device.command_buffer().clone();
    command_buffer.begin().expect("begin() should succeed");
    frame(&command_buffer);
    command_buffer.end().expect("end() should succeed");
    device
        .queue()
        .submit(&[command_buffer], None)
        .expect("submit() should succeed");
}
