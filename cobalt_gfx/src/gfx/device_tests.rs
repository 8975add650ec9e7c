//! Unit tests for Device
//!
//! Tests construction, factories, memory accounting and the frame contract
//! against the mock backend.

use crate::error::Error;
use crate::gfx::mock_backend::{mock_device, DrawFixture, MockBackend};
use crate::gfx::{
    Backend, BindingMappingInfo, BufferInfo, BufferTextureCopy, BufferUsage, CommandBufferInfo,
    CommandBufferType, Device, DeviceInfo, Extent3D, Features, Format, Object, ObjectStatus,
    ObjectType, PrimitiveTopology, QueueInfo, QueueType, Rect2D, TextureInfo, TextureUsage,
};

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_device_new_builds_default_queue_and_command_buffer() {
    let device = mock_device();

    assert!(device.queue().is_ready());
    assert_eq!(device.queue().queue_type(), QueueType::Graphics);
    assert!(device.command_buffer().is_ready());
    assert_eq!(device.command_buffer().buffer_type(), CommandBufferType::Primary);
    assert_eq!(device.info().width, 800);
    assert_eq!(device.backend().name(), "Mock");
}

#[test]
fn test_device_new_fails_when_backend_fails() {
    let backend = MockBackend {
        fail_initialize: true,
        ..Default::default()
    };
    let result = Device::new(backend, DeviceInfo::default());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_device_reports_backend_features() {
    let device = mock_device();
    assert!(device.has_feature(Features::INSTANCED_ARRAYS));
    assert!(!device.has_feature(Features::FORMAT_ASTC));
    assert_eq!(device.caps().max_vertex_attributes, 16);
    assert!(!device.is_async());
}

#[test]
fn test_binding_mapping_offsets() {
    let mapping = BindingMappingInfo {
        buffer_offsets: vec![0, 4, 8],
        sampler_offsets: vec![0, 2, 6],
        flexible_set: 2,
    };
    assert_eq!(mapping.buffer_slot(1, 3), 7);
    assert_eq!(mapping.sampler_slot(2, 1), 7);
    // Unknown sets fall back to offset 0
    assert_eq!(mapping.buffer_slot(5, 2), 2);
}

// ============================================================================
// FACTORIES
// ============================================================================

#[test]
fn test_create_buffer_rejects_empty_usage() {
    let device = mock_device();
    let result = device.create_buffer(&BufferInfo::new(BufferUsage::empty(), 16, 4));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(device.backend().count("create_buffer"), 0);
}

#[test]
fn test_backend_failure_marks_object_failed() {
    let device = mock_device();
    device.backend_mut().fail_next_create = true;

    let buffer = crate::gfx::Buffer::new(&device);
    assert!(!buffer.initialize(&BufferInfo::new(BufferUsage::VERTEX, 16, 4)));
    assert_eq!(buffer.status(), ObjectStatus::Failed);
    assert_eq!(device.memory_status().buffer_size, 0);
}

#[test]
fn test_extra_queue_and_command_buffer() {
    let device = mock_device();
    let queue = device
        .create_queue(&QueueInfo { queue_type: QueueType::Transfer })
        .unwrap();
    let secondary = device
        .create_command_buffer(&CommandBufferInfo { buffer_type: CommandBufferType::Secondary })
        .unwrap();

    assert_eq!(queue.queue_type(), QueueType::Transfer);
    assert_eq!(queue.object_type(), ObjectType::Queue);
    assert_eq!(secondary.buffer_type(), CommandBufferType::Secondary);
}

#[test]
fn test_dropping_resources_releases_natives() {
    let device = mock_device();
    {
        let _fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
        assert!(device.backend().live_objects > 0);
    }
    assert_eq!(device.backend().live_objects, 0);
}

// ============================================================================
// MEMORY STATUS
// ============================================================================

#[test]
fn test_memory_status_tracks_buffers_and_textures() {
    let device = mock_device();
    let buffer = device
        .create_buffer(&BufferInfo::new(BufferUsage::UNIFORM, 256, 256))
        .unwrap();
    let texture = device
        .create_texture(&TextureInfo::new_2d(Format::R8G8B8A8_UNORM, TextureUsage::SAMPLED, 16, 16))
        .unwrap();

    let status = device.memory_status();
    assert_eq!(status.buffer_size, 256);
    assert_eq!(status.texture_size, 16 * 16 * 4);

    drop(buffer);
    texture.destroy();
    let status = device.memory_status();
    assert_eq!(status.buffer_size, 0);
    assert_eq!(status.texture_size, 0);
}

// ============================================================================
// FRAME CONTRACT
// ============================================================================

#[test]
fn test_present_publishes_frame_stats() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    device.acquire().unwrap();
    cmd.begin().unwrap();
    cmd.begin_render_pass(
        &fixture.render_pass,
        &fixture.framebuffer,
        Rect2D { x: 0, y: 0, width: 800, height: 600 },
        &[crate::gfx::Color::ZERO],
        1.0,
        0,
    )
    .unwrap();
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.draw().unwrap();
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();
    device.queue().submit(std::slice::from_ref(cmd), None).unwrap();

    assert_eq!(device.pending_frame_stats().draw_calls, 1);
    assert_eq!(device.frame_stats().draw_calls, 0);

    device.present().unwrap();
    let stats = device.frame_stats();
    assert_eq!(stats.draw_calls, 1);
    // 48-byte buffer with a 12-byte stride holds 4 vertices: one triangle
    assert_eq!(stats.triangles, 1);
    assert_eq!(device.pending_frame_stats().draw_calls, 0);
}

#[test]
fn test_immediate_texture_upload() {
    let device = mock_device();
    let texture = device
        .create_texture(&TextureInfo::new_2d(Format::R8_UNORM, TextureUsage::SAMPLED, 4, 4))
        .unwrap();
    let texels = [7u8; 16];
    let region = BufferTextureCopy {
        tex_extent: Extent3D { width: 4, height: 4, depth: 1 },
        ..Default::default()
    };

    device.copy_buffers_to_texture(&[&texels], &texture, &[region]).unwrap();
    assert_eq!(device.backend().count("copy_buffers_to_texture 1"), 1);

    let result = device.copy_buffers_to_texture(&[], &texture, &[region]);
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
}
