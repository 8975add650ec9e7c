//! Unit tests for CommandBuffer
//!
//! Tests state coalescing, render pass rules, draw accounting and command
//! sharing between primary and secondary buffers.

use std::mem::size_of;
use std::rc::Rc;

use crate::error::Error;
use crate::gfx::mock_backend::{mock_device, test_render_pass, test_shader, DrawFixture, MockBackend};
use crate::gfx::{
    BufferInfo, BufferUsage, Color, ColorAttachment, CommandBuffer, CommandBufferInfo, CommandBufferType,
    CommandType, DescriptorSetInfo, Device, DrawInfo, Format, FrameStats, FramebufferInfo, InputAssemblerInfo,
    LoadOp, PipelineStateInfo, PrimitiveTopology, Rect2D, RecordingState, RenderPass, RenderPassInfo,
    StateFlags, StencilFace, VertexAttribute, Viewport,
};

const AREA: Rect2D = Rect2D { x: 0, y: 0, width: 800, height: 600 };

/// Same attachment format as the fixture pass, but loading instead of clearing
fn loading_pass(device: &Device<MockBackend>) -> Rc<RenderPass<MockBackend>> {
    device
        .create_render_pass(&RenderPassInfo {
            color_attachments: vec![ColorAttachment {
                load_op: LoadOp::Load,
                ..ColorAttachment::new(Format::R8G8B8A8_UNORM)
            }],
            depth_stencil_attachment: None,
        })
        .unwrap()
}

fn secondary(device: &Device<MockBackend>) -> Rc<CommandBuffer<MockBackend>> {
    device
        .create_command_buffer(&CommandBufferInfo { buffer_type: CommandBufferType::Secondary })
        .unwrap()
}

fn begin_pass(cmd: &CommandBuffer<MockBackend>, fixture: &DrawFixture) {
    cmd.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, AREA, &[Color::ZERO], 1.0, 0)
        .unwrap();
}

// ============================================================================
// STATE COALESCING
// ============================================================================

#[test]
fn test_setters_coalesce_into_one_bind_states() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.set_scissor(Rect2D { x: 10, y: 10, width: 100, height: 100 }).unwrap();
    cmd.set_line_width(2.0).unwrap();
    cmd.set_depth_bias(1.0, 0.0, 2.0).unwrap();
    cmd.set_stencil_write_mask(StencilFace::Front, 0x0f).unwrap();
    cmd.draw().unwrap();
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();

    let package = cmd.package();
    assert_eq!(
        package.cmd_types(),
        &[
            CommandType::BeginRenderPass,
            CommandType::BindStates,
            CommandType::Draw,
            CommandType::EndRenderPass,
        ]
    );

    let allocator = device.shared.allocator.borrow();
    let bind = allocator.bind_states_pool().get(package.bind_states[0]).unwrap();
    assert_eq!(
        bind.touched,
        StateFlags::PIPELINE_STATE
            | StateFlags::INPUT_ASSEMBLER
            | StateFlags::SCISSOR
            | StateFlags::LINE_WIDTH
            | StateFlags::DEPTH_BIAS
            | StateFlags::STENCIL_WRITE_MASK
    );
    assert_eq!(bind.state.line_width, 2.0);
    assert_eq!(bind.state.stencil_write_mask.front, 0x0f);
    assert_eq!(bind.state.stencil_write_mask.back, 0xFF);
}

#[test]
fn test_unchanged_values_do_not_invalidate_state() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    // The render pass already set the viewport to its area
    cmd.set_viewport(Viewport::from_rect(AREA)).unwrap();
    assert!(!cmd.is_state_invalid());

    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.set_line_width(3.0).unwrap();
    cmd.draw().unwrap();
    assert!(!cmd.is_state_invalid());

    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.set_line_width(3.0).unwrap();
    cmd.set_blend_constants(Color::ZERO).unwrap();
    assert!(!cmd.is_state_invalid());
    cmd.draw().unwrap();

    assert_eq!(cmd.package().count(CommandType::BindStates), 1);
    assert_eq!(cmd.package().count(CommandType::Draw), 2);
}

#[test]
fn test_touched_fields_accumulate_over_the_recording() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.draw().unwrap();
    cmd.set_depth_bounds(0.1, 0.9).unwrap();
    cmd.draw().unwrap();

    let package = cmd.package();
    assert_eq!(package.count(CommandType::BindStates), 2);
    let allocator = device.shared.allocator.borrow();
    let second = allocator.bind_states_pool().get(package.bind_states[1]).unwrap();
    assert!(second.touched.contains(StateFlags::PIPELINE_STATE | StateFlags::DEPTH_BOUNDS));
}

#[test]
fn test_end_flushes_pending_state() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = secondary(&device);

    cmd.begin().unwrap();
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.end().unwrap();

    assert_eq!(cmd.package().cmd_types(), &[CommandType::BindStates]);
    assert_eq!(cmd.state(), RecordingState::Recorded);
}

#[test]
fn test_descriptor_set_offsets_must_match_layout() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let layout = fixture.pipeline_layout.set_layouts()[0].clone();
    let set = device.create_descriptor_set(&DescriptorSetInfo { layout }).unwrap();
    let cmd = secondary(&device);

    cmd.begin().unwrap();
    let result = cmd.bind_descriptor_set(0, &set, &[256]);
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
    assert!(!cmd.is_state_invalid());

    cmd.bind_descriptor_set(1, &set, &[]).unwrap();
    let current = cmd.current_state();
    assert!(current.descriptor_set(0).is_none());
    assert!(current.descriptor_set(1).is_some_and(|bound| Rc::ptr_eq(bound, &set)));
}

// ============================================================================
// RENDER PASS RULES
// ============================================================================

#[test]
fn test_primary_draw_requires_render_pass() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    assert!(matches!(cmd.draw(), Err(Error::InvalidOperation(_))));
    assert!(cmd.set_line_width(2.0).is_err());
    assert_eq!(cmd.package().count(CommandType::Draw), 0);
    assert_eq!(cmd.num_draw_calls(), 0);
}

#[test]
fn test_secondary_draws_without_render_pass() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = secondary(&device);

    cmd.begin().unwrap();
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.set_line_width(2.0).unwrap();
    cmd.draw().unwrap();
    cmd.end().unwrap();

    assert_eq!(cmd.package().count(CommandType::Draw), 1);
    assert_eq!(cmd.num_draw_calls(), 1);
}

#[test]
fn test_secondary_cannot_open_or_close_render_pass() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = secondary(&device);

    cmd.begin().unwrap();
    let result = cmd.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, AREA, &[], 1.0, 0);
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
    assert!(cmd.end_render_pass().is_err());
    assert!(!cmd.inside_render_pass());
    assert!(cmd.package().is_empty());
}

#[test]
fn test_render_pass_cannot_nest() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    let result = cmd.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, AREA, &[], 1.0, 0);
    assert!(result.is_err());
    cmd.end_render_pass().unwrap();
    assert!(cmd.end_render_pass().is_err());
    assert_eq!(cmd.package().count(CommandType::BeginRenderPass), 1);
    assert_eq!(cmd.package().count(CommandType::EndRenderPass), 1);
}

#[test]
fn test_framebuffer_of_incompatible_pass_is_rejected() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let loading = device
        .create_framebuffer(&FramebufferInfo::surface(loading_pass(&device)))
        .unwrap();
    // Structurally equal to the fixture pass
    let equal = device
        .create_framebuffer(&FramebufferInfo::surface(test_render_pass(&device)))
        .unwrap();
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    let result = cmd.begin_render_pass(&fixture.render_pass, &loading, AREA, &[Color::ZERO], 1.0, 0);
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
    assert!(!cmd.inside_render_pass());
    assert_eq!(cmd.package().count(CommandType::BeginRenderPass), 0);

    cmd.begin_render_pass(&fixture.render_pass, &equal, AREA, &[Color::ZERO], 1.0, 0)
        .unwrap();
    assert!(cmd.inside_render_pass());
}

#[test]
fn test_pipeline_of_incompatible_pass_is_rejected() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let foreign = device
        .create_pipeline_state(&PipelineStateInfo::new(
            test_shader(&device),
            fixture.pipeline_layout.clone(),
            loading_pass(&device),
            PrimitiveTopology::TriangleList,
        ))
        .unwrap();
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    assert!(matches!(cmd.bind_pipeline_state(&foreign), Err(Error::InvalidOperation(_))));
    cmd.end_render_pass().unwrap();

    // Bound before the pass, caught at the draw
    cmd.bind_pipeline_state(&foreign).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    begin_pass(cmd, &fixture);
    assert!(matches!(cmd.draw(), Err(Error::InvalidOperation(_))));
    assert!(cmd.draw_with_info(&DrawInfo::vertices(3)).is_err());
    assert_eq!(cmd.package().count(CommandType::Draw), 0);
    assert_eq!(cmd.num_draw_calls(), 0);

    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.draw().unwrap();
    assert_eq!(cmd.num_draw_calls(), 1);
}

#[test]
fn test_upload_inside_primary_pass_is_rejected() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let uniforms = device
        .create_buffer(&BufferInfo::new(BufferUsage::UNIFORM, 16, 16))
        .unwrap();
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    cmd.update_buffer(&uniforms, &[1, 2, 3, 4], 4).unwrap();
    begin_pass(cmd, &fixture);
    assert!(cmd.update_buffer(&uniforms, &[5, 6, 7, 8], 0).is_err());
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();

    assert_eq!(cmd.package().count(CommandType::UpdateBuffer), 1);
    device.queue().submit(std::slice::from_ref(cmd), None).unwrap();
    assert_eq!(device.backend().count("cmd update_buffer 4@4"), 1);
}

#[test]
fn test_commands_outside_recording_are_rejected() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    assert!(cmd.bind_pipeline_state(&fixture.pipeline_state).is_err());
    assert!(cmd.end().is_err());

    cmd.begin().unwrap();
    cmd.end().unwrap();
    assert!(cmd.bind_pipeline_state(&fixture.pipeline_state).is_err());
}

// ============================================================================
// DRAW ACCOUNTING
// ============================================================================

#[test]
fn test_draw_without_pipeline_is_rejected() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    assert!(matches!(cmd.draw(), Err(Error::InvalidOperation(_))));
    assert_eq!(cmd.package().count(CommandType::Draw), 0);
}

#[test]
fn test_triangle_strip_counts_instances() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleStrip);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.draw_with_info(&DrawInfo::indexed(5).with_instances(2)).unwrap();

    assert_eq!(cmd.num_draw_calls(), 1);
    assert_eq!(cmd.num_instances(), 2);
    assert_eq!(cmd.num_triangles(), 6);
}

#[test]
fn test_large_instanced_draw_counts_without_overflow() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    begin_pass(cmd, &fixture);
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&fixture.input_assembler).unwrap();
    cmd.draw_with_info(&DrawInfo::indexed(30_000_000).with_instances(1000)).unwrap();

    assert_eq!(cmd.num_instances(), 1000);
    assert_eq!(cmd.num_triangles(), 10_000_000_000);
}

#[test]
fn test_frame_stats_saturate() {
    let mut stats = FrameStats { draw_calls: u64::MAX - 1, instances: 0, triangles: u64::MAX };
    stats.accumulate(&FrameStats { draw_calls: 5, instances: 3, triangles: 1 });

    assert_eq!(stats.draw_calls, u64::MAX);
    assert_eq!(stats.instances, 3);
    assert_eq!(stats.triangles, u64::MAX);
}

#[test]
fn test_indirect_draw_counts_every_record() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let record = size_of::<DrawInfo>() as u32;
    let indirect = device
        .create_buffer(&BufferInfo::new(BufferUsage::INDIRECT, record * 2, 0))
        .unwrap();
    let vertices = device
        .create_buffer(&BufferInfo::new(BufferUsage::VERTEX, 48, 12))
        .unwrap();
    let mut info = InputAssemblerInfo::new(vec![VertexAttribute::new(0, Format::R32G32B32_SFLOAT, 0)], vec![vertices]);
    info.indirect_buffer = Some(indirect.clone());
    let input_assembler = device.create_input_assembler(&info).unwrap();
    let cmd = device.command_buffer();

    cmd.begin().unwrap();
    // Indirect updates land in the CPU draw list at record time
    cmd.update_buffer(&indirect, bytemuck::cast_slice(&[DrawInfo::vertices(3), DrawInfo::vertices(6).with_instances(2)]), 0)
        .unwrap();
    assert_eq!(cmd.package().count(CommandType::UpdateBuffer), 0);
    assert_eq!(indirect.draw_infos().len(), 2);

    begin_pass(cmd, &fixture);
    cmd.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    cmd.bind_input_assembler(&input_assembler).unwrap();
    cmd.draw().unwrap();

    assert_eq!(cmd.num_draw_calls(), 2);
    assert_eq!(cmd.num_instances(), 2);
    assert_eq!(cmd.num_triangles(), 1 + 2 * 2);

    let package = cmd.package();
    assert_eq!(package.count(CommandType::Draw), 1);
    let allocator = device.shared.allocator.borrow();
    assert!(allocator.draw_pool().get(package.draw[0]).is_some_and(|draw| draw.indirect));
}

// ============================================================================
// SECONDARY EXECUTION
// ============================================================================

#[test]
fn test_execute_shares_records_until_both_are_cleared() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let bundle = secondary(&device);
    let primary = device.command_buffer();

    bundle.begin().unwrap();
    bundle.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    bundle.bind_input_assembler(&fixture.input_assembler).unwrap();
    bundle.set_line_width(4.0).unwrap();
    bundle.draw().unwrap();
    bundle.end().unwrap();

    primary.begin().unwrap();
    begin_pass(primary, &fixture);
    primary.execute(std::slice::from_ref(&bundle)).unwrap();
    primary.end_render_pass().unwrap();
    primary.end().unwrap();

    let shared_draw = bundle.package().draw[0];
    assert_eq!(device.shared.allocator.borrow().draw_pool().ref_count(shared_draw), 2);
    assert_eq!(device.shared.allocator.borrow().live_count(), 4);

    // State and statistics carry over to the primary
    assert_eq!(primary.current_state().line_width, 4.0);
    assert!(primary.current_state().pipeline_state.is_some());
    assert_eq!(primary.num_draw_calls(), 1);
    assert_eq!(
        primary.package().cmd_types(),
        &[
            CommandType::BeginRenderPass,
            CommandType::BindStates,
            CommandType::Draw,
            CommandType::EndRenderPass,
        ]
    );

    bundle.begin().unwrap();
    assert_eq!(device.shared.allocator.borrow().draw_pool().ref_count(shared_draw), 1);
    primary.begin().unwrap();
    assert_eq!(device.shared.allocator.borrow().live_count(), 0);
}

#[test]
fn test_execute_rejects_primary_and_unfinished_buffers() {
    let device = mock_device();
    let other_primary = device.create_command_buffer(&CommandBufferInfo::default()).unwrap();
    let unfinished = secondary(&device);
    let cmd = device.command_buffer();

    unfinished.begin().unwrap();
    cmd.begin().unwrap();
    assert!(cmd.execute(&[other_primary]).is_err());
    assert!(cmd.execute(&[unfinished]).is_err());
    assert!(cmd.package().is_empty());
}

#[test]
fn test_submit_replays_secondary_commands() {
    let device = mock_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let bundle = secondary(&device);
    let primary = device.command_buffer();

    bundle.begin().unwrap();
    bundle.bind_pipeline_state(&fixture.pipeline_state).unwrap();
    bundle.bind_input_assembler(&fixture.input_assembler).unwrap();
    bundle.draw().unwrap();
    bundle.end().unwrap();

    primary.begin().unwrap();
    begin_pass(primary, &fixture);
    primary.execute(std::slice::from_ref(&bundle)).unwrap();
    primary.end_render_pass().unwrap();
    primary.end().unwrap();

    // Secondaries are never submitted directly
    device.queue().submit(&[bundle.clone()], None).unwrap();
    assert_eq!(device.backend().count("cmd "), 0);

    device.queue().submit(std::slice::from_ref(primary), None).unwrap();
    let backend = device.backend();
    let replayed: Vec<&str> = backend
        .calls
        .iter()
        .filter(|call| call.starts_with("cmd "))
        .map(String::as_str)
        .collect();
    assert_eq!(replayed.len(), 4);
    assert_eq!(replayed[0], "cmd begin_render_pass 1");
    assert!(replayed[1].starts_with("cmd bind_states"));
    assert_eq!(replayed[2], "cmd draw v4 i0 x0");
    assert_eq!(replayed[3], "cmd end_render_pass");
}
