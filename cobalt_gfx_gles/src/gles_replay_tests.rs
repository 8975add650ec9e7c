//! Unit tests for command replay
//!
//! Frames are recorded through the device command buffer and submitted to a
//! GLES backend on the HeadlessDriver; assertions read the driver call log.

use std::rc::Rc;

use cobalt_gfx::cobalt::gfx::{
    BufferInfo, BufferTextureCopy, BufferUsage, Color, ColorAttachment, ColorWriteMask,
    DescriptorSetInfo, DescriptorSetLayoutBinding, DescriptorSetLayoutInfo, DescriptorType,
    DeviceInfo, DrawInfo, DynamicStateFlags, Extent3D, Format, FramebufferInfo,
    InputAssembler, InputAssemblerInfo, PipelineLayoutInfo, PrimitiveTopology, Rect2D,
    RenderPassInfo, ShaderAttribute, ShaderInfo, ShaderStageFlags, StencilFace as FaceSelect,
    StoreOp, TextureInfo, TextureUsage, VertexAttribute, Viewport,
};

use super::*;
use crate::headless_driver::HeadlessDriver;
use crate::test_fixtures::{
    calls, clear_calls, count, full_area, headless_device, headless_device_with, submit_frame,
    DrawFixture, HeadlessBackend, HeadlessDevice,
};

/// Clear to black, bind the fixture pipeline and input assembler, draw once
fn draw_frame(device: &HeadlessDevice, fixture: &DrawFixture) {
    submit_frame(device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[Color::ZERO], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });
}

// ============================================================================
// FRAMES
// ============================================================================

#[test]
fn test_frame_clears_then_draws() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    clear_calls(&device);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(
            &fixture.render_pass,
            &fixture.framebuffer,
            full_area(),
            &[Color::new(0.5, 0.25, 0.0, 1.0)],
            1.0,
            0,
        )
        .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let calls = calls(&device);
    let clear = format!("clear_buffer_f32 {:#x} 0 [0.5, 0.25, 0.0, 1.0]", gl::COLOR);
    let draw = format!("draw_arrays {:#x} 0 4", gl::TRIANGLES);
    let clear_at = calls.iter().position(|call| *call == clear).unwrap();
    let program_at = calls.iter().position(|call| call.starts_with("use_program")).unwrap();
    let draw_at = calls.iter().position(|call| *call == draw).unwrap();

    assert!(calls.contains(&"viewport 0 0 800 600".to_string()));
    assert!(clear_at < program_at);
    assert!(program_at < draw_at);
}

#[test]
fn test_redundant_state_filtered_within_and_across_frames() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.draw().unwrap();
        // Rebinding the same objects records nothing
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });
    draw_frame(&device, &fixture);

    assert_eq!(count(&device, "use_program"), 1);
    assert_eq!(count(&device, "cull_face"), 0);
    assert_eq!(count(&device, &format!("enable {:#x}", gl::DEPTH_TEST)), 1);
    assert_eq!(count(&device, "draw_arrays "), 3);
}

#[test]
fn test_present_swaps_buffers() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);

    device.acquire().unwrap();
    draw_frame(&device, &fixture);
    device.present().unwrap();

    assert_eq!(count(&device, "swap_buffers"), 1);
    assert_eq!(device.frame_stats().draw_calls, 1);
}

// ============================================================================
// VERTEX ARRAYS
// ============================================================================

#[test]
fn test_vertex_array_built_once_and_reused() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);

    draw_frame(&device, &fixture);
    draw_frame(&device, &fixture);

    assert_eq!(count(&device, "create_vertex_array"), 1);
    assert_eq!(count(&device, "enable_vertex_attrib_array 0"), 1);
    assert_eq!(count(&device, &format!("vertex_attrib_pointer 0 3 {:#x}", gl::FLOAT)), 1);
    assert_eq!(fixture.input_assembler.native().unwrap().vao_count(), 1);
}

#[test]
fn test_vertex_array_per_attribute_layout() {
    let mut driver = HeadlessDriver::new();
    driver.attrib_locations.insert("a_moved".to_string(), 2);
    let device = headless_device_with(driver, DeviceInfo::default());
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let moved_shader = device
        .create_shader(&ShaderInfo {
            name: "moved".to_string(),
            attributes: vec![ShaderAttribute {
                name: "a_moved".to_string(),
                location: 0,
                format: Format::R32G32B32_SFLOAT,
            }],
            ..(*fixture.shader.info()).clone()
        })
        .unwrap();
    let moved = fixture.pipeline(&device, |info| info.shader = moved_shader.clone());

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.draw().unwrap();
        cb.bind_pipeline_state(&moved).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    assert_eq!(fixture.input_assembler.native().unwrap().vao_count(), 2);
    assert_eq!(count(&device, "enable_vertex_attrib_array 2"), 1);
}

#[test]
fn test_attributes_bound_directly_without_vertex_arrays() {
    let mut driver = HeadlessDriver::new();
    driver.vertex_array_objects = false;
    let device = headless_device_with(driver, DeviceInfo::default());
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);

    draw_frame(&device, &fixture);
    draw_frame(&device, &fixture);

    assert_eq!(count(&device, "create_vertex_array"), 0);
    assert_eq!(count(&device, "enable_vertex_attrib_array 0"), 1);
    assert_eq!(count(&device, "vertex_attrib_pointer 0"), 2);
    assert_eq!(device.backend().state_cache().enabled_attributes(), 1);
}

// ============================================================================
// RENDER PASS LOAD / STORE
// ============================================================================

fn pass_with(device: &HeadlessDevice, attachment: ColorAttachment) -> DrawFixture {
    let mut fixture = DrawFixture::new(device, PrimitiveTopology::TriangleList);
    fixture.render_pass = device
        .create_render_pass(&RenderPassInfo {
            color_attachments: vec![attachment],
            depth_stencil_attachment: None,
        })
        .unwrap();
    fixture.framebuffer = device
        .create_framebuffer(&FramebufferInfo::surface(fixture.render_pass.clone()))
        .unwrap();
    fixture.pipeline_state = fixture.pipeline(device, |_| {});
    fixture
}

#[test]
fn test_dont_care_store_invalidates_at_end() {
    let device = headless_device();
    let fixture = pass_with(
        &device,
        ColorAttachment { store_op: StoreOp::DontCare, ..ColorAttachment::new(Format::R8G8B8A8_UNORM) },
    );
    clear_calls(&device);

    draw_frame(&device, &fixture);

    let calls = calls(&device);
    let invalidate = format!("invalidate_framebuffer {:#x} [{:#x}]", gl::FRAMEBUFFER, gl::COLOR);
    let invalidate_at = calls.iter().position(|call| *call == invalidate).unwrap();
    let draw_at = calls.iter().position(|call| call.starts_with("draw_arrays")).unwrap();
    assert!(invalidate_at > draw_at);
}

#[test]
fn test_dont_care_load_invalidates_instead_of_clearing() {
    let device = headless_device();
    let fixture = pass_with(
        &device,
        ColorAttachment { load_op: LoadOp::DontCare, ..ColorAttachment::new(Format::R8G8B8A8_UNORM) },
    );
    clear_calls(&device);

    draw_frame(&device, &fixture);

    assert_eq!(count(&device, "clear_buffer"), 0);
    assert_eq!(count(&device, "invalidate_framebuffer"), 1);
}

#[test]
fn test_load_keeps_contents() {
    let device = headless_device();
    let fixture = pass_with(
        &device,
        ColorAttachment { load_op: LoadOp::Load, ..ColorAttachment::new(Format::R8G8B8A8_UNORM) },
    );
    clear_calls(&device);

    draw_frame(&device, &fixture);

    assert_eq!(count(&device, "clear_buffer"), 0);
    assert_eq!(count(&device, "invalidate_framebuffer"), 0);
}

#[test]
fn test_clear_overrides_then_restores_write_masks() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let masked = fixture.pipeline(&device, |info| {
        info.blend.targets[0].color_write_mask = ColorWriteMask::NONE;
    });

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&masked).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let masks: Vec<String> = calls(&device)
        .into_iter()
        .filter(|call| call.starts_with("color_mask"))
        .collect();
    assert_eq!(
        masks,
        vec![
            "color_mask false false false false",
            "color_mask true true true true",
            "color_mask false false false false",
        ]
    );
}

// ============================================================================
// DESCRIPTOR SETS
// ============================================================================

#[test]
fn test_dynamic_offsets_select_uniform_range() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let set_layout = device
        .create_descriptor_set_layout(&DescriptorSetLayoutInfo {
            bindings: vec![DescriptorSetLayoutBinding::new(
                0,
                DescriptorType::DynamicUniformBuffer,
                ShaderStageFlags::VERTEX,
            )],
        })
        .unwrap();
    let layout = device
        .create_pipeline_layout(&PipelineLayoutInfo { set_layouts: vec![set_layout.clone()] })
        .unwrap();
    let pipeline = fixture.pipeline(&device, |info| info.pipeline_layout = layout.clone());
    let uniforms = device.create_buffer(&BufferInfo::new(BufferUsage::UNIFORM, 1024, 256)).unwrap();
    let buffer_id = uniforms.native().unwrap().id();
    let set = device.create_descriptor_set(&DescriptorSetInfo { layout: set_layout }).unwrap();
    set.bind_buffer(0, &uniforms, 0).unwrap();
    set.update().unwrap();

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&pipeline).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.bind_descriptor_set(0, &set, &[512]).unwrap();
        cb.draw().unwrap();
        cb.bind_descriptor_set(0, &set, &[256]).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let range = |offset: u32| format!("bind_buffer_range {:#x} 0 {} {}+256", gl::UNIFORM_BUFFER, buffer_id, offset);
    assert_eq!(count(&device, &range(512)), 1);
    assert_eq!(count(&device, &range(256)), 1);
}

#[test]
fn test_texture_descriptor_binds_unit_and_sampler() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let set_layout = device
        .create_descriptor_set_layout(&DescriptorSetLayoutInfo {
            bindings: vec![DescriptorSetLayoutBinding::new(
                1,
                DescriptorType::SamplerTexture,
                ShaderStageFlags::FRAGMENT,
            )],
        })
        .unwrap();
    let layout = device
        .create_pipeline_layout(&PipelineLayoutInfo { set_layouts: vec![set_layout.clone()] })
        .unwrap();
    let pipeline = fixture.pipeline(&device, |info| info.pipeline_layout = layout.clone());
    let texture = device
        .create_texture(&TextureInfo::new_2d(Format::R8G8B8A8_UNORM, TextureUsage::SAMPLED, 4, 4))
        .unwrap();
    let sampler = device.create_sampler(&Default::default()).unwrap();
    let (texture_id, sampler_id) = (texture.native().unwrap().id(), sampler.native().unwrap().id());
    let set = device.create_descriptor_set(&DescriptorSetInfo { layout: set_layout }).unwrap();
    set.bind_texture(1, &texture, 0).unwrap();
    set.bind_sampler(1, &sampler, 0).unwrap();
    set.update().unwrap();
    clear_calls(&device);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&pipeline).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.bind_descriptor_set(0, &set, &[]).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let calls = calls(&device);
    assert!(calls.contains(&"active_texture 1".to_string()));
    assert!(calls.contains(&format!("bind_texture {:#x} {}", gl::TEXTURE_2D, texture_id)));
    assert!(calls.contains(&format!("bind_sampler 1 {}", sampler_id)));
}

#[test]
fn test_resized_texture_reaches_bound_descriptor() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let set_layout = device
        .create_descriptor_set_layout(&DescriptorSetLayoutInfo {
            bindings: vec![DescriptorSetLayoutBinding::new(
                1,
                DescriptorType::SamplerTexture,
                ShaderStageFlags::FRAGMENT,
            )],
        })
        .unwrap();
    let layout = device
        .create_pipeline_layout(&PipelineLayoutInfo { set_layouts: vec![set_layout.clone()] })
        .unwrap();
    let pipeline = fixture.pipeline(&device, |info| info.pipeline_layout = layout.clone());
    let texture = device
        .create_texture(&TextureInfo::new_2d(Format::R8G8B8A8_UNORM, TextureUsage::SAMPLED, 4, 4))
        .unwrap();
    let sampler = device.create_sampler(&Default::default()).unwrap();
    let set = device.create_descriptor_set(&DescriptorSetInfo { layout: set_layout }).unwrap();
    set.bind_texture(1, &texture, 0).unwrap();
    set.bind_sampler(1, &sampler, 0).unwrap();
    set.update().unwrap();

    let old_id = texture.native().unwrap().id();
    texture.resize(8, 8).unwrap();
    let new_id = texture.native().unwrap().id();
    assert_ne!(old_id, new_id);

    // Same texture object, nothing to restage
    set.bind_texture(1, &texture, 0).unwrap();
    assert!(!set.is_dirty());
    clear_calls(&device);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&pipeline).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.bind_descriptor_set(0, &set, &[]).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let calls = calls(&device);
    assert!(calls.contains(&format!("bind_texture {:#x} {}", gl::TEXTURE_2D, new_id)));
    assert!(!calls.contains(&format!("bind_texture {:#x} {}", gl::TEXTURE_2D, old_id)));
}

// ============================================================================
// DRAWS
// ============================================================================

fn indexed_fixture(device: &HeadlessDevice) -> (DrawFixture, Rc<InputAssembler<HeadlessBackend>>) {
    let fixture = DrawFixture::new(device, PrimitiveTopology::TriangleList);
    let indices = device.create_buffer(&BufferInfo::new(BufferUsage::INDEX, 12, 2)).unwrap();
    let input_assembler = device
        .create_input_assembler(&InputAssemblerInfo {
            index_buffer: Some(indices),
            ..InputAssemblerInfo::new(
                vec![VertexAttribute::new(0, Format::R32G32B32_SFLOAT, 0)],
                vec![fixture.vertex_buffer.clone()],
            )
        })
        .unwrap();
    (fixture, input_assembler)
}

#[test]
fn test_indexed_and_instanced_draws() {
    let device = headless_device();
    let (fixture, input_assembler) = indexed_fixture(&device);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&input_assembler).unwrap();
        cb.draw().unwrap();
        cb.draw_with_info(&DrawInfo { first_index: 3, ..DrawInfo::indexed(3).with_instances(4) })
            .unwrap();
        cb.end_render_pass().unwrap();
    });

    assert_eq!(
        count(&device, &format!("draw_elements {:#x} 6 {:#x} 0", gl::TRIANGLES, gl::UNSIGNED_SHORT)),
        1
    );
    assert_eq!(
        count(
            &device,
            &format!("draw_elements_instanced {:#x} 3 {:#x} 6 x4", gl::TRIANGLES, gl::UNSIGNED_SHORT)
        ),
        1
    );
}

#[test]
fn test_index_buffer_captured_in_vertex_array() {
    let device = headless_device();
    let (fixture, input_assembler) = indexed_fixture(&device);
    let index_buffer = input_assembler.index_buffer().unwrap().native().unwrap().id();
    clear_calls(&device);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&input_assembler).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let calls = calls(&device);
    let vao_at = calls.iter().position(|call| call.starts_with("bind_vertex_array")).unwrap();
    let bind = format!("bind_buffer {:#x} {}", gl::ELEMENT_ARRAY_BUFFER, index_buffer);
    let bind_at = calls.iter().position(|call| *call == bind).unwrap();
    assert!(vao_at < bind_at);
}

#[test]
fn test_indirect_draw_replays_every_record() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleStrip);
    let indirect = device
        .create_buffer(&BufferInfo::new(BufferUsage::INDIRECT, 28 * 2, 28))
        .unwrap();
    indirect
        .update_indirect(&[DrawInfo::vertices(3), DrawInfo::vertices(4).with_instances(2)])
        .unwrap();
    let input_assembler = device
        .create_input_assembler(&InputAssemblerInfo {
            indirect_buffer: Some(indirect),
            ..InputAssemblerInfo::new(
                vec![VertexAttribute::new(0, Format::R32G32B32_SFLOAT, 0)],
                vec![fixture.vertex_buffer.clone()],
            )
        })
        .unwrap();

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&input_assembler).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    assert_eq!(count(&device, &format!("draw_arrays {:#x} 0 3", gl::TRIANGLE_STRIP)), 1);
    assert_eq!(count(&device, &format!("draw_arrays_instanced {:#x} 0 4 x2", gl::TRIANGLE_STRIP)), 1);
}

#[test]
fn test_empty_draw_is_skipped() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.draw_with_info(&DrawInfo::vertices(0)).unwrap();
        cb.end_render_pass().unwrap();
    });

    assert_eq!(count(&device, "draw_"), 0);
}

// ============================================================================
// DYNAMIC STATES
// ============================================================================

#[test]
fn test_viewport_and_scissor_follow_the_command_buffer() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&fixture.pipeline_state).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.set_viewport(Viewport { x: 10.0, y: 20.0, width: 100.0, height: 50.0, min_depth: 0.0, max_depth: 0.5 })
            .unwrap();
        cb.set_scissor(Rect2D { x: 10, y: 20, width: 100, height: 50 }).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let calls = calls(&device);
    assert!(calls.contains(&"viewport 10 20 100 50".to_string()));
    assert!(calls.contains(&"depth_range 0 0.5".to_string()));
    assert!(calls.contains(&"scissor 10 20 100 50".to_string()));
}

#[test]
fn test_line_width_needs_dynamic_declaration() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::LineList);
    let dynamic = fixture.pipeline(&device, |info| {
        info.primitive = PrimitiveTopology::LineList;
        info.dynamic_states = DynamicStateFlags::LINE_WIDTH;
    });

    for pipeline in [&fixture.pipeline_state, &dynamic] {
        submit_frame(&device, |cb| {
            cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
                .unwrap();
            cb.bind_pipeline_state(pipeline).unwrap();
            cb.bind_input_assembler(&fixture.input_assembler).unwrap();
            cb.set_line_width(4.0).unwrap();
            cb.draw().unwrap();
            cb.end_render_pass().unwrap();
        });
    }

    assert_eq!(count(&device, "line_width 4"), 1);
}

#[test]
fn test_dynamic_stencil_compare_mask() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    let stencil = fixture.pipeline(&device, |info| {
        info.depth_stencil.stencil_test_enable = true;
        info.dynamic_states = DynamicStateFlags::STENCIL_COMPARE_MASK;
    });

    submit_frame(&device, |cb| {
        cb.begin_render_pass(&fixture.render_pass, &fixture.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&stencil).unwrap();
        cb.bind_input_assembler(&fixture.input_assembler).unwrap();
        cb.set_stencil_compare_mask(FaceSelect::Front, 3, 0x0f).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });

    let front = format!("stencil_func_separate {:#x} {:#x} 3 0xf", gl::FRONT, gl::ALWAYS);
    assert_eq!(count(&device, &front), 1);
    assert_eq!(count(&device, &format!("enable {:#x}", gl::STENCIL_TEST)), 1);
}

// ============================================================================
// TRANSFERS
// ============================================================================

#[test]
fn test_recorded_uploads_reach_the_driver() {
    let device = headless_device();
    let buffer = device.create_buffer(&BufferInfo::new(BufferUsage::VERTEX, 48, 12)).unwrap();
    let texture = device
        .create_texture(&TextureInfo::new_2d(Format::R8G8B8A8_UNORM, TextureUsage::SAMPLED, 2, 2))
        .unwrap();
    let region = BufferTextureCopy {
        tex_extent: Extent3D { width: 2, height: 2, depth: 1 },
        ..Default::default()
    };
    let pixels = [0u8; 16];
    clear_calls(&device);

    submit_frame(&device, |cb| {
        cb.update_buffer(&buffer, &[1u8; 12], 36).unwrap();
        cb.copy_buffers_to_texture(&[&pixels[..]], &texture, &[region]).unwrap();
    });

    assert_eq!(count(&device, &format!("buffer_sub_data {:#x} 12@36", gl::ARRAY_BUFFER)), 1);
    assert_eq!(count(&device, &format!("tex_sub_image_2d {:#x} 0 (0,0) 2x2 16", gl::TEXTURE_2D)), 1);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_validation_drains_driver_errors() {
    let info = DeviceInfo { validation: true, ..Default::default() };
    let device = headless_device_with(HeadlessDriver::new(), info);
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    device.backend_mut().driver_mut().pending_error = gl::INVALID_OPERATION;

    draw_frame(&device, &fixture);

    assert_eq!(device.backend().driver().pending_error, gl::NO_ERROR);
}

#[test]
fn test_errors_left_pending_without_validation() {
    let device = headless_device();
    let fixture = DrawFixture::new(&device, PrimitiveTopology::TriangleList);
    device.backend_mut().driver_mut().pending_error = gl::INVALID_OPERATION;

    draw_frame(&device, &fixture);

    assert_eq!(device.backend().driver().pending_error, gl::INVALID_OPERATION);
}
