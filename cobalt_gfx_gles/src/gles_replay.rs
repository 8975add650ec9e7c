/// Replay of recorded command packages into GL calls
///
/// Every state change goes through the `GlStateCache`, so re-applying the
/// cumulative state of a bind-states command only reaches the driver for the
/// values that actually differ.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use cobalt_gfx::cobalt::gfx::{
    BeginRenderPassCmd, BindStatesCmd, Color, Command, CommandAllocator, CommandPackage,
    CopyBuffersToTextureCmd, DrawCmd, DrawInfo, DynamicStateFlags, EndRenderPassCmd, Features,
    InputAssembler, LoadOp, PipelineState, StateFlags, StateSnapshot, StencilWriteMask, StoreOp,
    UpdateBufferCmd,
};
use cobalt_gfx::cobalt::Result;
use cobalt_gfx::{gfx_error, gfx_warn};

use crate::gl::{self, GLenum};
use crate::gles_backend::GlesBackend;
use crate::gles_driver::GlDriver;
use crate::gles_objects::{
    GlesAttribute, GlesDescriptor, GlesFramebuffer, GlesInputAssembler, GlesPipelineState,
};
use crate::gles_state_cache::{GlCaps, StencilFace};

const SOURCE: &str = "cobalt::gles::Replay";

/// Bound objects while a package is replayed
struct ReplayState<'a, D: GlDriver + 'static> {
    pipeline: Option<&'a PipelineState<GlesBackend<D>>>,
    input_assembler: Option<&'a InputAssembler<GlesBackend<D>>>,
    stencil_write_mask: StencilWriteMask,
}

impl<D: GlDriver + 'static> ReplayState<'_, D> {
    fn new() -> Self {
        Self {
            pipeline: None,
            input_assembler: None,
            stencil_write_mask: StencilWriteMask::default(),
        }
    }
}

impl<D: GlDriver + 'static> GlesBackend<D> {
    pub(crate) fn replay(&mut self, package: &CommandPackage<Self>, allocator: &CommandAllocator<Self>) -> Result<()> {
        let mut state = ReplayState::new();
        for command in package.iter(allocator) {
            let cmd_type = command.cmd_type();
            match command {
                Command::BeginRenderPass(cmd) => self.begin_render_pass(cmd, &state),
                Command::EndRenderPass(cmd) => self.end_render_pass(cmd),
                Command::BindStates(cmd) => self.bind_states(cmd, &mut state),
                Command::Draw(cmd) => self.draw(cmd, &state),
                Command::UpdateBuffer(cmd) => self.replay_update_buffer(cmd),
                Command::CopyBuffersToTexture(cmd) => self.replay_copy_buffers_to_texture(cmd),
            }
            self.check_error(cmd_type);
        }
        Ok(())
    }

    // ===== RENDER PASSES =====

    fn begin_render_pass(&mut self, cmd: &BeginRenderPassCmd<Self>, state: &ReplayState<'_, D>) {
        let (Some(render_pass), Some(framebuffer)) = (cmd.render_pass.as_deref(), cmd.framebuffer.as_deref()) else {
            gfx_error!(SOURCE, "Render pass begun without a render pass or framebuffer");
            return;
        };
        let (Some(pass), Some(framebuffer)) = (render_pass.native(), framebuffer.native()) else {
            gfx_error!(SOURCE, "Render pass or framebuffer has no native object");
            return;
        };

        let area = cmd.render_area;
        self.cache.bind_framebuffer(&mut self.driver, framebuffer.name());
        self.cache.viewport(&mut self.driver, area.x, area.y, area.width as i32, area.height as i32);
        self.cache.scissor(&mut self.driver, area);

        let depth_stencil = pass.depth_stencil;
        let discard_colors: Vec<bool> = pass.colors.iter().map(|(load, _)| *load == LoadOp::DontCare).collect();
        let discard_depth = depth_stencil.is_some_and(|ds| ds.has_depth && ds.depth_load == LoadOp::DontCare);
        let discard_stencil = depth_stencil.is_some_and(|ds| ds.has_stencil && ds.stencil_load == LoadOp::DontCare);
        self.invalidate_attachments(&framebuffer, &discard_colors, discard_depth, discard_stencil);

        let clear_color = pass.colors.iter().any(|(load, _)| *load == LoadOp::Clear);
        let clear_depth = depth_stencil.is_some_and(|ds| ds.has_depth && ds.depth_load == LoadOp::Clear);
        let clear_stencil = depth_stencil.is_some_and(|ds| ds.has_stencil && ds.stencil_load == LoadOp::Clear);
        if !(clear_color || clear_depth || clear_stencil) {
            return;
        }

        // Clears honor the write masks
        if clear_color {
            self.cache.color_mask(&mut self.driver, [true; 4]);
        }
        if clear_depth {
            self.cache.depth_mask(&mut self.driver, true);
        }
        if clear_stencil {
            self.cache.stencil_write_mask(&mut self.driver, StencilFace::Front, u32::MAX);
            self.cache.stencil_write_mask(&mut self.driver, StencilFace::Back, u32::MAX);
        }

        for (index, (load, _)) in pass.colors.iter().enumerate() {
            if *load == LoadOp::Clear {
                let color = cmd.clear_colors.get(index).copied().unwrap_or(Color::ZERO);
                self.driver.clear_buffer_f32(gl::COLOR, index as u32, &color.to_array());
            }
        }
        match (clear_depth, clear_stencil) {
            (true, true) => self.driver.clear_buffer_depth_stencil(cmd.clear_depth, cmd.clear_stencil as i32),
            (true, false) => self.driver.clear_buffer_f32(gl::DEPTH, 0, &[cmd.clear_depth]),
            (false, true) => self.driver.clear_buffer_i32(gl::STENCIL, 0, &[cmd.clear_stencil as i32]),
            (false, false) => {}
        }

        if let Some(pipeline) = state.pipeline.and_then(|pipeline| pipeline.native()) {
            self.restore_write_masks(&pipeline, state.stencil_write_mask);
        }
    }

    fn end_render_pass(&mut self, cmd: &EndRenderPassCmd<Self>) {
        let (Some(render_pass), Some(framebuffer)) = (cmd.render_pass.as_deref(), cmd.framebuffer.as_deref()) else {
            return;
        };
        let (Some(pass), Some(framebuffer)) = (render_pass.native(), framebuffer.native()) else {
            return;
        };

        let depth_stencil = pass.depth_stencil;
        let discard_colors: Vec<bool> = pass.colors.iter().map(|(_, store)| *store == StoreOp::DontCare).collect();
        let discard_depth = depth_stencil.is_some_and(|ds| ds.has_depth && ds.depth_store == StoreOp::DontCare);
        let discard_stencil = depth_stencil.is_some_and(|ds| ds.has_stencil && ds.stencil_store == StoreOp::DontCare);
        self.invalidate_attachments(&framebuffer, &discard_colors, discard_depth, discard_stencil);
    }

    fn invalidate_attachments(&mut self, framebuffer: &GlesFramebuffer, colors: &[bool], depth: bool, stencil: bool) {
        if !self.features.contains(Features::INVALIDATE_FRAMEBUFFER) {
            return;
        }

        let surface = framebuffer.fbo.is_none();
        let color_count = if surface { 1 } else { framebuffer.color_count as usize };
        let mut attachments: Vec<GLenum> = colors
            .iter()
            .take(color_count)
            .enumerate()
            .filter(|(_, discard)| **discard)
            .map(|(index, _)| if surface { gl::COLOR } else { gl::COLOR_ATTACHMENT0 + index as u32 })
            .collect();
        if depth {
            attachments.push(if surface { gl::DEPTH } else { gl::DEPTH_ATTACHMENT });
        }
        if stencil {
            attachments.push(if surface { gl::STENCIL } else { gl::STENCIL_ATTACHMENT });
        }
        if attachments.is_empty() {
            return;
        }

        self.cache.bind_framebuffer(&mut self.driver, framebuffer.name());
        self.driver.invalidate_framebuffer(gl::FRAMEBUFFER, &attachments);
    }

    fn restore_write_masks(&mut self, pipeline: &GlesPipelineState, dynamic_mask: StencilWriteMask) {
        self.cache.color_mask(&mut self.driver, pipeline.blend.color_mask);
        self.cache.depth_mask(&mut self.driver, pipeline.depth_stencil.depth_write);
        let (front, back) = if pipeline.dynamic_states.contains(DynamicStateFlags::STENCIL_WRITE_MASK) {
            (dynamic_mask.front, dynamic_mask.back)
        } else {
            (pipeline.depth_stencil.front.write_mask, pipeline.depth_stencil.back.write_mask)
        };
        self.cache.stencil_write_mask(&mut self.driver, StencilFace::Front, front);
        self.cache.stencil_write_mask(&mut self.driver, StencilFace::Back, back);
    }

    // ===== STATE BINDING =====

    fn bind_states<'a>(&mut self, cmd: &'a BindStatesCmd<Self>, state: &mut ReplayState<'a, D>) {
        let touched = cmd.touched;
        let snapshot = &cmd.state;

        if touched.contains(StateFlags::PIPELINE_STATE) {
            state.pipeline = snapshot.pipeline_state.as_deref();
            match state.pipeline.map(|pipeline| pipeline.native()) {
                Some(Some(native)) => self.apply_pipeline(&native, snapshot),
                Some(None) => gfx_error!(SOURCE, "Bound pipeline state has no native object"),
                None => {}
            }
        }
        if touched.contains(StateFlags::INPUT_ASSEMBLER) {
            state.input_assembler = snapshot.input_assembler.as_deref();
        }
        if touched.contains(StateFlags::DESCRIPTOR_SETS) {
            self.apply_descriptor_sets(snapshot);
        }
        if touched.intersects(StateFlags::PIPELINE_STATE | StateFlags::INPUT_ASSEMBLER) {
            if let (Some(pipeline), Some(input_assembler)) = (state.pipeline, state.input_assembler) {
                self.apply_input_assembler(pipeline, input_assembler);
            }
        }
        if touched.contains(StateFlags::STENCIL_WRITE_MASK) {
            state.stencil_write_mask = snapshot.stencil_write_mask;
        }
        self.apply_dynamic_states(snapshot, touched, state.pipeline);
    }

    fn apply_pipeline(&mut self, pipeline: &GlesPipelineState, snapshot: &StateSnapshot<Self>) {
        let Self { driver, cache, .. } = self;
        let dynamic = pipeline.dynamic_states;

        cache.use_program(driver, pipeline.program);

        let raster = &pipeline.raster;
        match raster.cull_face {
            Some(face) => {
                cache.set_enabled(driver, GlCaps::CULL_FACE, true);
                cache.cull_face(driver, face);
            }
            None => cache.set_enabled(driver, GlCaps::CULL_FACE, false),
        }
        cache.front_face(driver, raster.front_face);
        if !dynamic.contains(DynamicStateFlags::LINE_WIDTH) {
            cache.line_width(driver, raster.line_width);
        }
        cache.set_enabled(driver, GlCaps::POLYGON_OFFSET_FILL, raster.polygon_offset.is_some());
        if !dynamic.contains(DynamicStateFlags::DEPTH_BIAS) {
            if let Some((factor, units)) = raster.polygon_offset {
                cache.polygon_offset(driver, factor, units);
            }
        }

        let depth_stencil = &pipeline.depth_stencil;
        cache.set_enabled(driver, GlCaps::DEPTH_TEST, depth_stencil.depth_test);
        cache.depth_mask(driver, depth_stencil.depth_write);
        cache.depth_func(driver, depth_stencil.depth_func);

        cache.set_enabled(driver, GlCaps::STENCIL_TEST, depth_stencil.stencil_test);
        let compare = snapshot.stencil_compare_mask;
        let faces = [
            (StencilFace::Front, &depth_stencil.front, compare.front_reference, compare.front_mask),
            (StencilFace::Back, &depth_stencil.back, compare.back_reference, compare.back_mask),
        ];
        for (face, stencil, dynamic_reference, dynamic_mask) in faces {
            if dynamic.contains(DynamicStateFlags::STENCIL_COMPARE_MASK) {
                cache.stencil_func(driver, face, stencil.func, dynamic_reference as i32, dynamic_mask);
            } else {
                cache.stencil_func(driver, face, stencil.func, stencil.reference, stencil.compare_mask);
            }
            cache.stencil_op(driver, face, stencil.fail, stencil.depth_fail, stencil.pass);
            if !dynamic.contains(DynamicStateFlags::STENCIL_WRITE_MASK) {
                cache.stencil_write_mask(driver, face, stencil.write_mask);
            }
        }

        let blend = &pipeline.blend;
        cache.set_enabled(driver, GlCaps::SAMPLE_ALPHA_TO_COVERAGE, blend.alpha_to_coverage);
        cache.set_enabled(driver, GlCaps::BLEND, blend.enabled);
        cache.blend_equation(driver, blend.equation.0, blend.equation.1);
        cache.blend_func(driver, blend.func.0, blend.func.1, blend.func.2, blend.func.3);
        if !dynamic.contains(DynamicStateFlags::BLEND_CONSTANTS) {
            cache.blend_color(driver, blend.color);
        }
        cache.color_mask(driver, blend.color_mask);
    }

    fn apply_descriptor_sets(&mut self, snapshot: &StateSnapshot<Self>) {
        let Self { driver, cache, binding_mapping, .. } = self;

        for (index, bound) in snapshot.descriptor_sets.iter().enumerate() {
            let Some(set) = bound else {
                continue;
            };
            let Some(native) = set.native() else {
                gfx_error!(SOURCE, "Descriptor set {} has no native object", index);
                continue;
            };
            let set_index = index as u32;
            let offsets = snapshot.dynamic_offsets(index);

            for descriptor in &native.descriptors {
                match descriptor {
                    GlesDescriptor::Empty => {}
                    &GlesDescriptor::UniformBuffer { binding, element, buffer, size, stride, dynamic_index } => {
                        let offset = dynamic_index
                            .and_then(|dynamic| offsets.get(dynamic as usize).copied())
                            .unwrap_or(0);
                        let range = if stride > 0 { stride } else { size.saturating_sub(offset) };
                        let slot = binding_mapping.buffer_slot(set_index, binding) + element;
                        cache.bind_uniform_range(driver, slot, buffer, offset, range);
                    }
                    GlesDescriptor::Texture { binding, element, target, texture, sampler } => {
                        let unit = binding_mapping.sampler_slot(set_index, *binding) + *element;
                        cache.bind_texture(driver, unit, *target, texture.get());
                        cache.bind_sampler(driver, unit, *sampler);
                    }
                    &GlesDescriptor::Sampler { binding, element, sampler } => {
                        let unit = binding_mapping.sampler_slot(set_index, binding) + element;
                        cache.bind_sampler(driver, unit, sampler);
                    }
                }
            }
        }
    }

    fn apply_input_assembler(&mut self, pipeline: &PipelineState<Self>, input_assembler: &InputAssembler<Self>) {
        let (Some(pipeline), Some(mut native)) = (pipeline.native(), input_assembler.native_mut()) else {
            gfx_error!(SOURCE, "Pipeline state or input assembler has no native object");
            return;
        };

        if self.features.contains(Features::VERTEX_ARRAY_OBJECT) {
            let key = layout_key(&pipeline, &native.attributes);
            let existing = native.vaos.get(&key).copied();
            let vao = match existing {
                Some(vao) => vao,
                None => match self.build_vertex_array(&pipeline, &native) {
                    Some(vao) => {
                        native.vaos.insert(key, vao);
                        vao
                    }
                    None => return,
                },
            };
            self.cache.bind_vertex_array(&mut self.driver, vao);
        } else {
            self.bind_attributes(&pipeline, &native);
        }
    }

    /// Record the attribute layout of `input_assembler` into a new VAO
    fn build_vertex_array(&mut self, pipeline: &GlesPipelineState, input_assembler: &GlesInputAssembler) -> Option<u32> {
        let vao = match self.driver.create_vertex_array() {
            Ok(vao) => vao,
            Err(err) => {
                gfx_error!(SOURCE, "Failed to create vertex array: {}", err);
                return None;
            }
        };
        self.cache.bind_vertex_array(&mut self.driver, vao);

        for attribute in &input_assembler.attributes {
            let location = pipeline.attribute_location(attribute.location);
            self.cache.bind_buffer(&mut self.driver, gl::ARRAY_BUFFER, attribute.buffer);
            self.driver.enable_vertex_attrib_array(location);
            attribute_pointer(&mut self.driver, location, attribute);
            if attribute.divisor != 0 {
                self.driver.vertex_attrib_divisor(location, attribute.divisor);
            }
        }
        if input_assembler.index_buffer != 0 {
            self.cache.bind_buffer(&mut self.driver, gl::ELEMENT_ARRAY_BUFFER, input_assembler.index_buffer);
        }
        Some(vao)
    }

    /// Attribute setup without vertex array objects
    fn bind_attributes(&mut self, pipeline: &GlesPipelineState, input_assembler: &GlesInputAssembler) {
        let Self { driver, cache, .. } = self;
        let mut wanted = 0u64;

        for attribute in &input_assembler.attributes {
            let location = pipeline.attribute_location(attribute.location);
            if location >= u64::BITS {
                gfx_warn!(SOURCE, "Attribute location {} out of range, skipped", location);
                continue;
            }
            cache.bind_buffer(driver, gl::ARRAY_BUFFER, attribute.buffer);
            attribute_pointer(driver, location, attribute);
            cache.attribute_divisor(driver, location, attribute.divisor);
            wanted |= 1 << location;
        }

        let enabled = cache.enabled_attributes();
        for location in 0..u64::BITS {
            let bit = 1u64 << location;
            if (wanted | enabled) & bit != 0 {
                cache.set_attribute_enabled(driver, location, wanted & bit != 0);
            }
        }

        if input_assembler.index_buffer != 0 {
            cache.bind_buffer(driver, gl::ELEMENT_ARRAY_BUFFER, input_assembler.index_buffer);
        }
    }

    fn apply_dynamic_states(
        &mut self,
        snapshot: &StateSnapshot<Self>,
        touched: StateFlags,
        pipeline: Option<&PipelineState<Self>>,
    ) {
        let Self { driver, cache, .. } = self;
        // Without a pipeline every dynamic value applies
        let dynamic = pipeline.map_or(DynamicStateFlags::all(), |pipeline| pipeline.dynamic_states());

        if touched.contains(StateFlags::VIEWPORT) {
            let viewport = snapshot.viewport;
            cache.viewport(
                driver,
                viewport.x as i32,
                viewport.y as i32,
                viewport.width as i32,
                viewport.height as i32,
            );
            cache.depth_range(driver, viewport.min_depth, viewport.max_depth);
        }
        if touched.contains(StateFlags::SCISSOR) {
            cache.scissor(driver, snapshot.scissor);
        }
        if touched.contains(StateFlags::LINE_WIDTH) && dynamic.contains(DynamicStateFlags::LINE_WIDTH) {
            cache.line_width(driver, snapshot.line_width);
        }
        if touched.contains(StateFlags::DEPTH_BIAS) && dynamic.contains(DynamicStateFlags::DEPTH_BIAS) {
            let bias = snapshot.depth_bias;
            cache.polygon_offset(driver, bias.slope_factor, bias.constant_factor);
        }
        if touched.contains(StateFlags::BLEND_CONSTANTS) && dynamic.contains(DynamicStateFlags::BLEND_CONSTANTS) {
            cache.blend_color(driver, snapshot.blend_constants.to_array());
        }
        if touched.contains(StateFlags::STENCIL_WRITE_MASK) && dynamic.contains(DynamicStateFlags::STENCIL_WRITE_MASK) {
            let mask = snapshot.stencil_write_mask;
            cache.stencil_write_mask(driver, StencilFace::Front, mask.front);
            cache.stencil_write_mask(driver, StencilFace::Back, mask.back);
        }
        if touched.contains(StateFlags::STENCIL_COMPARE_MASK)
            && dynamic.contains(DynamicStateFlags::STENCIL_COMPARE_MASK)
        {
            let compare = snapshot.stencil_compare_mask;
            cache.stencil_compare(driver, StencilFace::Front, compare.front_reference as i32, compare.front_mask);
            cache.stencil_compare(driver, StencilFace::Back, compare.back_reference as i32, compare.back_mask);
        }
    }

    // ===== DRAWS =====

    fn draw(&mut self, cmd: &DrawCmd, state: &ReplayState<'_, D>) {
        let (Some(pipeline), Some(input_assembler)) = (state.pipeline, state.input_assembler) else {
            gfx_error!(SOURCE, "Draw without a bound pipeline state and input assembler");
            return;
        };
        let (Some(pipeline_native), Some(native)) = (pipeline.native(), input_assembler.native()) else {
            gfx_error!(SOURCE, "Draw with a pipeline state or input assembler lacking a native object");
            return;
        };
        let mode = pipeline_native.mode;

        if !cmd.indirect {
            self.draw_one(mode, &native, &cmd.info);
            return;
        }
        let Some(buffer) = input_assembler.indirect_buffer() else {
            gfx_error!(SOURCE, "Indirect draw without an indirect buffer");
            return;
        };
        let draws = buffer.draw_infos();
        for info in draws.iter() {
            self.draw_one(mode, &native, info);
        }
    }

    fn draw_one(&mut self, mode: GLenum, input_assembler: &GlesInputAssembler, info: &DrawInfo) {
        if info.vertex_offset != 0 || info.first_instance != 0 {
            gfx_warn!(SOURCE, "Base vertex and base instance need GLES 3.2, ignored");
        }
        let instanced = info.instance_count > 1;

        match input_assembler.index_type {
            Some(index_type) if info.index_count > 0 => {
                let offset = info.first_index * input_assembler.index_size;
                if instanced {
                    self.driver
                        .draw_elements_instanced(mode, info.index_count, index_type, offset, info.instance_count);
                } else {
                    self.driver.draw_elements(mode, info.index_count, index_type, offset);
                }
            }
            _ if info.vertex_count > 0 => {
                if instanced {
                    self.driver
                        .draw_arrays_instanced(mode, info.first_vertex, info.vertex_count, info.instance_count);
                } else {
                    self.driver.draw_arrays(mode, info.first_vertex, info.vertex_count);
                }
            }
            _ => {}
        }
    }

    // ===== TRANSFERS =====

    fn replay_update_buffer(&mut self, cmd: &UpdateBufferCmd<Self>) {
        let Some(buffer) = &cmd.buffer else {
            return;
        };
        match buffer.native() {
            Some(native) => self.upload_buffer(&native, &cmd.data, cmd.offset),
            None => gfx_error!(SOURCE, "Buffer update on a buffer without native object"),
        }
    }

    fn replay_copy_buffers_to_texture(&mut self, cmd: &CopyBuffersToTextureCmd<Self>) {
        let Some(texture) = &cmd.texture else {
            return;
        };
        let Some(native) = texture.native() else {
            gfx_error!(SOURCE, "Texture copy into a texture without native object");
            return;
        };
        let buffers: Vec<&[u8]> = cmd.buffers.iter().map(Vec::as_slice).collect();
        self.upload_texture(&native, &buffers, &cmd.regions);
    }
}

/// Key of the VAO built for `attributes` under the locations of `pipeline`
fn layout_key(pipeline: &GlesPipelineState, attributes: &[GlesAttribute]) -> u64 {
    let mut hasher = FxHasher::default();
    for attribute in attributes {
        pipeline.attribute_location(attribute.location).hash(&mut hasher);
    }
    hasher.finish()
}

fn attribute_pointer(driver: &mut dyn GlDriver, location: u32, attribute: &GlesAttribute) {
    let format = attribute.format;
    if format.integer {
        driver.vertex_attrib_pointer_i32(location, format.size, format.ty, attribute.stride, attribute.offset);
    } else {
        driver.vertex_attrib_pointer_f32(
            location,
            format.size,
            format.ty,
            format.normalized,
            attribute.stride,
            attribute.offset,
        );
    }
}

#[cfg(test)]
#[path = "gles_replay_tests.rs"]
mod tests;
