/// Command buffer: records a backend-agnostic command stream
///
/// Recording follows `begin` -> commands -> `end`. State setters only edit the
/// current `StateSnapshot`; a single `BindStates` command carrying the whole
/// snapshot is emitted in front of the next draw (and at `end`) when anything
/// actually changed since the last one.
///
/// On a primary buffer, draws and dynamic states need an open render pass and
/// uploads need a closed one. Secondary buffers have no render pass of their
/// own and may record all of them, but cannot open or close a pass.
///
/// Rejected calls log, record nothing, and return `Err(InvalidOperation)`;
/// the buffer stays usable.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx::commands::{CommandAllocator, DrawCmd};
use crate::gfx::device::DeviceShared;
use crate::gfx::{
    Backend, Buffer, BufferTextureCopy, BufferUsage, Color, CommandPackage, CommandType, DepthBias,
    DepthBounds, DescriptorSet, Device, DrawInfo, FrameStats, Framebuffer, GfxObject, InputAssembler,
    Object, ObjectStatus, ObjectType, PipelineState, PrimitiveTopology, Rect2D, RenderPass, StateFlags,
    StateSnapshot, StencilFace, Texture, Viewport,
};
use crate::{gfx_error, gfx_warn};

const SOURCE: &str = "cobalt::CommandBuffer";

/// Command buffer level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandBufferType {
    /// Submitted to a queue, owns render passes
    #[default]
    Primary,
    /// Replayed inside a primary through `execute`
    Secondary,
}

/// Descriptor for creating a command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandBufferInfo {
    pub buffer_type: CommandBufferType,
}

/// Recording lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Initial,
    Recording,
    Recorded,
}

/// Command buffer resource
pub struct CommandBuffer<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    buffer_type: Cell<CommandBufferType>,
    state: Cell<RecordingState>,
    inside_render_pass: Cell<bool>,
    current_pass: RefCell<Option<(Rc<RenderPass<B>>, Rc<Framebuffer<B>>)>>,
    package: RefCell<CommandPackage<B>>,
    current: RefCell<StateSnapshot<B>>,
    /// Snapshot fields set at least once since `begin`
    touched: Cell<StateFlags>,
    state_invalid: Cell<bool>,
    stats: Cell<FrameStats>,
}

impl<B: Backend> CommandBuffer<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self::from_shared(device.shared.clone())
    }

    pub(crate) fn from_shared(device: Rc<DeviceShared<B>>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::CommandBuffer),
            device,
            buffer_type: Cell::new(CommandBufferType::Primary),
            state: Cell::new(RecordingState::Initial),
            inside_render_pass: Cell::new(false),
            current_pass: RefCell::new(None),
            package: RefCell::new(CommandPackage::new()),
            current: RefCell::new(StateSnapshot::default()),
            touched: Cell::new(StateFlags::empty()),
            state_invalid: Cell::new(false),
            stats: Cell::new(FrameStats::default()),
        }
    }

    pub fn initialize(&self, info: &CommandBufferInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        self.buffer_type.set(info.buffer_type);
        self.object.set_status(ObjectStatus::Success);
        true
    }

    /// Release every recorded command
    pub fn destroy(&self) {
        self.clear_cmds();
        self.current_pass.borrow_mut().take();
        *self.current.borrow_mut() = StateSnapshot::default();
        self.state.set(RecordingState::Initial);
        self.inside_render_pass.set(false);
        self.object.set_status(ObjectStatus::Unready);
    }

    // ===== LIFECYCLE =====

    /// Reset the package and start a new recording
    pub fn begin(&self) -> Result<()> {
        self.object.ensure_ready(SOURCE, "begin")?;
        if self.state.get() == RecordingState::Recording {
            gfx_warn!(SOURCE, "begin() while recording, previous commands are discarded");
        }
        self.clear_cmds();
        self.current_pass.borrow_mut().take();
        *self.current.borrow_mut() = StateSnapshot::default();
        self.touched.set(StateFlags::empty());
        self.state_invalid.set(false);
        self.stats.set(FrameStats::default());
        self.inside_render_pass.set(false);
        self.state.set(RecordingState::Recording);
        Ok(())
    }

    /// Finish the recording, flushing pending state
    pub fn end(&self) -> Result<()> {
        self.check_recording("end")?;
        if self.inside_render_pass.get() {
            gfx_warn!(SOURCE, "end() called inside a render pass");
        }
        self.flush_states();
        self.state.set(RecordingState::Recorded);
        Ok(())
    }

    // ===== RENDER PASSES =====

    pub fn begin_render_pass(
        &self,
        render_pass: &Rc<RenderPass<B>>,
        framebuffer: &Rc<Framebuffer<B>>,
        render_area: Rect2D,
        clear_colors: &[Color],
        clear_depth: f32,
        clear_stencil: u32,
    ) -> Result<()> {
        self.check_recording("begin_render_pass")?;
        if self.buffer_type.get() == CommandBufferType::Secondary {
            return Err(self.reject("begin_render_pass", "secondary buffers cannot begin a render pass"));
        }
        if self.inside_render_pass.get() {
            return Err(self.reject("begin_render_pass", "a render pass is already open"));
        }
        render_pass.object().ensure_ready(SOURCE, "begin_render_pass")?;
        framebuffer.object().ensure_ready(SOURCE, "begin_render_pass")?;
        if !framebuffer.render_pass().is_some_and(|built_for| built_for.is_compatible(render_pass)) {
            return Err(self.reject("begin_render_pass", "framebuffer was built for an incompatible render pass"));
        }

        self.push(CommandType::BeginRenderPass, |allocator, package| {
            let handle = allocator.begin_render_pass.alloc();
            if let Some(cmd) = allocator.begin_render_pass.get_mut(handle) {
                cmd.render_pass = Some(render_pass.clone());
                cmd.framebuffer = Some(framebuffer.clone());
                cmd.render_area = render_area;
                cmd.clear_colors.extend_from_slice(clear_colors);
                cmd.clear_depth = clear_depth;
                cmd.clear_stencil = clear_stencil;
            }
            package.begin_render_pass.push(handle);
        });

        // The backend applies the render area itself
        {
            let mut current = self.current.borrow_mut();
            current.viewport = Viewport::from_rect(render_area);
            current.scissor = render_area;
        }
        *self.current_pass.borrow_mut() = Some((render_pass.clone(), framebuffer.clone()));
        self.inside_render_pass.set(true);
        Ok(())
    }

    pub fn end_render_pass(&self) -> Result<()> {
        self.check_recording("end_render_pass")?;
        if self.buffer_type.get() == CommandBufferType::Secondary {
            return Err(self.reject("end_render_pass", "secondary buffers cannot end a render pass"));
        }
        if !self.inside_render_pass.get() {
            return Err(self.reject("end_render_pass", "no render pass is open"));
        }

        let pass = self.current_pass.borrow_mut().take();
        self.push(CommandType::EndRenderPass, |allocator, package| {
            let handle = allocator.end_render_pass.alloc();
            if let (Some(cmd), Some((render_pass, framebuffer))) = (allocator.end_render_pass.get_mut(handle), pass) {
                cmd.render_pass = Some(render_pass);
                cmd.framebuffer = Some(framebuffer);
            }
            package.end_render_pass.push(handle);
        });
        self.inside_render_pass.set(false);
        Ok(())
    }

    // ===== STATE BINDING =====

    pub fn bind_pipeline_state(&self, pipeline_state: &Rc<PipelineState<B>>) -> Result<()> {
        self.check_recording("bind_pipeline_state")?;
        pipeline_state.object().ensure_ready(SOURCE, "bind_pipeline_state")?;
        let open_pass = self.current_pass.borrow().as_ref().map(|(render_pass, _)| render_pass.clone());
        if open_pass.is_some_and(|render_pass| !pipeline_state.is_compatible_with(&render_pass)) {
            return Err(self.reject("bind_pipeline_state", "pipeline state was built for an incompatible render pass"));
        }
        let changed = {
            let mut current = self.current.borrow_mut();
            replace_rc(&mut current.pipeline_state, pipeline_state)
        };
        self.touch(StateFlags::PIPELINE_STATE, changed);
        Ok(())
    }

    pub fn bind_input_assembler(&self, input_assembler: &Rc<InputAssembler<B>>) -> Result<()> {
        self.check_recording("bind_input_assembler")?;
        input_assembler.object().ensure_ready(SOURCE, "bind_input_assembler")?;
        let changed = {
            let mut current = self.current.borrow_mut();
            replace_rc(&mut current.input_assembler, input_assembler)
        };
        self.touch(StateFlags::INPUT_ASSEMBLER, changed);
        Ok(())
    }

    /// Bind `descriptor_set` at `set` with one offset per dynamic buffer element
    pub fn bind_descriptor_set(
        &self,
        set: u32,
        descriptor_set: &Rc<DescriptorSet<B>>,
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        self.check_recording("bind_descriptor_set")?;
        descriptor_set.object().ensure_ready(SOURCE, "bind_descriptor_set")?;
        let expected = descriptor_set.layout().map_or(0, |layout| layout.dynamic_offset_count());
        if dynamic_offsets.len() != expected as usize {
            return Err(self.reject(
                "bind_descriptor_set",
                &format!("{} dynamic offsets given, layout expects {}", dynamic_offsets.len(), expected),
            ));
        }

        let changed = {
            let mut current = self.current.borrow_mut();
            let index = set as usize;
            if current.descriptor_sets.len() <= index {
                current.descriptor_sets.resize(index + 1, None);
                current.dynamic_offsets.resize(index + 1, Vec::new());
            }
            let set_changed = replace_rc(&mut current.descriptor_sets[index], descriptor_set);
            let offsets = &mut current.dynamic_offsets[index];
            let offsets_changed = offsets.as_slice() != dynamic_offsets;
            if offsets_changed {
                offsets.clear();
                offsets.extend_from_slice(dynamic_offsets);
            }
            set_changed || offsets_changed
        };
        self.touch(StateFlags::DESCRIPTOR_SETS, changed);
        Ok(())
    }

    // ===== DYNAMIC STATES =====

    pub fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.check_inside_pass("set_viewport")?;
        self.set_field(StateFlags::VIEWPORT, |state| update(&mut state.viewport, viewport))
    }

    pub fn set_scissor(&self, scissor: Rect2D) -> Result<()> {
        self.check_inside_pass("set_scissor")?;
        self.set_field(StateFlags::SCISSOR, |state| update(&mut state.scissor, scissor))
    }

    pub fn set_line_width(&self, line_width: f32) -> Result<()> {
        self.check_inside_pass("set_line_width")?;
        self.set_field(StateFlags::LINE_WIDTH, |state| update(&mut state.line_width, line_width))
    }

    pub fn set_depth_bias(&self, constant_factor: f32, clamp: f32, slope_factor: f32) -> Result<()> {
        self.check_inside_pass("set_depth_bias")?;
        let bias = DepthBias { constant_factor, clamp, slope_factor };
        self.set_field(StateFlags::DEPTH_BIAS, |state| update(&mut state.depth_bias, bias))
    }

    pub fn set_blend_constants(&self, constants: Color) -> Result<()> {
        self.check_inside_pass("set_blend_constants")?;
        self.set_field(StateFlags::BLEND_CONSTANTS, |state| update(&mut state.blend_constants, constants))
    }

    pub fn set_depth_bounds(&self, min: f32, max: f32) -> Result<()> {
        self.check_inside_pass("set_depth_bounds")?;
        let bounds = DepthBounds { min, max };
        self.set_field(StateFlags::DEPTH_BOUNDS, |state| update(&mut state.depth_bounds, bounds))
    }

    pub fn set_stencil_write_mask(&self, face: StencilFace, mask: u32) -> Result<()> {
        self.check_inside_pass("set_stencil_write_mask")?;
        self.set_field(StateFlags::STENCIL_WRITE_MASK, |state| {
            let mut masks = state.stencil_write_mask;
            if face.includes_front() {
                masks.front = mask;
            }
            if face.includes_back() {
                masks.back = mask;
            }
            update(&mut state.stencil_write_mask, masks)
        })
    }

    pub fn set_stencil_compare_mask(&self, face: StencilFace, reference: u32, mask: u32) -> Result<()> {
        self.check_inside_pass("set_stencil_compare_mask")?;
        self.set_field(StateFlags::STENCIL_COMPARE_MASK, |state| {
            let mut masks = state.stencil_compare_mask;
            if face.includes_front() {
                masks.front_reference = reference;
                masks.front_mask = mask;
            }
            if face.includes_back() {
                masks.back_reference = reference;
                masks.back_mask = mask;
            }
            update(&mut state.stencil_compare_mask, masks)
        })
    }

    // ===== DRAWS =====

    /// Draw the bound input assembler with its own draw parameters
    ///
    /// An input assembler with an indirect buffer issues one draw per record.
    pub fn draw(&self) -> Result<()> {
        self.check_inside_pass("draw")?;
        let (input_assembler, primitive) = self.draw_bindings("draw")?;
        let indirect = input_assembler.indirect_buffer();

        let mut stats = self.stats.get();
        match &indirect {
            Some(buffer) => {
                for info in buffer.draw_infos().iter() {
                    account_draw(&mut stats, primitive, info);
                }
            }
            None => account_draw(&mut stats, primitive, &input_assembler.draw_info()),
        }
        self.stats.set(stats);

        self.record_draw(DrawCmd {
            info: input_assembler.draw_info(),
            indirect: indirect.is_some(),
        });
        Ok(())
    }

    /// Draw the bound input assembler with explicit parameters
    pub fn draw_with_info(&self, info: &DrawInfo) -> Result<()> {
        self.check_inside_pass("draw_with_info")?;
        let (_, primitive) = self.draw_bindings("draw_with_info")?;

        let mut stats = self.stats.get();
        account_draw(&mut stats, primitive, info);
        self.stats.set(stats);

        self.record_draw(DrawCmd { info: *info, indirect: false });
        Ok(())
    }

    fn draw_bindings(&self, operation: &str) -> Result<(Rc<InputAssembler<B>>, PrimitiveTopology)> {
        let current = self.current.borrow();
        let (Some(pipeline_state), Some(input_assembler)) = (&current.pipeline_state, &current.input_assembler) else {
            return Err(self.reject(operation, "a pipeline state and an input assembler must be bound"));
        };
        // A pipeline bound before the pass began is checked here
        if let Some((render_pass, _)) = self.current_pass.borrow().as_ref() {
            if !pipeline_state.is_compatible_with(render_pass) {
                return Err(self.reject(operation, "pipeline state was built for an incompatible render pass"));
            }
        }
        Ok((input_assembler.clone(), pipeline_state.primitive()))
    }

    fn record_draw(&self, draw: DrawCmd) {
        self.flush_states();
        self.push(CommandType::Draw, |allocator, package| {
            let handle = allocator.draw.alloc();
            if let Some(cmd) = allocator.draw.get_mut(handle) {
                *cmd = draw;
            }
            package.draw.push(handle);
        });
    }

    // ===== UPLOADS =====

    /// Record a buffer update; the bytes are copied at record time
    ///
    /// Indirect buffers are CPU-side draw lists: their records are replaced
    /// immediately and nothing is recorded.
    pub fn update_buffer(&self, buffer: &Rc<Buffer<B>>, data: &[u8], offset: u32) -> Result<()> {
        self.check_outside_pass("update_buffer")?;
        buffer.object().ensure_ready(SOURCE, "update_buffer")?;
        buffer.check_range(data.len(), offset)?;

        if buffer.usage().contains(BufferUsage::INDIRECT) {
            return buffer.store_draw_infos(data, offset);
        }

        self.push(CommandType::UpdateBuffer, |allocator, package| {
            let handle = allocator.update_buffer.alloc();
            if let Some(cmd) = allocator.update_buffer.get_mut(handle) {
                cmd.buffer = Some(buffer.clone());
                cmd.data.extend_from_slice(data);
                cmd.offset = offset;
            }
            package.update_buffer.push(handle);
        });
        Ok(())
    }

    /// Record a texture upload of one source buffer per region
    pub fn copy_buffers_to_texture(
        &self,
        buffers: &[&[u8]],
        texture: &Rc<Texture<B>>,
        regions: &[BufferTextureCopy],
    ) -> Result<()> {
        self.check_outside_pass("copy_buffers_to_texture")?;
        texture.object().ensure_ready(SOURCE, "copy_buffers_to_texture")?;
        if buffers.len() < regions.len() {
            return Err(self.reject(
                "copy_buffers_to_texture",
                &format!("{} regions but only {} buffers", regions.len(), buffers.len()),
            ));
        }

        texture.write_backup(buffers, regions);
        self.push(CommandType::CopyBuffersToTexture, |allocator, package| {
            let handle = allocator.copy_buffers_to_texture.alloc();
            if let Some(cmd) = allocator.copy_buffers_to_texture.get_mut(handle) {
                cmd.buffers.extend(buffers.iter().take(regions.len()).map(|data| data.to_vec()));
                cmd.texture = Some(texture.clone());
                cmd.regions.extend_from_slice(regions);
            }
            package.copy_buffers_to_texture.push(handle);
        });
        Ok(())
    }

    // ===== SECONDARY BUFFERS =====

    /// Append the recorded packages of `secondaries`, sharing their commands
    pub fn execute(&self, secondaries: &[Rc<CommandBuffer<B>>]) -> Result<()> {
        self.check_recording("execute")?;
        self.flush_states();

        for secondary in secondaries {
            if std::ptr::eq(self, Rc::as_ptr(secondary)) {
                return Err(self.reject("execute", "a command buffer cannot execute itself"));
            }
            if secondary.buffer_type() != CommandBufferType::Secondary {
                return Err(self.reject("execute", "only secondary buffers can be executed"));
            }
            if secondary.state() != RecordingState::Recorded {
                return Err(self.reject("execute", "secondary buffer has not finished recording"));
            }

            {
                let source = secondary.package.borrow();
                let mut allocator = self.device.allocator.borrow_mut();
                allocator.retain_package(&source);
                self.package.borrow_mut().append(&source);
            }

            let touched = secondary.touched.get();
            self.current.borrow_mut().copy_fields(&secondary.current.borrow(), touched);
            self.touched.set(self.touched.get() | touched);

            let mut stats = self.stats.get();
            stats.accumulate(&secondary.stats.get());
            self.stats.set(stats);
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn buffer_type(&self) -> CommandBufferType {
        self.buffer_type.get()
    }

    pub fn state(&self) -> RecordingState {
        self.state.get()
    }

    pub fn is_recording(&self) -> bool {
        self.state.get() == RecordingState::Recording
    }

    pub fn inside_render_pass(&self) -> bool {
        self.inside_render_pass.get()
    }

    /// Recorded commands
    pub fn package(&self) -> Ref<'_, CommandPackage<B>> {
        self.package.borrow()
    }

    /// Current (not necessarily flushed) bound state
    pub fn current_state(&self) -> Ref<'_, StateSnapshot<B>> {
        self.current.borrow()
    }

    /// True when the current state differs from the last emitted bind
    pub fn is_state_invalid(&self) -> bool {
        self.state_invalid.get()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats.get()
    }

    pub fn num_draw_calls(&self) -> u64 {
        self.stats.get().draw_calls
    }

    pub fn num_instances(&self) -> u64 {
        self.stats.get().instances
    }

    pub fn num_triangles(&self) -> u64 {
        self.stats.get().triangles
    }

    // ===== INTERNALS =====

    fn push(
        &self,
        cmd_type: CommandType,
        record: impl FnOnce(&mut CommandAllocator<B>, &mut CommandPackage<B>),
    ) {
        let mut allocator = self.device.allocator.borrow_mut();
        let mut package = self.package.borrow_mut();
        record(&mut allocator, &mut package);
        package.cmd_types.push(cmd_type);
    }

    /// Emit one BindStates with the whole snapshot if anything changed
    fn flush_states(&self) {
        if !self.state_invalid.get() {
            return;
        }
        let touched = self.touched.get();
        let current = self.current.borrow();
        self.push(CommandType::BindStates, |allocator, package| {
            let handle = allocator.bind_states.alloc();
            if let Some(cmd) = allocator.bind_states.get_mut(handle) {
                cmd.state.clone_from(&current);
                cmd.touched = touched;
            }
            package.bind_states.push(handle);
        });
        self.state_invalid.set(false);
    }

    fn set_field(&self, field: StateFlags, edit: impl FnOnce(&mut StateSnapshot<B>) -> bool) -> Result<()> {
        let changed = edit(&mut self.current.borrow_mut());
        self.touch(field, changed);
        Ok(())
    }

    fn touch(&self, field: StateFlags, changed: bool) {
        if changed {
            self.touched.set(self.touched.get() | field);
            self.state_invalid.set(true);
        }
    }

    fn clear_cmds(&self) {
        match self.device.allocator.try_borrow_mut() {
            Ok(mut allocator) => allocator.release_package(&mut self.package.borrow_mut()),
            Err(_) => gfx_error!(SOURCE, "Command allocator is busy, recorded commands leaked"),
        }
    }

    fn check_recording(&self, operation: &str) -> Result<()> {
        self.object.ensure_ready(SOURCE, operation)?;
        if self.state.get() != RecordingState::Recording {
            return Err(self.reject(operation, "command buffer is not recording"));
        }
        Ok(())
    }

    /// Draws and dynamic states need an open pass on primary buffers
    fn check_inside_pass(&self, operation: &str) -> Result<()> {
        self.check_recording(operation)?;
        if self.buffer_type.get() == CommandBufferType::Primary && !self.inside_render_pass.get() {
            return Err(self.reject(operation, "not inside a render pass"));
        }
        Ok(())
    }

    /// Uploads need a closed pass on primary buffers
    fn check_outside_pass(&self, operation: &str) -> Result<()> {
        self.check_recording(operation)?;
        if self.buffer_type.get() == CommandBufferType::Primary && self.inside_render_pass.get() {
            return Err(self.reject(operation, "not allowed inside a render pass"));
        }
        Ok(())
    }

    fn reject(&self, operation: &str, reason: &str) -> Error {
        gfx_error!(SOURCE, "{} rejected: {}", operation, reason);
        Error::InvalidOperation(format!("{operation}: {reason}"))
    }
}

impl<B: Backend> Object for CommandBuffer<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for CommandBuffer<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Store `value` and report whether it differed
fn update<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Point `slot` at `value` and report whether it pointed elsewhere
fn replace_rc<T>(slot: &mut Option<Rc<T>>, value: &Rc<T>) -> bool {
    if slot.as_ref().is_some_and(|bound| Rc::ptr_eq(bound, value)) {
        return false;
    }
    *slot = Some(value.clone());
    true
}

fn account_draw(stats: &mut FrameStats, primitive: PrimitiveTopology, info: &DrawInfo) {
    let count = if info.index_count > 0 { info.index_count } else { info.vertex_count };
    let triangles = u64::from(primitive.triangle_count(count)) * u64::from(info.instance_count.max(1));
    stats.accumulate(&FrameStats {
        draw_calls: 1,
        instances: u64::from(info.instance_count),
        triangles,
    });
}

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;
