/// Recorded command records, the state snapshot and the command package
///
/// A `CommandPackage` is the output of one recording: the ordered list of
/// command types plus, per type, the handles of the pooled records. Backends
/// walk it with `CommandPackage::iter`, which resolves every handle against
/// the device's `CommandAllocator`.

use std::rc::Rc;

use crate::gfx::command_pool::{CmdHandle, CommandPool, Recycle};
use crate::gfx::{
    Backend, Buffer, BufferTextureCopy, Color, DepthBias, DepthBounds, DescriptorSet, DrawInfo,
    Framebuffer, InputAssembler, PipelineState, Rect2D, RenderPass, StateFlags, StencilCompareMask,
    StencilWriteMask, Texture, Viewport,
};
use crate::gfx_error;

const SOURCE: &str = "cobalt::CommandPackage";

// ===== STATE SNAPSHOT =====

/// Bound state at the point of a draw
pub struct StateSnapshot<B: Backend> {
    pub pipeline_state: Option<Rc<PipelineState<B>>>,
    pub input_assembler: Option<Rc<InputAssembler<B>>>,
    /// Indexed by set number
    pub descriptor_sets: Vec<Option<Rc<DescriptorSet<B>>>>,
    /// Dynamic offsets of each bound set, parallel to `descriptor_sets`
    pub dynamic_offsets: Vec<Vec<u32>>,
    pub viewport: Viewport,
    pub scissor: Rect2D,
    pub line_width: f32,
    pub depth_bias: DepthBias,
    pub blend_constants: Color,
    pub depth_bounds: DepthBounds,
    pub stencil_write_mask: StencilWriteMask,
    pub stencil_compare_mask: StencilCompareMask,
}

impl<B: Backend> Default for StateSnapshot<B> {
    fn default() -> Self {
        Self {
            pipeline_state: None,
            input_assembler: None,
            descriptor_sets: Vec::new(),
            dynamic_offsets: Vec::new(),
            viewport: Viewport::default(),
            scissor: Rect2D::default(),
            line_width: 1.0,
            depth_bias: DepthBias::default(),
            blend_constants: Color::ZERO,
            depth_bounds: DepthBounds::default(),
            stencil_write_mask: StencilWriteMask::default(),
            stencil_compare_mask: StencilCompareMask::default(),
        }
    }
}

impl<B: Backend> Clone for StateSnapshot<B> {
    fn clone(&self) -> Self {
        let mut snapshot = Self::default();
        snapshot.clone_from(self);
        snapshot
    }

    fn clone_from(&mut self, source: &Self) {
        self.pipeline_state.clone_from(&source.pipeline_state);
        self.input_assembler.clone_from(&source.input_assembler);
        self.descriptor_sets.clone_from(&source.descriptor_sets);
        self.dynamic_offsets.clone_from(&source.dynamic_offsets);
        self.viewport = source.viewport;
        self.scissor = source.scissor;
        self.line_width = source.line_width;
        self.depth_bias = source.depth_bias;
        self.blend_constants = source.blend_constants;
        self.depth_bounds = source.depth_bounds;
        self.stencil_write_mask = source.stencil_write_mask;
        self.stencil_compare_mask = source.stencil_compare_mask;
    }
}

impl<B: Backend> StateSnapshot<B> {
    /// Overwrite the `fields` of `self` with those of `source`
    pub fn copy_fields(&mut self, source: &Self, fields: StateFlags) {
        if fields.contains(StateFlags::PIPELINE_STATE) {
            self.pipeline_state.clone_from(&source.pipeline_state);
        }
        if fields.contains(StateFlags::INPUT_ASSEMBLER) {
            self.input_assembler.clone_from(&source.input_assembler);
        }
        if fields.contains(StateFlags::DESCRIPTOR_SETS) {
            self.descriptor_sets.clone_from(&source.descriptor_sets);
            self.dynamic_offsets.clone_from(&source.dynamic_offsets);
        }
        if fields.contains(StateFlags::VIEWPORT) {
            self.viewport = source.viewport;
        }
        if fields.contains(StateFlags::SCISSOR) {
            self.scissor = source.scissor;
        }
        if fields.contains(StateFlags::LINE_WIDTH) {
            self.line_width = source.line_width;
        }
        if fields.contains(StateFlags::DEPTH_BIAS) {
            self.depth_bias = source.depth_bias;
        }
        if fields.contains(StateFlags::BLEND_CONSTANTS) {
            self.blend_constants = source.blend_constants;
        }
        if fields.contains(StateFlags::DEPTH_BOUNDS) {
            self.depth_bounds = source.depth_bounds;
        }
        if fields.contains(StateFlags::STENCIL_WRITE_MASK) {
            self.stencil_write_mask = source.stencil_write_mask;
        }
        if fields.contains(StateFlags::STENCIL_COMPARE_MASK) {
            self.stencil_compare_mask = source.stencil_compare_mask;
        }
    }

    /// Descriptor set bound at `set`, if any
    pub fn descriptor_set(&self, set: usize) -> Option<&Rc<DescriptorSet<B>>> {
        self.descriptor_sets.get(set).and_then(Option::as_ref)
    }

    /// Dynamic offsets recorded with the set bound at `set`
    pub fn dynamic_offsets(&self, set: usize) -> &[u32] {
        self.dynamic_offsets.get(set).map(Vec::as_slice).unwrap_or(&[])
    }

    fn reset(&mut self) {
        self.pipeline_state = None;
        self.input_assembler = None;
        self.descriptor_sets.clear();
        self.dynamic_offsets.clear();
        self.viewport = Viewport::default();
        self.scissor = Rect2D::default();
        self.line_width = 1.0;
        self.depth_bias = DepthBias::default();
        self.blend_constants = Color::ZERO;
        self.depth_bounds = DepthBounds::default();
        self.stencil_write_mask = StencilWriteMask::default();
        self.stencil_compare_mask = StencilCompareMask::default();
    }
}

// ===== COMMAND RECORDS =====

/// Command kinds in recording order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    BeginRenderPass,
    EndRenderPass,
    BindStates,
    Draw,
    UpdateBuffer,
    CopyBuffersToTexture,
}

pub struct BeginRenderPassCmd<B: Backend> {
    pub render_pass: Option<Rc<RenderPass<B>>>,
    pub framebuffer: Option<Rc<Framebuffer<B>>>,
    pub render_area: Rect2D,
    /// One per color attachment
    pub clear_colors: Vec<Color>,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

impl<B: Backend> Default for BeginRenderPassCmd<B> {
    fn default() -> Self {
        Self {
            render_pass: None,
            framebuffer: None,
            render_area: Rect2D::default(),
            clear_colors: Vec::new(),
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

impl<B: Backend> Recycle for BeginRenderPassCmd<B> {
    fn recycle(&mut self) {
        self.render_pass = None;
        self.framebuffer = None;
        self.clear_colors.clear();
    }
}

/// End of the pass begun by the matching `BeginRenderPassCmd`
pub struct EndRenderPassCmd<B: Backend> {
    pub render_pass: Option<Rc<RenderPass<B>>>,
    pub framebuffer: Option<Rc<Framebuffer<B>>>,
}

impl<B: Backend> Default for EndRenderPassCmd<B> {
    fn default() -> Self {
        Self {
            render_pass: None,
            framebuffer: None,
        }
    }
}

impl<B: Backend> Recycle for EndRenderPassCmd<B> {
    fn recycle(&mut self) {
        self.render_pass = None;
        self.framebuffer = None;
    }
}

/// Coalesced state binds
pub struct BindStatesCmd<B: Backend> {
    pub state: StateSnapshot<B>,
    /// Fields of `state` set at least once in the recording
    pub touched: StateFlags,
}

impl<B: Backend> Default for BindStatesCmd<B> {
    fn default() -> Self {
        Self {
            state: StateSnapshot::default(),
            touched: StateFlags::empty(),
        }
    }
}

impl<B: Backend> Recycle for BindStatesCmd<B> {
    fn recycle(&mut self) {
        self.state.reset();
        self.touched = StateFlags::empty();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DrawCmd {
    pub info: DrawInfo,
    /// Replay the draw records of the input assembler's indirect buffer
    pub indirect: bool,
}

impl Recycle for DrawCmd {
    fn recycle(&mut self) {
        self.info = DrawInfo::default();
        self.indirect = false;
    }
}

pub struct UpdateBufferCmd<B: Backend> {
    pub buffer: Option<Rc<Buffer<B>>>,
    /// Copy of the source bytes taken at record time
    pub data: Vec<u8>,
    pub offset: u32,
}

impl<B: Backend> Default for UpdateBufferCmd<B> {
    fn default() -> Self {
        Self {
            buffer: None,
            data: Vec::new(),
            offset: 0,
        }
    }
}

impl<B: Backend> Recycle for UpdateBufferCmd<B> {
    fn recycle(&mut self) {
        self.buffer = None;
        self.data.clear();
        self.offset = 0;
    }
}

pub struct CopyBuffersToTextureCmd<B: Backend> {
    /// One source buffer per region
    pub buffers: Vec<Vec<u8>>,
    pub texture: Option<Rc<Texture<B>>>,
    pub regions: Vec<BufferTextureCopy>,
}

impl<B: Backend> Default for CopyBuffersToTextureCmd<B> {
    fn default() -> Self {
        Self {
            buffers: Vec::new(),
            texture: None,
            regions: Vec::new(),
        }
    }
}

impl<B: Backend> Recycle for CopyBuffersToTextureCmd<B> {
    fn recycle(&mut self) {
        self.buffers.clear();
        self.texture = None;
        self.regions.clear();
    }
}

// ===== ALLOCATOR =====

/// One pool per command type, shared by every command buffer of a device
pub struct CommandAllocator<B: Backend> {
    pub(crate) begin_render_pass: CommandPool<BeginRenderPassCmd<B>>,
    pub(crate) end_render_pass: CommandPool<EndRenderPassCmd<B>>,
    pub(crate) bind_states: CommandPool<BindStatesCmd<B>>,
    pub(crate) draw: CommandPool<DrawCmd>,
    pub(crate) update_buffer: CommandPool<UpdateBufferCmd<B>>,
    pub(crate) copy_buffers_to_texture: CommandPool<CopyBuffersToTextureCmd<B>>,
}

impl<B: Backend> CommandAllocator<B> {
    pub fn new() -> Self {
        Self {
            begin_render_pass: CommandPool::new(),
            end_render_pass: CommandPool::new(),
            bind_states: CommandPool::new(),
            draw: CommandPool::new(),
            update_buffer: CommandPool::new(),
            copy_buffers_to_texture: CommandPool::new(),
        }
    }

    /// Add one reference to every record of `package`
    pub(crate) fn retain_package(&mut self, package: &CommandPackage<B>) {
        package.begin_render_pass.iter().for_each(|&h| {
            self.begin_render_pass.retain(h);
        });
        package.end_render_pass.iter().for_each(|&h| {
            self.end_render_pass.retain(h);
        });
        package.bind_states.iter().for_each(|&h| {
            self.bind_states.retain(h);
        });
        package.draw.iter().for_each(|&h| {
            self.draw.retain(h);
        });
        package.update_buffer.iter().for_each(|&h| {
            self.update_buffer.retain(h);
        });
        package.copy_buffers_to_texture.iter().for_each(|&h| {
            self.copy_buffers_to_texture.retain(h);
        });
    }

    /// Drop the package's reference to each of its records and empty it
    pub(crate) fn release_package(&mut self, package: &mut CommandPackage<B>) {
        for handle in package.begin_render_pass.drain(..) {
            self.begin_render_pass.release(handle);
        }
        for handle in package.end_render_pass.drain(..) {
            self.end_render_pass.release(handle);
        }
        for handle in package.bind_states.drain(..) {
            self.bind_states.release(handle);
        }
        for handle in package.draw.drain(..) {
            self.draw.release(handle);
        }
        for handle in package.update_buffer.drain(..) {
            self.update_buffer.release(handle);
        }
        for handle in package.copy_buffers_to_texture.drain(..) {
            self.copy_buffers_to_texture.release(handle);
        }
        package.cmd_types.clear();
    }

    /// Records handed out across all pools
    pub fn live_count(&self) -> usize {
        self.begin_render_pass.live_count()
            + self.end_render_pass.live_count()
            + self.bind_states.live_count()
            + self.draw.live_count()
            + self.update_buffer.live_count()
            + self.copy_buffers_to_texture.live_count()
    }

    pub fn bind_states_pool(&self) -> &CommandPool<BindStatesCmd<B>> {
        &self.bind_states
    }

    pub fn draw_pool(&self) -> &CommandPool<DrawCmd> {
        &self.draw
    }
}

impl<B: Backend> Default for CommandAllocator<B> {
    fn default() -> Self {
        Self::new()
    }
}

// ===== PACKAGE =====

/// Ordered output of one recording
pub struct CommandPackage<B: Backend> {
    pub(crate) cmd_types: Vec<CommandType>,
    pub(crate) begin_render_pass: Vec<CmdHandle<BeginRenderPassCmd<B>>>,
    pub(crate) end_render_pass: Vec<CmdHandle<EndRenderPassCmd<B>>>,
    pub(crate) bind_states: Vec<CmdHandle<BindStatesCmd<B>>>,
    pub(crate) draw: Vec<CmdHandle<DrawCmd>>,
    pub(crate) update_buffer: Vec<CmdHandle<UpdateBufferCmd<B>>>,
    pub(crate) copy_buffers_to_texture: Vec<CmdHandle<CopyBuffersToTextureCmd<B>>>,
}

impl<B: Backend> Default for CommandPackage<B> {
    fn default() -> Self {
        Self {
            cmd_types: Vec::new(),
            begin_render_pass: Vec::new(),
            end_render_pass: Vec::new(),
            bind_states: Vec::new(),
            draw: Vec::new(),
            update_buffer: Vec::new(),
            copy_buffers_to_texture: Vec::new(),
        }
    }
}

impl<B: Backend> CommandPackage<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cmd_types(&self) -> &[CommandType] {
        &self.cmd_types
    }

    pub fn len(&self) -> usize {
        self.cmd_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmd_types.is_empty()
    }

    /// Number of recorded commands of `cmd_type`
    pub fn count(&self, cmd_type: CommandType) -> usize {
        match cmd_type {
            CommandType::BeginRenderPass => self.begin_render_pass.len(),
            CommandType::EndRenderPass => self.end_render_pass.len(),
            CommandType::BindStates => self.bind_states.len(),
            CommandType::Draw => self.draw.len(),
            CommandType::UpdateBuffer => self.update_buffer.len(),
            CommandType::CopyBuffersToTexture => self.copy_buffers_to_texture.len(),
        }
    }

    /// Append the commands of `other`, sharing its records
    ///
    /// The caller retains the records through the allocator.
    pub(crate) fn append(&mut self, other: &CommandPackage<B>) {
        self.cmd_types.extend_from_slice(&other.cmd_types);
        self.begin_render_pass.extend_from_slice(&other.begin_render_pass);
        self.end_render_pass.extend_from_slice(&other.end_render_pass);
        self.bind_states.extend_from_slice(&other.bind_states);
        self.draw.extend_from_slice(&other.draw);
        self.update_buffer.extend_from_slice(&other.update_buffer);
        self.copy_buffers_to_texture.extend_from_slice(&other.copy_buffers_to_texture);
    }

    /// Walk the commands in recording order
    pub fn iter<'a>(&'a self, allocator: &'a CommandAllocator<B>) -> CommandIter<'a, B> {
        CommandIter {
            package: self,
            allocator,
            position: 0,
            cursors: [0; 6],
        }
    }
}

/// One resolved command
pub enum Command<'a, B: Backend> {
    BeginRenderPass(&'a BeginRenderPassCmd<B>),
    EndRenderPass(&'a EndRenderPassCmd<B>),
    BindStates(&'a BindStatesCmd<B>),
    Draw(&'a DrawCmd),
    UpdateBuffer(&'a UpdateBufferCmd<B>),
    CopyBuffersToTexture(&'a CopyBuffersToTextureCmd<B>),
}

impl<B: Backend> Command<'_, B> {
    pub fn cmd_type(&self) -> CommandType {
        match self {
            Command::BeginRenderPass(_) => CommandType::BeginRenderPass,
            Command::EndRenderPass(_) => CommandType::EndRenderPass,
            Command::BindStates(_) => CommandType::BindStates,
            Command::Draw(_) => CommandType::Draw,
            Command::UpdateBuffer(_) => CommandType::UpdateBuffer,
            Command::CopyBuffersToTexture(_) => CommandType::CopyBuffersToTexture,
        }
    }
}

/// Iterator over a package, see `CommandPackage::iter`
pub struct CommandIter<'a, B: Backend> {
    package: &'a CommandPackage<B>,
    allocator: &'a CommandAllocator<B>,
    position: usize,
    cursors: [usize; 6],
}

impl<'a, B: Backend> CommandIter<'a, B> {
    fn next_handle<T>(cursor: &mut usize, handles: &[CmdHandle<T>]) -> Option<CmdHandle<T>> {
        let handle = handles.get(*cursor).copied();
        *cursor += 1;
        handle
    }

    fn resolve(&mut self, cmd_type: CommandType) -> Option<Command<'a, B>> {
        let package = self.package;
        let allocator = self.allocator;
        let cursors = &mut self.cursors;
        match cmd_type {
            CommandType::BeginRenderPass => Self::next_handle(&mut cursors[0], &package.begin_render_pass)
                .and_then(|h| allocator.begin_render_pass.get(h))
                .map(Command::BeginRenderPass),
            CommandType::EndRenderPass => Self::next_handle(&mut cursors[1], &package.end_render_pass)
                .and_then(|h| allocator.end_render_pass.get(h))
                .map(Command::EndRenderPass),
            CommandType::BindStates => Self::next_handle(&mut cursors[2], &package.bind_states)
                .and_then(|h| allocator.bind_states.get(h))
                .map(Command::BindStates),
            CommandType::Draw => Self::next_handle(&mut cursors[3], &package.draw)
                .and_then(|h| allocator.draw.get(h))
                .map(Command::Draw),
            CommandType::UpdateBuffer => Self::next_handle(&mut cursors[4], &package.update_buffer)
                .and_then(|h| allocator.update_buffer.get(h))
                .map(Command::UpdateBuffer),
            CommandType::CopyBuffersToTexture => {
                Self::next_handle(&mut cursors[5], &package.copy_buffers_to_texture)
                    .and_then(|h| allocator.copy_buffers_to_texture.get(h))
                    .map(Command::CopyBuffersToTexture)
            }
        }
    }
}

impl<'a, B: Backend> Iterator for CommandIter<'a, B> {
    type Item = Command<'a, B>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&cmd_type) = self.package.cmd_types.get(self.position) {
            self.position += 1;
            match self.resolve(cmd_type) {
                Some(command) => return Some(command),
                None => gfx_error!(SOURCE, "{:?} record at position {} was released", cmd_type, self.position - 1),
            }
        }
        None
    }
}
