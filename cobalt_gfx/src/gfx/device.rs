/// Device: resource factory, capability registry and frame entry point
///
/// The device owns the backend, the command allocator shared by all of its
/// command buffers, the aggregate memory counters and the per-frame draw
/// statistics. It owns no resource: every `create_*` hands back an `Rc` that
/// the caller keeps alive.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use bitflags::bitflags;
use raw_window_handle::RawWindowHandle;

use crate::error::{Error, Result};
use crate::gfx::{
    Backend, Buffer, BufferInfo, BufferTextureCopy, CommandAllocator, CommandBuffer,
    CommandBufferInfo, CommandBufferType, DescriptorSet, DescriptorSetInfo, DescriptorSetLayout,
    DescriptorSetLayoutInfo, Fence, FrameStats, Framebuffer, FramebufferInfo, InputAssembler,
    InputAssemblerInfo, MemoryStatus, Object, PipelineLayout, PipelineLayoutInfo, PipelineState,
    PipelineStateInfo, Queue, QueueInfo, QueueType, RenderPass, RenderPassInfo, Sampler,
    SamplerInfo, Shader, ShaderInfo, Texture, TextureInfo,
};
use crate::{gfx_error, gfx_info, gfx_warn};

const SOURCE: &str = "cobalt::Device";

// ===== CONFIGURATION =====

/// Remapping of descriptor-set bindings onto flat backend slots
///
/// Backends without native descriptor sets (GLES) map `(set, binding)` to
/// `offsets[set] + binding`. `flexible_set` names the set whose bindings are
/// allowed to grow past the next set's offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMappingInfo {
    /// First uniform/storage block slot of each set
    pub buffer_offsets: Vec<u32>,
    /// First texture unit of each set
    pub sampler_offsets: Vec<u32>,
    pub flexible_set: u32,
}

impl Default for BindingMappingInfo {
    fn default() -> Self {
        Self {
            buffer_offsets: vec![0],
            sampler_offsets: vec![0],
            flexible_set: 0,
        }
    }
}

impl BindingMappingInfo {
    /// Flat buffer slot of `(set, binding)`
    pub fn buffer_slot(&self, set: u32, binding: u32) -> u32 {
        self.buffer_offsets.get(set as usize).copied().unwrap_or(0) + binding
    }

    /// Flat texture unit of `(set, binding)`
    pub fn sampler_slot(&self, set: u32, binding: u32) -> u32 {
        self.sampler_offsets.get(set as usize).copied().unwrap_or(0) + binding
    }
}

/// Device construction parameters supplied by the platform layer
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Target surface; `None` for offscreen or headless devices
    pub window_handle: Option<RawWindowHandle>,
    pub width: u32,
    pub height: u32,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    /// Check driver errors after every replayed command
    pub validation: bool,
    pub binding_mapping: BindingMappingInfo,
}

/// Numeric limits of the active backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    pub max_vertex_attributes: u32,
    pub max_vertex_uniform_vectors: u32,
    pub max_fragment_uniform_vectors: u32,
    pub max_texture_units: u32,
    pub max_vertex_texture_units: u32,
    pub max_uniform_buffer_bindings: u32,
    pub max_uniform_block_size: u32,
    pub max_texture_size: u32,
    pub max_cube_map_texture_size: u32,
    pub max_array_texture_layers: u32,
    pub max_3d_texture_size: u32,
    pub max_color_attachments: u32,
    pub uniform_buffer_offset_alignment: u32,
    pub depth_bits: u32,
    pub stencil_bits: u32,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        // GLES 3.0 minimums
        Self {
            max_vertex_attributes: 16,
            max_vertex_uniform_vectors: 256,
            max_fragment_uniform_vectors: 224,
            max_texture_units: 16,
            max_vertex_texture_units: 16,
            max_uniform_buffer_bindings: 24,
            max_uniform_block_size: 16384,
            max_texture_size: 2048,
            max_cube_map_texture_size: 2048,
            max_array_texture_layers: 256,
            max_3d_texture_size: 256,
            max_color_attachments: 4,
            uniform_buffer_offset_alignment: 256,
            depth_bits: 24,
            stencil_bits: 8,
        }
    }
}

bitflags! {
    /// Optional backend features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u32 {
        const COLOR_FLOAT = 1 << 0;
        const COLOR_HALF_FLOAT = 1 << 1;
        const TEXTURE_FLOAT = 1 << 2;
        const TEXTURE_HALF_FLOAT = 1 << 3;
        const TEXTURE_FLOAT_LINEAR = 1 << 4;
        const FORMAT_D24S8 = 1 << 5;
        const FORMAT_ETC2 = 1 << 6;
        const FORMAT_ASTC = 1 << 7;
        const FORMAT_BC = 1 << 8;
        const ELEMENT_INDEX_UINT = 1 << 9;
        const INSTANCED_ARRAYS = 1 << 10;
        const MULTIPLE_RENDER_TARGETS = 1 << 11;
        const BLEND_MINMAX = 1 << 12;
        const VERTEX_ARRAY_OBJECT = 1 << 13;
        const INVALIDATE_FRAMEBUFFER = 1 << 14;
        const DEPTH_BOUNDS = 1 << 15;
    }
}

// ===== SHARED STATE =====

/// State shared between the device and every object it created
pub(crate) struct DeviceShared<B: Backend> {
    pub(crate) backend: RefCell<B>,
    pub(crate) info: DeviceInfo,
    pub(crate) caps: DeviceCaps,
    pub(crate) features: Features,
    pub(crate) memory: Cell<MemoryStatus>,
    pub(crate) frame_stats: Cell<FrameStats>,
    pub(crate) last_frame_stats: Cell<FrameStats>,
    pub(crate) allocator: RefCell<CommandAllocator<B>>,
}

impl<B: Backend> DeviceShared<B> {
    /// Replace `old` live buffer bytes with `new`
    pub(crate) fn track_buffer_memory(&self, old: u64, new: u64) {
        let mut memory = self.memory.get();
        memory.buffer_size = memory.buffer_size.saturating_sub(old) + new;
        self.memory.set(memory);
    }

    /// Replace `old` live texture bytes with `new`
    pub(crate) fn track_texture_memory(&self, old: u64, new: u64) {
        let mut memory = self.memory.get();
        memory.texture_size = memory.texture_size.saturating_sub(old) + new;
        self.memory.set(memory);
    }

    /// Hand a native object back to the backend for destruction
    ///
    /// Destruction can be reached from `Drop`; when the backend is already
    /// borrowed the native object is leaked and logged instead of panicking.
    pub(crate) fn release(&self, source: &str, destroy: impl FnOnce(&mut B)) {
        match self.backend.try_borrow_mut() {
            Ok(mut backend) => destroy(&mut backend),
            Err(_) => gfx_error!(source, "Backend is busy, native object leaked"),
        }
    }

    pub(crate) fn add_frame_stats(&self, stats: &FrameStats) {
        let mut frame = self.frame_stats.get();
        frame.accumulate(stats);
        self.frame_stats.set(frame);
    }
}

// ===== DEVICE =====

/// Graphics device bound to one backend
pub struct Device<B: Backend> {
    pub(crate) shared: Rc<DeviceShared<B>>,
    queue: Rc<Queue<B>>,
    command_buffer: Rc<CommandBuffer<B>>,
    in_frame: Cell<bool>,
}

impl<B: Backend> Device<B> {
    /// Initialize `backend` for `info` and build the default queue and command buffer
    pub fn new(mut backend: B, info: DeviceInfo) -> Result<Self> {
        if let Err(err) = backend.initialize(&info) {
            gfx_error!(SOURCE, "Backend {} failed to initialize: {}", backend.name(), err);
            return Err(Error::InitializationFailed(err.to_string()));
        }

        let caps = backend.caps();
        let features = backend.features();
        gfx_info!(
            SOURCE,
            "Device initialized on {} ({}x{}, features {:?})",
            backend.name(),
            info.width,
            info.height,
            features
        );

        let shared = Rc::new(DeviceShared {
            backend: RefCell::new(backend),
            info,
            caps,
            features,
            memory: Cell::new(MemoryStatus::default()),
            frame_stats: Cell::new(FrameStats::default()),
            last_frame_stats: Cell::new(FrameStats::default()),
            allocator: RefCell::new(CommandAllocator::new()),
        });

        let queue = Rc::new(Queue::from_shared(shared.clone()));
        if !queue.initialize(&QueueInfo { queue_type: QueueType::Graphics }) {
            return Err(Error::InitializationFailed("default queue".to_string()));
        }
        let command_buffer = Rc::new(CommandBuffer::from_shared(shared.clone()));
        if !command_buffer.initialize(&CommandBufferInfo { buffer_type: CommandBufferType::Primary }) {
            return Err(Error::InitializationFailed("default command buffer".to_string()));
        }

        Ok(Self {
            shared,
            queue,
            command_buffer,
            in_frame: Cell::new(false),
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.shared.info
    }

    pub fn caps(&self) -> &DeviceCaps {
        &self.shared.caps
    }

    pub fn features(&self) -> Features {
        self.shared.features
    }

    pub fn has_feature(&self, feature: Features) -> bool {
        self.shared.features.contains(feature)
    }

    /// Bytes of currently live buffers and textures
    pub fn memory_status(&self) -> MemoryStatus {
        self.shared.memory.get()
    }

    /// Draw statistics of the last presented frame
    pub fn frame_stats(&self) -> FrameStats {
        self.shared.last_frame_stats.get()
    }

    /// Draw statistics submitted so far in the current frame
    pub fn pending_frame_stats(&self) -> FrameStats {
        self.shared.frame_stats.get()
    }

    pub fn is_async(&self) -> bool {
        self.shared.backend.borrow().is_async()
    }

    /// Default graphics queue
    pub fn queue(&self) -> &Rc<Queue<B>> {
        &self.queue
    }

    /// Default primary command buffer
    pub fn command_buffer(&self) -> &Rc<CommandBuffer<B>> {
        &self.command_buffer
    }

    /// Backend access (tests, tooling)
    pub fn backend(&self) -> Ref<'_, B> {
        self.shared.backend.borrow()
    }

    pub fn backend_mut(&self) -> RefMut<'_, B> {
        self.shared.backend.borrow_mut()
    }

    // ===== FRAME =====

    /// Begin a frame
    pub fn acquire(&self) -> Result<()> {
        if self.in_frame.get() {
            gfx_warn!(SOURCE, "acquire() called twice without present()");
        }
        self.shared.backend.borrow_mut().acquire()?;
        self.in_frame.set(true);
        Ok(())
    }

    /// End the frame and publish its draw statistics
    pub fn present(&self) -> Result<()> {
        if !self.in_frame.get() {
            gfx_warn!(SOURCE, "present() called without acquire()");
        }
        self.shared.backend.borrow_mut().present()?;
        self.shared.last_frame_stats.set(self.shared.frame_stats.get());
        self.shared.frame_stats.set(FrameStats::default());
        self.in_frame.set(false);
        Ok(())
    }

    // ===== IMMEDIATE UPLOADS =====

    /// Upload texel data immediately, outside of any command buffer
    pub fn copy_buffers_to_texture(
        &self,
        buffers: &[&[u8]],
        texture: &Texture<B>,
        regions: &[BufferTextureCopy],
    ) -> Result<()> {
        texture.object().ensure_ready(SOURCE, "copy_buffers_to_texture")?;
        if buffers.len() < regions.len() {
            gfx_error!(
                SOURCE,
                "copy_buffers_to_texture: {} regions but only {} buffers",
                regions.len(),
                buffers.len()
            );
            return Err(Error::InvalidOperation("not enough source buffers".to_string()));
        }
        texture.write_backup(buffers, regions);
        self.shared
            .backend
            .borrow_mut()
            .copy_buffers_to_texture(buffers, texture, regions)
    }

    // ===== FACTORIES =====

    pub fn create_buffer(&self, info: &BufferInfo) -> Result<Rc<Buffer<B>>> {
        let buffer = Rc::new(Buffer::new(self));
        created(buffer.initialize(info), buffer)
    }

    pub fn create_texture(&self, info: &TextureInfo) -> Result<Rc<Texture<B>>> {
        let texture = Rc::new(Texture::new(self));
        created(texture.initialize(info), texture)
    }

    pub fn create_sampler(&self, info: &SamplerInfo) -> Result<Rc<Sampler<B>>> {
        let sampler = Rc::new(Sampler::new(self));
        created(sampler.initialize(info), sampler)
    }

    pub fn create_shader(&self, info: &ShaderInfo) -> Result<Rc<Shader<B>>> {
        let shader = Rc::new(Shader::new(self));
        created(shader.initialize(info), shader)
    }

    pub fn create_render_pass(&self, info: &RenderPassInfo) -> Result<Rc<RenderPass<B>>> {
        let render_pass = Rc::new(RenderPass::new(self));
        created(render_pass.initialize(info), render_pass)
    }

    pub fn create_framebuffer(&self, info: &FramebufferInfo<B>) -> Result<Rc<Framebuffer<B>>> {
        let framebuffer = Rc::new(Framebuffer::new(self));
        created(framebuffer.initialize(info), framebuffer)
    }

    pub fn create_descriptor_set_layout(
        &self,
        info: &DescriptorSetLayoutInfo,
    ) -> Result<Rc<DescriptorSetLayout<B>>> {
        let layout = Rc::new(DescriptorSetLayout::new(self));
        created(layout.initialize(info), layout)
    }

    pub fn create_pipeline_layout(&self, info: &PipelineLayoutInfo<B>) -> Result<Rc<PipelineLayout<B>>> {
        let layout = Rc::new(PipelineLayout::new(self));
        created(layout.initialize(info), layout)
    }

    pub fn create_descriptor_set(&self, info: &DescriptorSetInfo<B>) -> Result<Rc<DescriptorSet<B>>> {
        let set = Rc::new(DescriptorSet::new(self));
        created(set.initialize(info), set)
    }

    pub fn create_pipeline_state(&self, info: &PipelineStateInfo<B>) -> Result<Rc<PipelineState<B>>> {
        let pipeline = Rc::new(PipelineState::new(self));
        created(pipeline.initialize(info), pipeline)
    }

    pub fn create_input_assembler(&self, info: &InputAssemblerInfo<B>) -> Result<Rc<InputAssembler<B>>> {
        let input_assembler = Rc::new(InputAssembler::new(self));
        created(input_assembler.initialize(info), input_assembler)
    }

    pub fn create_command_buffer(&self, info: &CommandBufferInfo) -> Result<Rc<CommandBuffer<B>>> {
        let command_buffer = Rc::new(CommandBuffer::new(self));
        created(command_buffer.initialize(info), command_buffer)
    }

    pub fn create_queue(&self, info: &QueueInfo) -> Result<Rc<Queue<B>>> {
        let queue = Rc::new(Queue::new(self));
        created(queue.initialize(info), queue)
    }

    pub fn create_fence(&self) -> Result<Rc<Fence<B>>> {
        let fence = Rc::new(Fence::new(self));
        created(fence.initialize(), fence)
    }
}

/// Wrap the outcome of an `initialize` call for the `create_*` factories
fn created<T: Object>(initialized: bool, object: Rc<T>) -> Result<Rc<T>> {
    if initialized {
        Ok(object)
    } else {
        Err(Error::InvalidResource(format!(
            "{:?} failed to initialize ({:?})",
            object.object_type(),
            object.status()
        )))
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
