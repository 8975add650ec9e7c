/// Plain value types shared by resources, command recording and backends

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

/// RGBA color used for clear values and blend constants
pub type Color = glam::Vec4;

/// Viewport rectangle and depth range
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering `rect` with the full [0, 1] depth range
    pub fn from_rect(rect: Rect2D) -> Self {
        Self {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width as f32,
            height: rect.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// 3D texel offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offset3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// 3D extent in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Default for Extent3D {
    fn default() -> Self {
        Self { width: 1, height: 1, depth: 1 }
    }
}

/// Mip level and array layer range addressed by a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSubresourceLayers {
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

impl Default for TextureSubresourceLayers {
    fn default() -> Self {
        Self { mip_level: 0, base_array_layer: 0, layer_count: 1 }
    }
}

/// One buffer-to-texture copy region
///
/// `buffer_stride` and `buffer_texture_height` are in texels; 0 means the
/// rows (or images) are tightly packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferTextureCopy {
    pub buffer_offset: u32,
    pub buffer_stride: u32,
    pub buffer_texture_height: u32,
    pub tex_offset: Offset3D,
    pub tex_extent: Extent3D,
    pub tex_subres: TextureSubresourceLayers,
}

/// Parameters of one draw
///
/// Also the element type of indirect buffers, hence the `Pod` layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawInfo {
    pub vertex_count: u32,
    pub first_vertex: u32,
    pub index_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub instance_count: u32,
    pub first_instance: u32,
}

impl DrawInfo {
    /// Non-indexed draw of `vertex_count` vertices
    pub fn vertices(vertex_count: u32) -> Self {
        Self { vertex_count, ..Default::default() }
    }

    /// Indexed draw of `index_count` indices
    pub fn indexed(index_count: u32) -> Self {
        Self { index_count, ..Default::default() }
    }

    pub fn with_instances(mut self, instance_count: u32) -> Self {
        self.instance_count = instance_count;
        self
    }
}

/// Depth bias parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthBias {
    /// Constant depth offset
    pub constant_factor: f32,
    /// Maximum depth bias clamp
    pub clamp: f32,
    /// Slope-based depth offset
    pub slope_factor: f32,
}

/// Depth bounds test range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for DepthBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Faces addressed by a stencil setter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilFace {
    Front,
    Back,
    All,
}

impl StencilFace {
    pub fn includes_front(self) -> bool {
        matches!(self, StencilFace::Front | StencilFace::All)
    }

    pub fn includes_back(self) -> bool {
        matches!(self, StencilFace::Back | StencilFace::All)
    }
}

/// Per-face stencil write masks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilWriteMask {
    pub front: u32,
    pub back: u32,
}

impl Default for StencilWriteMask {
    fn default() -> Self {
        Self { front: 0xFF, back: 0xFF }
    }
}

/// Per-face stencil reference values and compare masks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilCompareMask {
    pub front_reference: u32,
    pub front_mask: u32,
    pub back_reference: u32,
    pub back_mask: u32,
}

impl Default for StencilCompareMask {
    fn default() -> Self {
        Self { front_reference: 0, front_mask: 0xFF, back_reference: 0, back_mask: 0xFF }
    }
}

bitflags! {
    /// Fields of the recorded state snapshot that were explicitly set
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u32 {
        const PIPELINE_STATE = 1 << 0;
        const INPUT_ASSEMBLER = 1 << 1;
        const DESCRIPTOR_SETS = 1 << 2;
        const VIEWPORT = 1 << 3;
        const SCISSOR = 1 << 4;
        const LINE_WIDTH = 1 << 5;
        const DEPTH_BIAS = 1 << 6;
        const BLEND_CONSTANTS = 1 << 7;
        const DEPTH_BOUNDS = 1 << 8;
        const STENCIL_WRITE_MASK = 1 << 9;
        const STENCIL_COMPARE_MASK = 1 << 10;
    }
}

/// Draw telemetry of a command buffer or a frame
///
/// Counters saturate instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub draw_calls: u64,
    pub instances: u64,
    pub triangles: u64,
}

impl FrameStats {
    pub fn accumulate(&mut self, other: &FrameStats) {
        self.draw_calls = self.draw_calls.saturating_add(other.draw_calls);
        self.instances = self.instances.saturating_add(other.instances);
        self.triangles = self.triangles.saturating_add(other.triangles);
    }
}

/// Bytes of live buffers and textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStatus {
    pub buffer_size: u64,
    pub texture_size: u64,
}
