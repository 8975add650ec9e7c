/// Native GLES objects stored inside the HAL resources
///
/// GL names are plain `u32`. Everything the replay needs per draw is
/// converted to GL enumerants once, at creation time.

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use cobalt_gfx::cobalt::gfx::{DynamicStateFlags, Format, LoadOp, StoreOp};

use crate::gl::GLenum;
use crate::gles_conversions::{GlAttributeFormat, GlFormat};

// ===== BUFFER =====

#[derive(Debug)]
pub struct GlesBuffer {
    /// GL buffer name, 0 for indirect buffers (CPU side only)
    pub(crate) id: u32,
    pub(crate) target: Option<GLenum>,
    pub(crate) size: u32,
    pub(crate) usage_hint: GLenum,
}

impl GlesBuffer {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn target(&self) -> Option<GLenum> {
        self.target
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

// ===== TEXTURE =====

/// Texture name shared with the descriptors that sample it
///
/// Resizing replaces the GL texture object. The new name is written here,
/// so every descriptor resolved from the texture binds the live object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SharedName(Rc<Cell<u32>>);

impl SharedName {
    pub(crate) fn new(id: u32) -> Self {
        Self(Rc::new(Cell::new(id)))
    }

    pub(crate) fn get(&self) -> u32 {
        self.0.get()
    }

    /// Store `id`, returning the name it replaces
    pub(crate) fn replace(&self, id: u32) -> u32 {
        self.0.replace(id)
    }
}

#[derive(Debug)]
pub struct GlesTexture {
    pub(crate) name: SharedName,
    pub(crate) target: GLenum,
    pub(crate) hal_format: Format,
    pub(crate) format: GlFormat,
    pub(crate) compressed: bool,
    pub(crate) levels: u32,
    pub(crate) gen_mipmap: bool,
}

impl GlesTexture {
    pub fn id(&self) -> u32 {
        self.name.get()
    }

    pub fn target(&self) -> GLenum {
        self.target
    }

    /// Allocated mip levels
    pub fn levels(&self) -> u32 {
        self.levels
    }
}

// ===== SAMPLER =====

#[derive(Debug)]
pub struct GlesSampler {
    pub(crate) id: u32,
}

impl GlesSampler {
    pub fn id(&self) -> u32 {
        self.id
    }
}

// ===== SHADER =====

/// Declared attribute location and where the linker actually put it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlesShaderAttribute {
    pub(crate) declared: u32,
    pub(crate) location: u32,
}

#[derive(Debug)]
pub struct GlesShader {
    pub(crate) program: u32,
    pub(crate) attributes: Vec<GlesShaderAttribute>,
}

impl GlesShader {
    pub fn program(&self) -> u32 {
        self.program
    }
}

// ===== RENDER PASS / FRAMEBUFFER =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlesDepthStencilOps {
    pub(crate) has_depth: bool,
    pub(crate) has_stencil: bool,
    pub(crate) depth_load: LoadOp,
    pub(crate) depth_store: StoreOp,
    pub(crate) stencil_load: LoadOp,
    pub(crate) stencil_store: StoreOp,
}

#[derive(Debug)]
pub struct GlesRenderPass {
    /// (load, store) of each color attachment
    pub(crate) colors: Vec<(LoadOp, StoreOp)>,
    pub(crate) depth_stencil: Option<GlesDepthStencilOps>,
}

#[derive(Debug)]
pub struct GlesFramebuffer {
    /// `None` for the default (surface) framebuffer
    pub(crate) fbo: Option<u32>,
    pub(crate) color_count: u32,
}

impl GlesFramebuffer {
    pub fn fbo(&self) -> Option<u32> {
        self.fbo
    }

    /// GL name to bind, 0 for the surface
    pub(crate) fn name(&self) -> u32 {
        self.fbo.unwrap_or(0)
    }
}

// ===== BINDINGS =====

/// GLES has no layout objects; bindings are remapped at replay
#[derive(Debug, Default)]
pub struct GlesDescriptorSetLayout;

#[derive(Debug, Default)]
pub struct GlesPipelineLayout;

/// Where a flat descriptor lives in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlesSlot {
    pub(crate) binding: u32,
    pub(crate) element: u32,
    pub(crate) dynamic_index: Option<u32>,
}

/// One resolved descriptor of a set
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GlesDescriptor {
    Empty,
    UniformBuffer {
        binding: u32,
        element: u32,
        buffer: u32,
        size: u32,
        /// Range bound per dynamic offset, 0 to bind up to the buffer end
        stride: u32,
        /// Position in the dynamic offsets given with the set
        dynamic_index: Option<u32>,
    },
    Texture {
        binding: u32,
        element: u32,
        target: GLenum,
        texture: SharedName,
        /// 0 keeps the texture's own parameters
        sampler: u32,
    },
    Sampler {
        binding: u32,
        element: u32,
        sampler: u32,
    },
}

#[derive(Debug, Default)]
pub struct GlesDescriptorSet {
    pub(crate) slots: Vec<GlesSlot>,
    pub(crate) descriptors: Vec<GlesDescriptor>,
}

// ===== PIPELINE STATE =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GlesRasterState {
    /// `None` disables face culling
    pub(crate) cull_face: Option<GLenum>,
    pub(crate) front_face: GLenum,
    /// (factor, units); `None` disables polygon offset
    pub(crate) polygon_offset: Option<(f32, f32)>,
    pub(crate) line_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlesStencilFace {
    pub(crate) func: GLenum,
    pub(crate) reference: i32,
    pub(crate) compare_mask: u32,
    pub(crate) write_mask: u32,
    pub(crate) fail: GLenum,
    pub(crate) depth_fail: GLenum,
    pub(crate) pass: GLenum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlesDepthStencilState {
    pub(crate) depth_test: bool,
    pub(crate) depth_write: bool,
    pub(crate) depth_func: GLenum,
    pub(crate) stencil_test: bool,
    pub(crate) front: GlesStencilFace,
    pub(crate) back: GlesStencilFace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GlesBlendState {
    pub(crate) alpha_to_coverage: bool,
    pub(crate) enabled: bool,
    /// (rgb, alpha)
    pub(crate) equation: (GLenum, GLenum),
    /// (src_rgb, dst_rgb, src_alpha, dst_alpha)
    pub(crate) func: (GLenum, GLenum, GLenum, GLenum),
    pub(crate) color: [f32; 4],
    pub(crate) color_mask: [bool; 4],
}

#[derive(Debug)]
pub struct GlesPipelineState {
    pub(crate) mode: GLenum,
    pub(crate) program: u32,
    /// Linked attribute locations of the program
    pub(crate) attributes: Vec<GlesShaderAttribute>,
    pub(crate) raster: GlesRasterState,
    pub(crate) depth_stencil: GlesDepthStencilState,
    pub(crate) blend: GlesBlendState,
    pub(crate) dynamic_states: DynamicStateFlags,
}

impl GlesPipelineState {
    pub fn mode(&self) -> GLenum {
        self.mode
    }

    pub fn program(&self) -> u32 {
        self.program
    }

    /// Linked location of the attribute declared at `declared`
    ///
    /// Attributes the shader does not reflect keep their declared location.
    pub(crate) fn attribute_location(&self, declared: u32) -> u32 {
        self.attributes
            .iter()
            .find(|attribute| attribute.declared == declared)
            .map_or(declared, |attribute| attribute.location)
    }
}

// ===== INPUT ASSEMBLER =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlesAttribute {
    /// Location declared by the HAL attribute (before shader remapping)
    pub(crate) location: u32,
    pub(crate) buffer: u32,
    pub(crate) stride: u32,
    pub(crate) offset: u32,
    pub(crate) format: GlAttributeFormat,
    pub(crate) divisor: u32,
}

#[derive(Debug, Default)]
pub struct GlesInputAssembler {
    pub(crate) attributes: Vec<GlesAttribute>,
    /// GL index buffer name, 0 when not indexed
    pub(crate) index_buffer: u32,
    pub(crate) index_type: Option<GLenum>,
    pub(crate) index_size: u32,
    /// VAOs keyed by the attribute location layout they were built for
    pub(crate) vaos: FxHashMap<u64, u32>,
}

impl GlesInputAssembler {
    pub fn vao_count(&self) -> usize {
        self.vaos.len()
    }
}

// ===== FENCE =====

#[derive(Debug, Default)]
pub struct GlesFence {
    pub(crate) sync: Option<u32>,
}

impl GlesFence {
    pub fn is_armed(&self) -> bool {
        self.sync.is_some()
    }
}
