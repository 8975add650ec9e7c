/// Pipeline state object and its fixed-function sub-states

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use bitflags::bitflags;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{
    Backend, Color, DepthBias, Device, GfxObject, Object, ObjectStatus, ObjectType, PipelineLayout,
    RenderPass, Shader, VertexAttribute,
};
use crate::gfx_error;

const SOURCE: &str = "cobalt::PipelineState";

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    LineLoop,
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveTopology {
    /// Triangles assembled from `count` vertices or indices
    pub fn triangle_count(self, count: u32) -> u32 {
        match self {
            PrimitiveTopology::TriangleList => count / 3,
            PrimitiveTopology::TriangleStrip | PrimitiveTopology::TriangleFan => count.saturating_sub(2),
            _ => 0,
        }
    }
}

// ===== RASTERIZATION ENUMS =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison operator for depth, stencil and sampler compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    /// result = src * srcFactor + dst * dstFactor
    Add,
    /// result = src * srcFactor - dst * dstFactor
    Subtract,
    /// result = dst * dstFactor - src * srcFactor
    ReverseSubtract,
    /// result = min(src, dst)
    Min,
    /// result = max(src, dst)
    Max,
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    #[default]
    S1,
    S2,
    S4,
    S8,
}

impl SampleCount {
    pub fn count(self) -> u32 {
        match self {
            SampleCount::S1 => 1,
            SampleCount::S2 => 2,
            SampleCount::S4 => 4,
            SampleCount::S8 => 8,
        }
    }
}

// ===== RASTERIZER STATE =====

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
    pub depth_clip: bool,
    pub depth_bias_enabled: bool,
    pub depth_bias: DepthBias,
    pub line_width: f32,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
            depth_clip: true,
            depth_bias_enabled: false,
            depth_bias: DepthBias::default(),
            line_width: 1.0,
        }
    }
}

// ===== DEPTH/STENCIL STATE =====

/// Stencil operation state (per-face)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilOpState {
    /// Action on stencil test fail
    pub fail_op: StencilOp,
    /// Action on stencil pass + depth pass
    pub pass_op: StencilOp,
    /// Action on stencil pass + depth fail
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    /// Bits of stencil buffer read for compare
    pub compare_mask: u32,
    /// Bits of stencil buffer written
    pub write_mask: u32,
    /// Reference value for compare/replace
    pub reference: u32,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
        }
    }
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
            stencil_test_enable: false,
            front: StencilOpState::default(),
            back: StencilOpState::default(),
        }
    }
}

// ===== COLOR BLEND STATE =====

/// Color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorWriteMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorWriteMask {
    pub const ALL: Self = Self { r: true, g: true, b: true, a: true };
    pub const NONE: Self = Self { r: false, g: false, b: false, a: false };
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blending of one color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendTarget {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
}

impl Default for BlendTarget {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Color blending state
#[derive(Debug, Clone, PartialEq)]
pub struct BlendState {
    pub alpha_to_coverage: bool,
    pub blend_color: Color,
    /// One entry per color attachment; missing entries use the default target
    pub targets: Vec<BlendTarget>,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            alpha_to_coverage: false,
            blend_color: Color::ZERO,
            targets: vec![BlendTarget::default()],
        }
    }
}

bitflags! {
    /// States supplied per draw through the command buffer instead of the pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DynamicStateFlags: u32 {
        const VIEWPORT = 1 << 0;
        const SCISSOR = 1 << 1;
        const LINE_WIDTH = 1 << 2;
        const DEPTH_BIAS = 1 << 3;
        const BLEND_CONSTANTS = 1 << 4;
        const DEPTH_BOUNDS = 1 << 5;
        const STENCIL_WRITE_MASK = 1 << 6;
        const STENCIL_COMPARE_MASK = 1 << 7;
    }
}

// ===== PIPELINE STATE =====

/// Descriptor for creating a pipeline state
pub struct PipelineStateInfo<B: Backend> {
    pub shader: Rc<Shader<B>>,
    pub pipeline_layout: Rc<PipelineLayout<B>>,
    pub render_pass: Rc<RenderPass<B>>,
    pub primitive: PrimitiveTopology,
    /// Vertex input layout expected by the shader
    pub input_state: Vec<VertexAttribute>,
    pub rasterizer: RasterizerState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
    pub dynamic_states: DynamicStateFlags,
}

impl<B: Backend> Clone for PipelineStateInfo<B> {
    fn clone(&self) -> Self {
        Self {
            shader: self.shader.clone(),
            pipeline_layout: self.pipeline_layout.clone(),
            render_pass: self.render_pass.clone(),
            primitive: self.primitive,
            input_state: self.input_state.clone(),
            rasterizer: self.rasterizer,
            depth_stencil: self.depth_stencil,
            blend: self.blend.clone(),
            dynamic_states: self.dynamic_states,
        }
    }
}

impl<B: Backend> PipelineStateInfo<B> {
    /// Pipeline with default fixed-function states
    pub fn new(
        shader: Rc<Shader<B>>,
        pipeline_layout: Rc<PipelineLayout<B>>,
        render_pass: Rc<RenderPass<B>>,
        primitive: PrimitiveTopology,
    ) -> Self {
        Self {
            shader,
            pipeline_layout,
            render_pass,
            primitive,
            input_state: Vec::new(),
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            blend: BlendState::default(),
            dynamic_states: DynamicStateFlags::empty(),
        }
    }
}

/// Immutable pipeline state object
pub struct PipelineState<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    primitive: Cell<PrimitiveTopology>,
    dynamic_states: Cell<DynamicStateFlags>,
    info: RefCell<Option<PipelineStateInfo<B>>>,
    native: NativeSlot<B::PipelineState>,
}

impl<B: Backend> PipelineState<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::PipelineState),
            device: device.shared.clone(),
            primitive: Cell::new(PrimitiveTopology::default()),
            dynamic_states: Cell::new(DynamicStateFlags::empty()),
            info: RefCell::new(None),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &PipelineStateInfo<B>) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if !info.shader.is_ready() || !info.pipeline_layout.is_ready() || !info.render_pass.is_ready() {
            gfx_error!(
                SOURCE,
                "Pipeline state needs a ready shader, pipeline layout and render pass ({:?}, {:?}, {:?})",
                info.shader.status(),
                info.pipeline_layout.status(),
                info.render_pass.status()
            );
            return false;
        }
        let color_count = info.render_pass.info().color_attachments.len();
        if info.blend.targets.len() > color_count.max(1) {
            gfx_error!(
                SOURCE,
                "{} blend targets for a render pass with {} color attachments",
                info.blend.targets.len(),
                color_count
            );
            return false;
        }

        let created = self.device.backend.borrow_mut().create_pipeline_state(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                self.primitive.set(info.primitive);
                self.dynamic_states.set(info.dynamic_states);
                *self.info.borrow_mut() = Some(info.clone());
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create pipeline state: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_pipeline_state(native));
        }
        self.info.borrow_mut().take();
        self.object.set_status(ObjectStatus::Unready);
    }

    pub fn primitive(&self) -> PrimitiveTopology {
        self.primitive.get()
    }

    pub fn dynamic_states(&self) -> DynamicStateFlags {
        self.dynamic_states.get()
    }

    /// Render pass the pipeline was built for (None unless ready)
    pub fn render_pass(&self) -> Option<Rc<RenderPass<B>>> {
        self.info.borrow().as_ref().map(|info| info.render_pass.clone())
    }

    /// Whether the pipeline can draw inside `render_pass`
    pub fn is_compatible_with(&self, render_pass: &RenderPass<B>) -> bool {
        self.render_pass().is_some_and(|own| own.is_compatible(render_pass))
    }

    /// Creation description (None unless ready)
    pub fn info(&self) -> Option<Ref<'_, PipelineStateInfo<B>>> {
        Ref::filter_map(self.info.borrow(), Option::as_ref).ok()
    }

    pub fn native(&self) -> Option<Ref<'_, B::PipelineState>> {
        self.native.get()
    }

    pub fn native_mut(&self) -> Option<RefMut<'_, B::PipelineState>> {
        self.native.get_mut()
    }
}

impl<B: Backend> Object for PipelineState<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for PipelineState<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
