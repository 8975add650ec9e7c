/// Render pass: attachment formats and load/store behaviour
///
/// Two render passes are compatible when their attachment lists are equal,
/// field by field. Framebuffers and pipeline states are checked against that.

use std::cell::{Cell, Ref, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHasher;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Device, Format, GfxObject, Object, ObjectStatus, ObjectType, SampleCount};
use crate::gfx_error;

const SOURCE: &str = "cobalt::RenderPass";

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    ColorAttachment,
    DepthStencilAttachment,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

/// Color attachment of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorAttachment {
    pub format: Format,
    pub samples: SampleCount,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub begin_layout: ImageLayout,
    pub end_layout: ImageLayout,
}

impl ColorAttachment {
    /// Clear on load, store at the end
    pub fn new(format: Format) -> Self {
        Self {
            format,
            samples: SampleCount::S1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            begin_layout: ImageLayout::Undefined,
            end_layout: ImageLayout::ColorAttachment,
        }
    }
}

/// Depth-stencil attachment of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilAttachment {
    pub format: Format,
    pub samples: SampleCount,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub begin_layout: ImageLayout,
    pub end_layout: ImageLayout,
}

impl DepthStencilAttachment {
    /// Clear on load, contents discarded at the end
    pub fn new(format: Format) -> Self {
        Self {
            format,
            samples: SampleCount::S1,
            depth_load_op: LoadOp::Clear,
            depth_store_op: StoreOp::DontCare,
            stencil_load_op: LoadOp::Clear,
            stencil_store_op: StoreOp::DontCare,
            begin_layout: ImageLayout::Undefined,
            end_layout: ImageLayout::DepthStencilAttachment,
        }
    }
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RenderPassInfo {
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

/// Render pass resource
pub struct RenderPass<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    info: RefCell<RenderPassInfo>,
    hash: Cell<u64>,
    native: NativeSlot<B::RenderPass>,
}

impl<B: Backend> RenderPass<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::RenderPass),
            device: device.shared.clone(),
            info: RefCell::new(RenderPassInfo::default()),
            hash: Cell::new(0),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &RenderPassInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if info.color_attachments.is_empty() && info.depth_stencil_attachment.is_none() {
            gfx_error!(SOURCE, "Render pass has no attachments");
            return false;
        }
        if let Some(bad) = info.color_attachments.iter().find(|a| a.format.has_depth() || a.format == Format::UNKNOWN) {
            gfx_error!(SOURCE, "{:?} is not a color format", bad.format);
            return false;
        }
        if let Some(depth) = &info.depth_stencil_attachment {
            if !depth.format.has_depth() {
                gfx_error!(SOURCE, "{:?} is not a depth format", depth.format);
                return false;
            }
        }

        let created = self.device.backend.borrow_mut().create_render_pass(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                self.hash.set(compute_hash(info));
                *self.info.borrow_mut() = info.clone();
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create render pass: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_render_pass(native));
        }
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Structural equality of the attachment lists
    pub fn is_compatible(&self, other: &RenderPass<B>) -> bool {
        self.hash.get() == other.hash.get() && *self.info.borrow() == *other.info.borrow()
    }

    /// Hash of the attachment lists
    pub fn hash(&self) -> u64 {
        self.hash.get()
    }

    pub fn info(&self) -> Ref<'_, RenderPassInfo> {
        self.info.borrow()
    }

    pub fn native(&self) -> Option<Ref<'_, B::RenderPass>> {
        self.native.get()
    }
}

impl<B: Backend> Object for RenderPass<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for RenderPass<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn compute_hash(info: &RenderPassInfo) -> u64 {
    let mut hasher = FxHasher::default();
    info.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
