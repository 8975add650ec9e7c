/// Framebuffer: concrete attachments for a render pass
///
/// Attachment formats must match the render pass. A framebuffer with no
/// textures at all targets the device surface.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Device, GfxObject, Object, ObjectStatus, ObjectType, RenderPass, Texture};
use crate::gfx_error;

const SOURCE: &str = "cobalt::Framebuffer";

/// Descriptor for creating a framebuffer
pub struct FramebufferInfo<B: Backend> {
    pub render_pass: Rc<RenderPass<B>>,
    pub color_textures: Vec<Rc<Texture<B>>>,
    pub depth_stencil_texture: Option<Rc<Texture<B>>>,
}

impl<B: Backend> FramebufferInfo<B> {
    /// Framebuffer rendering to the device surface
    pub fn surface(render_pass: Rc<RenderPass<B>>) -> Self {
        Self {
            render_pass,
            color_textures: Vec::new(),
            depth_stencil_texture: None,
        }
    }

    pub fn is_surface(&self) -> bool {
        self.color_textures.is_empty() && self.depth_stencil_texture.is_none()
    }
}

/// Framebuffer resource
pub struct Framebuffer<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    render_pass: RefCell<Option<Rc<RenderPass<B>>>>,
    color_textures: RefCell<Vec<Rc<Texture<B>>>>,
    depth_stencil_texture: RefCell<Option<Rc<Texture<B>>>>,
    native: NativeSlot<B::Framebuffer>,
}

impl<B: Backend> Framebuffer<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Framebuffer),
            device: device.shared.clone(),
            render_pass: RefCell::new(None),
            color_textures: RefCell::new(Vec::new()),
            depth_stencil_texture: RefCell::new(None),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &FramebufferInfo<B>) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if !validate(info) {
            return false;
        }

        let created = self.device.backend.borrow_mut().create_framebuffer(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                *self.render_pass.borrow_mut() = Some(info.render_pass.clone());
                *self.color_textures.borrow_mut() = info.color_textures.clone();
                *self.depth_stencil_texture.borrow_mut() = info.depth_stencil_texture.clone();
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create framebuffer: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_framebuffer(native));
        }
        self.render_pass.borrow_mut().take();
        self.color_textures.borrow_mut().clear();
        self.depth_stencil_texture.borrow_mut().take();
        self.object.set_status(ObjectStatus::Unready);
    }

    pub fn render_pass(&self) -> Option<Rc<RenderPass<B>>> {
        self.render_pass.borrow().clone()
    }

    pub fn color_textures(&self) -> Ref<'_, [Rc<Texture<B>>]> {
        Ref::map(self.color_textures.borrow(), Vec::as_slice)
    }

    pub fn depth_stencil_texture(&self) -> Option<Rc<Texture<B>>> {
        self.depth_stencil_texture.borrow().clone()
    }

    /// True when rendering to the device surface
    pub fn is_surface(&self) -> bool {
        self.color_textures.borrow().is_empty() && self.depth_stencil_texture.borrow().is_none()
    }

    pub fn native(&self) -> Option<Ref<'_, B::Framebuffer>> {
        self.native.get()
    }
}

impl<B: Backend> Object for Framebuffer<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for Framebuffer<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn validate<B: Backend>(info: &FramebufferInfo<B>) -> bool {
    if !info.render_pass.is_ready() {
        gfx_error!(SOURCE, "Framebuffer render pass is not ready");
        return false;
    }
    if info.is_surface() {
        return true;
    }

    let pass = info.render_pass.info();
    if info.color_textures.len() != pass.color_attachments.len() {
        gfx_error!(
            SOURCE,
            "{} color textures for {} color attachments",
            info.color_textures.len(),
            pass.color_attachments.len()
        );
        return false;
    }
    for (index, (texture, attachment)) in info.color_textures.iter().zip(&pass.color_attachments).enumerate() {
        if !texture.is_ready() {
            gfx_error!(SOURCE, "Color texture {} is not ready", index);
            return false;
        }
        if texture.format() != attachment.format {
            gfx_error!(
                SOURCE,
                "Color texture {} is {:?}, render pass expects {:?}",
                index,
                texture.format(),
                attachment.format
            );
            return false;
        }
    }

    match (&info.depth_stencil_texture, &pass.depth_stencil_attachment) {
        (None, None) => true,
        (Some(texture), Some(attachment)) => {
            if !texture.is_ready() {
                gfx_error!(SOURCE, "Depth-stencil texture is not ready");
                return false;
            }
            if texture.format() != attachment.format {
                gfx_error!(
                    SOURCE,
                    "Depth-stencil texture is {:?}, render pass expects {:?}",
                    texture.format(),
                    attachment.format
                );
                return false;
            }
            true
        }
        (Some(_), None) => {
            gfx_error!(SOURCE, "Depth-stencil texture given but render pass has no depth attachment");
            false
        }
        (None, Some(_)) => {
            gfx_error!(SOURCE, "Render pass expects a depth-stencil texture");
            false
        }
    }
}
