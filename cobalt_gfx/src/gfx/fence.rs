/// Fence: CPU-side wait for submitted work

use std::cell::{Cell, Ref};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Device, GfxObject, Object, ObjectStatus, ObjectType};
use crate::{gfx_debug, gfx_error};

const SOURCE: &str = "cobalt::Fence";

/// Fence resource
pub struct Fence<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    signaled: Cell<bool>,
    native: NativeSlot<B::Fence>,
}

impl<B: Backend> Fence<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Fence),
            device: device.shared.clone(),
            signaled: Cell::new(false),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        let created = self.device.backend.borrow_mut().create_fence();
        match created {
            Ok(native) => {
                self.native.set(native);
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create fence: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_fence(native));
        }
        self.signaled.set(false);
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Arm the fence behind the work submitted so far
    pub(crate) fn signal(&self) -> Result<()> {
        self.object.ensure_ready(SOURCE, "signal")?;
        let mut native = self.native.get_mut().ok_or_else(missing_native)?;
        self.device.backend.borrow_mut().signal_fence(&mut native)?;
        self.signaled.set(true);
        Ok(())
    }

    /// Block until the work behind the fence completed
    ///
    /// Waiting on a fence that was never submitted returns immediately.
    pub fn wait(&self) -> Result<()> {
        self.object.ensure_ready(SOURCE, "wait")?;
        if !self.signaled.get() {
            gfx_debug!(SOURCE, "wait() on a fence that was never submitted");
            return Ok(());
        }
        let mut native = self.native.get_mut().ok_or_else(missing_native)?;
        self.device.backend.borrow_mut().wait_fence(&mut native)
    }

    /// Return the fence to its unsignaled state
    pub fn reset(&self) -> Result<()> {
        self.object.ensure_ready(SOURCE, "reset")?;
        let mut native = self.native.get_mut().ok_or_else(missing_native)?;
        self.device.backend.borrow_mut().reset_fence(&mut native);
        self.signaled.set(false);
        Ok(())
    }

    /// True once the fence was submitted and not reset since
    pub fn is_signaled(&self) -> bool {
        self.signaled.get()
    }

    pub fn native(&self) -> Option<Ref<'_, B::Fence>> {
        self.native.get()
    }
}

impl<B: Backend> Object for Fence<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for Fence<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn missing_native() -> Error {
    gfx_error!(SOURCE, "Fence has no native object");
    Error::InvalidResource("fence has no native object".to_string())
}
