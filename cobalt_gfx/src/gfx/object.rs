/// Object base shared by every device resource
///
/// Each resource carries a type tag and a status. The status starts at
/// `Unready`, becomes `Success` when `initialize` succeeds, `Failed` when the
/// backend rejects the object, and goes back to `Unready` on `destroy`.
/// `initialize` may run at most once per instance.

use std::cell::{Cell, Ref, RefCell, RefMut};

use crate::error::{Error, Result};

/// Kind of device object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Unknown,
    Buffer,
    Texture,
    Sampler,
    Shader,
    RenderPass,
    Framebuffer,
    DescriptorSetLayout,
    PipelineLayout,
    DescriptorSet,
    PipelineState,
    InputAssembler,
    CommandBuffer,
    Queue,
    Fence,
}

/// Lifecycle status of a device object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectStatus {
    /// Not initialized yet, initialization rejected, or destroyed
    #[default]
    Unready,
    /// The backend failed to create the native object
    Failed,
    /// Ready for use
    Success,
}

/// Type tag and lifecycle bookkeeping embedded in every resource
#[derive(Debug)]
pub struct GfxObject {
    object_type: ObjectType,
    status: Cell<ObjectStatus>,
    initialized: Cell<bool>,
}

impl GfxObject {
    pub fn new(object_type: ObjectType) -> Self {
        Self {
            object_type,
            status: Cell::new(ObjectStatus::Unready),
            initialized: Cell::new(false),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn status(&self) -> ObjectStatus {
        self.status.get()
    }

    pub fn is_ready(&self) -> bool {
        self.status.get() == ObjectStatus::Success
    }

    /// Claim the single `initialize` call of this object
    ///
    /// Returns false (and logs) when the object was already initialized once.
    pub(crate) fn claim_initialize(&self, source: &str) -> bool {
        if self.initialized.get() {
            crate::gfx_error!(
                source,
                "{:?} is already initialized, create a new object instead",
                self.object_type
            );
            return false;
        }
        self.initialized.set(true);
        true
    }

    pub(crate) fn set_status(&self, status: ObjectStatus) {
        self.status.set(status);
    }

    /// Error out unless the object is ready, logging the rejected operation
    pub(crate) fn ensure_ready(&self, source: &str, operation: &str) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        crate::gfx_error!(
            source,
            "{} on a {:?} with status {:?}",
            operation,
            self.object_type,
            self.status.get()
        );
        Err(Error::InvalidResource(format!(
            "{:?} is not ready ({:?})",
            self.object_type,
            self.status.get()
        )))
    }
}

/// Common accessors for every device object
pub trait Object {
    /// Embedded object base
    fn object(&self) -> &GfxObject;

    fn object_type(&self) -> ObjectType {
        self.object().object_type()
    }

    fn status(&self) -> ObjectStatus {
        self.object().status()
    }

    fn is_ready(&self) -> bool {
        self.object().is_ready()
    }
}

/// Storage for the backend-native half of a resource
pub(crate) struct NativeSlot<T>(RefCell<Option<T>>);

impl<T> NativeSlot<T> {
    pub(crate) fn new() -> Self {
        Self(RefCell::new(None))
    }

    pub(crate) fn set(&self, native: T) {
        *self.0.borrow_mut() = Some(native);
    }

    pub(crate) fn take(&self) -> Option<T> {
        self.0.borrow_mut().take()
    }

    pub(crate) fn get(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), Option::as_ref).ok()
    }

    pub(crate) fn get_mut(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.0.borrow_mut(), Option::as_mut).ok()
    }
}
