/// Descriptor set: resources bound to the slots of a descriptor set layout
///
/// Binding calls only stage the descriptor and raise the dirty flag; the
/// backend sees the set once `update()` runs. A bind whose resource does not
/// fit the slot's descriptor type is logged and leaves the slot untouched.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{
    Backend, Buffer, BufferUsage, DescriptorSetLayout, DescriptorType, Device, GfxObject, Object,
    ObjectStatus, ObjectType, Sampler, Texture,
};
use crate::gfx_error;

const SOURCE: &str = "cobalt::DescriptorSet";

/// Contents of one descriptor slot
pub struct Descriptor<B: Backend> {
    pub descriptor_type: DescriptorType,
    pub buffer: Option<Rc<Buffer<B>>>,
    pub texture: Option<Rc<Texture<B>>>,
    pub sampler: Option<Rc<Sampler<B>>>,
}

impl<B: Backend> Descriptor<B> {
    fn empty(descriptor_type: DescriptorType) -> Self {
        Self {
            descriptor_type,
            buffer: None,
            texture: None,
            sampler: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none() && self.texture.is_none() && self.sampler.is_none()
    }
}

impl<B: Backend> Clone for Descriptor<B> {
    fn clone(&self) -> Self {
        Self {
            descriptor_type: self.descriptor_type,
            buffer: self.buffer.clone(),
            texture: self.texture.clone(),
            sampler: self.sampler.clone(),
        }
    }
}

/// Descriptor for creating a descriptor set
pub struct DescriptorSetInfo<B: Backend> {
    pub layout: Rc<DescriptorSetLayout<B>>,
}

/// Descriptor set resource
pub struct DescriptorSet<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    layout: RefCell<Option<Rc<DescriptorSetLayout<B>>>>,
    descriptors: RefCell<Vec<Descriptor<B>>>,
    dirty: Cell<bool>,
    native: NativeSlot<B::DescriptorSet>,
}

impl<B: Backend> DescriptorSet<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::DescriptorSet),
            device: device.shared.clone(),
            layout: RefCell::new(None),
            descriptors: RefCell::new(Vec::new()),
            dirty: Cell::new(false),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &DescriptorSetInfo<B>) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if !info.layout.is_ready() {
            gfx_error!(SOURCE, "Descriptor set layout is not ready");
            return false;
        }

        let descriptors: Vec<Descriptor<B>> = (0..info.layout.descriptor_count())
            .filter_map(|index| info.layout.binding_of_descriptor(index))
            .map(|binding| Descriptor::empty(binding.descriptor_type))
            .collect();

        let created = self.device.backend.borrow_mut().create_descriptor_set(&info.layout);
        match created {
            Ok(native) => {
                self.native.set(native);
                *self.layout.borrow_mut() = Some(info.layout.clone());
                *self.descriptors.borrow_mut() = descriptors;
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create descriptor set: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_descriptor_set(native));
        }
        self.descriptors.borrow_mut().clear();
        self.layout.borrow_mut().take();
        self.dirty.set(false);
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Stage `buffer` into element `index` of `binding`
    pub fn bind_buffer(&self, binding: u32, buffer: &Rc<Buffer<B>>, index: u32) -> Result<()> {
        let slot = self.slot(binding, index, "bind_buffer")?;
        let mut descriptors = self.descriptors.borrow_mut();
        let descriptor = &mut descriptors[slot];

        let required = match descriptor.descriptor_type {
            DescriptorType::UniformBuffer | DescriptorType::DynamicUniformBuffer => BufferUsage::UNIFORM,
            DescriptorType::StorageBuffer | DescriptorType::DynamicStorageBuffer => BufferUsage::STORAGE,
            other => return Err(mismatch("bind_buffer", binding, other)),
        };
        if !buffer.usage().contains(required) {
            gfx_error!(
                SOURCE,
                "bind_buffer: binding {} needs {:?} usage, buffer has {:?}",
                binding,
                required,
                buffer.usage()
            );
            return Err(Error::InvalidOperation("buffer usage does not fit the binding".to_string()));
        }

        if !same(&descriptor.buffer, buffer) {
            descriptor.buffer = Some(buffer.clone());
            self.dirty.set(true);
        }
        Ok(())
    }

    /// Stage `texture` into element `index` of `binding`
    pub fn bind_texture(&self, binding: u32, texture: &Rc<Texture<B>>, index: u32) -> Result<()> {
        let slot = self.slot(binding, index, "bind_texture")?;
        let mut descriptors = self.descriptors.borrow_mut();
        let descriptor = &mut descriptors[slot];
        if !descriptor.descriptor_type.accepts_texture() {
            return Err(mismatch("bind_texture", binding, descriptor.descriptor_type));
        }

        if !same(&descriptor.texture, texture) {
            descriptor.texture = Some(texture.clone());
            self.dirty.set(true);
        }
        Ok(())
    }

    /// Stage `sampler` into element `index` of `binding`
    pub fn bind_sampler(&self, binding: u32, sampler: &Rc<Sampler<B>>, index: u32) -> Result<()> {
        let slot = self.slot(binding, index, "bind_sampler")?;
        let mut descriptors = self.descriptors.borrow_mut();
        let descriptor = &mut descriptors[slot];
        if !descriptor.descriptor_type.accepts_sampler() {
            return Err(mismatch("bind_sampler", binding, descriptor.descriptor_type));
        }

        if !same(&descriptor.sampler, sampler) {
            descriptor.sampler = Some(sampler.clone());
            self.dirty.set(true);
        }
        Ok(())
    }

    /// Push staged descriptors to the backend; a no-op when nothing changed
    pub fn update(&self) -> Result<()> {
        self.object.ensure_ready(SOURCE, "update")?;
        if !self.dirty.get() {
            return Ok(());
        }

        {
            let descriptors = self.descriptors.borrow();
            let mut native = self.native.get_mut().ok_or_else(|| {
                gfx_error!(SOURCE, "update: descriptor set has no native object");
                Error::InvalidResource("descriptor set has no native object".to_string())
            })?;
            self.device
                .backend
                .borrow_mut()
                .update_descriptor_set(&mut native, &descriptors)?;
        }
        self.dirty.set(false);
        Ok(())
    }

    /// Staged changes not yet pushed by `update()`
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn get_buffer(&self, binding: u32, index: u32) -> Option<Rc<Buffer<B>>> {
        let slot = self.layout()?.descriptor_index(binding, index)?;
        self.descriptors.borrow().get(slot)?.buffer.clone()
    }

    pub fn get_texture(&self, binding: u32, index: u32) -> Option<Rc<Texture<B>>> {
        let slot = self.layout()?.descriptor_index(binding, index)?;
        self.descriptors.borrow().get(slot)?.texture.clone()
    }

    pub fn get_sampler(&self, binding: u32, index: u32) -> Option<Rc<Sampler<B>>> {
        let slot = self.layout()?.descriptor_index(binding, index)?;
        self.descriptors.borrow().get(slot)?.sampler.clone()
    }

    pub fn layout(&self) -> Option<Rc<DescriptorSetLayout<B>>> {
        self.layout.borrow().clone()
    }

    /// Staged descriptors in flat layout order
    pub fn descriptors(&self) -> Ref<'_, [Descriptor<B>]> {
        Ref::map(self.descriptors.borrow(), Vec::as_slice)
    }

    pub fn native(&self) -> Option<Ref<'_, B::DescriptorSet>> {
        self.native.get()
    }

    pub fn native_mut(&self) -> Option<RefMut<'_, B::DescriptorSet>> {
        self.native.get_mut()
    }

    fn slot(&self, binding: u32, index: u32, operation: &str) -> Result<usize> {
        self.object.ensure_ready(SOURCE, operation)?;
        self.layout()
            .and_then(|layout| layout.descriptor_index(binding, index))
            .ok_or_else(|| {
                gfx_error!(SOURCE, "{}: binding {} element {} is not in the layout", operation, binding, index);
                Error::InvalidOperation(format!("binding {binding}[{index}] does not exist"))
            })
    }
}

impl<B: Backend> Object for DescriptorSet<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for DescriptorSet<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn same<T>(current: &Option<Rc<T>>, candidate: &Rc<T>) -> bool {
    current.as_ref().is_some_and(|bound| Rc::ptr_eq(bound, candidate))
}

fn mismatch(operation: &str, binding: u32, descriptor_type: DescriptorType) -> Error {
    gfx_error!(SOURCE, "{}: binding {} is a {:?} slot", operation, binding, descriptor_type);
    Error::InvalidOperation(format!("binding {binding} does not accept this resource"))
}

#[cfg(test)]
#[path = "descriptor_set_tests.rs"]
mod tests;
