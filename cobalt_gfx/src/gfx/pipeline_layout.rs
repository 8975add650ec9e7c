/// Pipeline layout: the descriptor set layouts a pipeline binds, by set index

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, DescriptorSetLayout, Device, GfxObject, Object, ObjectStatus, ObjectType};
use crate::gfx_error;

const SOURCE: &str = "cobalt::PipelineLayout";

/// Descriptor for creating a pipeline layout
pub struct PipelineLayoutInfo<B: Backend> {
    pub set_layouts: Vec<Rc<DescriptorSetLayout<B>>>,
}

/// Pipeline layout resource
pub struct PipelineLayout<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    set_layouts: RefCell<Vec<Rc<DescriptorSetLayout<B>>>>,
    /// Set index -> first slot in the flattened dynamic offset array
    dynamic_offset_indices: RefCell<Vec<u32>>,
    native: NativeSlot<B::PipelineLayout>,
}

impl<B: Backend> PipelineLayout<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::PipelineLayout),
            device: device.shared.clone(),
            set_layouts: RefCell::new(Vec::new()),
            dynamic_offset_indices: RefCell::new(Vec::new()),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &PipelineLayoutInfo<B>) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if let Some(set) = info.set_layouts.iter().position(|layout| !layout.is_ready()) {
            gfx_error!(SOURCE, "Descriptor set layout {} is not ready", set);
            return false;
        }

        let mut dynamic_offset_indices = Vec::with_capacity(info.set_layouts.len());
        let mut next = 0;
        for layout in &info.set_layouts {
            dynamic_offset_indices.push(next);
            next += layout.dynamic_offset_count();
        }

        let created = self.device.backend.borrow_mut().create_pipeline_layout(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                *self.set_layouts.borrow_mut() = info.set_layouts.clone();
                *self.dynamic_offset_indices.borrow_mut() = dynamic_offset_indices;
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create pipeline layout: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_pipeline_layout(native));
        }
        self.set_layouts.borrow_mut().clear();
        self.object.set_status(ObjectStatus::Unready);
    }

    pub fn set_layouts(&self) -> Ref<'_, [Rc<DescriptorSetLayout<B>>]> {
        Ref::map(self.set_layouts.borrow(), Vec::as_slice)
    }

    /// First flattened dynamic offset slot of `set`
    pub fn dynamic_offset_index(&self, set: u32) -> Option<u32> {
        self.dynamic_offset_indices.borrow().get(set as usize).copied()
    }

    /// Total dynamic offsets across every set
    pub fn dynamic_offset_count(&self) -> u32 {
        self.set_layouts.borrow().iter().map(|layout| layout.dynamic_offset_count()).sum()
    }

    pub fn native(&self) -> Option<Ref<'_, B::PipelineLayout>> {
        self.native.get()
    }
}

impl<B: Backend> Object for PipelineLayout<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for PipelineLayout<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
