/// Descriptor set layout: the ordered binding slots a descriptor set provides

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Device, GfxObject, Object, ObjectStatus, ObjectType, ShaderStageFlags};
use crate::gfx_error;

const SOURCE: &str = "cobalt::DescriptorSetLayout";

/// Marker for binding numbers absent from a layout
const INVALID_INDEX: u32 = u32::MAX;

/// Kind of resource a binding slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    /// Uniform buffer bound with a per-bind dynamic offset
    DynamicUniformBuffer,
    StorageBuffer,
    DynamicStorageBuffer,
    /// Texture and sampler combined in one slot
    SamplerTexture,
    Sampler,
    Texture,
}

impl DescriptorType {
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            DescriptorType::UniformBuffer
                | DescriptorType::DynamicUniformBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::DynamicStorageBuffer
        )
    }

    pub fn is_dynamic(self) -> bool {
        matches!(self, DescriptorType::DynamicUniformBuffer | DescriptorType::DynamicStorageBuffer)
    }

    pub fn accepts_texture(self) -> bool {
        matches!(self, DescriptorType::SamplerTexture | DescriptorType::Texture)
    }

    pub fn accepts_sampler(self) -> bool {
        matches!(self, DescriptorType::SamplerTexture | DescriptorType::Sampler)
    }
}

/// One binding slot (possibly an array) of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    /// Array size
    pub count: u32,
    pub stage_flags: ShaderStageFlags,
}

impl DescriptorSetLayoutBinding {
    pub fn new(binding: u32, descriptor_type: DescriptorType, stage_flags: ShaderStageFlags) -> Self {
        Self {
            binding,
            descriptor_type,
            count: 1,
            stage_flags,
        }
    }
}

/// Descriptor for creating a descriptor set layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutInfo {
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

/// Descriptor set layout resource
pub struct DescriptorSetLayout<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    info: RefCell<DescriptorSetLayoutInfo>,
    /// Binding number -> first flat descriptor index
    binding_indices: RefCell<Vec<u32>>,
    /// Flat descriptor index -> position in `info.bindings`
    descriptor_owners: RefCell<Vec<u32>>,
    dynamic_offset_count: Cell<u32>,
    native: NativeSlot<B::DescriptorSetLayout>,
}

impl<B: Backend> DescriptorSetLayout<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::DescriptorSetLayout),
            device: device.shared.clone(),
            info: RefCell::new(DescriptorSetLayoutInfo::default()),
            binding_indices: RefCell::new(Vec::new()),
            descriptor_owners: RefCell::new(Vec::new()),
            dynamic_offset_count: Cell::new(0),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &DescriptorSetLayoutInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }

        let max_binding = info.bindings.iter().map(|b| b.binding + 1).max().unwrap_or(0);
        let mut binding_indices = vec![INVALID_INDEX; max_binding as usize];
        let mut descriptor_owners = Vec::new();
        let mut dynamic_offset_count = 0;
        for (position, binding) in info.bindings.iter().enumerate() {
            if binding.count == 0 {
                gfx_error!(SOURCE, "Binding {} has an array size of 0", binding.binding);
                return false;
            }
            let slot = &mut binding_indices[binding.binding as usize];
            if *slot != INVALID_INDEX {
                gfx_error!(SOURCE, "Binding {} is declared twice", binding.binding);
                return false;
            }
            *slot = descriptor_owners.len() as u32;
            descriptor_owners.extend(std::iter::repeat(position as u32).take(binding.count as usize));
            if binding.descriptor_type.is_dynamic() {
                dynamic_offset_count += binding.count;
            }
        }

        let created = self.device.backend.borrow_mut().create_descriptor_set_layout(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                *self.info.borrow_mut() = info.clone();
                *self.binding_indices.borrow_mut() = binding_indices;
                *self.descriptor_owners.borrow_mut() = descriptor_owners;
                self.dynamic_offset_count.set(dynamic_offset_count);
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create descriptor set layout: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_descriptor_set_layout(native));
        }
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Flat descriptor index of element `index` of `binding`
    pub fn descriptor_index(&self, binding: u32, index: u32) -> Option<usize> {
        let first = *self.binding_indices.borrow().get(binding as usize)?;
        if first == INVALID_INDEX {
            return None;
        }
        let layout_binding = self.binding(binding)?;
        (index < layout_binding.count).then_some((first + index) as usize)
    }

    /// Layout entry declaring `binding`
    pub fn binding(&self, binding: u32) -> Option<DescriptorSetLayoutBinding> {
        self.info.borrow().bindings.iter().find(|b| b.binding == binding).copied()
    }

    /// Layout entry owning flat descriptor `descriptor`
    pub fn binding_of_descriptor(&self, descriptor: usize) -> Option<DescriptorSetLayoutBinding> {
        let position = *self.descriptor_owners.borrow().get(descriptor)?;
        self.info.borrow().bindings.get(position as usize).copied()
    }

    /// Total descriptors including array elements
    pub fn descriptor_count(&self) -> usize {
        self.descriptor_owners.borrow().len()
    }

    /// Dynamic offsets expected when a set of this layout is bound
    pub fn dynamic_offset_count(&self) -> u32 {
        self.dynamic_offset_count.get()
    }

    pub fn info(&self) -> Ref<'_, DescriptorSetLayoutInfo> {
        self.info.borrow()
    }

    pub fn native(&self) -> Option<Ref<'_, B::DescriptorSetLayout>> {
        self.native.get()
    }
}

impl<B: Backend> Object for DescriptorSetLayout<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for DescriptorSetLayout<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
