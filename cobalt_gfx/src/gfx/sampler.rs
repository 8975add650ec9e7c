/// Sampler resource

use std::cell::{Cell, Ref};
use std::rc::Rc;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Color, CompareOp, Device, GfxObject, Object, ObjectStatus, ObjectType};
use crate::gfx_error;

const SOURCE: &str = "cobalt::Sampler";

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Only valid as mip filter: sample the base level
    None,
    Point,
    Linear,
    Anisotropic,
}

/// Addressing outside of [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    Wrap,
    Mirror,
    Clamp,
    Border,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerInfo {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mip_filter: Filter,
    pub address_u: Address,
    pub address_v: Address,
    pub address_w: Address,
    pub max_anisotropy: u32,
    /// Depth compare function (None disables compare mode)
    pub compare_op: Option<CompareOp>,
    pub border_color: Color,
    pub mip_lod_bias: f32,
}

impl Default for SamplerInfo {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mip_filter: Filter::None,
            address_u: Address::Wrap,
            address_v: Address::Wrap,
            address_w: Address::Wrap,
            max_anisotropy: 0,
            compare_op: None,
            border_color: Color::ZERO,
            mip_lod_bias: 0.0,
        }
    }
}

/// Sampler resource, independent of any texture
pub struct Sampler<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    info: Cell<SamplerInfo>,
    native: NativeSlot<B::Sampler>,
}

impl<B: Backend> Sampler<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Sampler),
            device: device.shared.clone(),
            info: Cell::new(SamplerInfo::default()),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &SamplerInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if info.min_filter == Filter::None || info.mag_filter == Filter::None {
            gfx_error!(SOURCE, "Filter::None is only valid as mip filter");
            return false;
        }

        let created = self.device.backend.borrow_mut().create_sampler(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                self.info.set(*info);
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create sampler: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_sampler(native));
        }
        self.object.set_status(ObjectStatus::Unready);
    }

    pub fn info(&self) -> SamplerInfo {
        self.info.get()
    }

    pub fn native(&self) -> Option<Ref<'_, B::Sampler>> {
        self.native.get()
    }
}

impl<B: Backend> Object for Sampler<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for Sampler<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
