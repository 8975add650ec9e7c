/// Shader resource: stage sources plus the uniform declarations used to bind them

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use bitflags::bitflags;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Device, Format, GfxObject, Object, ObjectStatus, ObjectType};
use crate::gfx_error;

const SOURCE: &str = "cobalt::Shader";

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub fn flag(self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

bitflags! {
    /// Set of shader stages (binding visibility)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
        const ALL = Self::VERTEX.bits() | Self::FRAGMENT.bits() | Self::COMPUTE.bits();
    }
}

/// Source of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStageInfo {
    pub stage: ShaderStage,
    pub source: String,
}

/// Vertex input declared by the shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderAttribute {
    pub name: String,
    pub location: u32,
    pub format: Format,
}

/// Uniform block declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub set: u32,
    pub binding: u32,
    pub name: String,
    /// Size in bytes
    pub size: u32,
    pub count: u32,
}

/// Combined texture/sampler declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSamplerTexture {
    pub set: u32,
    pub binding: u32,
    pub name: String,
    pub count: u32,
}

/// Descriptor for creating a shader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInfo {
    pub name: String,
    pub stages: Vec<ShaderStageInfo>,
    pub attributes: Vec<ShaderAttribute>,
    pub blocks: Vec<UniformBlock>,
    pub samplers: Vec<UniformSamplerTexture>,
}

/// Shader resource
pub struct Shader<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    info: RefCell<ShaderInfo>,
    native: NativeSlot<B::Shader>,
}

impl<B: Backend> Shader<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Shader),
            device: device.shared.clone(),
            info: RefCell::new(ShaderInfo::default()),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &ShaderInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if !validate(info) {
            return false;
        }

        let created = self.device.backend.borrow_mut().create_shader(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                *self.info.borrow_mut() = info.clone();
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create shader '{}': {}", info.name, err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_shader(native));
        }
        self.object.set_status(ObjectStatus::Unready);
    }

    pub fn info(&self) -> Ref<'_, ShaderInfo> {
        self.info.borrow()
    }

    pub fn name(&self) -> String {
        self.info.borrow().name.clone()
    }

    pub fn native(&self) -> Option<Ref<'_, B::Shader>> {
        self.native.get()
    }

    pub fn native_mut(&self) -> Option<RefMut<'_, B::Shader>> {
        self.native.get_mut()
    }
}

impl<B: Backend> Object for Shader<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for Shader<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn validate(info: &ShaderInfo) -> bool {
    if info.stages.is_empty() {
        gfx_error!(SOURCE, "Shader '{}' has no stages", info.name);
        return false;
    }
    let mut seen = ShaderStageFlags::empty();
    for stage in &info.stages {
        if seen.contains(stage.stage.flag()) {
            gfx_error!(SOURCE, "Shader '{}' declares {:?} twice", info.name, stage.stage);
            return false;
        }
        seen |= stage.stage.flag();
    }
    if seen.contains(ShaderStageFlags::COMPUTE) && seen != ShaderStageFlags::COMPUTE {
        gfx_error!(SOURCE, "Shader '{}' mixes compute with graphics stages", info.name);
        return false;
    }
    if !seen.contains(ShaderStageFlags::COMPUTE)
        && !seen.contains(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT)
    {
        gfx_error!(SOURCE, "Shader '{}' needs both vertex and fragment stages", info.name);
        return false;
    }
    true
}
