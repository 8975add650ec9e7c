/// Buffer resource and buffer descriptor

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::mem::size_of;
use std::rc::Rc;

use bitflags::bitflags;
use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{Backend, Device, DrawInfo, GfxObject, Object, ObjectStatus, ObjectType};
use crate::gfx_error;

const SOURCE: &str = "cobalt::Buffer";

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const INDEX = 1 << 2;
        const VERTEX = 1 << 3;
        const UNIFORM = 1 << 4;
        const STORAGE = 1 << 5;
        /// CPU-side list of `DrawInfo` replayed as individual draws
        const INDIRECT = 1 << 6;
    }
}

bitflags! {
    /// Memory placement flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemoryUsage: u32 {
        const DEVICE = 1 << 0;
        const HOST = 1 << 1;
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    pub usage: BufferUsage,
    pub memory_usage: MemoryUsage,
    /// Size in bytes
    pub size: u32,
    /// Size in bytes of one element (vertex, index, draw record)
    pub stride: u32,
}

impl BufferInfo {
    pub fn new(usage: BufferUsage, size: u32, stride: u32) -> Self {
        Self {
            usage,
            memory_usage: MemoryUsage::DEVICE,
            size,
            stride,
        }
    }
}

/// Buffer resource
///
/// Created empty, filled through `update`. Live bytes are accounted in the
/// device's `MemoryStatus` from a successful `initialize` until `destroy`.
pub struct Buffer<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    info: Cell<BufferInfo>,
    draw_infos: RefCell<Vec<DrawInfo>>,
    native: NativeSlot<B::Buffer>,
}

impl<B: Backend> Buffer<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Buffer),
            device: device.shared.clone(),
            info: Cell::new(BufferInfo::new(BufferUsage::empty(), 0, 1)),
            draw_infos: RefCell::new(Vec::new()),
            native: NativeSlot::new(),
        }
    }

    /// Create the native buffer
    ///
    /// Returns false when the description is rejected (the buffer stays
    /// `Unready`) or when the backend fails (`Failed`).
    pub fn initialize(&self, info: &BufferInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if info.usage.is_empty() {
            gfx_error!(SOURCE, "Buffer usage must not be empty");
            return false;
        }

        let mut info = *info;
        if info.usage.contains(BufferUsage::INDIRECT) && info.stride == 0 {
            info.stride = size_of::<DrawInfo>() as u32;
        }
        info.stride = info.stride.max(1);

        let created = self.device.backend.borrow_mut().create_buffer(&info);
        match created {
            Ok(native) => {
                self.native.set(native);
                self.info.set(info);
                self.device.track_buffer_memory(0, info.size as u64);
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create buffer of {} bytes: {}", info.size, err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    /// Release the native buffer and its accounted bytes
    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_buffer(native));
            self.device.track_buffer_memory(self.info.get().size as u64, 0);
        }
        self.draw_infos.borrow_mut().clear();
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Write `data` at byte `offset`
    pub fn update(&self, data: &[u8], offset: u32) -> Result<()> {
        self.object.ensure_ready(SOURCE, "update")?;
        self.check_range(data.len(), offset)?;

        if self.usage().contains(BufferUsage::INDIRECT) {
            self.store_draw_infos(data, offset)?;
        }

        let mut native = self.native_mut().ok_or_else(|| missing_native("update"))?;
        self.device.backend.borrow_mut().update_buffer(&mut native, data, offset)
    }

    /// Write a typed slice (vertices, indices, uniform structs) at byte `offset`
    pub fn update_typed<T: Pod>(&self, data: &[T], offset: u32) -> Result<()> {
        self.update(bytemuck::cast_slice(data), offset)
    }

    /// Replace the draw records of an indirect buffer
    pub fn update_indirect(&self, draws: &[DrawInfo]) -> Result<()> {
        if !self.usage().contains(BufferUsage::INDIRECT) {
            gfx_error!(SOURCE, "update_indirect on a buffer without INDIRECT usage");
            return Err(Error::InvalidOperation("buffer is not an indirect buffer".to_string()));
        }
        self.draw_infos.borrow_mut().clear();
        self.update(bytemuck::cast_slice(draws), 0)
    }

    /// Reallocate to `size` bytes; previous contents are lost
    pub fn resize(&self, size: u32) -> Result<()> {
        self.object.ensure_ready(SOURCE, "resize")?;
        let mut info = self.info.get();
        if info.size == size {
            return Ok(());
        }

        {
            let mut native = self.native_mut().ok_or_else(|| missing_native("resize"))?;
            self.device.backend.borrow_mut().resize_buffer(&mut native, size)?;
        }

        self.device.track_buffer_memory(info.size as u64, size as u64);
        info.size = size;
        self.info.set(info);
        let count = self.count() as usize;
        self.draw_infos.borrow_mut().truncate(count);
        Ok(())
    }

    /// Record draw entries written to an indirect buffer
    pub(crate) fn store_draw_infos(&self, data: &[u8], offset: u32) -> Result<()> {
        let record = size_of::<DrawInfo>();
        if offset as usize % record != 0 || data.len() % record != 0 {
            gfx_error!(
                SOURCE,
                "Indirect update of {} bytes at offset {} is not a whole number of draw records",
                data.len(),
                offset
            );
            return Err(Error::InvalidOperation("misaligned indirect update".to_string()));
        }

        let draws: Vec<DrawInfo> = data
            .chunks_exact(record)
            .map(bytemuck::pod_read_unaligned::<DrawInfo>)
            .collect();
        let first = offset as usize / record;
        let mut stored = self.draw_infos.borrow_mut();
        if stored.len() < first + draws.len() {
            stored.resize(first + draws.len(), DrawInfo::default());
        }
        stored[first..first + draws.len()].copy_from_slice(&draws);
        Ok(())
    }

    pub(crate) fn check_range(&self, len: usize, offset: u32) -> Result<()> {
        let size = self.size() as usize;
        if offset as usize + len > size {
            gfx_error!(
                SOURCE,
                "Update of {} bytes at offset {} overflows buffer of {} bytes",
                len,
                offset,
                size
            );
            return Err(Error::InvalidOperation("buffer update out of range".to_string()));
        }
        Ok(())
    }

    pub fn info(&self) -> BufferInfo {
        self.info.get()
    }

    pub fn usage(&self) -> BufferUsage {
        self.info.get().usage
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        self.info.get().memory_usage
    }

    pub fn size(&self) -> u32 {
        self.info.get().size
    }

    pub fn stride(&self) -> u32 {
        self.info.get().stride
    }

    /// Number of whole elements of `stride` bytes
    pub fn count(&self) -> u32 {
        let info = self.info.get();
        info.size / info.stride
    }

    /// Draw records of an indirect buffer
    pub fn draw_infos(&self) -> Ref<'_, [DrawInfo]> {
        Ref::map(self.draw_infos.borrow(), Vec::as_slice)
    }

    pub fn native(&self) -> Option<Ref<'_, B::Buffer>> {
        self.native.get()
    }

    pub fn native_mut(&self) -> Option<RefMut<'_, B::Buffer>> {
        self.native.get_mut()
    }
}

impl<B: Backend> Object for Buffer<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for Buffer<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn missing_native(operation: &str) -> Error {
    gfx_error!(SOURCE, "{}: buffer has no native object", operation);
    Error::InvalidResource("buffer has no native object".to_string())
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
