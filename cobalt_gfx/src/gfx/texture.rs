/// Texture resource, texture descriptor and texture flags

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{
    format_size, format_surface_size, max_mip_levels, Backend, BufferTextureCopy, Device, Format,
    GfxObject, Object, ObjectStatus, ObjectType, SampleCount,
};
use crate::{gfx_error, gfx_warn};

const SOURCE: &str = "cobalt::Texture";

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Tex1D,
    Tex2D,
    Tex3D,
}

bitflags! {
    /// Texture usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const STORAGE = 1 << 3;
        const COLOR_ATTACHMENT = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
        const INPUT_ATTACHMENT = 1 << 6;
    }
}

bitflags! {
    /// Texture creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        /// Regenerate the mip chain after every upload
        const GEN_MIPMAP = 1 << 0;
        /// Six-layer 2D texture sampled as a cube
        const CUBEMAP = 1 << 1;
        /// Keep a CPU copy of the uploaded base level
        const BACKUP_BUFFER = 1 << 2;
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub texture_type: TextureType,
    pub usage: TextureUsage,
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Array layers (6 for cubemaps)
    pub layer_count: u32,
    /// Mip levels (0 is treated as 1)
    pub level_count: u32,
    pub samples: SampleCount,
    pub flags: TextureFlags,
}

impl Default for TextureInfo {
    fn default() -> Self {
        Self {
            texture_type: TextureType::Tex2D,
            usage: TextureUsage::SAMPLED,
            format: Format::R8G8B8A8_UNORM,
            width: 1,
            height: 1,
            depth: 1,
            layer_count: 1,
            level_count: 1,
            samples: SampleCount::S1,
            flags: TextureFlags::empty(),
        }
    }
}

impl TextureInfo {
    /// Plain 2D texture description
    pub fn new_2d(format: Format, usage: TextureUsage, width: u32, height: u32) -> Self {
        Self {
            format,
            usage,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn is_cubemap(&self) -> bool {
        self.flags.contains(TextureFlags::CUBEMAP)
    }

    /// Bytes of every layer and mip level
    pub fn byte_size(&self) -> u64 {
        format_surface_size(self.format, self.width, self.height, self.depth, self.level_count.max(1))
            * self.layer_count as u64
    }

    /// Bytes of the base level across all layers
    fn base_level_size(&self) -> u64 {
        format_size(self.format, self.width, self.height, self.depth) * self.layer_count as u64
    }
}

/// Texture resource
pub struct Texture<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    info: Cell<TextureInfo>,
    size: Cell<u64>,
    backup: RefCell<Vec<u8>>,
    native: NativeSlot<B::Texture>,
}

impl<B: Backend> Texture<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Texture),
            device: device.shared.clone(),
            info: Cell::new(TextureInfo::default()),
            size: Cell::new(0),
            backup: RefCell::new(Vec::new()),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &TextureInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        let Some(info) = validate(info) else {
            return false;
        };

        let created = self.device.backend.borrow_mut().create_texture(&info);
        match created {
            Ok(native) => {
                let size = info.byte_size();
                self.native.set(native);
                self.info.set(info);
                self.size.set(size);
                self.device.track_texture_memory(0, size);
                if info.flags.contains(TextureFlags::BACKUP_BUFFER) {
                    *self.backup.borrow_mut() = vec![0; info.base_level_size() as usize];
                }
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(
                    SOURCE,
                    "Backend failed to create {:?} texture {}x{}: {}",
                    info.format,
                    info.width,
                    info.height,
                    err
                );
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_texture(native));
            self.device.track_texture_memory(self.size.get(), 0);
            self.size.set(0);
        }
        self.backup.borrow_mut().clear();
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Reallocate at a new base size, keeping format, layers and levels
    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.object.ensure_ready(SOURCE, "resize")?;
        let mut info = self.info.get();
        if info.width == width && info.height == height {
            return Ok(());
        }
        if width == 0 || height == 0 {
            gfx_error!(SOURCE, "Cannot resize texture to {}x{}", width, height);
            return Err(Error::InvalidOperation("zero texture extent".to_string()));
        }

        info.width = width;
        info.height = height;
        info.level_count = info.level_count.min(max_mip_levels(width, height, info.depth));

        {
            let mut native = self.native.get_mut().ok_or_else(|| {
                gfx_error!(SOURCE, "resize: texture has no native object");
                Error::InvalidResource("texture has no native object".to_string())
            })?;
            self.device.backend.borrow_mut().resize_texture(&mut native, &info)?;
        }

        let size = info.byte_size();
        self.device.track_texture_memory(self.size.get(), size);
        self.size.set(size);
        self.info.set(info);
        if info.flags.contains(TextureFlags::BACKUP_BUFFER) {
            *self.backup.borrow_mut() = vec![0; info.base_level_size() as usize];
        }
        Ok(())
    }

    /// Mirror an upload into the CPU backup of the base level
    pub(crate) fn write_backup(&self, buffers: &[&[u8]], regions: &[BufferTextureCopy]) {
        let info = self.info.get();
        if !info.flags.contains(TextureFlags::BACKUP_BUFFER) || info.format.is_compressed() {
            return;
        }
        let mut backup = self.backup.borrow_mut();
        for (region, data) in regions.iter().zip(buffers) {
            if region.tex_subres.mip_level != 0 {
                continue;
            }
            if !copy_region(&mut backup, &info, region, data) {
                gfx_warn!(SOURCE, "Upload region {:?} does not fit the backup buffer", region);
            }
        }
    }

    pub fn info(&self) -> TextureInfo {
        self.info.get()
    }

    pub fn texture_type(&self) -> TextureType {
        self.info.get().texture_type
    }

    pub fn format(&self) -> Format {
        self.info.get().format
    }

    pub fn width(&self) -> u32 {
        self.info.get().width
    }

    pub fn height(&self) -> u32 {
        self.info.get().height
    }

    pub fn flags(&self) -> TextureFlags {
        self.info.get().flags
    }

    /// Bytes accounted for this texture
    pub fn size(&self) -> u64 {
        self.size.get()
    }

    /// CPU copy of the base level (empty without `BACKUP_BUFFER`)
    pub fn backup(&self) -> Ref<'_, [u8]> {
        Ref::map(self.backup.borrow(), Vec::as_slice)
    }

    pub fn native(&self) -> Option<Ref<'_, B::Texture>> {
        self.native.get()
    }

    pub fn native_mut(&self) -> Option<RefMut<'_, B::Texture>> {
        self.native.get_mut()
    }
}

impl<B: Backend> Object for Texture<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for Texture<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn validate(info: &TextureInfo) -> Option<TextureInfo> {
    let mut info = *info;
    if info.format == Format::UNKNOWN {
        gfx_error!(SOURCE, "Texture format must not be UNKNOWN");
        return None;
    }
    if info.width == 0 || info.height == 0 || info.depth == 0 || info.layer_count == 0 {
        gfx_error!(
            SOURCE,
            "Invalid texture extent {}x{}x{} with {} layers",
            info.width,
            info.height,
            info.depth,
            info.layer_count
        );
        return None;
    }
    if info.texture_type != TextureType::Tex3D && info.depth != 1 {
        gfx_error!(SOURCE, "Only 3D textures may have depth > 1");
        return None;
    }
    if info.is_cubemap()
        && (info.texture_type != TextureType::Tex2D || info.layer_count != 6 || info.width != info.height)
    {
        gfx_error!(SOURCE, "Cubemaps must be square 2D textures with 6 layers");
        return None;
    }

    info.level_count = info.level_count.max(1);
    let max_levels = max_mip_levels(info.width, info.height, info.depth);
    if info.level_count > max_levels {
        gfx_error!(
            SOURCE,
            "{} mip levels requested, {}x{}x{} allows {}",
            info.level_count,
            info.width,
            info.height,
            info.depth,
            max_levels
        );
        return None;
    }
    if info.flags.contains(TextureFlags::GEN_MIPMAP) && info.format.is_compressed() {
        gfx_warn!(SOURCE, "Mipmap generation is not available for {:?}", info.format);
        info.flags.remove(TextureFlags::GEN_MIPMAP);
    }
    Some(info)
}

/// Copy one uncompressed region into a tightly packed base-level image
fn copy_region(dst: &mut [u8], info: &TextureInfo, region: &BufferTextureCopy, src: &[u8]) -> bool {
    let bpp = info.format.size_bytes() as usize;
    let extent = region.tex_extent;
    let offset = region.tex_offset;
    if offset.x < 0 || offset.y < 0 || offset.z < 0 {
        return false;
    }
    let (ox, oy, oz) = (offset.x as usize, offset.y as usize, offset.z as usize);
    let (width, height, depth) = (info.width as usize, info.height as usize, info.depth as usize);
    if ox + extent.width as usize > width
        || oy + extent.height as usize > height
        || oz + extent.depth as usize > depth
        || region.tex_subres.base_array_layer + region.tex_subres.layer_count > info.layer_count
    {
        return false;
    }

    let row_length = (if region.buffer_stride > 0 { region.buffer_stride } else { extent.width }) as usize;
    let image_height = (if region.buffer_texture_height > 0 {
        region.buffer_texture_height
    } else {
        extent.height
    }) as usize;
    let row_bytes = extent.width as usize * bpp;

    for layer in 0..region.tex_subres.layer_count as usize {
        let dst_layer = region.tex_subres.base_array_layer as usize + layer;
        for z in 0..extent.depth as usize {
            for y in 0..extent.height as usize {
                let src_row = region.buffer_offset as usize
                    + (((layer * extent.depth as usize + z) * image_height + y) * row_length) * bpp;
                let dst_row = (((dst_layer * depth + oz + z) * height + oy + y) * width + ox) * bpp;
                let (Some(from), Some(to)) = (
                    src.get(src_row..src_row + row_bytes),
                    dst.get_mut(dst_row..dst_row + row_bytes),
                ) else {
                    return false;
                };
                to.copy_from_slice(from);
            }
        }
    }
    true
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
