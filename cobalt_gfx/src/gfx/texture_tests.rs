//! Unit tests for Texture
//!
//! Tests size accounting, validation, resize and the CPU backup buffer.

use crate::gfx::mock_backend::mock_device;
use crate::gfx::{
    BufferTextureCopy, Extent3D, Format, Object, ObjectStatus, Offset3D, Texture, TextureFlags,
    TextureInfo, TextureType, TextureUsage,
};

fn rgba8(width: u32, height: u32) -> TextureInfo {
    TextureInfo::new_2d(Format::R8G8B8A8_UNORM, TextureUsage::SAMPLED, width, height)
}

// ============================================================================
// SIZE ACCOUNTING
// ============================================================================

#[test]
fn test_texture_size_includes_mip_chain() {
    let device = mock_device();
    let info = TextureInfo { level_count: 3, ..rgba8(4, 4) };
    let texture = device.create_texture(&info).unwrap();

    // 4x4 + 2x2 + 1x1 texels of 4 bytes
    assert_eq!(texture.size(), 84);
    assert_eq!(device.memory_status().texture_size, 84);
}

#[test]
fn test_texture_size_of_cubemap_counts_layers() {
    let device = mock_device();
    let info = TextureInfo {
        layer_count: 6,
        flags: TextureFlags::CUBEMAP,
        ..rgba8(8, 8)
    };
    let texture = device.create_texture(&info).unwrap();
    assert_eq!(texture.size(), 8 * 8 * 4 * 6);
}

#[test]
fn test_texture_resize_applies_memory_delta() {
    let device = mock_device();
    let texture = device.create_texture(&rgba8(16, 16)).unwrap();
    let other = device.create_texture(&rgba8(2, 2)).unwrap();
    assert_eq!(device.memory_status().texture_size, 1024 + 16);

    texture.resize(8, 4).unwrap();
    assert_eq!(texture.width(), 8);
    assert_eq!(texture.height(), 4);
    assert_eq!(device.memory_status().texture_size, 128 + 16);
    assert_eq!(device.backend().count("resize_texture 8x4"), 1);

    drop(other);
    assert_eq!(device.memory_status().texture_size, 128);
}

#[test]
fn test_texture_resize_clamps_mip_levels() {
    let device = mock_device();
    let info = TextureInfo { level_count: 5, ..rgba8(16, 16) };
    let texture = device.create_texture(&info).unwrap();

    texture.resize(2, 2).unwrap();
    assert_eq!(texture.info().level_count, 2);
    assert_eq!(texture.size(), 16 + 4);
}

#[test]
fn test_texture_resize_to_zero_is_rejected() {
    let device = mock_device();
    let texture = device.create_texture(&rgba8(4, 4)).unwrap();
    assert!(texture.resize(0, 4).is_err());
    assert_eq!(texture.width(), 4);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_texture_rejects_invalid_descriptions() {
    let device = mock_device();
    let invalid = [
        TextureInfo { format: Format::UNKNOWN, ..rgba8(4, 4) },
        rgba8(0, 4),
        TextureInfo { depth: 2, ..rgba8(4, 4) },
        TextureInfo { flags: TextureFlags::CUBEMAP, ..rgba8(4, 4) },
        TextureInfo { level_count: 4, ..rgba8(4, 4) },
    ];
    for info in &invalid {
        let texture = Texture::new(&device);
        assert!(!texture.initialize(info), "{:?} should be rejected", info);
        assert_eq!(texture.status(), ObjectStatus::Unready);
    }
    assert_eq!(device.backend().count("create_texture"), 0);
}

#[test]
fn test_3d_texture_accepts_depth() {
    let device = mock_device();
    let info = TextureInfo {
        texture_type: TextureType::Tex3D,
        depth: 4,
        ..rgba8(4, 4)
    };
    let texture = device.create_texture(&info).unwrap();
    assert_eq!(texture.size(), 4 * 4 * 4 * 4);
}

#[test]
fn test_compressed_texture_drops_mipmap_generation() {
    let device = mock_device();
    let info = TextureInfo {
        format: Format::ETC2_RGB8_UNORM,
        flags: TextureFlags::GEN_MIPMAP,
        ..rgba8(8, 8)
    };
    let texture = device.create_texture(&info).unwrap();
    assert!(!texture.flags().contains(TextureFlags::GEN_MIPMAP));
}

// ============================================================================
// BACKUP BUFFER
// ============================================================================

#[test]
fn test_backup_buffer_mirrors_uploads() {
    let device = mock_device();
    let info = TextureInfo {
        format: Format::R8_UNORM,
        flags: TextureFlags::BACKUP_BUFFER,
        ..rgba8(4, 4)
    };
    let texture = device.create_texture(&info).unwrap();
    assert_eq!(texture.backup().len(), 16);

    // 2x2 block at (1, 2)
    let texels = [1u8, 2, 3, 4];
    let region = BufferTextureCopy {
        tex_offset: Offset3D { x: 1, y: 2, z: 0 },
        tex_extent: Extent3D { width: 2, height: 2, depth: 1 },
        ..Default::default()
    };
    device.copy_buffers_to_texture(&[&texels], &texture, &[region]).unwrap();

    let backup = texture.backup();
    assert_eq!(&backup[8..12], &[0, 1, 2, 0]);
    assert_eq!(&backup[12..16], &[0, 3, 4, 0]);
    assert!(backup[..8].iter().all(|&texel| texel == 0));
}

#[test]
fn test_backup_buffer_honors_row_stride() {
    let device = mock_device();
    let info = TextureInfo {
        format: Format::R8_UNORM,
        flags: TextureFlags::BACKUP_BUFFER,
        ..rgba8(2, 2)
    };
    let texture = device.create_texture(&info).unwrap();

    // Source rows are 3 texels wide, only 2 are copied
    let texels = [1u8, 2, 9, 3, 4, 9];
    let region = BufferTextureCopy {
        buffer_stride: 3,
        tex_extent: Extent3D { width: 2, height: 2, depth: 1 },
        ..Default::default()
    };
    device.copy_buffers_to_texture(&[&texels], &texture, &[region]).unwrap();
    assert_eq!(&*texture.backup(), &[1, 2, 3, 4]);
}

#[test]
fn test_texture_without_backup_flag_keeps_no_copy() {
    let device = mock_device();
    let texture = device.create_texture(&rgba8(2, 2)).unwrap();
    let region = BufferTextureCopy {
        tex_extent: Extent3D { width: 2, height: 2, depth: 1 },
        ..Default::default()
    };
    device.copy_buffers_to_texture(&[&[0u8; 16]], &texture, &[region]).unwrap();
    assert!(texture.backup().is_empty());
}
