//! Unit tests for the format table and size arithmetic

use crate::gfx::{format_size, format_surface_size, max_mip_levels, Format, FormatType};

// ============================================================================
// FORMAT INFO
// ============================================================================

#[test]
fn test_uncompressed_texel_sizes() {
    assert_eq!(Format::R8_UNORM.size_bytes(), 1);
    assert_eq!(Format::R8G8B8A8_UNORM.size_bytes(), 4);
    assert_eq!(Format::R16G16B16A16_SFLOAT.size_bytes(), 8);
    assert_eq!(Format::R32G32B32_SFLOAT.size_bytes(), 12);
    assert_eq!(Format::R32G32B32A32_UINT.size_bytes(), 16);
    assert_eq!(Format::R5G6B5_UNORM.size_bytes(), 2);
}

#[test]
fn test_numeric_classes() {
    assert_eq!(Format::R8G8B8A8_SNORM.info().format_type, FormatType::Snorm);
    assert_eq!(Format::R32_SINT.info().format_type, FormatType::Int);
    assert_eq!(Format::R16_UINT.info().format_type, FormatType::Uint);
    assert_eq!(Format::B10G11R11_UFLOAT.info().format_type, FormatType::Ufloat);
    assert_eq!(Format::R32G32_SFLOAT.info().format_type, FormatType::Float);
    assert_eq!(Format::UNKNOWN.info().format_type, FormatType::None);
}

#[test]
fn test_component_counts_and_alpha() {
    let rgba = Format::R8G8B8A8_SRGB.info();
    assert_eq!(rgba.count, 4);
    assert!(rgba.has_alpha);

    let rgb = Format::R8G8B8_UNORM.info();
    assert_eq!(rgb.count, 3);
    assert!(!rgb.has_alpha);
}

#[test]
fn test_depth_stencil_flags() {
    assert!(Format::D16_UNORM.has_depth());
    assert!(!Format::D16_UNORM.has_stencil());
    assert!(Format::D24_UNORM_S8_UINT.has_depth());
    assert!(Format::D24_UNORM_S8_UINT.has_stencil());
    assert!(!Format::R8G8B8A8_UNORM.has_depth());
}

#[test]
fn test_compressed_flags() {
    let etc2 = Format::ETC2_RGBA8_UNORM.info();
    assert!(etc2.is_compressed);
    assert_eq!(etc2.size, 16);
    assert_eq!((etc2.block_width, etc2.block_height), (4, 4));
    assert!(!Format::R8G8B8A8_UNORM.is_compressed());
}

// ============================================================================
// SIZE ARITHMETIC
// ============================================================================

#[test]
fn test_uncompressed_size_is_w_h_d_bpp() {
    assert_eq!(format_size(Format::R8G8B8A8_UNORM, 256, 128, 1), 256 * 128 * 4);
    assert_eq!(format_size(Format::R32_SFLOAT, 4, 4, 4), 4 * 4 * 4 * 4);
}

#[test]
fn test_compressed_size_rounds_up_to_blocks() {
    // 10x10 → 3x3 blocks of 8 bytes
    assert_eq!(format_size(Format::BC1_RGB_UNORM, 10, 10, 1), 3 * 3 * 8);
    // 1x1 still occupies a full block
    assert_eq!(format_size(Format::ETC2_RGBA8_UNORM, 1, 1, 1), 16);
    // 8x8 blocks
    assert_eq!(format_size(Format::ASTC_8x8_UNORM, 17, 8, 1), 3 * 1 * 16);
}

#[test]
fn test_surface_size_sums_mip_chain() {
    // 4x4 RGBA8: 64 + 16 + 4
    assert_eq!(format_surface_size(Format::R8G8B8A8_UNORM, 4, 4, 1, 3), 64 + 16 + 4);
    // Non-square chain clamps the short side at 1: 4x1, 2x1, 1x1
    assert_eq!(format_surface_size(Format::R8_UNORM, 4, 1, 1, 3), 4 + 2 + 1);
}

#[test]
fn test_surface_size_single_level_matches_format_size() {
    assert_eq!(
        format_surface_size(Format::D24_UNORM_S8_UINT, 800, 600, 1, 1),
        format_size(Format::D24_UNORM_S8_UINT, 800, 600, 1)
    );
}

#[test]
fn test_max_mip_levels() {
    assert_eq!(max_mip_levels(1, 1, 1), 1);
    assert_eq!(max_mip_levels(256, 256, 1), 9);
    assert_eq!(max_mip_levels(300, 17, 1), 9);
    assert_eq!(max_mip_levels(0, 0, 0), 1);
}
