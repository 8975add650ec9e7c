/// Pixel and vertex attribute formats, and the byte-size arithmetic built on them
///
/// One table serves textures, render pass attachments and vertex attributes.
/// Every format maps to a `FormatInfo` giving its byte size (per texel, or per
/// block for compressed formats), component count, numeric class and
/// alpha/depth/stencil/compressed flags.

/// Numeric class of a format's components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// No numeric interpretation (UNKNOWN)
    None,
    /// Unsigned normalized
    Unorm,
    /// Signed normalized
    Snorm,
    /// Unsigned integer
    Uint,
    /// Signed integer
    Int,
    /// Unsigned float (packed HDR formats)
    Ufloat,
    /// Signed float
    Float,
}

/// Static properties of a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub name: &'static str,
    /// Bytes per texel, or bytes per block when `is_compressed`
    pub size: u32,
    /// Component count
    pub count: u32,
    pub format_type: FormatType,
    pub has_alpha: bool,
    pub has_depth: bool,
    pub has_stencil: bool,
    pub is_compressed: bool,
    /// Block width in texels (1 for uncompressed formats)
    pub block_width: u32,
    /// Block height in texels (1 for uncompressed formats)
    pub block_height: u32,
}

impl FormatInfo {
    const fn color(name: &'static str, size: u32, count: u32, format_type: FormatType, has_alpha: bool) -> Self {
        Self {
            name,
            size,
            count,
            format_type,
            has_alpha,
            has_depth: false,
            has_stencil: false,
            is_compressed: false,
            block_width: 1,
            block_height: 1,
        }
    }

    const fn depth(name: &'static str, size: u32, count: u32, format_type: FormatType, has_stencil: bool) -> Self {
        Self {
            name,
            size,
            count,
            format_type,
            has_alpha: false,
            has_depth: true,
            has_stencil,
            is_compressed: false,
            block_width: 1,
            block_height: 1,
        }
    }

    const fn block(name: &'static str, block_bytes: u32, count: u32, has_alpha: bool, block_width: u32, block_height: u32) -> Self {
        Self {
            name,
            size: block_bytes,
            count,
            format_type: FormatType::Unorm,
            has_alpha,
            has_depth: false,
            has_stencil: false,
            is_compressed: true,
            block_width,
            block_height,
        }
    }
}

/// Texture, attachment and vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(non_camel_case_types)]
pub enum Format {
    #[default]
    UNKNOWN,

    // 8-bit per component
    R8_UNORM,
    R8_SNORM,
    R8_UINT,
    R8_SINT,
    R8G8_UNORM,
    R8G8_SNORM,
    R8G8_UINT,
    R8G8_SINT,
    R8G8B8_UNORM,
    R8G8B8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SNORM,
    R8G8B8A8_UINT,
    R8G8B8A8_SINT,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,

    // 16-bit per component
    R16_UINT,
    R16_SINT,
    R16_SFLOAT,
    R16G16_UINT,
    R16G16_SINT,
    R16G16_SFLOAT,
    R16G16B16A16_UINT,
    R16G16B16A16_SINT,
    R16G16B16A16_SFLOAT,

    // 32-bit per component
    R32_UINT,
    R32_SINT,
    R32_SFLOAT,
    R32G32_UINT,
    R32G32_SINT,
    R32G32_SFLOAT,
    R32G32B32_UINT,
    R32G32B32_SINT,
    R32G32B32_SFLOAT,
    R32G32B32A32_UINT,
    R32G32B32A32_SINT,
    R32G32B32A32_SFLOAT,

    // Packed
    R5G6B5_UNORM,
    R5G5B5A1_UNORM,
    R4G4B4A4_UNORM,
    A2B10G10R10_UNORM,
    B10G11R11_UFLOAT,
    E5B9G9R9_UFLOAT,

    // Depth / stencil
    D16_UNORM,
    D24_UNORM_S8_UINT,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,

    // Block compressed
    BC1_RGB_UNORM,
    BC1_RGBA_UNORM,
    BC2_UNORM,
    BC3_UNORM,
    ETC1_RGB8_UNORM,
    ETC2_RGB8_UNORM,
    ETC2_RGBA8_UNORM,
    EAC_R11_UNORM,
    ASTC_4x4_UNORM,
    ASTC_8x8_UNORM,
}

impl Format {
    /// Static properties of this format
    pub const fn info(self) -> FormatInfo {
        use FormatType::*;
        match self {
            Format::UNKNOWN => FormatInfo::color("UNKNOWN", 0, 0, None, false),

            Format::R8_UNORM => FormatInfo::color("R8_UNORM", 1, 1, Unorm, false),
            Format::R8_SNORM => FormatInfo::color("R8_SNORM", 1, 1, Snorm, false),
            Format::R8_UINT => FormatInfo::color("R8_UINT", 1, 1, Uint, false),
            Format::R8_SINT => FormatInfo::color("R8_SINT", 1, 1, Int, false),
            Format::R8G8_UNORM => FormatInfo::color("R8G8_UNORM", 2, 2, Unorm, false),
            Format::R8G8_SNORM => FormatInfo::color("R8G8_SNORM", 2, 2, Snorm, false),
            Format::R8G8_UINT => FormatInfo::color("R8G8_UINT", 2, 2, Uint, false),
            Format::R8G8_SINT => FormatInfo::color("R8G8_SINT", 2, 2, Int, false),
            Format::R8G8B8_UNORM => FormatInfo::color("R8G8B8_UNORM", 3, 3, Unorm, false),
            Format::R8G8B8_SRGB => FormatInfo::color("R8G8B8_SRGB", 3, 3, Unorm, false),
            Format::R8G8B8A8_UNORM => FormatInfo::color("R8G8B8A8_UNORM", 4, 4, Unorm, true),
            Format::R8G8B8A8_SNORM => FormatInfo::color("R8G8B8A8_SNORM", 4, 4, Snorm, true),
            Format::R8G8B8A8_UINT => FormatInfo::color("R8G8B8A8_UINT", 4, 4, Uint, true),
            Format::R8G8B8A8_SINT => FormatInfo::color("R8G8B8A8_SINT", 4, 4, Int, true),
            Format::R8G8B8A8_SRGB => FormatInfo::color("R8G8B8A8_SRGB", 4, 4, Unorm, true),
            Format::B8G8R8A8_UNORM => FormatInfo::color("B8G8R8A8_UNORM", 4, 4, Unorm, true),
            Format::B8G8R8A8_SRGB => FormatInfo::color("B8G8R8A8_SRGB", 4, 4, Unorm, true),

            Format::R16_UINT => FormatInfo::color("R16_UINT", 2, 1, Uint, false),
            Format::R16_SINT => FormatInfo::color("R16_SINT", 2, 1, Int, false),
            Format::R16_SFLOAT => FormatInfo::color("R16_SFLOAT", 2, 1, Float, false),
            Format::R16G16_UINT => FormatInfo::color("R16G16_UINT", 4, 2, Uint, false),
            Format::R16G16_SINT => FormatInfo::color("R16G16_SINT", 4, 2, Int, false),
            Format::R16G16_SFLOAT => FormatInfo::color("R16G16_SFLOAT", 4, 2, Float, false),
            Format::R16G16B16A16_UINT => FormatInfo::color("R16G16B16A16_UINT", 8, 4, Uint, true),
            Format::R16G16B16A16_SINT => FormatInfo::color("R16G16B16A16_SINT", 8, 4, Int, true),
            Format::R16G16B16A16_SFLOAT => FormatInfo::color("R16G16B16A16_SFLOAT", 8, 4, Float, true),

            Format::R32_UINT => FormatInfo::color("R32_UINT", 4, 1, Uint, false),
            Format::R32_SINT => FormatInfo::color("R32_SINT", 4, 1, Int, false),
            Format::R32_SFLOAT => FormatInfo::color("R32_SFLOAT", 4, 1, Float, false),
            Format::R32G32_UINT => FormatInfo::color("R32G32_UINT", 8, 2, Uint, false),
            Format::R32G32_SINT => FormatInfo::color("R32G32_SINT", 8, 2, Int, false),
            Format::R32G32_SFLOAT => FormatInfo::color("R32G32_SFLOAT", 8, 2, Float, false),
            Format::R32G32B32_UINT => FormatInfo::color("R32G32B32_UINT", 12, 3, Uint, false),
            Format::R32G32B32_SINT => FormatInfo::color("R32G32B32_SINT", 12, 3, Int, false),
            Format::R32G32B32_SFLOAT => FormatInfo::color("R32G32B32_SFLOAT", 12, 3, Float, false),
            Format::R32G32B32A32_UINT => FormatInfo::color("R32G32B32A32_UINT", 16, 4, Uint, true),
            Format::R32G32B32A32_SINT => FormatInfo::color("R32G32B32A32_SINT", 16, 4, Int, true),
            Format::R32G32B32A32_SFLOAT => FormatInfo::color("R32G32B32A32_SFLOAT", 16, 4, Float, true),

            Format::R5G6B5_UNORM => FormatInfo::color("R5G6B5_UNORM", 2, 3, Unorm, false),
            Format::R5G5B5A1_UNORM => FormatInfo::color("R5G5B5A1_UNORM", 2, 4, Unorm, true),
            Format::R4G4B4A4_UNORM => FormatInfo::color("R4G4B4A4_UNORM", 2, 4, Unorm, true),
            Format::A2B10G10R10_UNORM => FormatInfo::color("A2B10G10R10_UNORM", 4, 4, Unorm, true),
            Format::B10G11R11_UFLOAT => FormatInfo::color("B10G11R11_UFLOAT", 4, 3, Ufloat, false),
            Format::E5B9G9R9_UFLOAT => FormatInfo::color("E5B9G9R9_UFLOAT", 4, 3, Ufloat, false),

            Format::D16_UNORM => FormatInfo::depth("D16_UNORM", 2, 1, Unorm, false),
            Format::D24_UNORM_S8_UINT => FormatInfo::depth("D24_UNORM_S8_UINT", 4, 2, Unorm, true),
            Format::D32_SFLOAT => FormatInfo::depth("D32_SFLOAT", 4, 1, Float, false),
            Format::D32_SFLOAT_S8_UINT => FormatInfo::depth("D32_SFLOAT_S8_UINT", 8, 2, Float, true),

            Format::BC1_RGB_UNORM => FormatInfo::block("BC1_RGB_UNORM", 8, 3, false, 4, 4),
            Format::BC1_RGBA_UNORM => FormatInfo::block("BC1_RGBA_UNORM", 8, 4, true, 4, 4),
            Format::BC2_UNORM => FormatInfo::block("BC2_UNORM", 16, 4, true, 4, 4),
            Format::BC3_UNORM => FormatInfo::block("BC3_UNORM", 16, 4, true, 4, 4),
            Format::ETC1_RGB8_UNORM => FormatInfo::block("ETC1_RGB8_UNORM", 8, 3, false, 4, 4),
            Format::ETC2_RGB8_UNORM => FormatInfo::block("ETC2_RGB8_UNORM", 8, 3, false, 4, 4),
            Format::ETC2_RGBA8_UNORM => FormatInfo::block("ETC2_RGBA8_UNORM", 16, 4, true, 4, 4),
            Format::EAC_R11_UNORM => FormatInfo::block("EAC_R11_UNORM", 8, 1, false, 4, 4),
            Format::ASTC_4x4_UNORM => FormatInfo::block("ASTC_4x4_UNORM", 16, 4, true, 4, 4),
            Format::ASTC_8x8_UNORM => FormatInfo::block("ASTC_8x8_UNORM", 16, 4, true, 8, 8),
        }
    }

    /// Bytes per texel (uncompressed) or per block (compressed)
    pub const fn size_bytes(self) -> u32 {
        self.info().size
    }

    pub const fn is_compressed(self) -> bool {
        self.info().is_compressed
    }

    /// True for depth and depth-stencil formats
    pub const fn has_depth(self) -> bool {
        self.info().has_depth
    }

    pub const fn has_stencil(self) -> bool {
        self.info().has_stencil
    }
}

/// Byte size of one `width × height × depth` image in `format`
///
/// Compressed formats round each dimension up to whole blocks:
/// `ceil(w / bw) * ceil(h / bh) * block_bytes * depth`.
pub fn format_size(format: Format, width: u32, height: u32, depth: u32) -> u64 {
    let info = format.info();
    if info.is_compressed {
        let blocks_x = width.div_ceil(info.block_width) as u64;
        let blocks_y = height.div_ceil(info.block_height) as u64;
        blocks_x * blocks_y * info.size as u64 * depth as u64
    } else {
        width as u64 * height as u64 * depth as u64 * info.size as u64
    }
}

/// Byte size of a full mip chain of `mip_levels` levels starting at `width × height × depth`
pub fn format_surface_size(format: Format, width: u32, height: u32, depth: u32, mip_levels: u32) -> u64 {
    (0..mip_levels)
        .map(|level| {
            format_size(
                format,
                (width >> level).max(1),
                (height >> level).max(1),
                (depth >> level).max(1),
            )
        })
        .sum()
}

/// Number of levels in a full mip chain for the given extent
pub fn max_mip_levels(width: u32, height: u32, depth: u32) -> u32 {
    let largest = width.max(height).max(depth).max(1);
    u32::BITS - largest.leading_zeros()
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
