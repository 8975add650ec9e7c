/// Conversions from HAL enums and formats to GL enumerants

use cobalt_gfx::cobalt::gfx::{
    Address, BlendFactor, BlendOp, BufferUsage, CompareOp, CullMode, Filter, Format, FormatType,
    FrontFace, IndexType, MemoryUsage, PrimitiveTopology, ShaderStage, StencilOp, TextureInfo,
    TextureType,
};

use crate::gl::{self, GLenum};

/// Internal format, pixel format and pixel type of a texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFormat {
    pub internal_format: GLenum,
    pub format: GLenum,
    /// 0 for compressed formats
    pub ty: GLenum,
}

const fn fmt(internal_format: GLenum, format: GLenum, ty: GLenum) -> Option<GlFormat> {
    Some(GlFormat { internal_format, format, ty })
}

const fn compressed(internal_format: GLenum) -> Option<GlFormat> {
    Some(GlFormat { internal_format, format: internal_format, ty: 0 })
}

/// Convert a texture or attachment format
///
/// BGRA formats are stored as RGBA; GLES3 has no swizzled storage.
pub fn format_to_gl(format: Format) -> Option<GlFormat> {
    use gl::*;
    match format {
        Format::UNKNOWN => None,

        Format::R8_UNORM => fmt(R8, RED, UNSIGNED_BYTE),
        Format::R8_SNORM => fmt(R8_SNORM, RED, BYTE),
        Format::R8_UINT => fmt(R8UI, RED_INTEGER, UNSIGNED_BYTE),
        Format::R8_SINT => fmt(R8I, RED_INTEGER, BYTE),
        Format::R8G8_UNORM => fmt(RG8, RG, UNSIGNED_BYTE),
        Format::R8G8_SNORM => fmt(RG8_SNORM, RG, BYTE),
        Format::R8G8_UINT => fmt(RG8UI, RG_INTEGER, UNSIGNED_BYTE),
        Format::R8G8_SINT => fmt(RG8I, RG_INTEGER, BYTE),
        Format::R8G8B8_UNORM => fmt(RGB8, RGB, UNSIGNED_BYTE),
        Format::R8G8B8_SRGB => fmt(SRGB8, RGB, UNSIGNED_BYTE),
        Format::R8G8B8A8_UNORM | Format::B8G8R8A8_UNORM => fmt(RGBA8, RGBA, UNSIGNED_BYTE),
        Format::R8G8B8A8_SNORM => fmt(RGBA8_SNORM, RGBA, BYTE),
        Format::R8G8B8A8_UINT => fmt(RGBA8UI, RGBA_INTEGER, UNSIGNED_BYTE),
        Format::R8G8B8A8_SINT => fmt(RGBA8I, RGBA_INTEGER, BYTE),
        Format::R8G8B8A8_SRGB | Format::B8G8R8A8_SRGB => fmt(SRGB8_ALPHA8, RGBA, UNSIGNED_BYTE),

        Format::R16_UINT => fmt(R16UI, RED_INTEGER, UNSIGNED_SHORT),
        Format::R16_SINT => fmt(R16I, RED_INTEGER, SHORT),
        Format::R16_SFLOAT => fmt(R16F, RED, HALF_FLOAT),
        Format::R16G16_UINT => fmt(RG16UI, RG_INTEGER, UNSIGNED_SHORT),
        Format::R16G16_SINT => fmt(RG16I, RG_INTEGER, SHORT),
        Format::R16G16_SFLOAT => fmt(RG16F, RG, HALF_FLOAT),
        Format::R16G16B16A16_UINT => fmt(RGBA16UI, RGBA_INTEGER, UNSIGNED_SHORT),
        Format::R16G16B16A16_SINT => fmt(RGBA16I, RGBA_INTEGER, SHORT),
        Format::R16G16B16A16_SFLOAT => fmt(RGBA16F, RGBA, HALF_FLOAT),

        Format::R32_UINT => fmt(R32UI, RED_INTEGER, UNSIGNED_INT),
        Format::R32_SINT => fmt(R32I, RED_INTEGER, INT),
        Format::R32_SFLOAT => fmt(R32F, RED, FLOAT),
        Format::R32G32_UINT => fmt(RG32UI, RG_INTEGER, UNSIGNED_INT),
        Format::R32G32_SINT => fmt(RG32I, RG_INTEGER, INT),
        Format::R32G32_SFLOAT => fmt(RG32F, RG, FLOAT),
        Format::R32G32B32_UINT => fmt(RGB32UI, RGB_INTEGER, UNSIGNED_INT),
        Format::R32G32B32_SINT => fmt(RGB32I, RGB_INTEGER, INT),
        Format::R32G32B32_SFLOAT => fmt(RGB32F, RGB, FLOAT),
        Format::R32G32B32A32_UINT => fmt(RGBA32UI, RGBA_INTEGER, UNSIGNED_INT),
        Format::R32G32B32A32_SINT => fmt(RGBA32I, RGBA_INTEGER, INT),
        Format::R32G32B32A32_SFLOAT => fmt(RGBA32F, RGBA, FLOAT),

        Format::R5G6B5_UNORM => fmt(RGB565, RGB, UNSIGNED_SHORT_5_6_5),
        Format::R5G5B5A1_UNORM => fmt(RGB5_A1, RGBA, UNSIGNED_SHORT_5_5_5_1),
        Format::R4G4B4A4_UNORM => fmt(RGBA4, RGBA, UNSIGNED_SHORT_4_4_4_4),
        Format::A2B10G10R10_UNORM => fmt(RGB10_A2, RGBA, UNSIGNED_INT_2_10_10_10_REV),
        Format::B10G11R11_UFLOAT => fmt(R11F_G11F_B10F, RGB, UNSIGNED_INT_10F_11F_11F_REV),
        Format::E5B9G9R9_UFLOAT => fmt(RGB9_E5, RGB, UNSIGNED_INT_5_9_9_9_REV),

        Format::D16_UNORM => fmt(DEPTH_COMPONENT16, DEPTH_COMPONENT, UNSIGNED_SHORT),
        Format::D24_UNORM_S8_UINT => fmt(DEPTH24_STENCIL8, DEPTH_STENCIL, UNSIGNED_INT_24_8),
        Format::D32_SFLOAT => fmt(DEPTH_COMPONENT32F, DEPTH_COMPONENT, FLOAT),
        Format::D32_SFLOAT_S8_UINT => fmt(DEPTH32F_STENCIL8, DEPTH_STENCIL, FLOAT_32_UNSIGNED_INT_24_8_REV),

        Format::BC1_RGB_UNORM => compressed(COMPRESSED_RGB_S3TC_DXT1_EXT),
        Format::BC1_RGBA_UNORM => compressed(COMPRESSED_RGBA_S3TC_DXT1_EXT),
        Format::BC2_UNORM => compressed(COMPRESSED_RGBA_S3TC_DXT3_EXT),
        Format::BC3_UNORM => compressed(COMPRESSED_RGBA_S3TC_DXT5_EXT),
        Format::ETC1_RGB8_UNORM => compressed(ETC1_RGB8_OES),
        Format::ETC2_RGB8_UNORM => compressed(COMPRESSED_RGB8_ETC2),
        Format::ETC2_RGBA8_UNORM => compressed(COMPRESSED_RGBA8_ETC2_EAC),
        Format::EAC_R11_UNORM => compressed(COMPRESSED_R11_EAC),
        Format::ASTC_4x4_UNORM => compressed(COMPRESSED_RGBA_ASTC_4X4_KHR),
        Format::ASTC_8x8_UNORM => compressed(COMPRESSED_RGBA_ASTC_8X8_KHR),
    }
}

/// How a vertex attribute format is fed to `glVertexAttrib*Pointer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlAttributeFormat {
    pub size: u32,
    pub ty: GLenum,
    pub normalized: bool,
    /// Use the integer pointer variant
    pub integer: bool,
}

/// Convert a vertex attribute format; None for depth, compressed and shared-exponent formats
pub fn attribute_format_to_gl(format: Format) -> Option<GlAttributeFormat> {
    let info = format.info();
    if info.is_compressed || info.has_depth || info.count == 0 {
        return None;
    }
    if format == Format::A2B10G10R10_UNORM {
        return Some(GlAttributeFormat {
            size: 4,
            ty: gl::UNSIGNED_INT_2_10_10_10_REV,
            normalized: true,
            integer: false,
        });
    }
    if info.size % info.count != 0 {
        return None;
    }

    let component = info.size / info.count;
    let ty = match (info.format_type, component) {
        (FormatType::Unorm | FormatType::Uint, 1) => gl::UNSIGNED_BYTE,
        (FormatType::Snorm | FormatType::Int, 1) => gl::BYTE,
        (FormatType::Unorm | FormatType::Uint, 2) => gl::UNSIGNED_SHORT,
        (FormatType::Snorm | FormatType::Int, 2) => gl::SHORT,
        (FormatType::Float, 2) => gl::HALF_FLOAT,
        (FormatType::Uint, 4) => gl::UNSIGNED_INT,
        (FormatType::Int, 4) => gl::INT,
        (FormatType::Float, 4) => gl::FLOAT,
        _ => return None,
    };
    Some(GlAttributeFormat {
        size: info.count,
        ty,
        normalized: matches!(info.format_type, FormatType::Unorm | FormatType::Snorm),
        integer: matches!(info.format_type, FormatType::Uint | FormatType::Int),
    })
}

pub fn topology_to_gl(topology: PrimitiveTopology) -> GLenum {
    match topology {
        PrimitiveTopology::PointList => gl::POINTS,
        PrimitiveTopology::LineList => gl::LINES,
        PrimitiveTopology::LineStrip => gl::LINE_STRIP,
        PrimitiveTopology::LineLoop => gl::LINE_LOOP,
        PrimitiveTopology::TriangleList => gl::TRIANGLES,
        PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
        PrimitiveTopology::TriangleFan => gl::TRIANGLE_FAN,
    }
}

/// Face to cull, None when culling is disabled
pub fn cull_mode_to_gl(mode: CullMode) -> Option<GLenum> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(gl::FRONT),
        CullMode::Back => Some(gl::BACK),
    }
}

pub fn front_face_to_gl(face: FrontFace) -> GLenum {
    match face {
        FrontFace::CounterClockwise => gl::CCW,
        FrontFace::Clockwise => gl::CW,
    }
}

pub fn compare_op_to_gl(op: CompareOp) -> GLenum {
    match op {
        CompareOp::Never => gl::NEVER,
        CompareOp::Less => gl::LESS,
        CompareOp::Equal => gl::EQUAL,
        CompareOp::LessOrEqual => gl::LEQUAL,
        CompareOp::Greater => gl::GREATER,
        CompareOp::NotEqual => gl::NOTEQUAL,
        CompareOp::GreaterOrEqual => gl::GEQUAL,
        CompareOp::Always => gl::ALWAYS,
    }
}

pub fn stencil_op_to_gl(op: StencilOp) -> GLenum {
    match op {
        StencilOp::Keep => gl::KEEP,
        StencilOp::Zero => gl::ZERO,
        StencilOp::Replace => gl::REPLACE,
        StencilOp::IncrementAndClamp => gl::INCR,
        StencilOp::DecrementAndClamp => gl::DECR,
        StencilOp::Invert => gl::INVERT,
        StencilOp::IncrementAndWrap => gl::INCR_WRAP,
        StencilOp::DecrementAndWrap => gl::DECR_WRAP,
    }
}

pub fn blend_factor_to_gl(factor: BlendFactor) -> GLenum {
    match factor {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcColor => gl::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => gl::DST_COLOR,
        BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => gl::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => gl::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => gl::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::ConstantAlpha => gl::CONSTANT_ALPHA,
        BlendFactor::OneMinusConstantAlpha => gl::ONE_MINUS_CONSTANT_ALPHA,
        BlendFactor::SrcAlphaSaturate => gl::SRC_ALPHA_SATURATE,
    }
}

pub fn blend_op_to_gl(op: BlendOp) -> GLenum {
    match op {
        BlendOp::Add => gl::FUNC_ADD,
        BlendOp::Subtract => gl::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => gl::MIN,
        BlendOp::Max => gl::MAX,
    }
}

/// Minification filter combining the texel and mip filters
pub fn min_filter_to_gl(min: Filter, mip: Filter) -> GLenum {
    let linear = matches!(min, Filter::Linear | Filter::Anisotropic);
    match (mip, linear) {
        (Filter::None, false) => gl::NEAREST,
        (Filter::None, true) => gl::LINEAR,
        (Filter::Point, false) => gl::NEAREST_MIPMAP_NEAREST,
        (Filter::Point, true) => gl::LINEAR_MIPMAP_NEAREST,
        (Filter::Linear | Filter::Anisotropic, false) => gl::NEAREST_MIPMAP_LINEAR,
        (Filter::Linear | Filter::Anisotropic, true) => gl::LINEAR_MIPMAP_LINEAR,
    }
}

pub fn mag_filter_to_gl(mag: Filter) -> GLenum {
    match mag {
        Filter::None | Filter::Point => gl::NEAREST,
        Filter::Linear | Filter::Anisotropic => gl::LINEAR,
    }
}

/// Addressing mode; GLES3 has no border color, `Border` clamps to edge
pub fn address_to_gl(address: Address) -> GLenum {
    match address {
        Address::Wrap => gl::REPEAT,
        Address::Mirror => gl::MIRRORED_REPEAT,
        Address::Clamp | Address::Border => gl::CLAMP_TO_EDGE,
    }
}

/// Bind target of a buffer, None for buffers without a GL object
pub fn buffer_target(usage: BufferUsage) -> Option<GLenum> {
    if usage.contains(BufferUsage::INDIRECT) {
        None
    } else if usage.contains(BufferUsage::INDEX) {
        Some(gl::ELEMENT_ARRAY_BUFFER)
    } else if usage.contains(BufferUsage::UNIFORM) {
        Some(gl::UNIFORM_BUFFER)
    } else if usage.contains(BufferUsage::STORAGE) {
        Some(gl::SHADER_STORAGE_BUFFER)
    } else {
        Some(gl::ARRAY_BUFFER)
    }
}

pub fn buffer_usage_hint(memory_usage: MemoryUsage) -> GLenum {
    if memory_usage.contains(MemoryUsage::HOST) {
        gl::DYNAMIC_DRAW
    } else {
        gl::STATIC_DRAW
    }
}

/// Texture target; 1D textures are 2D textures of height 1
pub fn texture_target(info: &TextureInfo) -> GLenum {
    match info.texture_type {
        TextureType::Tex3D => gl::TEXTURE_3D,
        TextureType::Tex1D | TextureType::Tex2D if info.is_cubemap() => gl::TEXTURE_CUBE_MAP,
        TextureType::Tex1D | TextureType::Tex2D if info.layer_count > 1 => gl::TEXTURE_2D_ARRAY,
        TextureType::Tex1D | TextureType::Tex2D => gl::TEXTURE_2D,
    }
}

pub fn index_type_to_gl(index_type: IndexType) -> GLenum {
    match index_type {
        IndexType::U8 => gl::UNSIGNED_BYTE,
        IndexType::U16 => gl::UNSIGNED_SHORT,
        IndexType::U32 => gl::UNSIGNED_INT,
    }
}

pub fn shader_stage_to_gl(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        ShaderStage::Compute => gl::COMPUTE_SHADER,
    }
}

#[cfg(test)]
#[path = "gles_conversions_tests.rs"]
mod tests;
