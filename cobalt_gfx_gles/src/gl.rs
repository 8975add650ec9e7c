//! OpenGL ES 3.0 enumerants used by the backend
//!
//! Kept local so the headless driver builds without a GL binding crate.

pub type GLenum = u32;

// ===== ERRORS =====

pub const NO_ERROR: GLenum = 0;
pub const INVALID_ENUM: GLenum = 0x0500;
pub const INVALID_VALUE: GLenum = 0x0501;
pub const INVALID_OPERATION: GLenum = 0x0502;
pub const OUT_OF_MEMORY: GLenum = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

// ===== QUERIES =====

pub const VENDOR: GLenum = 0x1F00;
pub const RENDERER: GLenum = 0x1F01;
pub const VERSION: GLenum = 0x1F02;
pub const MAX_VERTEX_ATTRIBS: GLenum = 0x8869;
pub const MAX_VERTEX_UNIFORM_VECTORS: GLenum = 0x8DFB;
pub const MAX_FRAGMENT_UNIFORM_VECTORS: GLenum = 0x8DFD;
pub const MAX_TEXTURE_IMAGE_UNITS: GLenum = 0x8872;
pub const MAX_VERTEX_TEXTURE_IMAGE_UNITS: GLenum = 0x8B4C;
pub const MAX_UNIFORM_BUFFER_BINDINGS: GLenum = 0x8A2F;
pub const MAX_UNIFORM_BLOCK_SIZE: GLenum = 0x8A30;
pub const MAX_TEXTURE_SIZE: GLenum = 0x0D33;
pub const MAX_CUBE_MAP_TEXTURE_SIZE: GLenum = 0x851C;
pub const MAX_ARRAY_TEXTURE_LAYERS: GLenum = 0x88FF;
pub const MAX_3D_TEXTURE_SIZE: GLenum = 0x8073;
pub const MAX_COLOR_ATTACHMENTS: GLenum = 0x8CDF;
pub const UNIFORM_BUFFER_OFFSET_ALIGNMENT: GLenum = 0x8A34;
pub const DEPTH_BITS: GLenum = 0x0D56;
pub const STENCIL_BITS: GLenum = 0x0D57;

// ===== BUFFERS =====

pub const ARRAY_BUFFER: GLenum = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const UNIFORM_BUFFER: GLenum = 0x8A11;
pub const SHADER_STORAGE_BUFFER: GLenum = 0x90D2;
pub const STATIC_DRAW: GLenum = 0x88E4;
pub const DYNAMIC_DRAW: GLenum = 0x88E8;

// ===== TEXTURES =====

pub const TEXTURE_2D: GLenum = 0x0DE1;
pub const TEXTURE_3D: GLenum = 0x806F;
pub const TEXTURE_2D_ARRAY: GLenum = 0x8C1A;
pub const TEXTURE_CUBE_MAP: GLenum = 0x8513;
pub const TEXTURE_CUBE_MAP_POSITIVE_X: GLenum = 0x8515;
pub const TEXTURE0: GLenum = 0x84C0;

pub const TEXTURE_MAG_FILTER: GLenum = 0x2800;
pub const TEXTURE_MIN_FILTER: GLenum = 0x2801;
pub const TEXTURE_WRAP_S: GLenum = 0x2802;
pub const TEXTURE_WRAP_T: GLenum = 0x2803;
pub const TEXTURE_WRAP_R: GLenum = 0x8072;
pub const TEXTURE_MIN_LOD: GLenum = 0x813A;
pub const TEXTURE_MAX_LOD: GLenum = 0x813B;
pub const TEXTURE_COMPARE_MODE: GLenum = 0x884C;
pub const TEXTURE_COMPARE_FUNC: GLenum = 0x884D;
pub const COMPARE_REF_TO_TEXTURE: GLenum = 0x884E;
pub const TEXTURE_MAX_ANISOTROPY_EXT: GLenum = 0x84FE;

pub const NEAREST: GLenum = 0x2600;
pub const LINEAR: GLenum = 0x2601;
pub const NEAREST_MIPMAP_NEAREST: GLenum = 0x2700;
pub const LINEAR_MIPMAP_NEAREST: GLenum = 0x2701;
pub const NEAREST_MIPMAP_LINEAR: GLenum = 0x2702;
pub const LINEAR_MIPMAP_LINEAR: GLenum = 0x2703;
pub const REPEAT: GLenum = 0x2901;
pub const CLAMP_TO_EDGE: GLenum = 0x812F;
pub const MIRRORED_REPEAT: GLenum = 0x8370;

pub const UNPACK_ROW_LENGTH: GLenum = 0x0CF2;
pub const UNPACK_ALIGNMENT: GLenum = 0x0CF5;
pub const UNPACK_IMAGE_HEIGHT: GLenum = 0x806E;

// ===== PIXEL FORMATS / TYPES =====

pub const DEPTH_COMPONENT: GLenum = 0x1902;
pub const RED: GLenum = 0x1903;
pub const RGB: GLenum = 0x1907;
pub const RGBA: GLenum = 0x1908;
pub const RG: GLenum = 0x8227;
pub const RG_INTEGER: GLenum = 0x8228;
pub const RED_INTEGER: GLenum = 0x8D94;
pub const RGB_INTEGER: GLenum = 0x8D98;
pub const RGBA_INTEGER: GLenum = 0x8D99;
pub const DEPTH_STENCIL: GLenum = 0x84F9;

pub const BYTE: GLenum = 0x1400;
pub const UNSIGNED_BYTE: GLenum = 0x1401;
pub const SHORT: GLenum = 0x1402;
pub const UNSIGNED_SHORT: GLenum = 0x1403;
pub const INT: GLenum = 0x1404;
pub const UNSIGNED_INT: GLenum = 0x1405;
pub const FLOAT: GLenum = 0x1406;
pub const HALF_FLOAT: GLenum = 0x140B;
pub const UNSIGNED_SHORT_4_4_4_4: GLenum = 0x8033;
pub const UNSIGNED_SHORT_5_5_5_1: GLenum = 0x8034;
pub const UNSIGNED_SHORT_5_6_5: GLenum = 0x8363;
pub const UNSIGNED_INT_2_10_10_10_REV: GLenum = 0x8368;
pub const UNSIGNED_INT_24_8: GLenum = 0x84FA;
pub const UNSIGNED_INT_10F_11F_11F_REV: GLenum = 0x8C3B;
pub const UNSIGNED_INT_5_9_9_9_REV: GLenum = 0x8C3E;
pub const FLOAT_32_UNSIGNED_INT_24_8_REV: GLenum = 0x8DAD;

// Sized internal formats
pub const R8: GLenum = 0x8229;
pub const R8_SNORM: GLenum = 0x8F94;
pub const R8UI: GLenum = 0x8232;
pub const R8I: GLenum = 0x8231;
pub const RG8: GLenum = 0x822B;
pub const RG8_SNORM: GLenum = 0x8F95;
pub const RG8UI: GLenum = 0x8238;
pub const RG8I: GLenum = 0x8237;
pub const RGB8: GLenum = 0x8051;
pub const SRGB8: GLenum = 0x8C41;
pub const RGBA8: GLenum = 0x8058;
pub const RGBA8_SNORM: GLenum = 0x8F97;
pub const RGBA8UI: GLenum = 0x8D7C;
pub const RGBA8I: GLenum = 0x8D8E;
pub const SRGB8_ALPHA8: GLenum = 0x8C43;
pub const R16UI: GLenum = 0x8234;
pub const R16I: GLenum = 0x8233;
pub const R16F: GLenum = 0x822D;
pub const RG16UI: GLenum = 0x823A;
pub const RG16I: GLenum = 0x8239;
pub const RG16F: GLenum = 0x822F;
pub const RGBA16UI: GLenum = 0x8D76;
pub const RGBA16I: GLenum = 0x8D88;
pub const RGBA16F: GLenum = 0x881A;
pub const R32UI: GLenum = 0x8236;
pub const R32I: GLenum = 0x8235;
pub const R32F: GLenum = 0x822E;
pub const RG32UI: GLenum = 0x823C;
pub const RG32I: GLenum = 0x823B;
pub const RG32F: GLenum = 0x8230;
pub const RGB32UI: GLenum = 0x8D71;
pub const RGB32I: GLenum = 0x8D83;
pub const RGB32F: GLenum = 0x8815;
pub const RGBA32UI: GLenum = 0x8D70;
pub const RGBA32I: GLenum = 0x8D82;
pub const RGBA32F: GLenum = 0x8814;
pub const RGB565: GLenum = 0x8D62;
pub const RGB5_A1: GLenum = 0x8057;
pub const RGBA4: GLenum = 0x8056;
pub const RGB10_A2: GLenum = 0x8059;
pub const R11F_G11F_B10F: GLenum = 0x8C3A;
pub const RGB9_E5: GLenum = 0x8C3D;
pub const DEPTH_COMPONENT16: GLenum = 0x81A5;
pub const DEPTH24_STENCIL8: GLenum = 0x88F0;
pub const DEPTH_COMPONENT32F: GLenum = 0x8CAC;
pub const DEPTH32F_STENCIL8: GLenum = 0x8CAD;

// Compressed formats
pub const COMPRESSED_RGB_S3TC_DXT1_EXT: GLenum = 0x83F0;
pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: GLenum = 0x83F1;
pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: GLenum = 0x83F2;
pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: GLenum = 0x83F3;
pub const ETC1_RGB8_OES: GLenum = 0x8D64;
pub const COMPRESSED_R11_EAC: GLenum = 0x9270;
pub const COMPRESSED_RGB8_ETC2: GLenum = 0x9274;
pub const COMPRESSED_RGBA8_ETC2_EAC: GLenum = 0x9278;
pub const COMPRESSED_RGBA_ASTC_4X4_KHR: GLenum = 0x93B0;
pub const COMPRESSED_RGBA_ASTC_8X8_KHR: GLenum = 0x93B7;

// ===== SHADERS =====

pub const FRAGMENT_SHADER: GLenum = 0x8B30;
pub const VERTEX_SHADER: GLenum = 0x8B31;
pub const COMPUTE_SHADER: GLenum = 0x91B9;

// ===== FRAMEBUFFERS =====

pub const FRAMEBUFFER: GLenum = 0x8D40;
pub const READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
pub const COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const STENCIL_ATTACHMENT: GLenum = 0x8D20;
pub const DEPTH_STENCIL_ATTACHMENT: GLenum = 0x821A;
pub const NONE: GLenum = 0;
pub const BACK: GLenum = 0x0405;

// Default framebuffer attachments for invalidation
pub const COLOR: GLenum = 0x1800;
pub const DEPTH: GLenum = 0x1801;
pub const STENCIL: GLenum = 0x1802;

// ===== FIXED FUNCTION =====

pub const CULL_FACE: GLenum = 0x0B44;
pub const DEPTH_TEST: GLenum = 0x0B71;
pub const STENCIL_TEST: GLenum = 0x0B90;
pub const BLEND: GLenum = 0x0BE2;
pub const SCISSOR_TEST: GLenum = 0x0C11;
pub const POLYGON_OFFSET_FILL: GLenum = 0x8037;
pub const SAMPLE_ALPHA_TO_COVERAGE: GLenum = 0x809E;

pub const FRONT: GLenum = 0x0404;
pub const FRONT_AND_BACK: GLenum = 0x0408;
pub const CW: GLenum = 0x0900;
pub const CCW: GLenum = 0x0901;

pub const NEVER: GLenum = 0x0200;
pub const LESS: GLenum = 0x0201;
pub const EQUAL: GLenum = 0x0202;
pub const LEQUAL: GLenum = 0x0203;
pub const GREATER: GLenum = 0x0204;
pub const NOTEQUAL: GLenum = 0x0205;
pub const GEQUAL: GLenum = 0x0206;
pub const ALWAYS: GLenum = 0x0207;

pub const ZERO: GLenum = 0;
pub const ONE: GLenum = 1;
pub const KEEP: GLenum = 0x1E00;
pub const REPLACE: GLenum = 0x1E01;
pub const INCR: GLenum = 0x1E02;
pub const DECR: GLenum = 0x1E03;
pub const INVERT: GLenum = 0x150A;
pub const INCR_WRAP: GLenum = 0x8507;
pub const DECR_WRAP: GLenum = 0x8508;

pub const SRC_COLOR: GLenum = 0x0300;
pub const ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
pub const SRC_ALPHA: GLenum = 0x0302;
pub const ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
pub const DST_ALPHA: GLenum = 0x0304;
pub const ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
pub const DST_COLOR: GLenum = 0x0306;
pub const ONE_MINUS_DST_COLOR: GLenum = 0x0307;
pub const SRC_ALPHA_SATURATE: GLenum = 0x0308;
pub const CONSTANT_COLOR: GLenum = 0x8001;
pub const ONE_MINUS_CONSTANT_COLOR: GLenum = 0x8002;
pub const CONSTANT_ALPHA: GLenum = 0x8003;
pub const ONE_MINUS_CONSTANT_ALPHA: GLenum = 0x8004;
pub const FUNC_ADD: GLenum = 0x8006;
pub const MIN: GLenum = 0x8007;
pub const MAX: GLenum = 0x8008;
pub const FUNC_SUBTRACT: GLenum = 0x800A;
pub const FUNC_REVERSE_SUBTRACT: GLenum = 0x800B;

// ===== PRIMITIVES =====

pub const POINTS: GLenum = 0x0000;
pub const LINES: GLenum = 0x0001;
pub const LINE_LOOP: GLenum = 0x0002;
pub const LINE_STRIP: GLenum = 0x0003;
pub const TRIANGLES: GLenum = 0x0004;
pub const TRIANGLE_STRIP: GLenum = 0x0005;
pub const TRIANGLE_FAN: GLenum = 0x0006;

// ===== SYNC =====

pub const SYNC_GPU_COMMANDS_COMPLETE: GLenum = 0x9117;
pub const SYNC_FLUSH_COMMANDS_BIT: GLenum = 0x0000_0001;
pub const ALREADY_SIGNALED: GLenum = 0x911A;
pub const TIMEOUT_EXPIRED: GLenum = 0x911B;
pub const CONDITION_SATISFIED: GLenum = 0x911C;
pub const WAIT_FAILED: GLenum = 0x911D;

/// Readable name of a `glGetError` code
pub fn error_name(code: GLenum) -> &'static str {
    match code {
        NO_ERROR => "GL_NO_ERROR",
        INVALID_ENUM => "GL_INVALID_ENUM",
        INVALID_VALUE => "GL_INVALID_VALUE",
        INVALID_OPERATION => "GL_INVALID_OPERATION",
        OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        _ => "GL_UNKNOWN_ERROR",
    }
}
