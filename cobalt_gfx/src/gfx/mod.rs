/// Graphics module - device, resources, command recording and the backend seam

// Module declarations
pub mod backend;
pub(crate) mod device;
pub(crate) mod object;
pub mod format;
pub mod types;
pub mod buffer;
pub mod texture;
pub mod sampler;
pub mod shader;
pub mod render_pass;
pub mod framebuffer;
pub mod descriptor_set_layout;
pub mod pipeline_layout;
pub mod descriptor_set;
pub mod pipeline_state;
pub mod input_assembler;
pub mod command_pool;
pub mod commands;
pub mod command_buffer;
pub mod queue;
pub mod fence;

#[cfg(test)]
pub(crate) mod mock_backend;

// Re-exports
pub use backend::Backend;
pub use device::{BindingMappingInfo, Device, DeviceCaps, DeviceInfo, Features};
pub use object::{GfxObject, Object, ObjectStatus, ObjectType};
pub use format::*;
pub use types::*;
pub use buffer::*;
pub use texture::*;
pub use sampler::*;
pub use shader::*;
pub use render_pass::*;
pub use framebuffer::*;
pub use descriptor_set_layout::*;
pub use pipeline_layout::*;
pub use descriptor_set::*;
pub use pipeline_state::*;
pub use input_assembler::*;
pub use command_pool::{CmdHandle, CommandPool, Recycle};
pub use commands::*;
pub use command_buffer::*;
pub use queue::*;
pub use fence::*;
