/*!
# Cobalt GFX

Cross-backend graphics hardware abstraction layer.

This crate provides the backend-agnostic device API: resource objects,
deferred command recording with pooled commands and coalesced state binds,
queues and fences. Concrete backends (`cobalt_gfx_gles`, ...) implement the
[`gfx::Backend`] trait and are selected when the [`gfx::Device`] is built.

## Architecture

- **Device**: factory for every resource, capability registry, memory counters
- **Resources**: Buffer, Texture, Sampler, Shader, RenderPass, Framebuffer,
  DescriptorSetLayout, PipelineLayout, DescriptorSet, PipelineState, InputAssembler
- **CommandBuffer**: records an ordered command stream, folding consecutive
  state setters into a single bind-states command
- **Queue / Fence**: submit recorded buffers to the backend, optionally signaled
- **Backend**: replays the command stream into driver calls
*/

// Internal modules
mod error;
pub mod log;
pub mod gfx;

// Main cobalt namespace module
pub mod cobalt {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Graphics sub-module with the whole device API
    pub mod gfx {
        pub use crate::gfx::*;
    }
}

// Re-export math library at crate root
pub use glam;
