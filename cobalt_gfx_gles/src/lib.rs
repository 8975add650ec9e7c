/*!
# Cobalt GFX - OpenGL ES 3.0 Backend

OpenGL ES 3.0 implementation of the `cobalt_gfx` [`Backend`](cobalt_gfx::cobalt::gfx::Backend)
trait.

Resources map onto GL objects, and recorded command buffers are replayed
through a [`GlStateCache`] that drops redundant state changes before they
reach the driver. The driver itself sits behind the [`GlDriver`] trait:

- [`GlowDriver`] issues real GL calls through `glow` (feature `glow-driver`)
- [`HeadlessDriver`] records calls without a context, for tests and tooling

```no_run
use cobalt_gfx::cobalt::gfx::{Device, DeviceInfo};
use cobalt_gfx_gles::{GlesBackend, HeadlessDriver};

let device = Device::new(GlesBackend::new(HeadlessDriver::new()), DeviceInfo::default())?;
# Ok::<(), cobalt_gfx::cobalt::Error>(())
```
*/

// Raw GL layer
pub mod gl;
mod gles_driver;
mod headless_driver;
#[cfg(feature = "glow-driver")]
mod glow_driver;

// Backend modules
pub mod gles_conversions;
mod gles_state_cache;
mod gles_objects;
mod gles_backend;
mod gles_replay;

#[cfg(test)]
mod test_fixtures;

pub use gles_driver::{DriverResult, GlDriver};
pub use headless_driver::HeadlessDriver;
#[cfg(feature = "glow-driver")]
pub use glow_driver::GlowDriver;

pub use gles_state_cache::{GlCaps, GlStateCache, StencilFace};
pub use gles_objects::{
    GlesBuffer, GlesDescriptorSet, GlesDescriptorSetLayout, GlesFence, GlesFramebuffer,
    GlesInputAssembler, GlesPipelineLayout, GlesPipelineState, GlesRenderPass, GlesSampler,
    GlesShader, GlesTexture,
};
pub use gles_backend::GlesBackend;
