//! Default Render Passes
//!
//! The behaviors behind the default chain: Shadow feeds a light-space depth
//! map to Light, which shades the opaque queue (plus the skybox); Debug and
//! Particle draw on top of Light's target; Billboard composes over a copy;
//! HDR resolves the result to LDR. Empty-queue passes forward their
//! predecessor's outputs so the chain stays well-defined.

pub mod billboard;
pub mod debug;
pub mod hdr;
pub mod light;
pub mod particle;
pub mod shadow;

pub use billboard::BillboardPass;
pub use debug::DebugPass;
pub use hdr::HdrPass;
pub use light::LightPass;
pub use particle::ParticlePass;
pub use shadow::ShadowPass;
