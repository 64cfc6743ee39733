#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
#[cfg(feature = "winit")]
pub mod app;
pub mod camera;
pub mod engine;
pub mod errors;
pub mod events;
pub mod gfx;
pub mod particles;
pub mod physics;
pub mod renderer;
pub mod resources;
pub mod timer;
pub mod transform;
pub mod vertex;
pub mod world;

pub use animation::{
    ANIMATION_BLENDS_MAX, AnimationBlender, AnimationClip, AnimationSampler, JOINTS_MAX, Skeleton,
    SkinningPalette,
};
pub use camera::{Camera, CameraDesc};
pub use engine::Engine;
pub use errors::{KestrelError, Result};
pub use events::{Event, EventKind, Events};
pub use gfx::{GfxContext, GfxContextDesc, wgpu_backend::WgpuContext};
pub use particles::{PARTICLES_MAX, ParticleEmitter, ParticleEmitterDesc};
pub use renderer::{
    BatchRenderer, DirectionalLight, FrameData, PointLight, Renderer, RenderQueueType, SpotLight,
};
pub use resources::{
    Material, MaterialDesc, Mesh, Model, RESOURCE_CACHE, ResourceGroupId, ResourceId, Resources,
};
pub use timer::Timer;
pub use transform::Transform;
pub use world::{EntityId, EntityWorld};
