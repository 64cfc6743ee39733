//! Animation Core
//!
//! Skeletons, clips of per-joint keyframe tracks, and the two runtime
//! drivers that turn them into skinning palettes every frame: the
//! [`AnimationSampler`] (one clip at a time) and the [`AnimationBlender`]
//! (up to [`ANIMATION_BLENDS_MAX`] weighted clips).
//!
//! The per-frame flow is always: sample clip(s) at a normalized time into
//! local joint poses, convert local poses to model-space matrices down the
//! joint tree, then multiply by each joint's inverse bind matrix to produce
//! the palette the skinning shader consumes.

pub mod blender;
pub mod clip;
pub mod sampler;
pub mod skeleton;
pub mod tracks;

pub use blender::{AnimationBlender, AnimationBlenderInfo, BlendSample};
pub use clip::{AnimationClip, JointTrack};
pub use sampler::{AnimationSampler, AnimationSamplerInfo, SamplingContext};
pub use skeleton::{Joint, JointPose, Skeleton};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};

/// The maximum amount of joints a skeleton (and a skinning palette) can have.
pub const JOINTS_MAX: usize = 128;

/// The maximum amount of samples an animation blender can mix.
pub const ANIMATION_BLENDS_MAX: usize = 8;

/// One skinning palette: the fixed-size matrix block uploaded per skinned
/// instance. Unused tail entries stay identity.
pub type SkinningPalette = [glam::Mat4; JOINTS_MAX];
