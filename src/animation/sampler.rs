//! Animation Sampler
//!
//! Plays one clip at a time against a skeleton and rebuilds its skinning
//! palette every update. `current_time` is normalized to `[0, 1]`; looping
//! wraps it, non-looping playback holds at the end.

use glam::Mat4;

use crate::animation::clip::JointCursors;
use crate::animation::skeleton::JointPose;
use crate::animation::{JOINTS_MAX, SkinningPalette};
use crate::errors::{KestrelError, Result};
use crate::resources::{ResourceId, Resources};

/// Per-sampler sampling state: one cursor triple per joint track.
#[derive(Debug, Clone, Default)]
pub struct SamplingContext {
    cursors: Vec<JointCursors>,
}

impl SamplingContext {
    pub fn resize(&mut self, joints: usize) {
        self.cursors.clear();
        self.cursors.resize(joints, JointCursors::default());
    }

    #[inline]
    pub(crate) fn cursor_mut(&mut self, joint: usize) -> &mut JointCursors {
        &mut self.cursors[joint]
    }

    /// Forgets all cursor positions (used when the clip changes).
    pub fn invalidate(&mut self) {
        for cursor in &mut self.cursors {
            *cursor = JointCursors::default();
        }
    }
}

/// Playback state of a sampler.
#[derive(Debug, Clone, Copy)]
pub struct AnimationSamplerInfo {
    /// Index into the sampler's animation list.
    pub current_animation: usize,
    /// Normalized playback position in `[0, 1]`.
    pub current_time: f32,
    /// Playback rate multiplier; negative plays in reverse.
    pub play_speed: f32,
    pub is_looping: bool,
    pub is_animating: bool,
}

impl Default for AnimationSamplerInfo {
    fn default() -> Self {
        Self {
            current_animation: 0,
            current_time: 0.0,
            play_speed: 1.0,
            is_looping: true,
            is_animating: true,
        }
    }
}

pub struct AnimationSampler {
    skeleton: ResourceId,
    animations: Vec<ResourceId>,

    context: SamplingContext,
    locals: Vec<JointPose>,
    models: Vec<Mat4>,

    skinning_palette: SkinningPalette,
    pub info: AnimationSamplerInfo,
}

impl AnimationSampler {
    /// Creates a sampler over `skeleton_id` with one or more animations.
    pub fn new(
        resources: &Resources,
        skeleton_id: ResourceId,
        animation_ids: &[ResourceId],
    ) -> Result<Self> {
        if animation_ids.is_empty() {
            return Err(KestrelError::AnimationDataError(
                "An animation sampler needs at least one animation".to_string(),
            ));
        }

        let skeleton = resources.get_skeleton(skeleton_id);
        let joints = skeleton.joints_count();

        let mut context = SamplingContext::default();
        context.resize(joints);

        let mut sampler = Self {
            skeleton: skeleton_id,
            animations: animation_ids.to_vec(),
            context,
            locals: vec![JointPose::identity(); joints],
            models: vec![Mat4::IDENTITY; joints],
            skinning_palette: [Mat4::IDENTITY; JOINTS_MAX],
            info: AnimationSamplerInfo::default(),
        };
        sampler.info.play_speed = resources.get_animation(animation_ids[0]).playback_rate;
        Ok(sampler)
    }

    #[inline]
    #[must_use]
    pub fn skeleton_id(&self) -> ResourceId {
        self.skeleton
    }

    #[inline]
    #[must_use]
    pub fn skinning_palette(&self) -> &SkinningPalette {
        &self.skinning_palette
    }

    /// Switches to another of the sampler's animations, restarting playback.
    pub fn set_current_animation(&mut self, index: usize) {
        assert!(index < self.animations.len(), "Animation index out of range");
        self.info.current_animation = index;
        self.info.current_time = 0.0;
        self.context.invalidate();
    }

    /// Advances playback by `dt` seconds and rebuilds the skinning palette.
    pub fn update(&mut self, resources: &Resources, dt: f32) {
        if !self.info.is_animating {
            return;
        }

        let animation = resources.get_animation(self.animations[self.info.current_animation]);
        let duration = animation.duration;
        if duration <= 0.0 {
            return;
        }

        // Non-looping playback holds at either end.
        if !self.info.is_looping {
            let forward_done = self.info.play_speed >= 0.0 && self.info.current_time >= 1.0;
            let reverse_done = self.info.play_speed < 0.0 && self.info.current_time <= 0.0;
            if forward_done || reverse_done {
                return;
            }
        }

        self.info.current_time += (dt * self.info.play_speed) / duration;
        if self.info.is_looping {
            self.info.current_time = self.info.current_time.rem_euclid(1.0);
        } else {
            self.info.current_time = self.info.current_time.clamp(0.0, 1.0);
        }

        // Sample job: clip at ratio -> local poses.
        let skeleton = resources.get_skeleton(self.skeleton);
        let time = self.info.current_time * duration;
        for (i, joint) in skeleton.joints().iter().enumerate() {
            let pose = match animation.tracks.get(i) {
                Some(track) => {
                    track.sample_or_rest(time, &joint.local_rest, self.context.cursor_mut(i))
                }
                None => joint.local_rest,
            };
            self.locals[i] = pose;
        }

        // Local-to-model job, then the inverse-bind multiply.
        skeleton.local_to_model(&self.locals, &mut self.models);
        for (i, inverse_bind) in skeleton.inverse_bind_matrices().iter().enumerate() {
            self.skinning_palette[i] = self.models[i] * *inverse_bind;
        }
    }
}
