//! Animation Blender
//!
//! Mixes up to [`ANIMATION_BLENDS_MAX`] clips over one skeleton. The
//! blender's `blending_ratio` in `[0, 1]` is partitioned into N-1 equal
//! intervals; at any ratio exactly the two neighboring samples carry
//! weight, and every sample's playback speed is normalized against the
//! weighted duration of those two so the blend stays in phase.

use glam::{Mat4, Quat, Vec3};

use crate::animation::clip::JointCursors;
use crate::animation::sampler::SamplingContext;
use crate::animation::skeleton::JointPose;
use crate::animation::{ANIMATION_BLENDS_MAX, JOINTS_MAX, SkinningPalette};
use crate::errors::Result;
use crate::resources::{ResourceId, Resources};

/// One clip participating in a blend, with its own playback clock and
/// sampling context.
pub struct BlendSample {
    animation: ResourceId,
    context: SamplingContext,
    locals: Vec<JointPose>,

    /// Normalized playback position in `[0, 1]`.
    pub time: f32,
    /// The clip's duration in seconds.
    pub duration: f32,
    pub weight: f32,
    /// Normalized playback speed, `duration / blended_duration`.
    pub speed: f32,
}

impl BlendSample {
    #[inline]
    #[must_use]
    pub fn animation_id(&self) -> ResourceId {
        self.animation
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnimationBlenderInfo {
    /// Blend position in `[0, 1]` across the sample list.
    pub blending_ratio: f32,
    /// Minimum total weight before the rest pose fills in.
    pub blending_threshold: f32,
    pub is_animating: bool,
    pub is_looping: bool,
}

impl Default for AnimationBlenderInfo {
    fn default() -> Self {
        Self {
            blending_ratio: 0.0,
            blending_threshold: 0.1,
            is_animating: true,
            is_looping: true,
        }
    }
}

pub struct AnimationBlender {
    skeleton: ResourceId,
    blends: Vec<BlendSample>,

    locals: Vec<JointPose>,
    models: Vec<Mat4>,

    skinning_palette: SkinningPalette,
    pub info: AnimationBlenderInfo,
}

impl AnimationBlender {
    pub fn new(resources: &Resources, skeleton_id: ResourceId) -> Result<Self> {
        let joints = resources.get_skeleton(skeleton_id).joints_count();

        Ok(Self {
            skeleton: skeleton_id,
            blends: Vec::new(),
            locals: vec![JointPose::identity(); joints],
            models: vec![Mat4::IDENTITY; joints],
            skinning_palette: [Mat4::IDENTITY; JOINTS_MAX],
            info: AnimationBlenderInfo::default(),
        })
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

    #[inline]
    #[must_use]
    pub fn blends(&self) -> &[BlendSample] {
        &self.blends
    }

    /// Adds a clip to the blend list.
    pub fn push_animation(&mut self, resources: &Resources, animation_id: ResourceId) {
        assert!(
            self.blends.len() < ANIMATION_BLENDS_MAX,
            "Animation blender sample overflow"
        );

        let joints = resources.get_skeleton(self.skeleton).joints_count();
        let duration = resources.get_animation(animation_id).duration;

        let mut context = SamplingContext::default();
        context.resize(joints);

        self.blends.push(BlendSample {
            animation: animation_id,
            context,
            locals: vec![JointPose::identity(); joints],
            time: 0.0,
            duration,
            weight: 0.0,
            speed: 1.0,
        });
    }

    /// Overrides one sample's weight. The next update recomputes weights
    /// from `blending_ratio`, so this is only meaningful for manual blends.
    pub fn set_animation_weight(&mut self, index: usize, weight: f32) {
        assert!(index < self.blends.len(), "Blend sample index out of range");
        self.blends[index].weight = weight;
    }

    /// Advances all samples and rebuilds the skinning palette.
    pub fn update(&mut self, resources: &Resources, dt: f32) {
        if !self.info.is_animating || self.blends.is_empty() {
            return;
        }

        self.update_blend_weights();

        // Sampling jobs.
        let skeleton = resources.get_skeleton(self.skeleton);
        for blend in &mut self.blends {
            if blend.duration <= 0.0 {
                continue;
            }
            if !self.info.is_looping && blend.time >= 1.0 {
                continue;
            }

            blend.time += (dt * blend.speed) / blend.duration;
            if self.info.is_looping {
                blend.time = blend.time.rem_euclid(1.0);
            } else {
                blend.time = blend.time.clamp(0.0, 1.0);
            }

            // Too light to contribute this frame; skip the sampling work.
            if blend.weight <= 0.0 {
                continue;
            }

            let animation = resources.get_animation(blend.animation);
            let time = blend.time * blend.duration;
            for (i, joint) in skeleton.joints().iter().enumerate() {
                blend.locals[i] = match animation.tracks.get(i) {
                    Some(track) => {
                        track.sample_or_rest(time, &joint.local_rest, blend.context.cursor_mut(i))
                    }
                    None => joint.local_rest,
                };
            }
        }

        self.run_blending_job(resources);

        let skeleton = resources.get_skeleton(self.skeleton);
        skeleton.local_to_model(&self.locals, &mut self.models);
        for (i, inverse_bind) in skeleton.inverse_bind_matrices().iter().enumerate() {
            self.skinning_palette[i] = self.models[i] * *inverse_bind;
        }
    }

    /// Computes per-sample weights from `blending_ratio` and normalizes
    /// every sample's speed against the blended duration.
    fn update_blend_weights(&mut self) {
        let count = self.blends.len();
        if count == 1 {
            self.blends[0].weight = 1.0;
            self.blends[0].speed = 1.0;
            return;
        }

        let intervals_count = count - 1;
        let interval = 1.0 / intervals_count as f32;

        for (i, blend) in self.blends.iter_mut().enumerate() {
            let med = i as f32 * interval;
            let x = self.info.blending_ratio - med;
            blend.weight = ((interval - x.abs()) * intervals_count as f32).max(0.0);
        }

        // The blended duration comes from the two samples neighboring the
        // ratio; every sample's speed is its duration over that.
        let clamped_ratio = self.info.blending_ratio.clamp(0.0, 0.999);
        let lower = (clamped_ratio * intervals_count as f32) as usize;

        let blend_l = &self.blends[lower];
        let blend_r = &self.blends[lower + 1];
        let blended_duration =
            blend_l.duration * blend_l.weight + blend_r.duration * blend_r.weight;
        if blended_duration <= 0.0 {
            return;
        }

        let inv_duration = 1.0 / blended_duration;
        for blend in &mut self.blends {
            blend.speed = blend.duration * inv_duration;
        }
    }

    /// Blends the sampled local poses into `self.locals`, filling in the
    /// rest pose when the total weight sits under the threshold.
    fn run_blending_job(&mut self, resources: &Resources) {
        let skeleton = resources.get_skeleton(self.skeleton);
        let total_weight: f32 = self
            .blends
            .iter()
            .filter(|b| b.weight > 0.0)
            .map(|b| b.weight)
            .sum();

        let rest_weight = (self.info.blending_threshold - total_weight).max(0.0);
        let denom = total_weight + rest_weight;

        for (j, joint) in skeleton.joints().iter().enumerate() {
            if denom <= 0.0 {
                self.locals[j] = joint.local_rest;
                continue;
            }

            let mut position = Vec3::ZERO;
            let mut scale = Vec3::ZERO;
            let mut rotation = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
            let mut reference: Option<Quat> = None;

            for blend in self.blends.iter().filter(|b| b.weight > 0.0) {
                let pose = &blend.locals[j];
                position += pose.position * blend.weight;
                scale += pose.scale * blend.weight;

                let q = align_quat(pose.rotation, &mut reference);
                rotation = Quat::from_xyzw(
                    rotation.x + q.x * blend.weight,
                    rotation.y + q.y * blend.weight,
                    rotation.z + q.z * blend.weight,
                    rotation.w + q.w * blend.weight,
                );
            }

            if rest_weight > 0.0 {
                let rest = &joint.local_rest;
                position += rest.position * rest_weight;
                scale += rest.scale * rest_weight;
                let q = align_quat(rest.rotation, &mut reference);
                rotation = Quat::from_xyzw(
                    rotation.x + q.x * rest_weight,
                    rotation.y + q.y * rest_weight,
                    rotation.z + q.z * rest_weight,
                    rotation.w + q.w * rest_weight,
                );
            }

            self.locals[j] = JointPose {
                position: position / denom,
                rotation: rotation.normalize(),
                scale: scale / denom,
            };
        }
    }
}

/// Flips `q` into the hemisphere of the first accumulated rotation so the
/// weighted sum interpolates along the short arc.
fn align_quat(q: Quat, reference: &mut Option<Quat>) -> Quat {
    match reference {
        Some(r) => {
            if r.dot(q) < 0.0 {
                -q
            } else {
                q
            }
        }
        None => {
            *reference = Some(q);
            q
        }
    }
}
