//! Animation Clips
//!
//! A clip is one keyframe track triple (position, rotation, scale) per
//! joint, keyed by absolute time within `[0, duration]`.

use glam::{Quat, Vec3};

use crate::animation::skeleton::JointPose;
use crate::animation::tracks::{KeyframeCursor, KeyframeTrack};

/// The keyframe tracks of one joint. Any track may be empty, in which case
/// that channel holds the joint's rest value.
#[derive(Debug, Clone, Default)]
pub struct JointTrack {
    pub positions: KeyframeTrack<Vec3>,
    pub rotations: KeyframeTrack<Quat>,
    pub scales: KeyframeTrack<Vec3>,
}

/// Per-joint cursor state for one clip.
#[derive(Debug, Clone, Copy, Default)]
pub struct JointCursors {
    pub position: KeyframeCursor,
    pub rotation: KeyframeCursor,
    pub scale: KeyframeCursor,
}

impl JointTrack {
    /// Samples the joint's pose at `time`, taking missing channels from
    /// `rest`.
    #[must_use]
    pub fn sample_or_rest(&self, time: f32, rest: &JointPose, cursors: &mut JointCursors) -> JointPose {
        JointPose {
            position: self
                .positions
                .sample_with_cursor(time, &mut cursors.position)
                .unwrap_or(rest.position),
            rotation: self
                .rotations
                .sample_with_cursor(time, &mut cursors.rotation)
                .unwrap_or(rest.rotation),
            scale: self
                .scales
                .sample_with_cursor(time, &mut cursors.scale)
                .unwrap_or(rest.scale),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// Clip length in seconds; the maximum end time across all tracks.
    pub duration: f32,
    /// Default playback rate applied by samplers created from this clip.
    pub playback_rate: f32,
    /// One track per joint, indexed like the skeleton's joint array.
    pub tracks: Vec<JointTrack>,
}

impl AnimationClip {
    /// Builds a clip, deriving `duration` from the tracks' end times.
    #[must_use]
    pub fn new(name: &str, tracks: Vec<JointTrack>) -> Self {
        let duration = tracks
            .iter()
            .flat_map(|t| {
                [
                    t.positions.end_time(),
                    t.rotations.end_time(),
                    t.scales.end_time(),
                ]
            })
            .fold(0.0_f32, f32::max);

        Self {
            name: name.to_string(),
            duration,
            playback_rate: 1.0,
            tracks,
        }
    }
}
