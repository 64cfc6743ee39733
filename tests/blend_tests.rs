//! Animation blender tests
//!
//! Tests for:
//! - The blend weight partition across N samples
//! - Blended duration and per-sample speed normalization
//! - Threshold-driven rest pose fill
//! - Palette construction from a blended pose

use glam::{Mat4, Vec3};
use kestrel::animation::blender::AnimationBlender;
use kestrel::animation::clip::{AnimationClip, JointTrack};
use kestrel::animation::skeleton::{Joint, JointPose, Skeleton};
use kestrel::animation::tracks::{InterpolationMode, KeyframeTrack};
use kestrel::resources::{RESOURCE_CACHE, ResourceId, Resources};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Helpers
// ============================================================================

fn one_joint_skeleton() -> Skeleton {
    Skeleton::new(
        vec![Joint {
            name: "root".to_string(),
            parent: None,
            local_rest: JointPose::identity(),
        }],
        0,
        vec![Mat4::IDENTITY],
    )
    .expect("valid skeleton")
}

/// A clip holding the root at `height` for `duration` seconds.
fn hold_clip(name: &str, height: f32, duration: f32) -> AnimationClip {
    let mut track = JointTrack::default();
    track.positions = KeyframeTrack::new(
        vec![0.0, duration],
        vec![Vec3::new(0.0, height, 0.0), Vec3::new(0.0, height, 0.0)],
        InterpolationMode::Linear,
    );
    let mut clip = AnimationClip::new(name, vec![track]);
    clip.duration = duration;
    clip
}

fn blender_setup(clips: &[(f32, f32)]) -> (Resources, AnimationBlender) {
    let mut resources = Resources::new();
    let skeleton = resources.push_skeleton(RESOURCE_CACHE, one_joint_skeleton());

    let ids: Vec<ResourceId> = clips
        .iter()
        .enumerate()
        .map(|(i, (height, duration))| {
            resources.push_animation(
                RESOURCE_CACHE,
                hold_clip(&format!("clip{i}"), *height, *duration),
            )
        })
        .collect();

    let mut blender = AnimationBlender::new(&resources, skeleton).unwrap();
    for id in ids {
        blender.push_animation(&resources, id);
    }

    (resources, blender)
}

// ============================================================================
// Weights & speeds
// ============================================================================

#[test]
fn two_clips_at_half_ratio_split_evenly() {
    let (resources, mut blender) = blender_setup(&[(0.0, 1.0), (0.0, 2.0)]);
    blender.info.blending_ratio = 0.5;

    blender.update(&resources, 0.01);

    let blends = blender.blends();
    assert!(approx(blends[0].weight, 0.5), "w0 = {}", blends[0].weight);
    assert!(approx(blends[1].weight, 0.5), "w1 = {}", blends[1].weight);

    // Blended duration = 1.0 * 0.5 + 2.0 * 0.5 = 1.5; speeds normalize
    // against it.
    assert!(approx(blends[0].speed, 1.0 / 1.5), "s0 = {}", blends[0].speed);
    assert!(approx(blends[1].speed, 2.0 / 1.5), "s1 = {}", blends[1].speed);
}

#[test]
fn ratio_zero_gives_first_clip_everything() {
    let (resources, mut blender) = blender_setup(&[(0.0, 1.0), (0.0, 2.0)]);
    blender.info.blending_ratio = 0.0;

    blender.update(&resources, 0.01);

    let blends = blender.blends();
    assert!(approx(blends[0].weight, 1.0));
    assert!(approx(blends[1].weight, 0.0));
}

#[test]
fn only_neighboring_samples_carry_weight() {
    let (resources, mut blender) = blender_setup(&[(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)]);
    blender.info.blending_ratio = 0.25;

    blender.update(&resources, 0.01);

    let blends = blender.blends();
    assert!(blends[0].weight > 0.0);
    assert!(blends[1].weight > 0.0);
    assert!(approx(blends[2].weight, 0.0), "w2 = {}", blends[2].weight);

    // The weight partition never dips below zero in total.
    let total: f32 = blends.iter().map(|b| b.weight).sum();
    assert!(total >= 0.0);
}

#[test]
fn single_clip_blend_is_passthrough() {
    let (resources, mut blender) = blender_setup(&[(3.0, 1.0)]);

    blender.update(&resources, 0.01);

    let blends = blender.blends();
    assert!(approx(blends[0].weight, 1.0));
    assert!(approx(blends[0].speed, 1.0));
}

// ============================================================================
// Blended pose
// ============================================================================

#[test]
fn blended_pose_mixes_clip_values() {
    // Clip A holds the root at y=0, clip B at y=2; an even blend lands in
    // the middle.
    let (resources, mut blender) = blender_setup(&[(0.0, 1.0), (2.0, 1.0)]);
    blender.info.blending_ratio = 0.5;
    blender.info.blending_threshold = 0.1;

    blender.update(&resources, 0.01);

    let palette = blender.skinning_palette();
    assert!(
        approx(palette[0].w_axis.y, 1.0),
        "Blended height = {}",
        palette[0].w_axis.y
    );
}

#[test]
fn under_threshold_rest_pose_fills_in() {
    let (resources, mut blender) = blender_setup(&[(4.0, 1.0), (4.0, 1.0)]);
    blender.info.blending_ratio = 0.5;
    // A threshold far above the achievable total pulls the pose towards
    // the rest pose (root at y=0).
    blender.info.blending_threshold = 4.0;

    blender.update(&resources, 0.01);

    let palette = blender.skinning_palette();
    // Weighted mix: (0.5 + 0.5) * 4.0 + 3.0 * 0.0, normalized by 4.0.
    assert!(
        approx(palette[0].w_axis.y, 1.0),
        "Rest-filled height = {}",
        palette[0].w_axis.y
    );
}

#[test]
fn not_animating_blender_holds_palette() {
    let (resources, mut blender) = blender_setup(&[(1.0, 1.0), (2.0, 1.0)]);
    blender.info.is_animating = false;

    blender.update(&resources, 0.01);

    assert_eq!(blender.skinning_palette()[0], Mat4::IDENTITY);
}

#[test]
fn blend_times_stay_normalized() {
    let (resources, mut blender) = blender_setup(&[(0.0, 1.0), (0.0, 2.0)]);
    blender.info.blending_ratio = 0.3;

    for _ in 0..100 {
        blender.update(&resources, 0.05);
        for blend in blender.blends() {
            assert!(
                (0.0..=1.0).contains(&blend.time),
                "blend time {} escaped [0, 1]",
                blend.time
            );
        }
    }
}
