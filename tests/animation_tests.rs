//! Animation core tests
//!
//! Tests for:
//! - KeyframeTrack interpolation and boundary clamping
//! - Skeleton validation and local-to-model conversion
//! - AnimationClip duration derivation
//! - Sampler time advance, loop wrap, hold, and reverse playback
//! - Skinning palette construction

use glam::{Mat4, Quat, Vec3};
use kestrel::animation::clip::{AnimationClip, JointTrack};
use kestrel::animation::sampler::AnimationSampler;
use kestrel::animation::skeleton::{Joint, JointPose, Skeleton};
use kestrel::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use kestrel::resources::{RESOURCE_CACHE, ResourceId, Resources};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Helpers
// ============================================================================

fn simple_joint(name: &str, parent: Option<usize>) -> Joint {
    Joint {
        name: name.to_string(),
        parent,
        local_rest: JointPose::identity(),
    }
}

/// A two-joint skeleton whose child rests one unit along +X.
fn two_joint_skeleton() -> Skeleton {
    let mut child = simple_joint("child", Some(0));
    child.local_rest.position = Vec3::X;

    Skeleton::new(
        vec![simple_joint("root", None), child],
        0,
        vec![Mat4::IDENTITY, Mat4::IDENTITY],
    )
    .expect("valid skeleton")
}

/// A clip translating the root from origin to (0, 2, 0) over one second.
fn root_lift_clip() -> AnimationClip {
    let mut track = JointTrack::default();
    track.positions = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)],
        InterpolationMode::Linear,
    );
    AnimationClip::new("lift", vec![track, JointTrack::default()])
}

fn sampler_setup(duration: f32) -> (Resources, ResourceId, ResourceId) {
    let mut resources = Resources::new();
    let skeleton = resources.push_skeleton(RESOURCE_CACHE, two_joint_skeleton());

    let mut clip = root_lift_clip();
    clip.duration = duration;
    let animation = resources.push_animation(RESOURCE_CACHE, clip);

    (resources, skeleton, animation)
}

// ============================================================================
// KeyframeTrack
// ============================================================================

#[test]
fn track_linear_midpoint() {
    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 10.0], InterpolationMode::Linear);
    let mut cursor = KeyframeCursor::default();

    let value = track.sample_with_cursor(0.5, &mut cursor).unwrap();
    assert!(approx(value, 5.0), "Expected 5.0, got {value}");
}

#[test]
fn track_linear_exact_keyframes() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );
    let mut cursor = KeyframeCursor::default();

    assert!(approx(track.sample_with_cursor(0.0, &mut cursor).unwrap(), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor).unwrap(), 10.0));
    assert!(approx(track.sample_with_cursor(2.0, &mut cursor).unwrap(), 20.0));
}

#[test]
fn track_clamps_outside_range() {
    let track = KeyframeTrack::new(vec![1.0, 2.0], vec![10.0_f32, 20.0], InterpolationMode::Linear);
    let mut cursor = KeyframeCursor::default();

    // Before the first keyframe and past the last one both clamp.
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor).unwrap(), 10.0));
    assert!(approx(track.sample_with_cursor(5.0, &mut cursor).unwrap(), 20.0));
}

#[test]
fn track_step_holds_value() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );
    let mut cursor = KeyframeCursor::default();

    assert!(approx(track.sample_with_cursor(0.5, &mut cursor).unwrap(), 0.0));
    assert!(approx(track.sample_with_cursor(0.99, &mut cursor).unwrap(), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor).unwrap(), 100.0));
    assert!(approx(track.sample_with_cursor(1.5, &mut cursor).unwrap(), 100.0));
}

#[test]
fn track_cursor_survives_reverse_playback() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0],
        vec![0.0_f32, 1.0, 2.0, 3.0],
        InterpolationMode::Linear,
    );
    let mut cursor = KeyframeCursor::default();

    assert!(approx(track.sample_with_cursor(2.5, &mut cursor).unwrap(), 2.5));
    // Sampling backwards re-seats the cursor.
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor).unwrap(), 0.5));
}

#[test]
fn empty_track_samples_none() {
    let track: KeyframeTrack<Vec3> = KeyframeTrack::default();
    let mut cursor = KeyframeCursor::default();
    assert!(track.sample_with_cursor(0.5, &mut cursor).is_none());
}

// ============================================================================
// Skeleton
// ============================================================================

#[test]
fn skeleton_rejects_non_topological_parent() {
    let mut bad_child = simple_joint("child", Some(1));
    bad_child.local_rest.position = Vec3::X;

    let result = Skeleton::new(
        vec![simple_joint("root", None), bad_child],
        0,
        vec![Mat4::IDENTITY, Mat4::IDENTITY],
    );
    assert!(result.is_err());
}

#[test]
fn skeleton_rejects_mismatched_inverse_binds() {
    let result = Skeleton::new(vec![simple_joint("root", None)], 0, Vec::new());
    assert!(result.is_err());
}

#[test]
fn local_to_model_chains_parents() {
    let skeleton = two_joint_skeleton();

    let mut locals = skeleton.rest_pose();
    locals[0].position = Vec3::new(0.0, 5.0, 0.0);

    let mut models = vec![Mat4::IDENTITY; 2];
    skeleton.local_to_model(&locals, &mut models);

    // The child inherits the root's translation plus its own rest offset.
    let child_position = models[1].w_axis.truncate();
    assert!(approx(child_position.x, 1.0));
    assert!(approx(child_position.y, 5.0));
}

// ============================================================================
// AnimationClip
// ============================================================================

#[test]
fn clip_duration_derives_from_tracks() {
    let clip = root_lift_clip();
    assert!(approx(clip.duration, 1.0));
}

// ============================================================================
// AnimationSampler
// ============================================================================

#[test]
fn sampler_loop_wraps_normalized_time() {
    let (resources, skeleton, animation) = sampler_setup(2.0);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    sampler.info.current_time = 0.99;
    sampler.info.play_speed = 1.0;
    sampler.info.is_looping = true;

    sampler.update(&resources, 0.04);

    // (0.99 + 0.04 * 1 / 2.0) mod 1 = 0.01
    assert!(
        approx(sampler.info.current_time, 0.01),
        "Expected 0.01, got {}",
        sampler.info.current_time
    );
}

#[test]
fn sampler_non_looping_holds_at_end() {
    let (resources, skeleton, animation) = sampler_setup(1.0);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    sampler.info.is_looping = false;
    sampler.info.current_time = 0.95;

    sampler.update(&resources, 0.2);
    assert!(approx(sampler.info.current_time, 1.0));

    // Past the end with looping off, the time stays put.
    sampler.update(&resources, 0.2);
    assert!(approx(sampler.info.current_time, 1.0));
}

#[test]
fn sampler_zero_speed_holds_time() {
    let (resources, skeleton, animation) = sampler_setup(1.0);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    sampler.info.play_speed = 0.0;
    sampler.info.current_time = 0.25;

    sampler.update(&resources, 0.5);
    assert!(approx(sampler.info.current_time, 0.25));
}

#[test]
fn sampler_negative_speed_decreases_time() {
    let (resources, skeleton, animation) = sampler_setup(1.0);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    sampler.info.play_speed = -1.0;
    sampler.info.current_time = 0.5;

    sampler.update(&resources, 0.1);
    assert!(
        sampler.info.current_time < 0.5,
        "Time should decrease, got {}",
        sampler.info.current_time
    );
}

#[test]
fn sampler_not_animating_skips() {
    let (resources, skeleton, animation) = sampler_setup(1.0);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    sampler.info.is_animating = false;
    sampler.info.current_time = 0.5;

    sampler.update(&resources, 0.1);
    assert!(approx(sampler.info.current_time, 0.5));
}

#[test]
fn sampler_time_stays_normalized() {
    let (resources, skeleton, animation) = sampler_setup(0.5);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    for _ in 0..200 {
        sampler.update(&resources, 0.037);
        assert!(
            (0.0..=1.0).contains(&sampler.info.current_time),
            "current_time {} escaped [0, 1]",
            sampler.info.current_time
        );
    }
}

#[test]
fn sampler_palette_tracks_root_motion() {
    let (resources, skeleton, animation) = sampler_setup(1.0);
    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();

    // Land the normalized time on the clip's midpoint.
    sampler.update(&resources, 0.5);
    assert!(approx(sampler.info.current_time, 0.5));

    // With identity inverse binds, the palette is the model pose: the
    // root sits at half the lift.
    let palette = sampler.skinning_palette();
    assert!(approx(palette[0].w_axis.y, 1.0));

    // Unused palette tail entries stay identity.
    assert_eq!(palette[64], Mat4::IDENTITY);
}

#[test]
fn sampler_applies_inverse_bind() {
    let mut resources = Resources::new();

    let mut child = simple_joint_at("child", Some(0), Vec3::X);
    child.local_rest.rotation = Quat::IDENTITY;
    let skeleton = Skeleton::new(
        vec![simple_joint("root", None), child],
        0,
        vec![
            Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
            Mat4::IDENTITY,
        ],
    )
    .unwrap();
    let skeleton = resources.push_skeleton(RESOURCE_CACHE, skeleton);
    let animation = resources.push_animation(RESOURCE_CACHE, root_lift_clip());

    let mut sampler = AnimationSampler::new(&resources, skeleton, &[animation]).unwrap();
    sampler.update(&resources, 0.5);

    // palette = model * inverse_bind: the lift (1.0 at midpoint) composes
    // with the bind offset (-1.0).
    let palette = sampler.skinning_palette();
    assert!(approx(palette[0].w_axis.y, 0.0));
}

fn simple_joint_at(name: &str, parent: Option<usize>, position: Vec3) -> Joint {
    let mut joint = simple_joint(name, parent);
    joint.local_rest.position = position;
    joint
}
