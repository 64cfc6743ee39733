//! Transform tests
//!
//! Tests for:
//! - TRS set/read round-trips
//! - The cached matrix composing as translate * rotate * scale
//! - Setter-driven vs explicit-apply matrix updates

use glam::{Mat4, Quat, Vec3};
use kestrel::Transform;
use std::f32::consts::FRAC_PI_2;

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn mat4_approx(a: Mat4, b: Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| approx_eq(*x, *y))
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
    assert_eq!(t.matrix(), Mat4::IDENTITY);
}

// ============================================================================
// Round-trips
// ============================================================================

#[test]
fn transform_fields_round_trip_bitwise() {
    let position = Vec3::new(1.5, -2.25, 0.125);
    let rotation = Quat::from_rotation_y(FRAC_PI_2);
    let scale = Vec3::new(2.0, 3.0, 0.5);

    let mut t = Transform::new();
    t.set_position(position);
    t.set_rotation(rotation);
    t.set_scale(scale);

    // Set-then-read returns bitwise-equal values.
    assert_eq!(t.position, position);
    assert_eq!(t.rotation, rotation);
    assert_eq!(t.scale, scale);
}

#[test]
fn transform_matrix_composes_trs() {
    let position = Vec3::new(10.0, 20.0, 30.0);
    let rotation = Quat::from_rotation_z(0.7);
    let scale = Vec3::new(2.0, 2.0, 2.0);

    let mut t = Transform::new();
    t.set_position(position);
    t.set_rotation(rotation);
    t.set_scale(scale);

    let expected = Mat4::from_translation(position)
        * Mat4::from_quat(rotation)
        * Mat4::from_scale(scale);
    assert!(mat4_approx(t.matrix(), expected));
}

// ============================================================================
// Apply semantics
// ============================================================================

#[test]
fn direct_field_mutation_requires_apply() {
    let mut t = Transform::new();

    // Direct field writes do not touch the cached matrix...
    t.position = Vec3::new(5.0, 0.0, 0.0);
    assert_eq!(t.matrix(), Mat4::IDENTITY);

    // ...until apply re-derives it.
    t.apply();
    assert!(approx_eq(t.matrix().w_axis.x, 5.0));
}

#[test]
fn setters_apply_immediately() {
    let mut t = Transform::new();
    t.set_position(Vec3::new(0.0, 7.0, 0.0));
    assert!(approx_eq(t.matrix().w_axis.y, 7.0));

    t.set_scale(Vec3::splat(3.0));
    assert!(approx_eq(t.matrix().x_axis.x, 3.0));
}

#[test]
fn translate_accumulates() {
    let mut t = Transform::new();
    t.translate(Vec3::new(1.0, 0.0, 0.0));
    t.translate(Vec3::new(2.0, 0.0, 0.0));

    assert!(approx_eq(t.position.x, 3.0));
    assert!(approx_eq(t.matrix().w_axis.x, 3.0));
}

#[test]
fn rotation_axis_angle_matches_quat() {
    let mut t = Transform::new();
    t.set_rotation_axis_angle(Vec3::Y, FRAC_PI_2);

    let expected = Quat::from_rotation_y(FRAC_PI_2);
    assert!(t.rotation.angle_between(expected) < EPSILON);
}
