//! Physics Interface
//!
//! The physics engine is an external collaborator. The entity world only
//! consumes authoritative transforms from it each tick, so the engine-side
//! surface is a pair of object-safe traits the collaborator implements.

use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsBodyType {
    /// Never moves; the world skips transform sync for these.
    Static,
    Dynamic,
    Kinematic,
}

/// A rigid body owned by the physics collaborator.
pub trait PhysicsBody {
    fn body_type(&self) -> PhysicsBodyType;

    /// World-space position after the last physics step.
    fn position(&self) -> Vec3;

    /// World-space rotation after the last physics step.
    fn rotation(&self) -> Quat;

    /// Stable id used in physics contact events.
    fn id(&self) -> u64;

    /// Removes the body from its physics world. Called once on entity
    /// destruction, before the component is dropped.
    fn destroy(&mut self) {}
}

/// A character controller owned by the physics collaborator.
pub trait CharacterBody {
    /// Steps the character's internal state. Called once per world update.
    fn update(&mut self);

    fn position(&self) -> Vec3;

    fn rotation(&self) -> Quat;

    /// Removes the character from its physics world. Called once on entity
    /// destruction, before the component is dropped.
    fn destroy(&mut self) {}
}
