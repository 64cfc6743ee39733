//! Particle Emitters
//!
//! Fixed-pool CPU particles: every emitter owns transforms, velocities,
//! and force accumulators for up to [`PARTICLES_MAX`] particles, a
//! distribution that shapes the initial velocities on emit, a gravity
//! factor, and a lifetime timer that deactivates the emitter when it runs
//! out.

use glam::Vec3;
use rand::RngExt;

use crate::resources::ResourceId;
use crate::timer::Timer;
use crate::transform::Transform;

/// The maximum amount of particles that can be emitted per emitter.
pub const PARTICLES_MAX: usize = 1024;

/// How emitted particles spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleDistributionType {
    /// Uniformly random directions scaled by the distribution radius.
    #[default]
    Random,
    /// Spread across the horizontal plane only.
    Square,
    /// Spread within a cube around the emitter.
    Cube,
}

/// Emitter creation parameters.
#[derive(Debug, Clone, Copy)]
pub struct ParticleEmitterDesc {
    /// The starting position of the particles.
    pub position: Vec3,
    /// The velocity applied to each particle in the update loop.
    pub velocity: Vec3,
    /// The unit scale of each particle.
    pub scale: Vec3,

    pub mesh_id: Option<ResourceId>,
    pub material_id: Option<ResourceId>,

    /// How long particles live after being emitted.
    pub lifetime: f32,
    pub gravity_factor: f32,

    pub distribution: ParticleDistributionType,
    /// The area or radius of the distribution. For `Random`, the radius is
    /// the maximum of the random range and its negation the minimum.
    pub distribution_radius: f32,

    /// The amount of particles to emit. Cannot exceed [`PARTICLES_MAX`].
    pub count: usize,
}

impl Default for ParticleEmitterDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            scale: Vec3::splat(0.2),
            mesh_id: None,
            material_id: None,
            lifetime: 2.5,
            gravity_factor: -9.81,
            distribution: ParticleDistributionType::Random,
            distribution_radius: 1.0,
            count: 0,
        }
    }
}

pub struct ParticleEmitter {
    pub initial_position: Vec3,
    pub initial_velocity: Vec3,

    pub transforms: Vec<Transform>,
    pub velocities: Vec<Vec3>,
    pub forces: Vec<Vec3>,

    pub particles_count: usize,
    pub lifetime: Timer,

    pub mesh_id: Option<ResourceId>,
    pub material_id: Option<ResourceId>,

    pub distribution: ParticleDistributionType,
    pub distribution_radius: f32,

    pub gravity_factor: f32,
    pub is_active: bool,
}

impl ParticleEmitter {
    #[must_use]
    pub fn new(desc: &ParticleEmitterDesc) -> Self {
        assert!(
            desc.count <= PARTICLES_MAX,
            "Particle emitter count exceeds PARTICLES_MAX"
        );

        let mut transform = Transform::new();
        transform.position = desc.position;
        transform.scale = desc.scale;
        transform.apply();

        Self {
            initial_position: desc.position,
            initial_velocity: desc.velocity,
            transforms: vec![transform; desc.count],
            velocities: vec![desc.velocity; desc.count],
            forces: vec![Vec3::ZERO; desc.count],
            particles_count: desc.count,
            lifetime: Timer::new(desc.lifetime, false, true),
            mesh_id: desc.mesh_id,
            material_id: desc.material_id,
            distribution: desc.distribution,
            distribution_radius: desc.distribution_radius,
            gravity_factor: desc.gravity_factor,
            is_active: false,
        }
    }

    /// Integrates the live particles and counts the lifetime down.
    pub fn update(&mut self, dt: f32) {
        if !self.is_active {
            return;
        }

        let gravity = Vec3::new(0.0, self.gravity_factor, 0.0);
        for i in 0..self.particles_count {
            let velocity = self.velocities[i] + gravity;
            let position = self.transforms[i].position + velocity * dt;
            self.transforms[i].set_position(position);
        }

        self.lifetime.update(dt);
        if !self.lifetime.has_runout {
            return;
        }

        self.is_active = false;
    }

    /// Activates the emitter and spreads the particle velocities by the
    /// configured distribution.
    pub fn emit(&mut self) {
        if !self.is_active {
            self.reset();
            self.is_active = true;
        }

        match self.distribution {
            ParticleDistributionType::Random => self.apply_random_distribution(),
            ParticleDistributionType::Square => self.apply_square_distribution(),
            ParticleDistributionType::Cube => self.apply_cube_distribution(),
        }
    }

    /// Puts every particle back at the emitter's initial state.
    pub fn reset(&mut self) {
        self.is_active = false;
        self.lifetime.reset();

        for transform in &mut self.transforms[..self.particles_count] {
            transform.set_position(self.initial_position);
        }
        for force in &mut self.forces[..self.particles_count] {
            *force = Vec3::ZERO;
        }
        for velocity in &mut self.velocities[..self.particles_count] {
            *velocity = self.initial_velocity;
        }
    }

    fn apply_random_distribution(&mut self) {
        let radius = self.distribution_radius;
        let mut rng = rand::rng();

        for velocity in &mut self.velocities[..self.particles_count] {
            let direction = Vec3::new(
                rng.random_range(-radius..=radius),
                rng.random_range(-radius..=radius),
                rng.random_range(-radius..=radius),
            );
            *velocity *= direction;
        }
    }

    fn apply_square_distribution(&mut self) {
        let min = (self.initial_position - self.distribution_radius / 2.0).normalize_or_zero();
        let max = (min + self.distribution_radius).normalize_or_zero();
        let mut rng = rand::rng();

        for velocity in &mut self.velocities[..self.particles_count] {
            let direction = Vec3::new(
                rng.random_range(min.x.min(max.x)..=min.x.max(max.x)),
                1.0,
                rng.random_range(min.z.min(max.z)..=min.z.max(max.z)),
            );
            *velocity *= direction;
        }
    }

    fn apply_cube_distribution(&mut self) {
        let min = (self.initial_position - self.distribution_radius / 2.0).normalize_or_zero();
        let max = (min + self.distribution_radius).normalize_or_zero();
        let mut rng = rand::rng();

        for velocity in &mut self.velocities[..self.particles_count] {
            let direction = Vec3::new(
                rng.random_range(min.x.min(max.x)..=min.x.max(max.x)),
                rng.random_range(min.y.min(max.y)..=min.y.max(max.y)),
                rng.random_range(min.z.min(max.z)..=min.z.max(max.z)),
            );
            *velocity *= direction;
        }
    }
}
