//! Entity World
//!
//! A lean component world: every entity owns a [`Transform`]; all other
//! components live in secondary maps keyed by the entity. Sweeps iterate
//! entities in creation order.
//!
//! The update sweep transfers authoritative state into each entity's
//! transform (physics bodies, characters), advances the animation drivers,
//! then the timers and emitters. The render sweep pushes every visual
//! component into its render queue. The destroy path tears down components
//! owning external resources first and announces the entity's death before
//! any of it happens.

use glam::{Quat, Vec3};
use slotmap::{SlotMap, SparseSecondaryMap, new_key_type};

use crate::animation::{AnimationBlender, AnimationSampler};
use crate::events::{Event, Events};
use crate::particles::{ParticleEmitter, ParticleEmitterDesc};
use crate::physics::{CharacterBody, PhysicsBody, PhysicsBodyType};
use crate::renderer::Renderer;
use crate::resources::{ResourceId, Resources};
use crate::timer::Timer;
use crate::transform::Transform;

new_key_type! {
    /// A world entity.
    pub struct EntityId;
}

impl EntityId {
    /// The raw id carried by entity events.
    #[must_use]
    pub fn raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

// ============================================================================
// Components
// ============================================================================

/// What a renderable component draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableType {
    Mesh,
    Model,
    DebugCube,
    DebugSphere,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderableComponent {
    pub ty: RenderableType,
    /// The mesh or model to draw; unused for debug primitives.
    pub renderable_id: Option<ResourceId>,
    pub material_id: Option<ResourceId>,
}

#[derive(Debug, Clone)]
pub struct InstancedRenderableComponent {
    pub ty: RenderableType,
    pub renderable_id: Option<ResourceId>,
    pub material_id: Option<ResourceId>,
    pub transforms: Vec<Transform>,
}

pub struct PhysicsComponent {
    pub body: Box<dyn PhysicsBody>,
}

pub struct CharacterComponent {
    pub character: Box<dyn CharacterBody>,
}

/// A positional audio source; playback belongs to the audio collaborator.
#[derive(Debug, Clone, Copy)]
pub struct AudioSourceComponent {
    pub buffer: ResourceId,
    pub volume: f32,
    pub is_looping: bool,
}

// ============================================================================
// EntityWorld
// ============================================================================

#[derive(Default)]
pub struct EntityWorld {
    transforms: SlotMap<EntityId, Transform>,
    /// Entities in creation order; sweeps follow this.
    order: Vec<EntityId>,

    physics: SparseSecondaryMap<EntityId, PhysicsComponent>,
    characters: SparseSecondaryMap<EntityId, CharacterComponent>,
    renderables: SparseSecondaryMap<EntityId, RenderableComponent>,
    instanced: SparseSecondaryMap<EntityId, InstancedRenderableComponent>,
    samplers: SparseSecondaryMap<EntityId, AnimationSampler>,
    blenders: SparseSecondaryMap<EntityId, AnimationBlender>,
    emitters: SparseSecondaryMap<EntityId, ParticleEmitter>,
    timers: SparseSecondaryMap<EntityId, Timer>,
    audio_sources: SparseSecondaryMap<EntityId, AudioSourceComponent>,
}

impl EntityWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every entity without dispatching events.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn entities_count(&self) -> usize {
        self.order.len()
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    /// Creates an entity with a transform and announces it.
    pub fn create_entity(
        &mut self,
        events: &mut Events,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> EntityId {
        let mut transform = Transform::new();
        transform.position = position;
        transform.rotation = rotation;
        transform.scale = scale;
        transform.apply();

        let entity = self.transforms.insert(transform);
        self.order.push(entity);

        events.dispatch(&Event::EntityAdded {
            entity_id: entity.raw(),
        });

        entity
    }

    /// Destroys an entity: the death event fires first, then components
    /// owning external resources are torn down, then the entity's row.
    pub fn destroy_entity(&mut self, events: &mut Events, entity: EntityId) {
        events.dispatch(&Event::EntityDestroyed {
            entity_id: entity.raw(),
        });

        if let Some(mut component) = self.physics.remove(entity) {
            component.body.destroy();
        }
        if let Some(mut component) = self.characters.remove(entity) {
            component.character.destroy();
        }
        self.samplers.remove(entity);
        self.blenders.remove(entity);

        self.renderables.remove(entity);
        self.instanced.remove(entity);
        self.emitters.remove(entity);
        self.timers.remove(entity);
        self.audio_sources.remove(entity);

        self.transforms.remove(entity);
        self.order.retain(|&e| e != entity);
    }

    // ------------------------------------------------------------------
    // Component registration
    // ------------------------------------------------------------------

    pub fn add_physics_body(&mut self, entity: EntityId, body: Box<dyn PhysicsBody>) {
        self.physics.insert(entity, PhysicsComponent { body });
    }

    pub fn add_character_body(&mut self, entity: EntityId, character: Box<dyn CharacterBody>) {
        self.characters
            .insert(entity, CharacterComponent { character });
    }

    pub fn add_renderable(&mut self, entity: EntityId, renderable: RenderableComponent) {
        self.renderables.insert(entity, renderable);
    }

    pub fn add_instanced_renderable(
        &mut self,
        entity: EntityId,
        renderable: InstancedRenderableComponent,
    ) {
        self.instanced.insert(entity, renderable);
    }

    pub fn add_animation_sampler(&mut self, entity: EntityId, sampler: AnimationSampler) {
        self.samplers.insert(entity, sampler);
    }

    pub fn add_animation_blender(&mut self, entity: EntityId, blender: AnimationBlender) {
        self.blenders.insert(entity, blender);
    }

    /// Creates and attaches an emitter rooted at the entity's position.
    pub fn add_particle_emitter(&mut self, entity: EntityId, mut desc: ParticleEmitterDesc) {
        if let Some(transform) = self.transforms.get(entity) {
            desc.position = transform.position;
        }
        self.emitters.insert(entity, ParticleEmitter::new(&desc));
    }

    pub fn add_timer(&mut self, entity: EntityId, limit: f32, one_shot: bool, active: bool) {
        self.timers.insert(entity, Timer::new(limit, one_shot, active));
    }

    pub fn add_audio_source(&mut self, entity: EntityId, source: AudioSourceComponent) {
        self.audio_sources.insert(entity, source);
    }

    // ------------------------------------------------------------------
    // Component access
    // ------------------------------------------------------------------

    #[must_use]
    pub fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transforms.get(entity)
    }

    #[must_use]
    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms.get_mut(entity)
    }

    #[must_use]
    pub fn sampler_mut(&mut self, entity: EntityId) -> Option<&mut AnimationSampler> {
        self.samplers.get_mut(entity)
    }

    #[must_use]
    pub fn blender_mut(&mut self, entity: EntityId) -> Option<&mut AnimationBlender> {
        self.blenders.get_mut(entity)
    }

    #[must_use]
    pub fn emitter_mut(&mut self, entity: EntityId) -> Option<&mut ParticleEmitter> {
        self.emitters.get_mut(entity)
    }

    #[must_use]
    pub fn timer(&self, entity: EntityId) -> Option<&Timer> {
        self.timers.get(entity)
    }

    // ------------------------------------------------------------------
    // Sweeps
    // ------------------------------------------------------------------

    /// The update sweep: physics → characters → samplers → blenders →
    /// timers → emitters, in entity-creation order within each step.
    pub fn update(&mut self, resources: &Resources, dt: f32) {
        // Physics bodies push their authoritative transform in.
        for &entity in &self.order {
            let Some(component) = self.physics.get(entity) else {
                continue;
            };
            // No need to update the transforms of static bodies.
            if component.body.body_type() == PhysicsBodyType::Static {
                continue;
            }
            let (position, rotation) = (component.body.position(), component.body.rotation());
            if let Some(transform) = self.transforms.get_mut(entity) {
                transform.position = position;
                transform.rotation = rotation;
                transform.apply();
            }
        }

        // Characters step themselves, then push their transform in.
        for &entity in &self.order {
            let Some(component) = self.characters.get_mut(entity) else {
                continue;
            };
            component.character.update();
            let (position, rotation) = (
                component.character.position(),
                component.character.rotation(),
            );
            if let Some(transform) = self.transforms.get_mut(entity) {
                transform.position = position;
                transform.rotation = rotation;
                transform.apply();
            }
        }

        for &entity in &self.order {
            if let Some(sampler) = self.samplers.get_mut(entity) {
                sampler.update(resources, dt);
            }
        }

        for &entity in &self.order {
            if let Some(blender) = self.blenders.get_mut(entity) {
                blender.update(resources, dt);
            }
        }

        for &entity in &self.order {
            if let Some(timer) = self.timers.get_mut(entity) {
                timer.update(dt);
            }
        }

        for &entity in &self.order {
            if let Some(emitter) = self.emitters.get_mut(entity) {
                emitter.update(dt);
            }
        }
    }

    /// The render sweep: static renderables → instanced renderables →
    /// samplers → blenders → emitters. Samplers and blenders must be
    /// paired with a renderable naming the skinned model.
    pub fn render(&self, renderer: &mut Renderer, resources: &mut Resources) {
        for &entity in &self.order {
            let (Some(renderable), Some(transform)) =
                (self.renderables.get(entity), self.transforms.get(entity))
            else {
                continue;
            };

            // Skinned entities are queued by the sampler/blender sweeps.
            if self.samplers.contains_key(entity) || self.blenders.contains_key(entity) {
                continue;
            }

            match renderable.ty {
                RenderableType::Mesh => {
                    if let Some(id) = renderable.renderable_id {
                        renderer.queue_mesh(resources, id, transform, renderable.material_id);
                    }
                }
                RenderableType::Model => {
                    if let Some(id) = renderable.renderable_id {
                        renderer.queue_model(resources, id, transform, renderable.material_id);
                    }
                }
                RenderableType::DebugCube => {
                    renderer.queue_debug_cube(resources, transform, renderable.material_id);
                }
                RenderableType::DebugSphere => {
                    renderer.queue_debug_sphere(resources, transform, renderable.material_id);
                }
            }
        }

        for &entity in &self.order {
            let Some(renderable) = self.instanced.get(entity) else {
                continue;
            };

            match renderable.ty {
                RenderableType::Mesh => {
                    if let Some(id) = renderable.renderable_id {
                        renderer.queue_mesh_instanced(
                            resources,
                            id,
                            &renderable.transforms,
                            renderable.material_id,
                        );
                    }
                }
                RenderableType::Model => {
                    if let Some(id) = renderable.renderable_id {
                        renderer.queue_model_instanced(
                            resources,
                            id,
                            &renderable.transforms,
                            renderable.material_id,
                        );
                    }
                }
                RenderableType::DebugCube => {
                    renderer.queue_debug_cube_instanced(
                        resources,
                        &renderable.transforms,
                        renderable.material_id,
                    );
                }
                RenderableType::DebugSphere => {
                    renderer.queue_debug_sphere_instanced(
                        resources,
                        &renderable.transforms,
                        renderable.material_id,
                    );
                }
            }
        }

        for &entity in &self.order {
            let (Some(sampler), Some(transform), Some(renderable)) = (
                self.samplers.get(entity),
                self.transforms.get(entity),
                self.renderables.get(entity),
            ) else {
                continue;
            };
            if let Some(model_id) = renderable.renderable_id {
                renderer.queue_animation(
                    resources,
                    model_id,
                    transform,
                    sampler.skinning_palette(),
                    renderable.material_id,
                );
            }
        }

        for &entity in &self.order {
            let (Some(blender), Some(transform), Some(renderable)) = (
                self.blenders.get(entity),
                self.transforms.get(entity),
                self.renderables.get(entity),
            ) else {
                continue;
            };
            if let Some(model_id) = renderable.renderable_id {
                renderer.queue_animation(
                    resources,
                    model_id,
                    transform,
                    blender.skinning_palette(),
                    renderable.material_id,
                );
            }
        }

        for &entity in &self.order {
            if let Some(emitter) = self.emitters.get(entity) {
                if emitter.is_active {
                    renderer.queue_particles(resources, emitter);
                }
            }
        }
    }
}
