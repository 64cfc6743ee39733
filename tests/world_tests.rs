//! Entity world tests
//!
//! Tests for:
//! - Entity lifecycle events (added / destroyed ordering)
//! - Physics and character state transfer into transforms
//! - Static bodies being skipped
//! - Timer and emitter sweeps

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use kestrel::events::{Event, EventKind, Events};
use kestrel::physics::{CharacterBody, PhysicsBody, PhysicsBodyType};
use kestrel::resources::Resources;
use kestrel::world::EntityWorld;

// ============================================================================
// Physics stubs
// ============================================================================

struct StubBody {
    ty: PhysicsBodyType,
    position: Vec3,
    rotation: Quat,
    destroyed: Rc<RefCell<bool>>,
}

impl PhysicsBody for StubBody {
    fn body_type(&self) -> PhysicsBodyType {
        self.ty
    }
    fn position(&self) -> Vec3 {
        self.position
    }
    fn rotation(&self) -> Quat {
        self.rotation
    }
    fn id(&self) -> u64 {
        1
    }
    fn destroy(&mut self) {
        *self.destroyed.borrow_mut() = true;
    }
}

struct StubCharacter {
    updates: Rc<RefCell<u32>>,
    position: Vec3,
}

impl CharacterBody for StubCharacter {
    fn update(&mut self) {
        *self.updates.borrow_mut() += 1;
    }
    fn position(&self) -> Vec3 {
        self.position
    }
    fn rotation(&self) -> Quat {
        Quat::IDENTITY
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn create_entity_dispatches_added() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut events = Events::new();
    {
        let seen = Rc::clone(&seen);
        events.listen(EventKind::EntityAdded, move |event| {
            if let Event::EntityAdded { entity_id } = event {
                seen.borrow_mut().push(*entity_id);
            }
            false
        });
    }

    let mut world = EntityWorld::new();
    let entity = world.create_entity(&mut events, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);

    assert_eq!(seen.borrow().as_slice(), &[entity.raw()]);
    assert_eq!(world.entities_count(), 1);
}

#[test]
fn destroy_dispatches_before_teardown() {
    let destroyed_flag = Rc::new(RefCell::new(false));
    let event_saw_component = Rc::new(RefCell::new(false));

    let mut world = EntityWorld::new();
    let mut events = Events::new();

    let entity = world.create_entity(&mut events, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    world.add_physics_body(
        entity,
        Box::new(StubBody {
            ty: PhysicsBodyType::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            destroyed: Rc::clone(&destroyed_flag),
        }),
    );

    // The destroy event fires while the body is still alive.
    {
        let destroyed_flag = Rc::clone(&destroyed_flag);
        let event_saw_component = Rc::clone(&event_saw_component);
        events.listen(EventKind::EntityDestroyed, move |_| {
            *event_saw_component.borrow_mut() = !*destroyed_flag.borrow();
            false
        });
    }

    world.destroy_entity(&mut events, entity);

    assert!(*event_saw_component.borrow(), "Event must precede teardown");
    assert!(*destroyed_flag.borrow(), "The body must be torn down");
    assert_eq!(world.entities_count(), 0);
}

#[test]
fn transforms_start_applied() {
    let mut world = EntityWorld::new();
    let mut events = Events::new();

    let entity = world.create_entity(
        &mut events,
        Vec3::new(3.0, 0.0, 0.0),
        Quat::IDENTITY,
        Vec3::ONE,
    );

    let transform = world.transform(entity).unwrap();
    assert!((transform.matrix().w_axis.x - 3.0).abs() < 1e-6);
}

// ============================================================================
// Update sweep
// ============================================================================

#[test]
fn dynamic_body_drives_transform() {
    let mut world = EntityWorld::new();
    let mut events = Events::new();
    let resources = Resources::new();

    let entity = world.create_entity(&mut events, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    world.add_physics_body(
        entity,
        Box::new(StubBody {
            ty: PhysicsBodyType::Dynamic,
            position: Vec3::new(0.0, 9.0, 0.0),
            rotation: Quat::from_rotation_y(1.0),
            destroyed: Rc::new(RefCell::new(false)),
        }),
    );

    world.update(&resources, 0.016);

    let transform = world.transform(entity).unwrap();
    assert!((transform.position.y - 9.0).abs() < 1e-6);
    // The cached matrix was re-applied with the authoritative state.
    assert!((transform.matrix().w_axis.y - 9.0).abs() < 1e-6);
}

#[test]
fn static_body_is_skipped() {
    let mut world = EntityWorld::new();
    let mut events = Events::new();
    let resources = Resources::new();

    let entity = world.create_entity(
        &mut events,
        Vec3::new(5.0, 5.0, 5.0),
        Quat::IDENTITY,
        Vec3::ONE,
    );
    world.add_physics_body(
        entity,
        Box::new(StubBody {
            ty: PhysicsBodyType::Static,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            destroyed: Rc::new(RefCell::new(false)),
        }),
    );

    world.update(&resources, 0.016);

    // The entity keeps its authored transform.
    let transform = world.transform(entity).unwrap();
    assert!((transform.position.x - 5.0).abs() < 1e-6);
}

#[test]
fn characters_update_then_transfer() {
    let updates = Rc::new(RefCell::new(0));
    let mut world = EntityWorld::new();
    let mut events = Events::new();
    let resources = Resources::new();

    let entity = world.create_entity(&mut events, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    world.add_character_body(
        entity,
        Box::new(StubCharacter {
            updates: Rc::clone(&updates),
            position: Vec3::new(0.0, 0.0, -2.0),
        }),
    );

    world.update(&resources, 0.016);
    world.update(&resources, 0.016);

    assert_eq!(*updates.borrow(), 2);
    assert!((world.transform(entity).unwrap().position.z + 2.0).abs() < 1e-6);
}

#[test]
fn timers_tick_in_the_update_sweep() {
    let mut world = EntityWorld::new();
    let mut events = Events::new();
    let resources = Resources::new();

    let entity = world.create_entity(&mut events, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    world.add_timer(entity, 1.0, true, true);

    world.update(&resources, 0.4);
    assert!(!world.timer(entity).unwrap().has_runout);

    world.update(&resources, 0.7);
    let timer = world.timer(entity).unwrap();
    assert!(timer.has_runout);
    assert!(!timer.is_active, "One-shot timers deactivate on runout");
}

#[test]
fn emitters_integrate_in_the_update_sweep() {
    let mut world = EntityWorld::new();
    let mut events = Events::new();
    let resources = Resources::new();

    let entity = world.create_entity(
        &mut events,
        Vec3::new(0.0, 10.0, 0.0),
        Quat::IDENTITY,
        Vec3::ONE,
    );
    world.add_particle_emitter(
        entity,
        kestrel::ParticleEmitterDesc {
            gravity_factor: -10.0,
            count: 4,
            ..Default::default()
        },
    );
    world.emitter_mut(entity).unwrap().is_active = true;

    world.update(&resources, 0.5);

    let emitter = world.emitter_mut(entity).unwrap();
    // The emitter was rooted at the entity's position and has fallen.
    assert!((emitter.transforms[0].position.y - 5.0).abs() < 1e-4);
}
