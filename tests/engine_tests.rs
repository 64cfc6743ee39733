//! Engine lifecycle tests (against the null backend)
//!
//! Tests for:
//! - Construction over an injected context
//! - The update/render loop bookkeeping
//! - Event routing into the renderer and the listeners

use glam::{Quat, Vec3};
use kestrel::events::{Event, EventKind};
use kestrel::{Engine, FrameData};

mod common;
use common::NullContext;

fn engine_setup() -> Engine {
    Engine::from_context(Box::new(NullContext::new(800, 600))).expect("engine init")
}

#[test]
fn engine_tracks_time_and_frames() {
    let mut engine = engine_setup();

    engine.update(0.016);
    engine.update(0.016);

    assert_eq!(engine.frame_count(), 2);
    assert!((engine.time() - 0.032).abs() < 1e-6);
    assert!(engine.fps() > 0.0);
}

#[test]
fn render_runs_a_full_frame() {
    let mut engine = engine_setup();

    let entity = engine.world.create_entity(
        &mut engine.events,
        Vec3::ZERO,
        Quat::IDENTITY,
        Vec3::ONE,
    );
    engine.world.add_renderable(
        entity,
        kestrel::world::RenderableComponent {
            ty: kestrel::world::RenderableType::DebugCube,
            renderable_id: None,
            material_id: None,
        },
    );

    engine.update(0.016);
    engine.render(FrameData::default());

    // The sweep queued the cube into the debug queue.
    // (Queues were cleared by begin and filled before end.)
    assert_eq!(engine.frame_count(), 1);
}

#[test]
fn resize_event_reaches_the_renderer() {
    let mut engine = engine_setup();

    engine.handle_event(&Event::WindowFramebufferResized {
        width: 320,
        height: 240,
    });

    assert_eq!(engine.size(), glam::IVec2::new(320, 240));
}

#[test]
fn events_forward_to_listeners() {
    let mut engine = engine_setup();

    let seen = std::rc::Rc::new(std::cell::RefCell::new(false));
    {
        let seen = std::rc::Rc::clone(&seen);
        engine.events.listen(EventKind::KeyPressed, move |_| {
            *seen.borrow_mut() = true;
            false
        });
    }

    engine.handle_event(&Event::KeyPressed {
        key_code: 65,
        modifier: 0,
    });
    assert!(*seen.borrow());
}

#[test]
fn shutdown_is_idempotent_enough() {
    let mut engine = engine_setup();
    engine.update(0.016);
    engine.render(FrameData::default());
    engine.shutdown();
}
