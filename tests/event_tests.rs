//! Event bus tests
//!
//! Tests for:
//! - Listener invocation in registration order
//! - Consumption stopping propagation
//! - Kind-based routing

use std::cell::RefCell;
use std::rc::Rc;

use kestrel::events::{Event, EventKind, Events};

#[test]
fn listeners_fire_in_registration_order() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut events = Events::new();

    for tag in ["first", "second", "third"] {
        let calls = Rc::clone(&calls);
        events.listen(EventKind::KeyPressed, move |_| {
            calls.borrow_mut().push(tag);
            false
        });
    }

    events.dispatch(&Event::KeyPressed {
        key_code: 32,
        modifier: 0,
    });

    assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn consuming_listener_stops_propagation() {
    let calls = Rc::new(RefCell::new(0));
    let mut events = Events::new();

    events.listen(EventKind::MouseMoved, |_| true);
    {
        let calls = Rc::clone(&calls);
        events.listen(EventKind::MouseMoved, move |_| {
            *calls.borrow_mut() += 1;
            false
        });
    }

    let consumed = events.dispatch(&Event::MouseMoved {
        x: 1.0,
        y: 2.0,
        offset_x: 0.0,
        offset_y: 0.0,
    });

    assert!(consumed);
    assert_eq!(*calls.borrow(), 0, "The second listener must not run");
}

#[test]
fn dispatch_routes_by_kind() {
    let resized = Rc::new(RefCell::new(None));
    let mut events = Events::new();

    {
        let resized = Rc::clone(&resized);
        events.listen(EventKind::WindowFramebufferResized, move |event| {
            if let Event::WindowFramebufferResized { width, height } = event {
                *resized.borrow_mut() = Some((*width, *height));
            }
            false
        });
    }

    // A different kind leaves the listener untouched.
    events.dispatch(&Event::WindowFullscreen {
        is_fullscreen: true,
    });
    assert!(resized.borrow().is_none());

    events.dispatch(&Event::WindowFramebufferResized {
        width: 640,
        height: 480,
    });
    assert_eq!(*resized.borrow(), Some((640, 480)));
}

#[test]
fn dispatch_without_listeners_is_unconsumed() {
    let mut events = Events::new();
    let consumed = events.dispatch(&Event::EntityAdded { entity_id: 7 });
    assert!(!consumed);
}
