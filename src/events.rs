//! Events
//!
//! The tagged event schema shared with the windowing and physics
//! collaborators, plus a synchronous dispatch bus. Listeners run in
//! registration order; a listener returning `true` consumes the event and
//! stops propagation.

use glam::Vec3;
use rustc_hash::FxHashMap;

/// A tagged engine event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    WindowFramebufferResized {
        width: u32,
        height: u32,
    },
    WindowFullscreen {
        is_fullscreen: bool,
    },

    KeyPressed {
        key_code: u32,
        modifier: u32,
    },
    KeyReleased {
        key_code: u32,
        modifier: u32,
    },

    MouseMoved {
        x: f32,
        y: f32,
        offset_x: f32,
        offset_y: f32,
    },
    MouseButtonPressed {
        button: u32,
        modifier: u32,
    },
    MouseButtonReleased {
        button: u32,
        modifier: u32,
    },

    PhysicsContactAdded {
        body1_id: u64,
        body2_id: u64,
        base_offset: Vec3,
        normal: Vec3,
        penetration_depth: f32,
    },
    PhysicsContactRemoved {
        body1_id: u64,
        body2_id: u64,
        base_offset: Vec3,
        normal: Vec3,
        penetration_depth: f32,
    },
    PhysicsContactPersisted {
        body1_id: u64,
        body2_id: u64,
        base_offset: Vec3,
        normal: Vec3,
        penetration_depth: f32,
    },
    PhysicsRaycastHit {
        body_id: u64,
        point: Vec3,
        direction: Vec3,
    },

    EntityAdded {
        entity_id: u64,
    },
    EntityDestroyed {
        entity_id: u64,
    },
}

impl Event {
    /// The event's discriminator, used for listener registration.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WindowFramebufferResized { .. } => EventKind::WindowFramebufferResized,
            Self::WindowFullscreen { .. } => EventKind::WindowFullscreen,
            Self::KeyPressed { .. } => EventKind::KeyPressed,
            Self::KeyReleased { .. } => EventKind::KeyReleased,
            Self::MouseMoved { .. } => EventKind::MouseMoved,
            Self::MouseButtonPressed { .. } => EventKind::MouseButtonPressed,
            Self::MouseButtonReleased { .. } => EventKind::MouseButtonReleased,
            Self::PhysicsContactAdded { .. } => EventKind::PhysicsContactAdded,
            Self::PhysicsContactRemoved { .. } => EventKind::PhysicsContactRemoved,
            Self::PhysicsContactPersisted { .. } => EventKind::PhysicsContactPersisted,
            Self::PhysicsRaycastHit { .. } => EventKind::PhysicsRaycastHit,
            Self::EntityAdded { .. } => EventKind::EntityAdded,
            Self::EntityDestroyed { .. } => EventKind::EntityDestroyed,
        }
    }
}

/// The discriminator of [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WindowFramebufferResized,
    WindowFullscreen,
    KeyPressed,
    KeyReleased,
    MouseMoved,
    MouseButtonPressed,
    MouseButtonReleased,
    PhysicsContactAdded,
    PhysicsContactRemoved,
    PhysicsContactPersisted,
    PhysicsRaycastHit,
    EntityAdded,
    EntityDestroyed,
}

/// A registered listener. Returning `true` consumes the event.
pub type ListenerFn = Box<dyn FnMut(&Event) -> bool>;

/// Synchronous event bus.
#[derive(Default)]
pub struct Events {
    listeners: FxHashMap<EventKind, Vec<ListenerFn>>,
}

impl Events {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for `kind`. Listeners fire in registration
    /// order.
    pub fn listen<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&Event) -> bool + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// Dispatches `event` to its listeners. Returns `true` if a listener
    /// consumed it.
    pub fn dispatch(&mut self, event: &Event) -> bool {
        let Some(listeners) = self.listeners.get_mut(&event.kind()) else {
            return false;
        };

        for listener in listeners.iter_mut() {
            if listener(event) {
                return true;
            }
        }
        false
    }
}
