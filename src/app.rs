//! Winit Adapter
//!
//! The windowing layer is a collaborator, not part of the core: it owns
//! the event loop and the swapchain surface. This module only translates
//! winit's window events into the engine's [`Event`] schema, tracking the
//! little state the translation needs (cursor position for mouse offsets,
//! the live modifier set).

use crate::events::Event;

/// Stateful translator from winit window events to engine events.
#[derive(Debug, Default)]
pub struct WinitEventAdapter {
    last_cursor: Option<(f64, f64)>,
    modifiers: u32,
}

impl WinitEventAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates one window event. Returns `None` for events outside the
    /// engine's schema.
    pub fn translate(&mut self, event: &winit::event::WindowEvent) -> Option<Event> {
        use winit::event::{ElementState, MouseButton, WindowEvent};

        match event {
            WindowEvent::Resized(size) => Some(Event::WindowFramebufferResized {
                width: size.width,
                height: size.height,
            }),

            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state().bits();
                None
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let winit::keyboard::PhysicalKey::Code(code) = event.physical_key else {
                    return None;
                };
                let key_code = code as u32;
                Some(match event.state {
                    ElementState::Pressed => Event::KeyPressed {
                        key_code,
                        modifier: self.modifiers,
                    },
                    ElementState::Released => Event::KeyReleased {
                        key_code,
                        modifier: self.modifiers,
                    },
                })
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x, position.y);
                let (offset_x, offset_y) = match self.last_cursor {
                    Some((last_x, last_y)) => ((x - last_x) as f32, (y - last_y) as f32),
                    None => (0.0, 0.0),
                };
                self.last_cursor = Some((x, y));

                Some(Event::MouseMoved {
                    x: x as f32,
                    y: y as f32,
                    offset_x,
                    offset_y,
                })
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => 0,
                    MouseButton::Right => 1,
                    MouseButton::Middle => 2,
                    MouseButton::Back => 3,
                    MouseButton::Forward => 4,
                    MouseButton::Other(code) => u32::from(*code),
                };
                Some(match state {
                    ElementState::Pressed => Event::MouseButtonPressed {
                        button,
                        modifier: self.modifiers,
                    },
                    ElementState::Released => Event::MouseButtonReleased {
                        button,
                        modifier: self.modifiers,
                    },
                })
            }

            _ => None,
        }
    }
}
