use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{Button, Controller};

/// Adapter that bridges Winit keyboard events to the Controller trait
#[derive(Debug, Clone, Default)]
pub struct WinitController {
    /// Currently pressed buttons
    pressed_keys: HashSet<Button>,
    /// All pressed buttons as a vec (for efficient get_down_keys)
    pressed_vec: Vec<Button>,
}

impl WinitController {
    /// Create a new WinitController with no pressed keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a Winit WindowEvent and update internal state
    pub fn process_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            self.process_key(event);
        }
    }

    fn process_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(keycode) = event.physical_key else {
            return;
        };
        if let Some(button) = Self::keycode_to_button(keycode) {
            self.set(button, event.state);
        }
    }

    fn set(&mut self, button: Button, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.pressed_keys.insert(button) {
                    self.pressed_vec.push(button);
                }
            }
            ElementState::Released => {
                if self.pressed_keys.remove(&button) {
                    self.pressed_vec.retain(|&b| b != button);
                }
            }
        }
    }

    /// Forget every held key, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.pressed_keys.clear();
        self.pressed_vec.clear();
    }

    /// Map Winit KeyCode to Button
    fn keycode_to_button(keycode: KeyCode) -> Option<Button> {
        match keycode {
            KeyCode::ArrowUp => Some(Button::PlayerOneUp),
            KeyCode::ArrowDown => Some(Button::PlayerOneDown),
            KeyCode::Tab => Some(Button::PlayerTwoUp),
            KeyCode::ControlLeft => Some(Button::PlayerTwoDown),
            KeyCode::Space => Some(Button::Start),
            KeyCode::Escape => Some(Button::Escape),
            KeyCode::F1 => Some(Button::Speed1),
            KeyCode::F2 => Some(Button::Speed2),
            KeyCode::F3 => Some(Button::Speed3),
            KeyCode::F4 => Some(Button::Speed4),
            KeyCode::F5 => Some(Button::Speed5),
            _ => None,
        }
    }
}

impl Controller for WinitController {
    fn is_down(&self, button: Button) -> bool {
        self.pressed_keys.contains(&button)
    }

    fn get_down_keys(&self) -> &[Button] {
        &self.pressed_vec
    }
}
