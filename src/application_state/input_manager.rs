//! # Input Manager
//!
//! Tracks raw keyboard and mouse state across frames and condenses it into
//! a `ProcessedInputState` snapshot once per frame for the engine.

use std::collections::HashMap;

use winit::{
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{MouseInput, ProcessedInputState, RawInputState};

/// The keys the camera controller cares about; everything else is ignored.
const KEY_CODES: [KeyCode; 6] = [
    KeyCode::KeyW,
    KeyCode::KeyS,
    KeyCode::KeyA,
    KeyCode::KeyD,
    KeyCode::Space,
    KeyCode::ShiftLeft,
];

/// Tracks the state of all input devices and processes input events.
pub struct InputManager {
    /// Last frame's state of the tracked keys.
    pub keyboard_inputs_old: HashMap<KeyCode, bool>,
    /// This frame's state of the tracked keys.
    pub keyboard_inputs_new: HashMap<KeyCode, bool>,

    /// Current mouse state.
    pub mouse_inputs: MouseInput,
}

impl InputManager {
    pub fn new() -> Self {
        let mut keyboard_inputs_old = HashMap::new();
        let mut keyboard_inputs_new = HashMap::new();
        for key_code in KEY_CODES {
            keyboard_inputs_old.insert(key_code, false);
            keyboard_inputs_new.insert(key_code, false);
        }

        let mouse_buttons = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

        let mut mouse_button_inputs_old = HashMap::new();
        let mut mouse_button_inputs_new = HashMap::new();

        for button in mouse_buttons {
            mouse_button_inputs_old.insert(button, false);
            mouse_button_inputs_new.insert(button, false);
        }

        let mouse_inputs = MouseInput {
            mouse_button_inputs_old,
            mouse_button_inputs_new,
            mouse_delta: None,
        };

        Self {
            keyboard_inputs_old,
            keyboard_inputs_new,
            mouse_inputs,
        }
    }

    /// Copies the current state into the old state, readying the next
    /// frame's edge detection.
    pub fn move_old_states(&mut self) {
        for (key, new_state) in self.keyboard_inputs_new.iter() {
            if let Some(old_state) = self.keyboard_inputs_old.get_mut(key) {
                *old_state = *new_state;
            }
        }

        for (button, new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            if let Some(old_state) = self.mouse_inputs.mouse_button_inputs_old.get_mut(button) {
                *old_state = *new_state;
            }
        }
    }

    /// Updates internal state from a window event. Untracked keys and
    /// buttons are ignored.
    pub fn intake_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                if let Some(key_state) = self.keyboard_inputs_new.get_mut(key) {
                    *key_state = *state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button_state) =
                    self.mouse_inputs.mouse_button_inputs_new.get_mut(button)
                {
                    *button_state = *state == ElementState::Pressed;
                }
            }
            _ => {}
        }
    }

    /// Records raw mouse motion from a device event.
    pub fn intake_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_inputs.mouse_delta = Some(delta);
    }

    /// Builds the edge-aware snapshot from the raw boolean states.
    pub fn create_processed_input_state(&mut self) -> ProcessedInputState {
        let mut keyboard_states = HashMap::new();
        let mut mouse_button_states = HashMap::new();

        for (key, &new_state) in self.keyboard_inputs_new.iter() {
            let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
            keyboard_states.insert(*key, RawInputState::from_raw_states(old_state, new_state));
        }

        for (button, &new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            let old_state = self
                .mouse_inputs
                .mouse_button_inputs_old
                .get(button)
                .copied()
                .unwrap_or(false);
            mouse_button_states
                .insert(*button, RawInputState::from_raw_states(old_state, new_state));
        }

        let mouse_delta = self.mouse_inputs.mouse_delta;

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            mouse_delta,
        }
    }

    /// Returns the frame's processed input and resets per-frame state.
    pub fn get_and_reset_processed_input(&mut self) -> Option<ProcessedInputState> {
        let processed_input = Some(self.create_processed_input_state());
        self.reset_inputs();
        processed_input
    }

    /// Advances frame state and clears the motion delta. Also called when
    /// the window loses focus so keys do not stick.
    pub fn reset_inputs(&mut self) {
        self.move_old_states();
        self.mouse_inputs.mouse_delta = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_becomes_pressed_then_held() {
        let mut manager = InputManager::new();
        manager.keyboard_inputs_new.insert(KeyCode::KeyW, true);

        let input = manager.get_and_reset_processed_input().unwrap();
        assert!(input.get_key_state(KeyCode::KeyW).is_just_pressed());

        let input = manager.get_and_reset_processed_input().unwrap();
        assert_eq!(input.get_key_state(KeyCode::KeyW), RawInputState::Held);
    }

    #[test]
    fn mouse_delta_clears_each_frame() {
        let mut manager = InputManager::new();
        manager.intake_mouse_motion((3.0, -2.0));

        let input = manager.get_and_reset_processed_input().unwrap();
        assert_eq!(input.get_mouse_delta(), Some((3.0, -2.0)));

        let input = manager.get_and_reset_processed_input().unwrap();
        assert_eq!(input.get_mouse_delta(), None);
    }

    #[test]
    fn untracked_keys_are_ignored() {
        let mut manager = InputManager::new();
        let input = manager.get_and_reset_processed_input().unwrap();
        assert_eq!(
            input.get_key_state(KeyCode::KeyQ),
            RawInputState::NotPressed
        );
    }
}
