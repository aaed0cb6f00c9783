//! # Input State
//!
//! Types describing input state transitions. The input manager tracks raw
//! pressed/released booleans per frame; these types translate a pair of
//! frames into edge-aware states (just pressed vs. held vs. released).

use std::collections::HashMap;
use winit::{event::MouseButton, keyboard::KeyCode};

/// The per-frame state of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputState {
    /// Not pressed this frame or last.
    NotPressed,
    /// Went down this frame.
    Pressed,
    /// Down this frame and last.
    Held,
    /// Went up this frame.
    Released,
}

impl Default for RawInputState {
    fn default() -> Self {
        Self::NotPressed
    }
}

impl RawInputState {
    /// Whether the input is currently down, regardless of edge.
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Whether the input went down exactly this frame.
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Derives the edge-aware state from last frame's and this frame's raw
    /// booleans.
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// A snapshot of all processed input for one frame.
pub struct ProcessedInputState {
    /// Edge-aware state of every tracked keyboard key.
    pub keyboard_states: HashMap<KeyCode, RawInputState>,

    /// Edge-aware state of every tracked mouse button.
    pub mouse_button_states: HashMap<MouseButton, RawInputState>,

    /// Mouse movement delta since the last frame, if any.
    pub mouse_delta: Option<(f64, f64)>,
}

impl ProcessedInputState {
    pub fn get_key_state(&self, key: KeyCode) -> RawInputState {
        self.keyboard_states.get(&key).copied().unwrap_or_default()
    }

    pub fn get_mouse_button_state(&self, button: MouseButton) -> RawInputState {
        self.mouse_button_states
            .get(&button)
            .copied()
            .unwrap_or_default()
    }

    pub fn get_mouse_delta(&self) -> Option<(f64, f64)> {
        self.mouse_delta
    }
}

/// Raw mouse state tracked between frames.
pub struct MouseInput {
    /// Last frame's pressed state per button.
    pub mouse_button_inputs_old: HashMap<MouseButton, bool>,
    /// This frame's pressed state per button.
    pub mouse_button_inputs_new: HashMap<MouseButton, bool>,

    /// Movement delta accumulated since the last frame.
    pub mouse_delta: Option<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_state_transitions() {
        assert_eq!(
            RawInputState::from_raw_states(false, true),
            RawInputState::Pressed
        );
        assert_eq!(
            RawInputState::from_raw_states(true, true),
            RawInputState::Held
        );
        assert_eq!(
            RawInputState::from_raw_states(true, false),
            RawInputState::Released
        );
        assert_eq!(
            RawInputState::from_raw_states(false, false),
            RawInputState::NotPressed
        );
    }

    #[test]
    fn active_covers_pressed_and_held() {
        assert!(RawInputState::Pressed.is_active());
        assert!(RawInputState::Held.is_active());
        assert!(!RawInputState::Released.is_active());
        assert!(!RawInputState::NotPressed.is_active());
        assert!(RawInputState::Pressed.is_just_pressed());
        assert!(!RawInputState::Held.is_just_pressed());
    }
}
