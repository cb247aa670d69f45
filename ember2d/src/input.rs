use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Tracks keyboard state across frames.
///
/// Three queries are offered per key: `is_key_pressed` is level-triggered
/// (true every frame the key is physically held), while `is_key_clicked` and
/// `is_key_released` are edge-triggered and true only on the single frame the
/// key transitions. Edge sets are cleared at the frame boundary, so a clicked
/// key reads true for every poll within that frame but never across frames.
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_clicked: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_down: HashSet::new(),
            keys_clicked: HashSet::new(),
            keys_released: HashSet::new(),
        }
    }

    /// Clear per-frame clicked/released flags.
    pub fn begin_frame(&mut self) {
        self.keys_clicked.clear();
        self.keys_released.clear();
    }

    /// Handle a keyboard input event from winit.
    pub fn handle_key(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(keycode) = event.physical_key {
            match event.state {
                ElementState::Pressed => self.key_down(keycode),
                ElementState::Released => self.key_up(keycode),
            }
        }
    }

    /// Record a key press. Repeat events for a held key do not re-arm the
    /// clicked edge.
    pub fn key_down(&mut self, key: KeyCode) {
        if self.keys_down.insert(key) {
            self.keys_clicked.insert(key);
        }
    }

    /// Record a key release. A release without a prior press is ignored.
    pub fn key_up(&mut self, key: KeyCode) {
        if self.keys_down.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    /// Returns true if the key is currently held down.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn is_key_clicked(&self, key: KeyCode) -> bool {
        self.keys_clicked.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
