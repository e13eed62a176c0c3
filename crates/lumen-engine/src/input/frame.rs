use std::collections::HashSet;

use super::types::Key;

/// Per-frame input deltas.
///
/// `InputState` provides the current state (held keys/buttons, pointer position).
/// `InputFrame` provides key presses and accumulated motion for the current
/// frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys pressed this frame.
    pub keys_pressed: HashSet<Key>,

    /// Pointer motion accumulated this frame, in logical pixels (+y down).
    pub pointer_delta: (f32, f32),

    /// Wheel motion accumulated this frame, in lines (+y away from the user).
    pub wheel_lines: (f32, f32),
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel_lines = (0.0, 0.0);
    }
}
