use bevy::prelude::*;
use std::collections::HashMap;

/// Continuous editor actions sampled from the keyboard each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    PanForward,
    PanBackward,
    PanLeft,
    PanRight,
}

#[derive(Default, Resource)]
pub struct ActionState {
    pressed: HashMap<EditorAction, bool>,
}

impl ActionState {
    pub fn set(&mut self, action: EditorAction, is_pressed: bool) {
        self.pressed.insert(action, is_pressed);
    }

    pub fn pressed(&self, action: EditorAction) -> bool {
        *self.pressed.get(&action).unwrap_or(&false)
    }
}
