use bevy::prelude::*;

/// Top-level app state: the editor either runs or sits behind the pause overlay.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Running,
    Paused,
}
