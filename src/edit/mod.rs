pub mod cursor;
pub mod registry;

use bevy::prelude::*;

use crate::state::GameState;
use crate::volume::plugin::{recompute_dirty_volumes, refresh_volume_bounds};

pub use cursor::{DragCompleted, EditSession, SnapCrossing};
pub use registry::ActiveRegistries;

/// Edit-cursor wiring: drag input before recompute, registry/handle refresh
/// after bounds, per the fixed frame order.
pub struct EditPlugin;

impl Plugin for EditPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SnapCrossing>()
            .add_event::<DragCompleted>()
            .init_resource::<EditSession>()
            .init_resource::<ActiveRegistries>()
            .init_resource::<cursor::EditHandleAssets>()
            .add_systems(Startup, cursor::setup_edit_handle_assets)
            .add_systems(
                Update,
                (cursor::begin_drag_or_select, cursor::update_drag)
                    .chain()
                    .before(recompute_dirty_volumes)
                    .run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (
                    registry::refresh_active_registries.after(refresh_volume_bounds),
                    cursor::sync_edit_handles.after(registry::refresh_active_registries),
                ),
            );
    }
}
