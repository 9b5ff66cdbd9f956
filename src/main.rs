use bevy::prelude::*;

mod setup;
mod input;
mod actions;
mod state;
mod settings;
mod grid;
mod bounds;
mod picking;
mod templates;
mod volume;
mod placement;
mod edit;
mod save;

// re-export the bits we actually need in main
use actions::ActionState;
use input::{camera_controller, input_mapping_system, pause_toggle_system};
use state::GameState;
use edit::EditPlugin;
use placement::PlacementPlugin;
use save::ScenePersistencePlugin;
use settings::RampartSettings;
use templates::TemplateAssetPlugin;
use volume::VolumesPlugin;

fn main() {
    App::new()
        // core engine plugins
        .add_plugins(DefaultPlugins)
        // your domain plugins
        .add_plugins(TemplateAssetPlugin)   // template manifest asset + loader
        .add_plugins(VolumesPlugin)         // recompute + bounds refresh
        .add_plugins(PlacementPlugin)       // ghost preview + commit
        .add_plugins(EditPlugin)            // drag handles + active registries
        .add_plugins(ScenePersistencePlugin)
        // init resources & editor state
        .init_resource::<ActionState>()
        .init_resource::<RampartSettings>()
        .init_resource::<grid::VolumeGridBounds>()
        .init_resource::<templates::TemplateRegistryHandle>()
        .init_resource::<volume::core::PlacedIdAllocator>()
        .init_resource::<volume::core::PlacedIndex>()
        .init_state::<GameState>()
        // camera, light, ground
        .add_systems(Startup, (settings::load_settings_override, setup::setup).chain())
        .add_systems(Startup, templates::load_template_registry.after(settings::load_settings_override))
        // input + camera + pause toggle each frame
        .add_systems(Update, pause_toggle_system)
        .add_systems(Update, templates::monitor_template_registry_ready)
        .add_systems(
            Update,
            (input_mapping_system, camera_controller).run_if(in_state(GameState::Running))
        )
        .run();
}
