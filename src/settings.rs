// src/settings.rs
//! Editor-wide tunables, optionally overridden from a RON file in assets/.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Snap units, drag sensitivities, and construction defaults.
/// Loaded once at startup; a missing or unreadable override file keeps defaults.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct RampartSettings {
    /// Path to the template manifest asset.
    pub template_manifest: String,
    /// Where scene saves land on disk.
    pub scene_path: String,
    /// XZ snap increment for ghost placement and horizontal drags.
    pub grid_size: f32,
    /// Snap increment for vertical (height) drags.
    pub vertical_snap: f32,
    /// Snap increment for yaw drags, in degrees.
    pub rotation_snap_degrees: f32,
    /// Screen-pixels-to-meters factor for vertical drags.
    pub vertical_sensitivity: f32,
    /// Screen-pixels-to-degrees factor for rotation drags.
    pub rotation_sensitivity: f32,
    /// Whether ghosts snap onto the faces of existing objects.
    pub surface_snap_enabled: bool,
    /// Whether ground placement rounds X/Z to the grid.
    pub grid_snap_enabled: bool,
    /// Wall panel thickness (collider width and bounds padding).
    pub wall_thickness: f32,
    /// Wall height clamp range.
    pub wall_height_min: f32,
    pub wall_height_max: f32,
    /// Edge length of one chunk cell in a tiled fill volume.
    pub chunk_size: f32,
    /// Per-side AABB shrink applied before placement overlap tests.
    pub overlap_margin: f32,
}

impl Default for RampartSettings {
    fn default() -> Self {
        Self {
            template_manifest: "templates.ron".to_string(),
            scene_path: "rampart_scene.ron".to_string(),
            grid_size: 0.5,
            vertical_snap: 0.25,
            rotation_snap_degrees: 15.0,
            vertical_sensitivity: 0.02,
            rotation_sensitivity: 0.5,
            surface_snap_enabled: true,
            grid_snap_enabled: true,
            wall_thickness: 0.3,
            wall_height_min: 0.5,
            wall_height_max: 8.0,
            chunk_size: 1.0,
            overlap_margin: 0.02,
        }
    }
}

/// Startup: replace defaults with `assets/rampart.ron` when present.
pub fn load_settings_override(mut settings: ResMut<RampartSettings>) {
    let path = "assets/rampart.ron";
    match std::fs::read_to_string(path) {
        Ok(text) => match ron::de::from_str::<RampartSettings>(&text) {
            Ok(loaded) => {
                *settings = loaded;
                info!("Settings: loaded overrides from '{}'", path);
            }
            Err(e) => warn!("Settings: failed to parse '{}': {} (keeping defaults)", path, e),
        },
        Err(_) => info!("Settings: no override file at '{}', using defaults", path),
    }
}
