// src/save.rs
//! Scene persistence: every placed entity flattens to one RON record
//! (template name, pose, control points, wall height). On load the volumes
//! come back dirty, so geometry is regenerated identically before first
//! render. Corrupt or zero-valued control points fall back to the variant's
//! defaults instead of failing the load.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::settings::RampartSettings;
use crate::state::GameState;
use crate::templates::{TemplateRegistry, TemplateRegistryHandle, VolumeVariantDef};
use crate::edit::registry::ActiveRegistries;
use crate::placement::spawn_committed;
use crate::volume::core::{
    EntityDeleted, Placed, PlacedId, PlacedIdAllocator, PlacedIndex, ProcVolume, VolumeFamily,
    VolumeKind,
};
use crate::volume::wall::{WallState, MIN_WALL_POINTS};

pub struct ScenePersistencePlugin;

impl Plugin for ScenePersistencePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (save_scene_on_key, load_scene_on_key).run_if(in_state(GameState::Running)),
        );
    }
}

// ---------- File format ----------

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SceneFile {
    pub entities: Vec<PlacedRecord>,
}

/// Flat save record for one placed entity.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PlacedRecord {
    pub id: u64,
    pub template: String,
    pub position: Vec3,
    pub yaw_deg: f32,
    #[serde(default)]
    pub control_points: Vec<Vec3>,
    #[serde(default)]
    pub wall_height: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum SceneFileError {
    #[error("I/O while accessing scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(String),
}

pub fn write_scene_file(path: &str, scene: &SceneFile) -> Result<(), SceneFileError> {
    let text = ron::ser::to_string_pretty(scene, ron::ser::PrettyConfig::default())
        .map_err(|e| SceneFileError::Ron(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}

pub fn read_scene_file(path: &str) -> Result<SceneFile, SceneFileError> {
    let text = std::fs::read_to_string(path)?;
    ron::de::from_str(&text).map_err(|e| SceneFileError::Ron(e.to_string()))
}

// ---------- Record <-> volume state ----------

/// Flatten a volume's control points into the record fields.
pub fn record_from_kind(kind: &VolumeKind) -> (Vec<Vec3>, f32) {
    match kind {
        VolumeKind::Wall(wall) => (wall.points.clone(), wall.height),
        other => (other.control_points(), 0.0),
    }
}

/// Rebuild a volume's control-point state from a saved record. Zero-valued
/// or structurally short data means "use the variant default".
pub fn restore_kind(
    variant: VolumeVariantDef,
    points: &[Vec3],
    wall_height: f32,
) -> VolumeKind {
    let fallback = VolumeKind::default_for(variant);
    match variant {
        VolumeVariantDef::CornerBox | VolumeVariantDef::Partition => match points.first() {
            Some(&p) if p != Vec3::ZERO => VolumeKind::CornerBox { point: p },
            _ => fallback,
        },
        VolumeVariantDef::ChunkFill => match points.first() {
            Some(&p) if p != Vec3::ZERO => VolumeKind::ChunkFill { point: p },
            _ => fallback,
        },
        VolumeVariantDef::HeightBox => {
            if points.len() >= 3 && points[0] != Vec3::ZERO {
                VolumeKind::HeightBox {
                    footprint: points[0],
                    height_a: points[1].y,
                    height_b: points[2].y,
                }
            } else {
                fallback
            }
        }
        VolumeVariantDef::Wall => {
            if points.len() >= MIN_WALL_POINTS
                && wall_height > 0.0
                && points.iter().any(|p| *p != Vec3::ZERO)
            {
                VolumeKind::Wall(WallState::new(points.to_vec(), wall_height))
            } else {
                fallback
            }
        }
    }
}

// ---------- Systems ----------

/// F5: flatten the world to the scene file.
pub fn save_scene_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<RampartSettings>,
    handle: Res<TemplateRegistryHandle>,
    registries: Res<Assets<TemplateRegistry>>,
    placed: Query<(&Placed, &Transform, Option<&ProcVolume>)>,
) {
    if !keys.just_pressed(KeyCode::F5) {
        return;
    }
    let Some(registry) = registries.get(&handle.0) else {
        warn!("Save: template registry not loaded yet");
        return;
    };

    let mut scene = SceneFile::default();
    for (placed, transform, volume) in placed.iter() {
        let Some(def) = registry.get(placed.template) else {
            warn!("Save: unknown template {:?}, entity skipped", placed.template);
            continue;
        };
        let (control_points, wall_height) = volume
            .map(|v| record_from_kind(&v.kind))
            .unwrap_or_default();
        scene.entities.push(PlacedRecord {
            id: placed.id.0,
            template: def.name.clone(),
            position: transform.translation,
            yaw_deg: transform
                .rotation
                .to_euler(EulerRot::YXZ)
                .0
                .to_degrees(),
            control_points,
            wall_height,
        });
    }

    match write_scene_file(&settings.scene_path, &scene) {
        Ok(()) => info!("Save: wrote {} entities to '{}'", scene.entities.len(), settings.scene_path),
        Err(e) => warn!("Save: failed: {}", e),
    }
}

/// F9: replace the world with the scene file's contents. Loaded volumes are
/// dirty, so the next recompute pass reproduces their geometry exactly.
pub fn load_scene_on_key(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<RampartSettings>,
    handle: Res<TemplateRegistryHandle>,
    template_registries: Res<Assets<TemplateRegistry>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut alloc: ResMut<PlacedIdAllocator>,
    mut index: ResMut<PlacedIndex>,
    mut registries: ResMut<ActiveRegistries>,
    existing: Query<(Entity, &Placed)>,
    mut deleted: EventWriter<EntityDeleted>,
) {
    if !keys.just_pressed(KeyCode::F9) {
        return;
    }
    let Some(registry) = template_registries.get(&handle.0) else {
        warn!("Load: template registry not loaded yet");
        return;
    };
    let scene = match read_scene_file(&settings.scene_path) {
        Ok(scene) => scene,
        Err(e) => {
            warn!("Load: failed to read '{}': {}", settings.scene_path, e);
            return;
        }
    };

    // tear down the current world
    for (entity, placed) in existing.iter() {
        deleted.write(EntityDeleted { entity, id: placed.id });
        registries.unregister_everywhere(entity);
        commands.entity(entity).despawn();
    }
    index.clear();

    let mut loaded = 0usize;
    for record in &scene.entities {
        let Some(template) = registry.index_of(&record.template) else {
            warn!("Load: unknown template '{}', record skipped", record.template);
            continue;
        };
        let Some(def) = registry.get(template) else { continue };

        let kind = def
            .volume
            .map(|variant| restore_kind(variant, &record.control_points, record.wall_height));
        let id = PlacedId(record.id);
        alloc.reserve_through(id);

        let entity = spawn_committed(
            &mut commands,
            meshes.as_mut(),
            materials.as_mut(),
            def,
            template,
            id,
            record.position,
            Quat::from_rotation_y(record.yaw_deg.to_radians()),
            kind,
        );
        index.insert(id, entity);
        registries.register(VolumeFamily::of(def.volume), entity);
        loaded += 1;
    }
    // nothing comes back pre-selected
    for family in VolumeFamily::ALL {
        registries.set_active(family, None);
    }
    info!("Load: restored {} entities from '{}'", loaded, settings.scene_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_point_restores_variant_default() {
        let restored = restore_kind(VolumeVariantDef::CornerBox, &[Vec3::ZERO], 0.0);
        assert_eq!(restored, VolumeKind::default_for(VolumeVariantDef::CornerBox));
        let restored = restore_kind(VolumeVariantDef::CornerBox, &[], 0.0);
        assert_eq!(restored, VolumeKind::default_for(VolumeVariantDef::CornerBox));
    }

    #[test]
    fn valid_points_round_trip() {
        let kind = VolumeKind::Wall(WallState::new(
            vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 1.0)],
            2.5,
        ));
        let (points, height) = record_from_kind(&kind);
        let restored = restore_kind(VolumeVariantDef::Wall, &points, height);
        assert_eq!(restored, kind);
    }

    #[test]
    fn corrupt_wall_falls_back_to_default() {
        // too few points
        let restored = restore_kind(VolumeVariantDef::Wall, &[Vec3::X], 2.0);
        assert_eq!(restored, VolumeKind::default_for(VolumeVariantDef::Wall));
        // nonsense height
        let restored =
            restore_kind(VolumeVariantDef::Wall, &[Vec3::ZERO, Vec3::X], 0.0);
        assert_eq!(restored, VolumeKind::default_for(VolumeVariantDef::Wall));
    }

    #[test]
    fn height_box_round_trip() {
        let kind = VolumeKind::HeightBox {
            footprint: Vec3::new(1.0, 0.0, 1.5),
            height_a: 2.0,
            height_b: 0.75,
        };
        let (points, height) = record_from_kind(&kind);
        let restored = restore_kind(VolumeVariantDef::HeightBox, &points, height);
        assert_eq!(restored, kind);
    }
}
