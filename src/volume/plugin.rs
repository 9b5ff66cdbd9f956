// src/volume/plugin.rs
//! Volume systems glue: dirty-coalesced geometry recompute, then bounds
//! refresh, in a fixed order each frame. Input systems run before recompute;
//! the active-object registry refreshes after bounds.

use bevy::prelude::*;

use crate::bounds::{local_bounds_from_world_boxes, LocalBounds, Obb};
use crate::settings::RampartSettings;
use crate::templates::{TemplateRegistry, TemplateRegistryHandle};
use crate::volume::box_corner::{corner_box_collider, corner_box_size};
use crate::volume::height_box::{height_box_collider, height_box_size};
use crate::volume::mesh::{box_mesh, wall_mesh};
use crate::volume::tiled::{cell_counts, fill_seed, fill_size, plan_fill};
use crate::volume::wall::MIN_SEGMENT_LEN;
use crate::volume::core::{
    ChunkPiece, ControlPointChanged, EntityDeleted, ProcVolume, VolumeColliders, VolumeKind,
};

pub struct VolumesPlugin;

impl Plugin for VolumesPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ControlPointChanged>()
            .add_event::<EntityDeleted>()
            .add_systems(
                Update,
                (
                    recompute_dirty_volumes,
                    refresh_volume_bounds.after(recompute_dirty_volumes),
                ),
            );
    }
}

/// Every control point must be finite before geometry is regenerated from it.
fn points_are_finite(kind: &VolumeKind) -> bool {
    kind.control_points().iter().all(|p| p.is_finite())
}

/// Once per frame: regenerate geometry for every volume marked dirty since
/// the last pass. Multiple mutations within the frame coalesce into one
/// recompute. Runs after input handling, before bounds refresh.
pub fn recompute_dirty_volumes(
    mut commands: Commands,
    settings: Res<RampartSettings>,
    registry_handle: Option<Res<TemplateRegistryHandle>>,
    registries: Option<Res<Assets<TemplateRegistry>>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut volumes: Query<(
        Entity,
        &mut ProcVolume,
        &Transform,
        Option<&Mesh3d>,
        Option<&Children>,
    )>,
    pieces: Query<(), With<ChunkPiece>>,
) {
    let registry = registry_handle
        .as_ref()
        .zip(registries.as_ref())
        .and_then(|(h, regs)| regs.get(&h.0));

    for (entity, mut volume, transform, mesh3d, children) in volumes.iter_mut() {
        if !volume.is_dirty() {
            continue;
        }
        if !points_are_finite(&volume.kind) {
            volume.take_dirty();
            warn!("Volume {:?}: non-finite control point, recompute skipped", entity);
            continue;
        }

        // Chunk fills need the template registry; stay dirty until it's ready.
        if matches!(volume.kind, VolumeKind::ChunkFill { .. }) && registry.is_none() {
            continue;
        }
        volume.take_dirty();

        match volume.kind.clone() {
            VolumeKind::CornerBox { point } => {
                let size = corner_box_size(point, &volume.clamp);
                volume.size = size;
                commands
                    .entity(entity)
                    .insert(VolumeColliders { boxes: vec![corner_box_collider(size)] });
                if let Some(handle) = mesh3d {
                    meshes.insert(&handle.0, box_mesh(size));
                }
            }
            VolumeKind::HeightBox { footprint, height_a, height_b } => {
                let size = height_box_size(footprint, height_a, height_b, &volume.clamp);
                volume.size = size;
                commands
                    .entity(entity)
                    .insert(VolumeColliders { boxes: vec![height_box_collider(size)] });
                if let Some(handle) = mesh3d {
                    meshes.insert(&handle.0, box_mesh(size));
                }
            }
            VolumeKind::Wall(wall) => {
                let boxes = wall.segment_colliders(settings.wall_thickness);
                let obb = wall.oriented_bounds(settings.wall_thickness);
                volume.size = obb.half * 2.0;
                commands.entity(entity).insert(VolumeColliders { boxes });
                if let Some(handle) = mesh3d {
                    meshes.insert(&handle.0, wall_mesh(&wall.points, wall.height, MIN_SEGMENT_LEN));
                }
            }
            VolumeKind::ChunkFill { point } => {
                let Some(registry) = registry else { continue };
                let size = fill_size(point, &volume.clamp);
                volume.size = size;

                // full refill: tear down previous pieces before spawning
                if let Some(children) = children {
                    for child in children.iter() {
                        if pieces.contains(child) {
                            commands.entity(child).despawn();
                        }
                    }
                }

                let variants = registry.chunk_variants();
                if variants.is_empty() {
                    warn!("Volume {:?}: no chunk templates available, fill skipped", entity);
                    commands.entity(entity).insert(VolumeColliders {
                        boxes: vec![Obb::axis_aligned(
                            Vec3::new(0.0, size.y * 0.5, 0.0),
                            size * 0.5,
                        )],
                    });
                } else {
                    // volumes are top-level entities, so the local translation
                    // is the world position (and is valid on the spawn frame)
                    let seed = fill_seed(transform.translation);
                    let counts = cell_counts(size, settings.chunk_size);
                    let picks = plan_fill(size, settings.chunk_size, &variants, seed);
                    for pick in &picks {
                        let Some(def) = registry.get(pick.template) else { continue };
                        let half = def.shape.half_extents();
                        let mesh_h = meshes.add(def.shape.mesh());
                        let mat_h = materials.add(StandardMaterial {
                            base_color: Color::srgb(def.color[0], def.color[1], def.color[2]),
                            ..default()
                        });
                        let translation = pick.local_translation(counts, settings.chunk_size)
                            + Vec3::new(0.0, half.y, 0.0);
                        commands.entity(entity).with_children(|parent| {
                            parent.spawn((
                                Mesh3d(mesh_h),
                                MeshMaterial3d(mat_h),
                                Transform {
                                    translation,
                                    rotation: Quat::from_rotation_y(pick.yaw_radians()),
                                    ..default()
                                },
                                ChunkPiece { template: pick.template },
                            ));
                        });
                    }
                    commands.entity(entity).insert(VolumeColliders {
                        boxes: vec![Obb::axis_aligned(
                            Vec3::new(0.0, size.y * 0.5, 0.0),
                            size * 0.5,
                        )],
                    });
                }
            }
        }

        volume.generation += 1;
    }
}

/// After recompute: refresh every volume's local selection bounds.
/// Side-effect-free with respect to geometry; safe to run every frame.
pub fn refresh_volume_bounds(
    mut commands: Commands,
    settings: Res<RampartSettings>,
    registry_handle: Option<Res<TemplateRegistryHandle>>,
    registries: Option<Res<Assets<TemplateRegistry>>>,
    volumes: Query<(Entity, &ProcVolume, &GlobalTransform, Option<&Children>)>,
    pieces: Query<(&ChunkPiece, &GlobalTransform)>,
) {
    let registry = registry_handle
        .as_ref()
        .zip(registries.as_ref())
        .and_then(|(h, regs)| regs.get(&h.0));

    for (entity, volume, global, children) in volumes.iter() {
        let bounds = match &volume.kind {
            VolumeKind::CornerBox { .. } | VolumeKind::HeightBox { .. } => {
                // height boxes derive from control points even before the mesh
                // catches up; the derived size already encodes them
                LocalBounds(Obb::axis_aligned(
                    Vec3::new(0.0, volume.size.y * 0.5, 0.0),
                    volume.size * 0.5,
                ))
            }
            VolumeKind::Wall(wall) => LocalBounds(wall.oriented_bounds(settings.wall_thickness)),
            VolumeKind::ChunkFill { .. } => {
                let child_boxes: Vec<_> = children
                    .map(|children| {
                        children
                            .iter()
                            .filter_map(|child| pieces.get(child).ok())
                            .filter_map(|(piece, piece_global)| {
                                let def = registry.and_then(|r| r.get(piece.template))?;
                                let tf = piece_global.compute_transform();
                                Some(
                                    Obb::new(tf.translation, def.shape.half_extents(), tf.rotation)
                                        .to_aabb(),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let (_, rot, trans) = global.to_scale_rotation_translation();
                match local_bounds_from_world_boxes(trans, rot, child_boxes) {
                    Some(aabb) => LocalBounds(Obb::axis_aligned(aabb.center, aabb.half)),
                    // no instantiated pieces yet: requested size
                    None => LocalBounds(Obb::axis_aligned(
                        Vec3::new(0.0, volume.size.y * 0.5, 0.0),
                        volume.size * 0.5,
                    )),
                }
            }
        };
        commands.entity(entity).insert(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::VolumeVariantDef;
    use crate::volume::core::SizeClamp;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()));
        app.init_asset::<Mesh>();
        app.init_asset::<StandardMaterial>();
        app.init_resource::<RampartSettings>();
        app.add_systems(
            Update,
            (recompute_dirty_volumes, refresh_volume_bounds.after(recompute_dirty_volumes)),
        );
        app
    }

    #[test]
    fn mutations_in_one_frame_coalesce_to_one_recompute() {
        let mut app = test_app();
        let entity = app
            .world_mut()
            .spawn((
                ProcVolume::new(
                    VolumeKind::default_for(VolumeVariantDef::CornerBox),
                    SizeClamp::default(),
                ),
                Transform::default(),
                GlobalTransform::default(),
            ))
            .id();

        // N mutations within the same frame
        {
            let mut volume = app.world_mut().get_mut::<ProcVolume>(entity).unwrap();
            if let VolumeKind::CornerBox { point } = &mut volume.kind {
                point.x = 2.0;
            }
            volume.mark_dirty();
            let mut volume = app.world_mut().get_mut::<ProcVolume>(entity).unwrap();
            if let VolumeKind::CornerBox { point } = &mut volume.kind {
                point.z = 2.0;
            }
            volume.mark_dirty();
        }

        app.update();
        let volume = app.world().get::<ProcVolume>(entity).unwrap();
        assert_eq!(volume.generation, 1, "exactly one recompute for N mutations");

        // a clean frame does not recompute again
        app.update();
        let volume = app.world().get::<ProcVolume>(entity).unwrap();
        assert_eq!(volume.generation, 1);
    }

    #[test]
    fn recompute_updates_size_and_bounds() {
        let mut app = test_app();
        let entity = app
            .world_mut()
            .spawn((
                ProcVolume::new(
                    VolumeKind::CornerBox { point: Vec3::new(2.0, 3.0, 2.0) },
                    SizeClamp::new(Vec3::ONE, Vec3::splat(20.0)),
                ),
                Transform::default(),
                GlobalTransform::default(),
            ))
            .id();

        app.update();
        let volume = app.world().get::<ProcVolume>(entity).unwrap();
        assert_eq!(volume.size, Vec3::new(4.0, 3.0, 4.0));
        let bounds = app.world().get::<LocalBounds>(entity).unwrap();
        assert_eq!(bounds.0.half, Vec3::new(2.0, 1.5, 2.0));
        assert_eq!(bounds.0.center, Vec3::new(0.0, 1.5, 0.0));
        let colliders = app.world().get::<VolumeColliders>(entity).unwrap();
        assert_eq!(colliders.boxes.len(), 1);
    }

    #[test]
    fn non_finite_point_skips_geometry() {
        let mut app = test_app();
        let entity = app
            .world_mut()
            .spawn((
                ProcVolume::new(
                    VolumeKind::CornerBox { point: Vec3::new(f32::NAN, 1.0, 1.0) },
                    SizeClamp::default(),
                ),
                Transform::default(),
                GlobalTransform::default(),
            ))
            .id();

        app.update();
        let volume = app.world().get::<ProcVolume>(entity).unwrap();
        assert_eq!(volume.generation, 0, "skipped recompute must not count");
        assert!(!volume.is_dirty(), "skip still consumes the dirty flag");
    }
}
