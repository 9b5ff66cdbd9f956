// src/placement/mod.rs
//! Placement session systems: begin on a template hotkey, drag the ghost with
//! surface/grid snapping, commit on click (validity-gated), cancel freely.

pub mod session;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bounds::{Aabb, LocalBounds};
use crate::grid::VolumeGridBounds;
use crate::picking::{cast_ray_entities, ray_plane, viewport_ray};
use crate::settings::RampartSettings;
use crate::state::GameState;
use crate::templates::{TemplateDef, TemplateRegistry, TemplateRegistryHandle, TemplateId};
use crate::edit::registry::ActiveRegistries;
use crate::volume::core::{
    Placed, PlacedId, PlacedIdAllocator, PlacedIndex, ProcVolume, SizeClamp, VolumeColliders,
    VolumeFamily, VolumeKind,
};
use crate::volume::plugin::recompute_dirty_volumes;

pub use session::{GhostPreview, GhostState, PlacementSession};

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementSession>()
            .init_resource::<GhostAssets>()
            .add_systems(Startup, setup_ghost_assets)
            .add_systems(
                Update,
                (handle_placement_hotkeys, update_ghost_drag, commit_or_cancel_placement)
                    .chain()
                    .after(crate::edit::cursor::update_drag)
                    .before(recompute_dirty_volumes)
                    .run_if(in_state(GameState::Running)),
            );
    }
}

/// Ghost tint materials (green = valid pose, red = invalid).
#[derive(Resource, Default)]
pub struct GhostAssets {
    pub valid_material: Handle<StandardMaterial>,
    pub invalid_material: Handle<StandardMaterial>,
}

pub fn setup_ghost_assets(
    mut assets: ResMut<GhostAssets>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    assets.valid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.3, 0.85, 0.35, 0.45),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    assets.invalid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.9, 0.25, 0.2, 0.45),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
}

const HOTKEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Number keys start a placement for the matching placeable template
/// (chunk-fill pieces are not directly placeable). Restarting replaces any
/// ghost already up.
pub fn handle_placement_hotkeys(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    handle: Res<TemplateRegistryHandle>,
    registries: Res<Assets<TemplateRegistry>>,
    ghost_assets: Res<GhostAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut session: ResMut<PlacementSession>,
) {
    let Some(registry) = registries.get(&handle.0) else { return };

    let placeable: Vec<TemplateId> = registry
        .templates
        .iter()
        .enumerate()
        .filter(|(_, def)| def.category.as_deref() != Some("chunk"))
        .map(|(i, _)| TemplateId(i as u32))
        .collect();

    for (slot, key) in HOTKEYS.iter().enumerate() {
        if !keys.just_pressed(*key) {
            continue;
        }
        let Some(&template) = placeable.get(slot) else { continue };
        let Some(def) = registry.get(template) else { continue };

        // replace any ghost already being dragged
        if let Some(old) = session.active.take() {
            commands.entity(old.ghost).despawn();
        }

        let half = def.shape.half_extents();
        let cached = Aabb::new(Vec3::new(0.0, half.y, 0.0), half);
        let ghost = commands
            .spawn((Transform::default(), Visibility::default(), GhostPreview))
            .id();
        let ghost_visual = commands
            .spawn((
                Mesh3d(meshes.add(def.shape.mesh())),
                MeshMaterial3d(ghost_assets.valid_material.clone()),
                Transform::from_translation(Vec3::new(0.0, half.y, 0.0)),
                ChildOf(ghost),
            ))
            .id();

        session.active = Some(GhostState {
            template,
            ghost,
            ghost_visual,
            cached_local_bounds: cached,
            position: Vec3::ZERO,
            yaw_deg: 0.0,
            valid: false,
            surface_snapped: false,
        });
        info!("Placement: began '{}' ({:?})", def.name, template);
        break;
    }
}

/// Each frame while a ghost is up: resolve the cursor to a pose (surface or
/// ground snapped), re-evaluate validity, move the preview, tint it.
pub fn update_ghost_drag(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<RampartSettings>,
    grid: Res<VolumeGridBounds>,
    mut session: ResMut<PlacementSession>,
    placed: Query<(Entity, &LocalBounds, &GlobalTransform), With<Placed>>,
    mut ghost_transforms: Query<&mut Transform, With<GhostPreview>>,
    mut visuals: Query<&mut MeshMaterial3d<StandardMaterial>>,
    ghost_assets: Res<GhostAssets>,
) {
    let Some(state) = session.active.as_mut() else { return };

    if keys.just_pressed(KeyCode::KeyR) {
        state.yaw_deg = (state.yaw_deg + settings.rotation_snap_degrees).rem_euclid(360.0);
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok((camera, cam_tf)) = cameras.single() else { return };
    let Some(ray) = viewport_ray(camera, cam_tf, cursor) else { return };

    let surface_hit = cast_ray_entities(
        ray,
        placed.iter().map(|(e, bounds, global)| {
            let tf = global.compute_transform();
            (e, bounds, tf.translation, tf.rotation)
        }),
    );

    let cached = state.cached_local_bounds;
    if let (Some(hit), true) = (surface_hit, settings.surface_snap_enabled) {
        let face = session::contact_face_from_normal(hit.normal);
        state.position = session::pivot_for_face(&cached, face, hit.point);
        state.surface_snapped = true;
    } else if let Some(ground) = ray_plane(ray, Vec3::ZERO, Vec3::Y) {
        let mut pivot = session::pivot_for_ground(&cached, ground);
        if settings.grid_snap_enabled {
            pivot = session::snap_to_grid_xz(pivot, settings.grid_size);
        }
        state.position = pivot;
        state.surface_snapped = false;
    } else {
        return;
    }

    let world_box = session::ghost_world_aabb(&cached, state.position, state.yaw_deg);
    state.valid = session::placement_valid(
        &world_box,
        state.surface_snapped,
        &grid,
        placed.iter().map(|(_, bounds, global)| {
            let tf = global.compute_transform();
            bounds.world_aabb(tf.translation, tf.rotation)
        }),
        settings.overlap_margin,
    );

    if let Ok(mut tf) = ghost_transforms.get_mut(state.ghost) {
        tf.translation = state.position;
        tf.rotation = Quat::from_rotation_y(state.yaw_deg.to_radians());
    }
    if let Ok(mut material) = visuals.get_mut(state.ghost_visual) {
        let want = if state.valid {
            &ghost_assets.valid_material
        } else {
            &ghost_assets.invalid_material
        };
        if material.0 != *want {
            material.0 = want.clone();
        }
    }
}

/// Left click commits the ghost (rejected while invalid, session stays open);
/// right click or Escape cancels without creating anything.
pub fn commit_or_cancel_placement(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    handle: Res<TemplateRegistryHandle>,
    template_registries: Res<Assets<TemplateRegistry>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut session: ResMut<PlacementSession>,
    mut alloc: ResMut<PlacedIdAllocator>,
    mut index: ResMut<PlacedIndex>,
    mut registries: ResMut<ActiveRegistries>,
) {
    let Some(state) = session.active else { return };

    if buttons.just_pressed(MouseButton::Right) || keys.just_pressed(KeyCode::Escape) {
        commands.entity(state.ghost).despawn();
        session.active = None;
        info!("Placement: cancelled");
        return;
    }
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    if !state.valid {
        warn!("Placement: commit rejected, pose is invalid");
        return;
    }
    let Some(def) = template_registries
        .get(&handle.0)
        .and_then(|r| r.get(state.template))
        .cloned()
    else {
        return;
    };

    let id = alloc.alloc();
    let entity = spawn_committed(
        &mut commands,
        meshes.as_mut(),
        materials.as_mut(),
        &def,
        state.template,
        id,
        state.position,
        Quat::from_rotation_y(state.yaw_deg.to_radians()),
        None,
    );
    index.insert(id, entity);
    let family = VolumeFamily::of(def.volume);
    registries.register(family, entity);
    registries.set_active(family, Some(entity));

    commands.entity(state.ghost).despawn();
    session.active = None;
    info!("Placement: committed '{}' as {:?} (id {})", def.name, entity, id.0);
}

/// Spawn the real entity at the ghost's last valid pose. Construction
/// templates get their procedural volume (dirty, so geometry lands this same
/// frame); plain props get a fixed visual child and static bounds.
/// `kind_override` lets a scene load restore saved control points.
pub fn spawn_committed(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    def: &TemplateDef,
    template: TemplateId,
    id: PlacedId,
    position: Vec3,
    rotation: Quat,
    kind_override: Option<VolumeKind>,
) -> Entity {
    let family = VolumeFamily::of(def.volume);
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(def.color[0], def.color[1], def.color[2]),
        ..default()
    });
    let transform = Transform { translation: position, rotation, ..default() };

    match def.volume {
        Some(variant) => {
            let kind = kind_override.unwrap_or_else(|| VolumeKind::default_for(variant));
            let mut entity = commands.spawn((
                Placed { id, template, family },
                ProcVolume::new(kind, SizeClamp::default()),
                VolumeColliders::default(),
                LocalBounds::unit(),
                transform,
                Visibility::default(),
            ));
            if !matches!(variant, crate::templates::VolumeVariantDef::ChunkFill) {
                // own mesh handle: recompute overwrites this asset in place
                let mesh = meshes.add(crate::volume::mesh::box_mesh(Vec3::splat(0.1)));
                entity.insert((Mesh3d(mesh), MeshMaterial3d(material)));
            }
            entity.id()
        }
        None => {
            let half = def.shape.half_extents();
            let root = commands
                .spawn((
                    Placed { id, template, family },
                    LocalBounds(crate::bounds::Obb::axis_aligned(
                        Vec3::new(0.0, half.y, 0.0),
                        half,
                    )),
                    transform,
                    Visibility::default(),
                ))
                .id();
            commands.spawn((
                Mesh3d(meshes.add(def.shape.mesh())),
                MeshMaterial3d(material),
                Transform::from_translation(Vec3::new(0.0, half.y, 0.0)),
                ChildOf(root),
            ));
            root
        }
    }
}
