// src/edit/cursor.rs
//! Per-selected-entity drag controller: vertical/horizontal/rotate drags with
//! discrete snap feedback, plus the click-action handles (delete, wall point
//! surgery). Only the active entity of a family receives drag input.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bounds::LocalBounds;
use crate::picking::{cast_ray_entities, ray_plane, ray_sphere, viewport_ray};
use crate::placement::session::PlacementSession;
use crate::settings::RampartSettings;
use crate::edit::registry::ActiveRegistries;
use crate::volume::core::{
    ControlPointChanged, EntityDeleted, Placed, PlacedIndex, ProcVolume, VolumeKind,
};
use crate::volume::wall::WallState;

/// Hit-test radius around a handle's center.
pub const HANDLE_RADIUS: f32 = 0.35;
/// Visual radius of the handle spheres.
const HANDLE_VISUAL_RADIUS: f32 = 0.15;

// ---------- Handle taxonomy ----------

/// What a handle does when grabbed or clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    /// Drag the whole entity in the horizontal plane.
    Move,
    /// Drag left/right to spin the entity about its up axis.
    Rotate,
    /// Drag up/down: corner-box height, wall height, or fill height.
    Height,
    /// Second, independent height point (HeightBox only).
    HeightAlt,
    /// Drag the XZ control point horizontally.
    Corner,
    /// Drag one wall bottom point horizontally.
    Point(usize),
    /// Click: grow the wall past this endpoint.
    Extend(usize),
    /// Click: split the segment after this point at its midpoint.
    InsertAfter(usize),
    /// Click: remove this wall point (rejected at the minimum count).
    DeletePoint(usize),
    /// Click: remove the entity.
    Delete,
}

impl HandleKind {
    /// Drag mode this handle enters; `None` for click actions.
    pub fn drag_mode(self) -> DragMode {
        match self {
            HandleKind::Move | HandleKind::Corner | HandleKind::Point(_) => DragMode::HorizontalMove,
            HandleKind::Height | HandleKind::HeightAlt => DragMode::VerticalMove,
            HandleKind::Rotate => DragMode::Rotate,
            _ => DragMode::None,
        }
    }
}

/// One edit handle, childed to the entity it controls.
#[derive(Component, Clone, Copy, Debug)]
pub struct EditHandle {
    pub owner: Entity,
    pub kind: HandleKind,
}

// ---------- Drag session ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    None,
    VerticalMove,
    HorizontalMove,
    Rotate,
}

/// Snapshot taken when a drag begins; discarded when it ends.
#[derive(Clone, Copy, Debug)]
pub struct DragState {
    pub entity: Entity,
    pub kind: HandleKind,
    pub mode: DragMode,
    pub start_screen: Vec2,
    pub start_translation: Vec3,
    pub start_yaw_deg: f32,
    /// Height value at drag start (meaning depends on the handle kind).
    pub start_value: f32,
    /// Last snapped scalar a crossing event fired for (vertical/rotate).
    pub last_snapped: f32,
    /// Last snapped XZ a crossing event fired for (horizontal).
    pub last_snapped_xz: Vec2,
}

#[derive(Resource, Default)]
pub struct EditSession {
    pub drag: Option<DragState>,
}

// ---------- Events ----------

/// Fired when a dragged value passes a new discrete snap boundary — once per
/// crossing, never per frame.
#[derive(Event, Clone, Copy, Debug)]
pub struct SnapCrossing {
    pub entity: Entity,
    pub mode: DragMode,
}

/// Fired once when a drag ends and the transform is committed.
#[derive(Event, Clone, Copy, Debug)]
pub struct DragCompleted {
    pub entity: Entity,
}

// ---------- Snap math ----------

/// Round to the nearest multiple of `step`. Snapping an already-snapped value
/// returns it unchanged.
pub fn snap_step(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Whether the snapped value moved at least one whole step since the last
/// crossing fired.
pub fn crossed_snap(last: f32, current: f32, step: f32) -> bool {
    if step <= 0.0 {
        return false;
    }
    (current - last).abs() >= step - 1e-4
}

// ---------- Handle assets & layout ----------

#[derive(Resource, Default)]
pub struct EditHandleAssets {
    pub mesh: Handle<Mesh>,
    pub drag_material: Handle<StandardMaterial>,
    pub action_material: Handle<StandardMaterial>,
    pub delete_material: Handle<StandardMaterial>,
}

pub fn setup_edit_handle_assets(
    mut assets: ResMut<EditHandleAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    assets.mesh = meshes.add(Sphere::new(HANDLE_VISUAL_RADIUS));
    assets.drag_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.95, 0.8, 0.2),
        unlit: true,
        ..default()
    });
    assets.action_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.8, 0.9),
        unlit: true,
        ..default()
    });
    assets.delete_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.9, 0.25, 0.2),
        unlit: true,
        ..default()
    });
}

/// Local-space handle set for an entity, derived from its volume state and
/// bounds. Order is stable so set comparisons are cheap.
pub fn expected_handles(volume: Option<&ProcVolume>, bounds: &LocalBounds) -> Vec<(HandleKind, Vec3)> {
    let envelope = bounds.0.to_aabb();
    let top = Vec3::new(envelope.center.x, envelope.max().y, envelope.center.z);

    let mut out = vec![
        (HandleKind::Move, top + Vec3::new(0.0, 0.5, 0.0)),
        (HandleKind::Rotate, top + Vec3::new(envelope.half.x + 0.5, 0.0, 0.0)),
        (HandleKind::Delete, top + Vec3::new(0.0, 1.1, 0.0)),
    ];

    let Some(volume) = volume else {
        return out;
    };

    match &volume.kind {
        VolumeKind::CornerBox { point } | VolumeKind::ChunkFill { point } => {
            out.push((HandleKind::Corner, Vec3::new(point.x, 0.0, point.z)));
            out.push((HandleKind::Height, Vec3::new(0.0, volume.size.y, 0.0)));
        }
        VolumeKind::HeightBox { footprint, height_a, height_b } => {
            out.push((HandleKind::Corner, Vec3::new(footprint.x, 0.0, footprint.z)));
            out.push((HandleKind::Height, Vec3::new(0.4, height_a.abs(), 0.0)));
            out.push((HandleKind::HeightAlt, Vec3::new(-0.4, height_b.abs(), 0.0)));
        }
        VolumeKind::Wall(wall) => {
            let n = wall.points.len();
            for (i, p) in wall.points.iter().enumerate() {
                out.push((HandleKind::Point(i), *p));
                out.push((
                    HandleKind::DeletePoint(i),
                    Vec3::new(p.x, wall.height + 0.4, p.z),
                ));
            }
            for i in 0..n.saturating_sub(1) {
                let mid = (wall.points[i] + wall.points[i + 1]) * 0.5;
                out.push((HandleKind::InsertAfter(i), Vec3::new(mid.x, 0.0, mid.z)));
            }
            if n >= 2 {
                out.push((HandleKind::Extend(0), endpoint_probe(wall, 0)));
                out.push((HandleKind::Extend(n - 1), endpoint_probe(wall, n - 1)));
            }
            // wall height handle rides the first point's top
            if let Some(p0) = wall.points.first() {
                out.push((HandleKind::Height, Vec3::new(p0.x, wall.height, p0.z)));
            }
        }
    }
    out
}

/// Where an Extend handle sits: one unit past the endpoint, along the wall.
fn endpoint_probe(wall: &WallState, index: usize) -> Vec3 {
    let n = wall.points.len();
    let p = wall.points[index];
    let dir = if n < 2 {
        Vec3::X
    } else if index == 0 {
        (wall.points[0] - wall.points[1]).with_y(0.0).normalize_or_zero()
    } else {
        (wall.points[n - 1] - wall.points[n - 2]).with_y(0.0).normalize_or_zero()
    };
    let dir = if dir == Vec3::ZERO { Vec3::X } else { dir };
    p + dir
}

fn handle_material(assets: &EditHandleAssets, kind: HandleKind) -> Handle<StandardMaterial> {
    match kind {
        HandleKind::Delete | HandleKind::DeletePoint(_) => assets.delete_material.clone(),
        HandleKind::Extend(_) | HandleKind::InsertAfter(_) => assets.action_material.clone(),
        _ => assets.drag_material.clone(),
    }
}

/// Keep the active entities' handle sets in sync with their volume state:
/// spawn on first activation, rebuild when the expected set changes (wall
/// point surgery shifts later indices), otherwise just follow positions.
pub fn sync_edit_handles(
    mut commands: Commands,
    registries: Res<ActiveRegistries>,
    assets: Res<EditHandleAssets>,
    owners: Query<(Entity, Option<&ProcVolume>, &LocalBounds), With<Placed>>,
    handles: Query<(Entity, &EditHandle)>,
    mut handle_transforms: Query<&mut Transform, With<EditHandle>>,
) {
    for (owner, volume, bounds) in owners.iter() {
        if !registries.is_active(owner) {
            continue;
        }
        let expected = expected_handles(volume, bounds);
        let existing: Vec<(Entity, HandleKind)> = handles
            .iter()
            .filter(|(_, h)| h.owner == owner)
            .map(|(e, h)| (e, h.kind))
            .collect();

        let kinds_match = existing.len() == expected.len()
            && expected.iter().all(|(kind, _)| existing.iter().any(|(_, k)| k == kind));

        if kinds_match {
            for (entity, kind) in existing {
                if let Some((_, pos)) = expected.iter().find(|(k, _)| *k == kind) {
                    if let Ok(mut tf) = handle_transforms.get_mut(entity) {
                        tf.translation = *pos;
                    }
                }
            }
        } else {
            for (entity, _) in existing {
                commands.entity(entity).despawn();
            }
            for (kind, pos) in expected {
                commands.spawn((
                    Mesh3d(assets.mesh.clone()),
                    MeshMaterial3d(handle_material(&assets, kind)),
                    Transform::from_translation(pos),
                    Visibility::Hidden,
                    EditHandle { owner, kind },
                    ChildOf(owner),
                ));
            }
        }
    }
}

// ---------- Drag begin / click actions / selection ----------

/// On press: grab a handle of an active entity, execute a click action, or
/// select whatever placed entity sits under the cursor. Clicking empty space
/// clears every family's active entity.
pub fn begin_drag_or_select(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    buttons: Res<ButtonInput<MouseButton>>,
    placement: Res<PlacementSession>,
    settings: Res<RampartSettings>,
    mut session: ResMut<EditSession>,
    mut registries: ResMut<ActiveRegistries>,
    mut index: ResMut<PlacedIndex>,
    handles: Query<(Entity, &EditHandle, &GlobalTransform, &Visibility)>,
    placed: Query<(Entity, &Placed, &LocalBounds, &GlobalTransform)>,
    transforms: Query<&Transform, With<Placed>>,
    mut volumes: Query<&mut ProcVolume>,
    mut changed: EventWriter<ControlPointChanged>,
    mut deleted: EventWriter<EntityDeleted>,
) {
    if !buttons.just_pressed(MouseButton::Left) || session.drag.is_some() {
        return;
    }
    // placement owns the pointer while a ghost is up
    if placement.active.is_some() {
        return;
    }
    let Ok(window) = windows.single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok((camera, cam_tf)) = cameras.single() else { return };
    let Some(ray) = viewport_ray(camera, cam_tf, cursor) else { return };

    // 1) handles first (visible ones only)
    let mut best: Option<(f32, Entity, EditHandle)> = None;
    for (entity, handle, global, visibility) in handles.iter() {
        if *visibility == Visibility::Hidden {
            continue;
        }
        if let Some(t) = ray_sphere(ray, global.translation(), HANDLE_RADIUS) {
            if best.as_ref().map_or(true, |(bt, _, _)| t < *bt) {
                best = Some((t, entity, *handle));
            }
        }
    }

    if let Some((_, _, handle)) = best {
        let owner = handle.owner;
        match handle.kind {
            HandleKind::Delete => {
                if let Ok((_, placed, _, _)) = placed.get(owner) {
                    index.remove(placed.id);
                    deleted.write(EntityDeleted { entity: owner, id: placed.id });
                }
                registries.unregister_everywhere(owner);
                commands.entity(owner).despawn();
                info!("Edit: deleted entity {:?}", owner);
            }
            HandleKind::DeletePoint(i) => {
                if let Ok(mut volume) = volumes.get_mut(owner) {
                    if let VolumeKind::Wall(wall) = &mut volume.kind {
                        match wall.delete_point(i) {
                            Ok(()) => {
                                volume.mark_dirty();
                                changed.write(ControlPointChanged { entity: owner });
                            }
                            Err(e) => warn!("Edit: point delete rejected: {}", e),
                        }
                    }
                }
            }
            HandleKind::InsertAfter(i) => {
                if let Ok(mut volume) = volumes.get_mut(owner) {
                    if let VolumeKind::Wall(wall) = &mut volume.kind {
                        match wall.insert_after(i) {
                            Ok(_) => {
                                volume.mark_dirty();
                                changed.write(ControlPointChanged { entity: owner });
                            }
                            Err(e) => warn!("Edit: point insert rejected: {}", e),
                        }
                    }
                }
            }
            HandleKind::Extend(i) => {
                if let Ok(mut volume) = volumes.get_mut(owner) {
                    if let VolumeKind::Wall(wall) = &mut volume.kind {
                        match wall.extend_from(i) {
                            Ok(_) => {
                                volume.mark_dirty();
                                changed.write(ControlPointChanged { entity: owner });
                            }
                            Err(e) => warn!("Edit: wall extend rejected: {}", e),
                        }
                    }
                }
            }
            kind => {
                // drag handle: snapshot and enter the state machine
                let Ok(transform) = transforms.get(owner) else { return };
                let volume = volumes.get(owner).ok();
                let start_value = drag_start_value(kind, volume);
                let yaw_deg = transform.rotation.to_euler(EulerRot::YXZ).0.to_degrees();
                session.drag = Some(DragState {
                    entity: owner,
                    kind,
                    mode: kind.drag_mode(),
                    start_screen: cursor,
                    start_translation: transform.translation,
                    start_yaw_deg: yaw_deg,
                    start_value,
                    last_snapped: match kind.drag_mode() {
                        DragMode::VerticalMove => snap_step(start_value, settings.vertical_snap),
                        DragMode::Rotate => snap_step(yaw_deg, settings.rotation_snap_degrees),
                        _ => 0.0,
                    },
                    last_snapped_xz: drag_start_xz(kind, volume, transform),
                });
            }
        }
        return;
    }

    // 2) no handle hit: select / deselect
    let hit = cast_ray_entities(
        ray,
        placed.iter().map(|(e, _, bounds, global)| {
            let tf = global.compute_transform();
            (e, bounds, tf.translation, tf.rotation)
        }),
    );
    match hit {
        Some(hit) => {
            if let Ok((_, placed, _, _)) = placed.get(hit.entity) {
                registries.set_active(placed.family, Some(hit.entity));
            }
        }
        None => {
            for family in crate::volume::core::VolumeFamily::ALL {
                registries.set_active(family, None);
            }
        }
    }
}

/// Horizontal reference a drag starts from: the dragged control point's local
/// XZ, or the entity translation for whole-entity moves.
fn drag_start_xz(kind: HandleKind, volume: Option<&ProcVolume>, transform: &Transform) -> Vec2 {
    if let Some(volume) = volume {
        match (&volume.kind, kind) {
            (VolumeKind::CornerBox { point }, HandleKind::Corner)
            | (VolumeKind::ChunkFill { point }, HandleKind::Corner) => {
                return Vec2::new(point.x, point.z);
            }
            (VolumeKind::HeightBox { footprint, .. }, HandleKind::Corner) => {
                return Vec2::new(footprint.x, footprint.z);
            }
            (VolumeKind::Wall(wall), HandleKind::Point(i)) => {
                if let Some(p) = wall.points.get(i) {
                    return Vec2::new(p.x, p.z);
                }
            }
            _ => {}
        }
    }
    Vec2::new(transform.translation.x, transform.translation.z)
}

/// Height value a vertical drag starts from, per handle kind.
fn drag_start_value(kind: HandleKind, volume: Option<&ProcVolume>) -> f32 {
    let Some(volume) = volume else { return 0.0 };
    match (&volume.kind, kind) {
        (VolumeKind::CornerBox { point }, HandleKind::Height) => point.y.abs(),
        (VolumeKind::ChunkFill { point }, HandleKind::Height) => point.y.abs(),
        (VolumeKind::HeightBox { height_a, .. }, HandleKind::Height) => height_a.abs(),
        (VolumeKind::HeightBox { height_b, .. }, HandleKind::HeightAlt) => height_b.abs(),
        (VolumeKind::Wall(wall), HandleKind::Height) => wall.height,
        _ => 0.0,
    }
}

// ---------- Drag update / end ----------

/// Advance the active drag each frame and commit on release. Snap-crossing
/// events fire only when the snapped value passes a new boundary.
pub fn update_drag(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    buttons: Res<ButtonInput<MouseButton>>,
    settings: Res<RampartSettings>,
    mut session: ResMut<EditSession>,
    mut targets: Query<(&mut Transform, Option<&mut ProcVolume>)>,
    mut crossings: EventWriter<SnapCrossing>,
    mut completed: EventWriter<DragCompleted>,
    mut changed: EventWriter<ControlPointChanged>,
) {
    let Some(drag) = session.drag.as_mut() else { return };

    if buttons.just_released(MouseButton::Left) {
        completed.write(DragCompleted { entity: drag.entity });
        session.drag = None;
        return;
    }
    if !buttons.pressed(MouseButton::Left) {
        session.drag = None;
        return;
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok((mut transform, volume)) = targets.get_mut(drag.entity) else {
        session.drag = None;
        return;
    };

    match drag.mode {
        DragMode::VerticalMove => {
            // screen y grows downward; dragging up raises the value
            let delta = (drag.start_screen.y - cursor.y) * settings.vertical_sensitivity;
            let snapped = snap_step(drag.start_value + delta, settings.vertical_snap).max(0.0);
            if let Some(mut volume) = volume {
                if apply_vertical(drag.kind, &mut *volume, snapped, &*settings) {
                    changed.write(ControlPointChanged { entity: drag.entity });
                }
            }
            if crossed_snap(drag.last_snapped, snapped, settings.vertical_snap) {
                crossings.write(SnapCrossing { entity: drag.entity, mode: drag.mode });
                drag.last_snapped = snapped;
            }
        }
        DragMode::HorizontalMove => {
            let Ok((camera, cam_tf)) = cameras.single() else { return };
            let Some(ray) = viewport_ray(camera, cam_tf, cursor) else { return };
            // plane rides at the entity's current height
            let plane_y = transform.translation.y;
            let Some(world) = ray_plane(ray, Vec3::new(0.0, plane_y, 0.0), Vec3::Y) else {
                return;
            };
            let step = settings.grid_size;
            match drag.kind {
                HandleKind::Move => {
                    let snapped =
                        Vec2::new(snap_step(world.x, step), snap_step(world.z, step));
                    transform.translation.x = snapped.x;
                    transform.translation.z = snapped.y;
                    if crossed_snap(drag.last_snapped_xz.x, snapped.x, step)
                        || crossed_snap(drag.last_snapped_xz.y, snapped.y, step)
                    {
                        crossings.write(SnapCrossing { entity: drag.entity, mode: drag.mode });
                        drag.last_snapped_xz = snapped;
                    }
                }
                HandleKind::Corner | HandleKind::Point(_) => {
                    // pull the hit into entity-local space before snapping
                    let local = transform.rotation.inverse() * (world - transform.translation);
                    let snapped =
                        Vec2::new(snap_step(local.x, step), snap_step(local.z, step));
                    if let Some(mut volume) = volume {
                        if apply_horizontal(drag.kind, &mut *volume, snapped) {
                            changed.write(ControlPointChanged { entity: drag.entity });
                        }
                    }
                    if crossed_snap(drag.last_snapped_xz.x, snapped.x, step)
                        || crossed_snap(drag.last_snapped_xz.y, snapped.y, step)
                    {
                        crossings.write(SnapCrossing { entity: drag.entity, mode: drag.mode });
                        drag.last_snapped_xz = snapped;
                    }
                }
                _ => {}
            }
        }
        DragMode::Rotate => {
            // natural direction: dragging right spins clockwise seen from above
            let delta = (cursor.x - drag.start_screen.x) * settings.rotation_sensitivity * -1.0;
            let snapped = snap_step(drag.start_yaw_deg + delta, settings.rotation_snap_degrees);
            transform.rotation = Quat::from_rotation_y(snapped.to_radians());
            if crossed_snap(drag.last_snapped, snapped, settings.rotation_snap_degrees) {
                crossings.write(SnapCrossing { entity: drag.entity, mode: drag.mode });
                drag.last_snapped = snapped;
            }
        }
        DragMode::None => {}
    }
}

/// Write a snapped height back into the volume. Returns true when state changed.
fn apply_vertical(
    kind: HandleKind,
    volume: &mut ProcVolume,
    value: f32,
    settings: &RampartSettings,
) -> bool {
    let changed = match (&mut volume.kind, kind) {
        (VolumeKind::CornerBox { point }, HandleKind::Height)
        | (VolumeKind::ChunkFill { point }, HandleKind::Height) => {
            if point.y != value {
                point.y = value;
                true
            } else {
                false
            }
        }
        (VolumeKind::HeightBox { height_a, .. }, HandleKind::Height) => {
            if *height_a != value {
                *height_a = value;
                true
            } else {
                false
            }
        }
        (VolumeKind::HeightBox { height_b, .. }, HandleKind::HeightAlt) => {
            if *height_b != value {
                *height_b = value;
                true
            } else {
                false
            }
        }
        (VolumeKind::Wall(wall), HandleKind::Height) => {
            let before = wall.height;
            wall.set_height(value, settings.wall_height_min, settings.wall_height_max);
            wall.height != before
        }
        _ => false,
    };
    if changed {
        volume.mark_dirty();
    }
    changed
}

/// Write a snapped local XZ back into the volume. Returns true when state changed.
fn apply_horizontal(kind: HandleKind, volume: &mut ProcVolume, xz: Vec2) -> bool {
    let changed = match (&mut volume.kind, kind) {
        (VolumeKind::CornerBox { point }, HandleKind::Corner)
        | (VolumeKind::ChunkFill { point }, HandleKind::Corner) => {
            if point.x != xz.x || point.z != xz.y {
                point.x = xz.x;
                point.z = xz.y;
                true
            } else {
                false
            }
        }
        (VolumeKind::HeightBox { footprint, .. }, HandleKind::Corner) => {
            if footprint.x != xz.x || footprint.z != xz.y {
                footprint.x = xz.x;
                footprint.z = xz.y;
                true
            } else {
                false
            }
        }
        (VolumeKind::Wall(wall), HandleKind::Point(i)) => {
            let before = wall.points.get(i).copied();
            match wall.set_point_xz(i, xz.x, xz.y) {
                Ok(()) => before != wall.points.get(i).copied(),
                Err(e) => {
                    warn!("Edit: point drag rejected: {}", e);
                    false
                }
            }
        }
        _ => false,
    };
    if changed {
        volume.mark_dirty();
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_snapped_values_is_idempotent() {
        for (value, step) in [(1.5, 0.5), (0.0, 0.25), (-3.75, 0.25), (90.0, 15.0)] {
            let once = snap_step(value, step);
            assert_eq!(once, snap_step(once, step));
            assert_eq!(once, value, "already-aligned value must not move");
        }
    }

    #[test]
    fn snap_rounds_to_nearest() {
        assert!((snap_step(5.2, 0.5) - 5.0).abs() < 1e-6);
        assert!((snap_step(5.3, 0.5) - 5.5).abs() < 1e-6);
        assert!((snap_step(37.0, 15.0) - 30.0).abs() < 1e-6);
        assert!((snap_step(38.0, 15.0) - 45.0).abs() < 1e-6);
    }

    #[test]
    fn crossing_fires_only_on_whole_steps() {
        // no crossing while the snapped value holds still
        assert!(!crossed_snap(1.0, 1.0, 0.25));
        // one whole step fires
        assert!(crossed_snap(1.0, 1.25, 0.25));
        assert!(crossed_snap(1.0, 0.75, 0.25));
        // several steps at once still fires (single event, larger jump)
        assert!(crossed_snap(1.0, 2.0, 0.25));
    }

    #[test]
    fn click_handles_have_no_drag_mode() {
        assert_eq!(HandleKind::Delete.drag_mode(), DragMode::None);
        assert_eq!(HandleKind::DeletePoint(0).drag_mode(), DragMode::None);
        assert_eq!(HandleKind::InsertAfter(1).drag_mode(), DragMode::None);
        assert_eq!(HandleKind::Extend(0).drag_mode(), DragMode::None);
        assert_eq!(HandleKind::Move.drag_mode(), DragMode::HorizontalMove);
        assert_eq!(HandleKind::Height.drag_mode(), DragMode::VerticalMove);
        assert_eq!(HandleKind::Rotate.drag_mode(), DragMode::Rotate);
    }

    #[test]
    fn wall_handle_set_tracks_point_count() {
        use crate::bounds::{LocalBounds, Obb};
        use crate::volume::core::SizeClamp;

        let wall = WallState::new(vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)], 2.0);
        let volume = ProcVolume::new(VolumeKind::Wall(wall), SizeClamp::default());
        let bounds = LocalBounds(Obb::axis_aligned(Vec3::new(2.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.2)));
        let handles = expected_handles(Some(&volume), &bounds);

        let points = handles.iter().filter(|(k, _)| matches!(k, HandleKind::Point(_))).count();
        let deletes =
            handles.iter().filter(|(k, _)| matches!(k, HandleKind::DeletePoint(_))).count();
        let inserts =
            handles.iter().filter(|(k, _)| matches!(k, HandleKind::InsertAfter(_))).count();
        let extends = handles.iter().filter(|(k, _)| matches!(k, HandleKind::Extend(_))).count();
        assert_eq!(points, 2);
        assert_eq!(deletes, 2);
        assert_eq!(inserts, 1);
        assert_eq!(extends, 2);
    }
}
