use bevy::prelude::*;
use crate::grid::VolumeGridBounds;
use crate::input::CameraOrbit;

#[derive(Component)]
pub struct MainCamera;

/// Marker for the ground slab under the build region.
#[derive(Component)]
pub struct GroundPlane;

pub fn setup(
    mut commands: Commands,
    grid: Res<VolumeGridBounds>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // 1) Light
    commands.spawn((
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-6.0, 9.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
        CameraOrbit {
            focus: Vec3::ZERO,
            radius: 16.0,
            yaw: 0.6,
            pitch: 0.6,
        },
    ));

    // 3) Ground slab covering the buildable region
    let extent = grid.extent();
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(extent.x, extent.z))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.35, 0.42, 0.3),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::IDENTITY,
        GroundPlane,
    ));

    info!(
        "Setup: build region {}x{}x{} cells at {}m",
        grid.dims.x, grid.dims.y, grid.dims.z, grid.cell_size
    );
}
