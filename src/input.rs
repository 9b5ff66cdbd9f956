use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::input::{mouse::MouseMotion, keyboard::KeyCode, ButtonInput};

use crate::actions::{EditorAction, ActionState};
use crate::grid::VolumeGridBounds;
use crate::setup::MainCamera;
use crate::state::GameState;

pub const PAN_SPEED: f32 = 25.0;
pub const ROTATE_SPEED: f32 = 0.2;
pub const MAX_CAMERA_DT: f32 = 0.05; // never use a dt larger than 50ms

#[derive(Component)]
pub struct CameraOrbit {
    pub focus: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.set(EditorAction::PanForward, keys.pressed(KeyCode::KeyW));
    action_state.set(EditorAction::PanBackward, keys.pressed(KeyCode::KeyS));
    action_state.set(EditorAction::PanLeft, keys.pressed(KeyCode::KeyA));
    action_state.set(EditorAction::PanRight, keys.pressed(KeyCode::KeyD));
}

pub fn pause_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
    current_state: Res<State<GameState>>,
) {
    if keys.just_pressed(KeyCode::KeyP) {
        if current_state.get() == &GameState::Running {
            next_state.set(GameState::Paused);
            info!("Paused editor");
        } else if current_state.get() == &GameState::Paused {
            next_state.set(GameState::Running);
            info!("Resumed editor");
        }
    }
}

pub fn camera_controller(
    time: Res<Time>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    action_state: Res<ActionState>,
    grid: Res<VolumeGridBounds>,
    mut query: Query<(&mut Transform, &mut CameraOrbit), With<MainCamera>>,
) {
    // 0) Clamp delta
    let mut dt = time.delta_secs();
    if dt > MAX_CAMERA_DT {
        dt = MAX_CAMERA_DT;
    }

    let Ok((mut tf, mut orbit)) = query.single_mut() else { return; };

    // 1) Camera-relative panning
    let forward = Vec2::new(-orbit.yaw.cos(), -orbit.yaw.sin());
    let right = Vec2::new(-forward.y, forward.x);

    let mut dir = Vec2::ZERO;
    if action_state.pressed(EditorAction::PanForward) { dir += forward; }
    if action_state.pressed(EditorAction::PanBackward) { dir -= forward; }
    if action_state.pressed(EditorAction::PanLeft) { dir -= right; }
    if action_state.pressed(EditorAction::PanRight) { dir += right; }

    if dir != Vec2::ZERO {
        let delta = dir.normalize() * PAN_SPEED * dt;
        orbit.focus.x += delta.x;
        orbit.focus.z += delta.y;
    }

    // 2) Keep the focus over the build region, on the ground plane
    let min = grid.world_min();
    let max = grid.world_max();
    orbit.focus.x = orbit.focus.x.clamp(min.x, max.x);
    orbit.focus.z = orbit.focus.z.clamp(min.z, max.z);
    orbit.focus.y = 0.0;

    // 3) Zoom
    for ev in scroll_evr.read() {
        let amount = match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.02,
        };
        orbit.radius = (orbit.radius - amount).clamp(2.0, 120.0);
    }

    // 4) Orbit
    if mouse_buttons.pressed(MouseButton::Middle) {
        for ev in motion_evr.read() {
            orbit.yaw += ev.delta.x * ROTATE_SPEED * dt;
            orbit.pitch += ev.delta.y * ROTATE_SPEED * dt;
        }
    }

    orbit.pitch = orbit.pitch.clamp(
        0.05,
        std::f32::consts::FRAC_PI_2 - 0.01,
    );

    // 5) Position camera
    let xz_radius = orbit.radius * orbit.pitch.cos();
    let offset = Vec3::new(
        xz_radius * orbit.yaw.cos(),
        orbit.radius * orbit.pitch.sin(),
        xz_radius * orbit.yaw.sin(),
    );

    tf.translation = orbit.focus + offset;

    // 6) Never dip below the ground plane
    if tf.translation.y < 1.5 {
        tf.translation.y = 1.5;
    }

    tf.look_at(orbit.focus, Vec3::Y);
}
