//! Scene setup: chase camera, sun, ground and checkpoint gates

use bevy::prelude::*;

use super::components::{CheckpointGate, Ground, MainCamera, SimWorldResource};
use super::sync::{CAMERA_DISTANCE, CAMERA_HEIGHT};

/// Radius of the ring the checkpoint gates stand on
const GATE_RING_RADIUS: f32 = 120.0;
const GATE_HALF_WIDTH: f32 = 6.0;
const GATE_POST_HEIGHT: f32 = 3.0;

/// Spawn the static scene the car drives through
pub fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
) {
    // Starts behind the car at rest; `follow_camera` takes over from the first frame
    commands.spawn((
        MainCamera,
        Camera3d::default(),
        Transform::from_xyz(0.0, CAMERA_HEIGHT, -CAMERA_DISTANCE)
            .looking_at(Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
    ));

    // Low sun so the wheels cast readable shadows
    commands.spawn((
        DirectionalLight {
            illuminance: 12000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(-30.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Ground,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(2000.0, 2000.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.25, 0.45, 0.25))),
    ));

    let post_mesh = meshes.add(Cuboid::new(0.4, GATE_POST_HEIGHT, 0.4));
    let post_material = materials.add(Color::srgb(0.95, 0.55, 0.1));
    let count = sim_world.0.checkpoints.total();
    for index in 0..count {
        // Ring through the grid, tangent to the car's initial heading (+Z)
        let angle = (index as f32 + 0.5) / count as f32 * std::f32::consts::TAU;
        let center = Vec3::new(
            GATE_RING_RADIUS * (1.0 - angle.cos()),
            GATE_POST_HEIGHT / 2.0,
            GATE_RING_RADIUS * angle.sin(),
        );
        let across = Vec3::new(-angle.cos(), 0.0, angle.sin()) * GATE_HALF_WIDTH;
        for side in [center - across, center + across] {
            commands.spawn((
                CheckpointGate(index),
                Mesh3d(post_mesh.clone()),
                MeshMaterial3d(post_material.clone()),
                Transform::from_translation(side),
            ));
        }
    }
}
