//! Systems for spawning visual entities from simulation state

use bevy::prelude::*;

use super::components::{SimWorldResource, VehicleBody, WheelLink};

const BODY_SIZE: Vec3 = Vec3::new(1.8, 0.6, 4.2);
const BODY_HEIGHT: f32 = 0.7;
const WHEEL_WIDTH: f32 = 0.25;

/// Spawn the car body with one mesh per simulated wheel
pub fn spawn_vehicle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
) {
    let world = &sim_world.0;
    let body_material = materials.add(Color::srgb(0.8, 0.2, 0.2));
    let wheel_material = materials.add(Color::srgb(0.1, 0.1, 0.1));

    commands
        .spawn((
            VehicleBody,
            Mesh3d(meshes.add(Cuboid::new(BODY_SIZE.x, BODY_SIZE.y, BODY_SIZE.z))),
            MeshMaterial3d(body_material),
            Transform::from_xyz(0.0, BODY_HEIGHT, 0.0),
        ))
        .with_children(|parent| {
            for wheel in world.vehicle.wheels().all() {
                let mount = wheel.feedback.position;
                parent.spawn((
                    WheelLink(wheel.id),
                    Mesh3d(meshes.add(Cylinder::new(wheel.radius, WHEEL_WIDTH))),
                    MeshMaterial3d(wheel_material.clone()),
                    Transform::from_xyz(mount.x, wheel.radius - BODY_HEIGHT, mount.z)
                        .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
                ));
            }
        });
}
