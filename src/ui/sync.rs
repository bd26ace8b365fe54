//! Systems for syncing Bevy entities with simulation state

use bevy::prelude::*;

use super::components::{
    CheckpointGate, ControlsResource, MainCamera, SimWorldResource, VehicleBody, WheelLink,
};

pub(super) const CAMERA_DISTANCE: f32 = 10.0;
pub(super) const CAMERA_HEIGHT: f32 = 4.0;

/// System to run simulation tick
pub fn tick_simulation(
    time: Res<Time>,
    controls: Res<ControlsResource>,
    mut sim_world: ResMut<SimWorldResource>,
) {
    sim_world.0.tick(&controls.0, time.delta_secs());
}

/// Place the car body at the chassis pose
pub fn sync_vehicle(
    sim_world: Res<SimWorldResource>,
    mut body_query: Query<&mut Transform, With<VehicleBody>>,
) {
    let chassis = &sim_world.0.chassis;
    for mut transform in body_query.iter_mut() {
        transform.translation.x = chassis.position.x;
        transform.translation.z = chassis.position.z;
        transform.rotation = Quat::from_rotation_y(chassis.heading);
    }
}

/// Apply each wheel's visual steer and spin angles
pub fn sync_wheels(
    sim_world: Res<SimWorldResource>,
    mut wheel_query: Query<(&WheelLink, &mut Transform)>,
) {
    let wheels = sim_world.0.vehicle.wheels();
    for (link, mut transform) in wheel_query.iter_mut() {
        if let Some(wheel) = wheels.get(link.0) {
            transform.rotation = Quat::from_rotation_y(wheel.visual.steer_angle.to_radians())
                * Quat::from_rotation_x(wheel.visual.spin_angle.to_radians())
                * Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        }
    }
}

/// Keep the camera behind the car
pub fn follow_camera(
    sim_world: Res<SimWorldResource>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    let chassis = &sim_world.0.chassis;
    let forward = chassis.forward();
    let target = Vec3::new(chassis.position.x, 0.5, chassis.position.z);
    let eye = target - Vec3::new(forward.x, 0.0, forward.z) * CAMERA_DISTANCE
        + Vec3::Y * CAMERA_HEIGHT;

    for mut transform in camera_query.iter_mut() {
        *transform = Transform::from_translation(eye).looking_at(target, Vec3::Y);
    }
}

/// Raise the posts of the gate the car must reach next
pub fn highlight_next_gate(
    sim_world: Res<SimWorldResource>,
    mut gate_query: Query<(&CheckpointGate, &mut Transform)>,
) {
    let next = sim_world.0.checkpoints.next_index();
    for (gate, mut transform) in gate_query.iter_mut() {
        transform.scale.y = if gate.0 == next { 1.5 } else { 1.0 };
    }
}
