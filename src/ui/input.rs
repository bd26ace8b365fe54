//! Input handling systems

use bevy::prelude::*;

use super::components::{ControlsResource, SimWorldResource};
use crate::simulation::RawControls;

fn axis(keyboard: &ButtonInput<KeyCode>, positive: [KeyCode; 2], negative: [KeyCode; 2]) -> f32 {
    let mut value = 0.0;
    if keyboard.any_pressed(positive) {
        value += 1.0;
    }
    if keyboard.any_pressed(negative) {
        value -= 1.0;
    }
    value
}

/// Read the keyboard into raw driving controls
pub fn poll_controls(keyboard: Res<ButtonInput<KeyCode>>, mut controls: ResMut<ControlsResource>) {
    controls.0 = RawControls {
        throttle: axis(
            &keyboard,
            [KeyCode::KeyW, KeyCode::ArrowUp],
            [KeyCode::KeyS, KeyCode::ArrowDown],
        ),
        steer: axis(
            &keyboard,
            [KeyCode::KeyD, KeyCode::ArrowRight],
            [KeyCode::KeyA, KeyCode::ArrowLeft],
        ),
        clutch_pedal: keyboard.pressed(KeyCode::ShiftLeft),
        hand_brake: keyboard.pressed(KeyCode::Space),
    };
}

/// Exit, plus manual triggers for the checkpoint and boost volumes
pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut sim_world: ResMut<SimWorldResource>,
    mut exit: MessageWriter<AppExit>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        let next = sim_world.0.checkpoints.next_index();
        sim_world.0.reach_checkpoint(next);
    }
    if keyboard.just_pressed(KeyCode::KeyB) {
        sim_world.0.collect_boost();
    }
}
