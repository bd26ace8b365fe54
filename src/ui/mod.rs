//! UI module that visualizes the simulation state using Bevy
//!
//! This module is purely for visualization - all simulation logic is in the `simulation` module.
//! The UI polls the keyboard into `RawControls`, ticks `SimWorld` on the fixed timestep and
//! renders the car and its HUD.

mod components;
mod hud;
mod input;
mod spawner;
mod sync;
mod world;

use bevy::prelude::*;

pub use components::{ControlsResource, SimWorldResource};

use hud::{setup_hud, update_hud_text};
use input::{handle_input, poll_controls};
use spawner::spawn_vehicle;
use sync::{follow_camera, highlight_next_gate, sync_vehicle, sync_wheels, tick_simulation};
use world::setup_world;

/// Plugin to register all UI systems
///
/// Expects a `SimWorldResource` to be inserted by the caller.
pub struct DrivetrainUIPlugin;

impl Plugin for DrivetrainUIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControlsResource>()
            .add_systems(
                Startup,
                (setup_world, spawn_vehicle.after(setup_world), setup_hud),
            )
            .add_systems(FixedUpdate, tick_simulation)
            .add_systems(
                Update,
                (
                    poll_controls,
                    handle_input,
                    sync_vehicle,
                    sync_wheels,
                    follow_camera.after(sync_vehicle),
                    highlight_next_gate,
                    update_hud_text,
                ),
            );
    }
}
