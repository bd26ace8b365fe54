//! UI components and resources for linking Bevy entities to simulation state

use bevy::prelude::*;

use crate::simulation::{RawControls, SimWorld, WheelId};

/// Resource wrapper for the simulation world
#[derive(Resource)]
pub struct SimWorldResource(pub SimWorld);

/// Controls polled this frame, consumed by the next fixed tick
#[derive(Resource, Default)]
pub struct ControlsResource(pub RawControls);

/// Marker component for ground plane
#[derive(Component)]
pub struct Ground;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Post of checkpoint gate `n`
#[derive(Component)]
pub struct CheckpointGate(pub usize);

/// Marker for the car body driven by the chassis
#[derive(Component)]
pub struct VehicleBody;

/// Links a wheel mesh to a simulation wheel
#[derive(Component)]
pub struct WheelLink(pub WheelId);

/// HUD text fields
#[derive(Component, Clone, Copy)]
pub enum HudText {
    Gear,
    Speed,
    Rpm,
    Timer,
    Checkpoints,
}
