//! Standalone drivetrain simulation module
//!
//! This module contains all the core vehicle logic (engine rpm, gearbox,
//! wheel actuation and race session) that can run independently of the
//! Bevy game engine. It can be tested via console without needing to boot
//! up the full game.

mod chassis;
mod config;
mod controller;
mod curve;
mod dashboard;
mod engine;
mod gearbox;
mod rng;
mod session;
mod types;
mod wheels;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use chassis::{ChassisFeedback, ChassisPhysics, PointMassChassis};
#[allow(unused_imports)]
pub use config::{ConfigError, VehicleConfiguration, WheelConfig, GEAR_DOWN_JITTER, GEAR_UP_JITTER};
#[allow(unused_imports)]
pub use controller::{PedalAction, VehicleController};
#[allow(unused_imports)]
pub use curve::{Curve, Keyframe};
#[allow(unused_imports)]
pub use dashboard::{DashboardReadout, EngineAudioMix, EngineSoundLimits, NeedleRange};
#[allow(unused_imports)]
pub use engine::{smooth_damp, EngineState, RpmInput, RpmModel};
#[allow(unused_imports)]
pub use gearbox::{
    GearBox, GearboxInput, PendingShift, ShiftDirection, ShiftPhase, DOWNSHIFT_CHECK_DELAY,
    UPSHIFT_CHECK_DELAY,
};
#[allow(unused_imports)]
pub use rng::SimRng;
#[allow(unused_imports)]
pub use session::{
    CheckpointResult, CheckpointTracker, InputResolver, RacePhase, RaceTimer, RawControls,
    SessionConfig, SessionState,
};
#[allow(unused_imports)]
pub use types::{
    lerp, lerp_unclamped, GearState, Input, MovementDirection, Vector3, WheelId,
    CLUTCH_ENGAGED_THRESHOLD, HORSEPOWER_TORQUE_CONSTANT, MOVING_SPEED_THRESHOLD, MPS_TO_KMH,
};
#[allow(unused_imports)]
pub use wheels::{Wheel, WheelActuation, WheelFeedback, WheelRole, WheelSet, WheelVisual};
pub use world::{DriveStats, SimWorld};
