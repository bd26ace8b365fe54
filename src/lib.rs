//! Drivetrain Simulation Library
//!
//! A racing vehicle drivetrain and chassis model (engine rpm, gearbox,
//! wheel actuation, race session) that can run independently or with a
//! Bevy UI.

pub mod simulation;

#[cfg(feature = "ui")]
pub mod ui;
