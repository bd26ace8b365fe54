//! Core types for the drivetrain simulation
//!
//! These are standalone types that don't depend on Bevy.

use serde::{Deserialize, Serialize};

/// Local forward speed (m/s) above which the vehicle counts as moving
pub const MOVING_SPEED_THRESHOLD: f32 = 0.1;

/// Clutch engagement above which power flows through the drivetrain
pub const CLUTCH_ENGAGED_THRESHOLD: f32 = 0.1;

/// Throttle magnitude below which an engaged engine coasts down
pub const COAST_THROTTLE_THRESHOLD: f32 = 0.1;

/// Conversion constant between horsepower, torque (lb-ft) and rpm
pub const HORSEPOWER_TORQUE_CONSTANT: f32 = 5252.0;

/// m/s to km/h
pub const MPS_TO_KMH: f32 = 3.6;

/// Index of a wheel inside a [`WheelSet`](super::wheels::WheelSet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WheelId(pub usize);

/// A 3D vector in the vehicle or world frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate around the Y axis by `angle` radians
    pub fn rotate_y(&self, angle: f32) -> Vector3 {
        let (sin, cos) = angle.sin_cos();
        Vector3 {
            x: self.x * cos + self.z * sin,
            y: self.y,
            z: -self.x * sin + self.z * cos,
        }
    }
}

/// Normalized driver input for one simulation tick
///
/// Produced by an input-resolution collaborator (see
/// [`InputResolver`](super::session::InputResolver)) and treated as a
/// read-only snapshot by the vehicle core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Input {
    /// Accelerator/brake axis in [-1, 1]
    pub throttle: f32,
    /// Steering axis in [-1, 1]
    pub steer: f32,
    /// Clutch engagement in [0, 1], 0 = fully declutched
    pub clutch: f32,
    pub hand_brake: bool,
}

impl Input {
    /// Build an input snapshot, clamping every axis into its valid range
    pub fn new(throttle: f32, steer: f32, clutch: f32, hand_brake: bool) -> Self {
        Self {
            throttle: throttle.clamp(-1.0, 1.0),
            steer: steer.clamp(-1.0, 1.0),
            clutch: clutch.clamp(0.0, 1.0),
            hand_brake,
        }
    }
}

/// State of the gearbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GearState {
    /// Declutched, waiting for a direction
    #[default]
    Neutral,
    /// Driving forward in `gear_index`
    Running,
    /// Driving backward
    RunningReverse,
    /// A gear change has been requested and is being confirmed
    CheckingChange,
    /// Declutched while the new gear engages
    Changing,
}

/// Direction of travel along the vehicle's forward axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementDirection {
    Forward,
    Backward,
    Stationary,
}

impl MovementDirection {
    /// Classify a local forward velocity (m/s)
    pub fn from_forward_velocity(forward_velocity: f32) -> Self {
        if forward_velocity > MOVING_SPEED_THRESHOLD {
            MovementDirection::Forward
        } else if forward_velocity < -MOVING_SPEED_THRESHOLD {
            MovementDirection::Backward
        } else {
            MovementDirection::Stationary
        }
    }

    pub fn is_forward(self) -> bool {
        self == MovementDirection::Forward
    }

    pub fn is_backward(self) -> bool {
        self == MovementDirection::Backward
    }

    pub fn is_moving(self) -> bool {
        self != MovementDirection::Stationary
    }

    /// +1 forward, -1 backward, 0 stationary
    pub fn sign(self) -> f32 {
        match self {
            MovementDirection::Forward => 1.0,
            MovementDirection::Backward => -1.0,
            MovementDirection::Stationary => 0.0,
        }
    }
}

/// Linear interpolation clamped to `t` in [0, 1]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    lerp_unclamped(a, b, t.clamp(0.0, 1.0))
}

pub fn lerp_unclamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
