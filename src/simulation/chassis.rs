//! Chassis physics seam
//!
//! The vehicle core never integrates motion itself. It hands actuation
//! targets to a `ChassisPhysics` implementation and reads back body velocity
//! and wheel angular velocity. `PointMassChassis` is a longitudinal point
//! mass with a kinematic bicycle yaw, enough to run the core headless.

use super::config::VehicleConfiguration;
use super::types::Vector3;
use super::wheels::WheelSet;

const GRAVITY: f32 = 9.81;

/// Peak longitudinal force as a fraction of the vehicle's weight
const TYRE_GRIP: f32 = 1.1;

/// Used when the wheel layout has no longitudinal spread
const DEFAULT_WHEELBASE: f32 = 2.6;

/// Body velocity as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisFeedback {
    /// Velocity along the vehicle's forward axis (m/s), signed
    pub forward_velocity: f32,
    /// Magnitude of the body velocity (m/s)
    pub speed: f32,
}

/// Anything that can move a vehicle body from wheel actuation
pub trait ChassisPhysics {
    fn feedback(&self) -> ChassisFeedback;

    /// Apply the wheels' actuation for `delta_secs` and write wheel feedback
    fn integrate(&mut self, wheels: &mut WheelSet, delta_secs: f32);
}

#[derive(Debug, Clone)]
pub struct PointMassChassis {
    mass: f32,
    drag_coefficient: f32,
    wheelbase: f32,
    pub position: Vector3,
    /// Yaw in radians, 0 faces +Z
    pub heading: f32,
    pub forward_velocity: f32,
    /// Meters covered, regardless of direction
    pub odometer: f32,
}

impl PointMassChassis {
    pub fn new(config: &VehicleConfiguration) -> Self {
        let (min_z, max_z) = config
            .wheels
            .iter()
            .map(|wheel| wheel.position.z)
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), z| {
                (lo.min(z), hi.max(z))
            });
        let spread = max_z - min_z;
        let wheelbase = if spread.is_finite() && spread > 0.1 {
            spread
        } else {
            DEFAULT_WHEELBASE
        };

        Self {
            mass: config.mass,
            drag_coefficient: config.drag_coefficient,
            wheelbase,
            position: Vector3::ZERO,
            heading: 0.0,
            forward_velocity: 0.0,
            odometer: 0.0,
        }
    }

    pub fn wheelbase(&self) -> f32 {
        self.wheelbase
    }

    pub fn forward(&self) -> Vector3 {
        Vector3::new(0.0, 0.0, 1.0).rotate_y(self.heading)
    }

    fn traction_limit(&self) -> f32 {
        self.mass * GRAVITY * TYRE_GRIP
    }
}

impl ChassisPhysics for PointMassChassis {
    fn feedback(&self) -> ChassisFeedback {
        ChassisFeedback {
            forward_velocity: self.forward_velocity,
            speed: self.forward_velocity.abs(),
        }
    }

    fn integrate(&mut self, wheels: &mut WheelSet, delta_secs: f32) {
        if delta_secs <= 0.0 {
            return;
        }

        let limit = self.traction_limit();
        let drive_force: f32 = wheels
            .drive()
            .map(|wheel| wheel.actuation.motor_torque / wheel.radius)
            .sum::<f32>()
            .clamp(-limit, limit);
        let brake_force: f32 = wheels
            .brake()
            .map(|wheel| wheel.actuation.brake_torque / wheel.radius)
            .sum::<f32>()
            .min(limit);

        let v = self.forward_velocity;
        let drag_force = self.drag_coefficient * v * v.abs();
        let mut next = v + (drive_force - drag_force) / self.mass * delta_secs;

        // brakes slow the body down but never push it backwards
        let brake_dv = brake_force / self.mass * delta_secs;
        if next.abs() <= brake_dv {
            next = 0.0;
        } else {
            next -= next.signum() * brake_dv;
        }
        self.forward_velocity = next;

        let steer_count = wheels.steer_ids().len();
        if steer_count > 0 {
            let steer_deg: f32 = wheels
                .steer()
                .map(|wheel| wheel.actuation.steer_angle)
                .sum::<f32>()
                / steer_count as f32;
            let yaw_rate = next * steer_deg.to_radians().tan() / self.wheelbase;
            self.heading += yaw_rate * delta_secs;
        }

        let step = next * delta_secs;
        let forward = self.forward();
        self.position = Vector3::new(
            self.position.x + forward.x * step,
            self.position.y,
            self.position.z + forward.z * step,
        );
        self.odometer += step.abs();

        for wheel in wheels.all_mut() {
            wheel.feedback.rpm = next / wheel.circumference() * 60.0;
        }
    }
}
