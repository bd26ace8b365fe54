//! Wheel roles, actuation targets and feedback
//!
//! A `WheelSet` classifies a vehicle's wheels into drive/brake/steer views
//! once at construction. Roles never change afterwards, so the views are
//! plain index lists.

use super::config::WheelConfig;
use super::types::{Vector3, WheelId};

/// Which jobs a wheel does. A wheel may hold several roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelRole {
    pub drive: bool,
    pub brake: bool,
    pub steer: bool,
}

/// Targets written for the physics collaborator each tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelActuation {
    /// Signed motor torque
    pub motor_torque: f32,
    /// Brake torque, never negative
    pub brake_torque: f32,
    /// Degrees
    pub steer_angle: f32,
}

/// Kinematic state reported back by the physics collaborator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelFeedback {
    /// Angular velocity in revolutions per minute
    pub rpm: f32,
    /// Contact point in the vehicle frame
    pub position: Vector3,
}

/// Pose of the wheel mesh, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelVisual {
    pub steer_angle: f32,
    /// Rolling angle about the axle, wrapped to [0, 360)
    pub spin_angle: f32,
}

#[derive(Debug, Clone)]
pub struct Wheel {
    pub id: WheelId,
    pub name: String,
    pub role: WheelRole,
    pub radius: f32,
    pub actuation: WheelActuation,
    pub feedback: WheelFeedback,
    pub visual: WheelVisual,
}

impl Wheel {
    pub fn new(id: WheelId, config: &WheelConfig) -> Self {
        Self {
            id,
            name: config.name.clone(),
            role: config.role(),
            radius: config.radius,
            actuation: WheelActuation::default(),
            feedback: WheelFeedback {
                rpm: 0.0,
                position: config.position,
            },
            visual: WheelVisual::default(),
        }
    }

    pub fn circumference(&self) -> f32 {
        2.0 * std::f32::consts::PI * self.radius
    }
}

/// All wheels of one vehicle plus their cached role views
#[derive(Debug, Clone, Default)]
pub struct WheelSet {
    wheels: Vec<Wheel>,
    drive: Vec<WheelId>,
    brake: Vec<WheelId>,
    steer: Vec<WheelId>,
}

impl WheelSet {
    pub fn new(configs: &[WheelConfig]) -> Self {
        let wheels: Vec<Wheel> = configs
            .iter()
            .enumerate()
            .map(|(index, config)| Wheel::new(WheelId(index), config))
            .collect();

        let view = |has_role: fn(&WheelRole) -> bool| -> Vec<WheelId> {
            wheels
                .iter()
                .filter(|wheel| has_role(&wheel.role))
                .map(|wheel| wheel.id)
                .collect()
        };

        let drive = view(|role| role.drive);
        let brake = view(|role| role.brake);
        let steer = view(|role| role.steer);

        Self {
            wheels,
            drive,
            brake,
            steer,
        }
    }

    pub fn all(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn all_mut(&mut self) -> &mut [Wheel] {
        &mut self.wheels
    }

    pub fn get(&self, id: WheelId) -> Option<&Wheel> {
        self.wheels.get(id.0)
    }

    pub fn get_mut(&mut self, id: WheelId) -> Option<&mut Wheel> {
        self.wheels.get_mut(id.0)
    }

    pub fn drive_ids(&self) -> &[WheelId] {
        &self.drive
    }

    pub fn brake_ids(&self) -> &[WheelId] {
        &self.brake
    }

    pub fn steer_ids(&self) -> &[WheelId] {
        &self.steer
    }

    pub fn drive(&self) -> impl Iterator<Item = &Wheel> {
        self.drive.iter().filter_map(|id| self.get(*id))
    }

    pub fn brake(&self) -> impl Iterator<Item = &Wheel> {
        self.brake.iter().filter_map(|id| self.get(*id))
    }

    pub fn steer(&self) -> impl Iterator<Item = &Wheel> {
        self.steer.iter().filter_map(|id| self.get(*id))
    }

    pub fn len(&self) -> usize {
        self.wheels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wheels.is_empty()
    }

    /// Mean angular velocity of the drive wheels, 0 without drive wheels
    pub fn average_drive_rpm(&self) -> f32 {
        if self.drive.is_empty() {
            return 0.0;
        }
        let total: f32 = self.drive().map(|wheel| wheel.feedback.rpm).sum();
        total / self.drive.len() as f32
    }

    pub fn set_motor_torque(&mut self, torque: f32) {
        for id in &self.drive {
            if let Some(wheel) = self.wheels.get_mut(id.0) {
                wheel.actuation.motor_torque = torque;
            }
        }
    }

    pub fn set_brake_torque(&mut self, torque: f32) {
        let torque = torque.max(0.0);
        for id in &self.brake {
            if let Some(wheel) = self.wheels.get_mut(id.0) {
                wheel.actuation.brake_torque = torque;
            }
        }
    }

    /// Set the physics steer angle and mirror it onto the wheel mesh
    pub fn set_steer_angle(&mut self, angle: f32) {
        for id in &self.steer {
            if let Some(wheel) = self.wheels.get_mut(id.0) {
                wheel.actuation.steer_angle = angle;
                wheel.visual.steer_angle = angle;
            }
        }
    }

    /// Store the angular velocity reported for one wheel
    pub fn record_feedback(&mut self, id: WheelId, feedback: WheelFeedback) {
        if let Some(wheel) = self.get_mut(id) {
            wheel.feedback = feedback;
        }
    }
}
