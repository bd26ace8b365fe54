//! Vehicle tunables
//!
//! Static per-session configuration for one vehicle. Every field has a
//! default reproducing the prototype car, so a YAML file only needs to
//! list what it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::curve::{Curve, Keyframe};
use super::rng::SimRng;
use super::types::Vector3;
use super::wheels::WheelRole;

/// Jitter added to the upshift point, in rpm
pub const GEAR_UP_JITTER: (f32, f32) = (-250.0, 50.0);

/// Jitter added to the downshift point, in rpm
pub const GEAR_DOWN_JITTER: (f32, f32) = (-50.0, 250.0);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("gear_ratios must contain at least one gear")]
    EmptyGearRatios,
    #[error("gear ratio {index} must be positive, got {ratio}")]
    InvalidGearRatio { index: usize, ratio: f32 },
    #[error("max_rpm must be positive, got {0}")]
    InvalidMaxRpm(f32),
    #[error("idle rpm {idle} must be at least 0 and below max_rpm {max}")]
    IdleAboveMax { idle: f32, max: f32 },
    #[error("wheel '{name}' must have a positive radius, got {radius}")]
    InvalidWheelRadius { name: String, radius: f32 },
    #[error("mass must be positive, got {0}")]
    InvalidMass(f32),
}

/// Layout entry for one physical wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub name: String,
    #[serde(default)]
    pub drive: bool,
    #[serde(default)]
    pub brake: bool,
    #[serde(default)]
    pub steer: bool,
    /// Rolling radius in meters
    pub radius: f32,
    /// Mount point in the vehicle frame
    #[serde(default)]
    pub position: Vector3,
}

impl WheelConfig {
    pub fn new(name: &str, role: WheelRole, radius: f32) -> Self {
        Self {
            name: name.to_string(),
            drive: role.drive,
            brake: role.brake,
            steer: role.steer,
            radius,
            position: Vector3::ZERO,
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    pub fn role(&self) -> WheelRole {
        WheelRole {
            drive: self.drive,
            brake: self.brake,
            steer: self.steer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfiguration {
    pub max_rpm: f32,
    /// Idle speed as a fraction of `max_rpm`
    pub idle_rpm_fraction: f32,
    pub gear_up_rpm_fraction: f32,
    pub gear_down_rpm_fraction: f32,
    /// Seconds spent declutched while a gear engages
    pub gear_change_duration: f32,
    pub differential_ratio: f32,
    /// Forward gears, index 0 is first gear
    pub gear_ratios: Vec<f32>,
    pub horsepower: f32,
    /// Normalized rpm to torque multiplier
    pub horsepower_curve: Curve,
    pub engine_braking_factor: f32,
    pub max_brake_torque: f32,
    /// Degrees
    pub max_steer_angle: f32,
    /// Body speed (m/s) to steering multiplier
    pub steering_angle_curve: Curve,
    pub drag_coefficient: f32,
    /// Kilograms
    pub mass: f32,
    pub wheels: Vec<WheelConfig>,
}

impl Default for VehicleConfiguration {
    fn default() -> Self {
        Self {
            max_rpm: 7000.0,
            idle_rpm_fraction: 0.1,
            gear_up_rpm_fraction: 0.9,
            gear_down_rpm_fraction: 0.25,
            gear_change_duration: 0.5,
            differential_ratio: 4.0,
            gear_ratios: vec![3.8, 2.2, 1.5, 1.0, 0.8],
            horsepower: 300.0,
            horsepower_curve: default_horsepower_curve(),
            engine_braking_factor: 400.0,
            max_brake_torque: 1000.0,
            max_steer_angle: 20.0,
            steering_angle_curve: Curve::linear(&[(0.0, 1.0), (20.0, 0.6), (50.0, 0.3)]),
            drag_coefficient: 0.05,
            mass: 1200.0,
            wheels: default_wheels(),
        }
    }
}

fn default_horsepower_curve() -> Curve {
    Curve::new([
        Keyframe::smooth(0.0, 0.0, 1.25),
        Keyframe::smooth(0.725, 0.9, 0.97),
        Keyframe::smooth(0.8, 0.965, 0.6),
        Keyframe::smooth(0.9, 1.0, -0.065),
        Keyframe::smooth(0.95, 0.85, -3.555),
        Keyframe::smooth(1.0, 0.0, 0.0),
    ])
}

/// Rear-wheel drive, four-wheel brakes, front steering
fn default_wheels() -> Vec<WheelConfig> {
    let front = WheelRole {
        drive: false,
        brake: true,
        steer: true,
    };
    let rear = WheelRole {
        drive: true,
        brake: true,
        steer: false,
    };
    vec![
        WheelConfig::new("front_left", front, 0.34).at(-0.8, 0.0, 1.3),
        WheelConfig::new("front_right", front, 0.34).at(0.8, 0.0, 1.3),
        WheelConfig::new("rear_left", rear, 0.34).at(-0.8, 0.0, -1.3),
        WheelConfig::new("rear_right", rear, 0.34).at(0.8, 0.0, -1.3),
    ]
}

impl VehicleConfiguration {
    /// Parse a configuration from YAML and validate it
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: VehicleConfiguration = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Check the invariants the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gear_ratios.is_empty() {
            return Err(ConfigError::EmptyGearRatios);
        }
        if let Some((index, &ratio)) = self
            .gear_ratios
            .iter()
            .enumerate()
            .find(|(_, ratio)| !(**ratio > 0.0))
        {
            return Err(ConfigError::InvalidGearRatio { index, ratio });
        }
        if !(self.max_rpm > 0.0) {
            return Err(ConfigError::InvalidMaxRpm(self.max_rpm));
        }
        let idle = self.idle_rpm();
        if !(idle >= 0.0 && idle < self.max_rpm) {
            return Err(ConfigError::IdleAboveMax {
                idle,
                max: self.max_rpm,
            });
        }
        if !(self.mass > 0.0) {
            return Err(ConfigError::InvalidMass(self.mass));
        }
        if let Some(wheel) = self.wheels.iter().find(|w| !(w.radius > 0.0)) {
            return Err(ConfigError::InvalidWheelRadius {
                name: wheel.name.clone(),
                radius: wheel.radius,
            });
        }
        Ok(())
    }

    pub fn idle_rpm(&self) -> f32 {
        self.max_rpm * self.idle_rpm_fraction
    }

    pub fn top_gear(&self) -> usize {
        self.gear_ratios.len().saturating_sub(1)
    }

    /// Ratio of `gear_index`, clamped to the available gears
    pub fn gear_ratio(&self, gear_index: usize) -> f32 {
        self.gear_ratios
            .get(gear_index.min(self.top_gear()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Upshift point, re-rolled on every call
    pub fn increase_gear_rpm(&self, rng: &mut SimRng) -> f32 {
        self.max_rpm * self.gear_up_rpm_fraction + rng.range(GEAR_UP_JITTER.0, GEAR_UP_JITTER.1)
    }

    /// Downshift point, re-rolled on every call
    pub fn decrease_gear_rpm(&self, rng: &mut SimRng) -> f32 {
        self.max_rpm * self.gear_down_rpm_fraction
            + rng.range(GEAR_DOWN_JITTER.0, GEAR_DOWN_JITTER.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_valid() {
        let config = VehicleConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_rpm(), 700.0);
        assert_eq!(config.top_gear(), 4);
    }

    #[test]
    fn test_empty_gear_ratios_rejected() {
        let config = VehicleConfiguration {
            gear_ratios: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGearRatios)));
    }

    #[test]
    fn test_non_positive_max_rpm_rejected() {
        let config = VehicleConfiguration {
            max_rpm: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxRpm(_))));
    }

    #[test]
    fn test_idle_fraction_at_or_above_one_rejected() {
        let config = VehicleConfiguration {
            idle_rpm_fraction: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IdleAboveMax { .. })
        ));
    }

    #[test]
    fn test_nan_or_negative_idle_fraction_rejected() {
        let config = VehicleConfiguration::from_yaml_str("idle_rpm_fraction: .nan\n");
        assert!(matches!(config, Err(ConfigError::IdleAboveMax { .. })));

        let config = VehicleConfiguration {
            idle_rpm_fraction: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IdleAboveMax { .. })
        ));
    }

    #[test]
    fn test_yaml_overrides_keep_defaults() {
        let yaml = "max_rpm: 9000\ngear_ratios: [3.0, 2.0]\n";
        let config = VehicleConfiguration::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(config.max_rpm, 9000.0);
        assert_eq!(config.gear_ratios, vec![3.0, 2.0]);
        assert_eq!(config.differential_ratio, 4.0);
        assert_eq!(config.wheels.len(), 4);
    }

    #[test]
    fn test_yaml_curve_and_wheels() {
        let yaml = r#"
horsepower_curve:
  - { time: 0.0, value: 0.5 }
  - { time: 1.0, value: 1.0 }
wheels:
  - { name: solo, drive: true, brake: true, steer: true, radius: 0.3 }
"#;
        let config = VehicleConfiguration::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(config.horsepower_curve.len(), 2);
        assert_eq!(config.wheels[0].name, "solo");
        assert!(config.wheels[0].role().steer);
    }

    #[test]
    fn test_yaml_bad_wheel_radius_rejected() {
        let yaml = "wheels:\n  - { name: flat, radius: 0.0 }\n";
        assert!(matches!(
            VehicleConfiguration::from_yaml_str(yaml),
            Err(ConfigError::InvalidWheelRadius { .. })
        ));
    }

    #[test]
    fn test_shift_points_within_jitter() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(1);
        for _ in 0..100 {
            let up = config.increase_gear_rpm(&mut rng);
            let down = config.decrease_gear_rpm(&mut rng);
            assert!((6300.0 - 250.0..6300.0 + 50.0).contains(&up));
            assert!((1750.0 - 50.0..1750.0 + 250.0).contains(&down));
        }
    }
}
