//! Dashboard and engine sound derivations
//!
//! Pure functions of the controller's read-only outputs. Rendering and audio
//! playback stay with the caller.

use serde::{Deserialize, Serialize};

use super::controller::VehicleController;
use super::types::{lerp, lerp_unclamped, MPS_TO_KMH};

/// Sweep of the tachometer needle, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeedleRange {
    pub min_angle: f32,
    pub max_angle: f32,
}

impl Default for NeedleRange {
    fn default() -> Self {
        Self {
            min_angle: 210.0,
            max_angle: -30.0,
        }
    }
}

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReadout {
    pub gear: String,
    pub speed_kmh: i32,
    pub rpm: i32,
    pub rpm_ratio: f32,
    /// Not clamped, so limiter overshoot shows past the redline
    pub needle_angle: f32,
}

impl DashboardReadout {
    pub fn from_controller(controller: &VehicleController, needle: &NeedleRange) -> Self {
        let rpm_ratio = controller.rpm_ratio();
        Self {
            gear: controller.gear_label(),
            speed_kmh: (controller.speed() * MPS_TO_KMH).round() as i32,
            rpm: controller.rpm().round() as i32,
            rpm_ratio,
            needle_angle: lerp_unclamped(needle.min_angle, needle.max_angle, rpm_ratio),
        }
    }
}

/// Loudness ceilings of the two engine loops
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSoundLimits {
    pub idle_max_volume: f32,
    pub running_max_volume: f32,
    pub running_max_pitch: f32,
}

impl Default for EngineSoundLimits {
    fn default() -> Self {
        Self {
            idle_max_volume: 0.4,
            running_max_volume: 1.0,
            running_max_pitch: 2.0,
        }
    }
}

/// Volume and pitch for the idle and running engine loops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineAudioMix {
    pub idle_volume: f32,
    pub running_volume: f32,
    pub running_pitch: f32,
}

impl EngineAudioMix {
    pub fn from_rpm_ratio(rpm_ratio: f32, limits: &EngineSoundLimits) -> Self {
        let r = rpm_ratio.clamp(0.0, 1.0);
        Self {
            idle_volume: lerp(0.05, limits.idle_max_volume, r),
            running_volume: lerp(0.1, limits.running_max_volume, r),
            running_pitch: lerp(0.3, limits.running_max_pitch, r),
        }
    }
}
