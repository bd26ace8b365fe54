//! Engine speed model
//!
//! Computes the engine RPM each tick from driver input and drive-wheel
//! feedback. The RPM chases a target through a critically damped spring so
//! gear changes don't make it oscillate, and a rev limiter with hysteresis
//! keeps it below the redline.

use log::debug;

use super::config::VehicleConfiguration;
use super::rng::SimRng;
use super::types::{CLUTCH_ENGAGED_THRESHOLD, COAST_THROTTLE_THRESHOLD};

/// Smoothing time while the clutch is open and the engine revs freely
pub const FREE_REV_SMOOTH_TIME: f32 = 0.25;

/// Smoothing time while the clutch couples engine and wheels
pub const ENGAGED_SMOOTH_TIME: f32 = 0.15;

/// Free-revving target noise, in rpm
pub const FREE_REV_JITTER: f32 = 100.0;

/// Target multiplier applied when coasting with the clutch engaged
pub const COAST_RPM_FACTOR: f32 = 0.98;

/// Fraction of max rpm that trips the rev limiter
pub const REV_LIMITER_TRIGGER: f32 = 0.975;

/// Fraction of max rpm the rev limiter pulls the engine down to
pub const REV_LIMITER_TARGET: f32 = 0.9;

/// Fraction of max rpm the engine must fall under before the limiter releases
pub const REV_LIMITER_RELEASE: f32 = 0.95;

pub const REV_LIMITER_COOLDOWN: f32 = 0.2;

/// Limited target noise, in rpm
pub const REV_LIMITER_JITTER: f32 = 50.0;

/// Mutable engine state, one per vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineState {
    pub rpm: f32,
    /// Smooth-damp velocity carried between ticks
    pub rpm_velocity: f32,
    pub rev_limiter_active: bool,
    /// Seconds left before the limiter may release
    pub rev_limiter_cooldown: f32,
}

impl EngineState {
    /// Engine started and settled at idle
    pub fn idling(config: &VehicleConfiguration) -> Self {
        Self {
            rpm: config.idle_rpm(),
            ..Default::default()
        }
    }
}

/// Inputs the RPM model reads for one tick
#[derive(Debug, Clone, Copy)]
pub struct RpmInput {
    pub throttle: f32,
    /// Effective clutch after the gearbox has had its say
    pub clutch: f32,
    /// Mean drive-wheel angular velocity (rpm)
    pub drive_wheel_rpm: f32,
    pub gear_ratio: f32,
}

pub struct RpmModel;

impl RpmModel {
    /// Advance the engine by `delta_secs`
    pub fn update(
        state: &EngineState,
        input: &RpmInput,
        config: &VehicleConfiguration,
        rng: &mut SimRng,
        delta_secs: f32,
    ) -> EngineState {
        if delta_secs <= 0.0 {
            return *state;
        }

        let mut next = *state;
        let (mut target, smooth_time) = Self::target_rpm(input, config, rng);

        let max_rpm = config.max_rpm;
        if !next.rev_limiter_active && next.rpm > max_rpm * REV_LIMITER_TRIGGER {
            next.rev_limiter_active = true;
            next.rev_limiter_cooldown = REV_LIMITER_COOLDOWN;
            debug!("rev limiter engaged at {:.0} rpm", next.rpm);
        }

        if next.rev_limiter_active {
            next.rev_limiter_cooldown = (next.rev_limiter_cooldown - delta_secs).max(0.0);
            let ceiling = max_rpm * REV_LIMITER_TARGET
                + rng.range(-REV_LIMITER_JITTER, REV_LIMITER_JITTER);
            target = target.min(ceiling);

            if next.rev_limiter_cooldown <= 0.0 && next.rpm < max_rpm * REV_LIMITER_RELEASE {
                next.rev_limiter_active = false;
                debug!("rev limiter released at {:.0} rpm", next.rpm);
            }
        }

        next.rpm = smooth_damp(
            next.rpm,
            target,
            &mut next.rpm_velocity,
            smooth_time,
            delta_secs,
        )
        .max(0.0);
        next
    }

    /// Target rpm and smoothing time for the current clutch position
    pub fn target_rpm(
        input: &RpmInput,
        config: &VehicleConfiguration,
        rng: &mut SimRng,
    ) -> (f32, f32) {
        let idle = config.idle_rpm();
        if input.clutch < CLUTCH_ENGAGED_THRESHOLD {
            let target = idle.max(config.max_rpm * input.throttle.abs())
                + rng.range(-FREE_REV_JITTER, FREE_REV_JITTER);
            (target, FREE_REV_SMOOTH_TIME)
        } else {
            let wheel_rpm =
                input.drive_wheel_rpm * input.gear_ratio * config.differential_ratio;
            let mut target = idle.max(wheel_rpm.abs());
            if input.throttle.abs() < COAST_THROTTLE_THRESHOLD {
                target *= COAST_RPM_FACTOR;
            }
            (target, ENGAGED_SMOOTH_TIME)
        }
    }
}

/// Critically damped approach of `current` toward `target`
///
/// `velocity` is carried between calls. The step never overshoots the
/// target.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    delta_secs: f32,
) -> f32 {
    if delta_secs <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * delta_secs;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * delta_secs;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engaged(drive_wheel_rpm: f32, throttle: f32) -> RpmInput {
        RpmInput {
            throttle,
            clutch: 1.0,
            drive_wheel_rpm,
            gear_ratio: 1.0,
        }
    }

    #[test]
    fn test_smooth_damp_reaches_target_without_overshoot() {
        let mut velocity = 0.0;
        let mut value = 0.0;
        for _ in 0..200 {
            value = smooth_damp(value, 100.0, &mut velocity, 0.15, 0.02);
            assert!(value <= 100.0);
        }
        assert!((value - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_zero_delta_leaves_state_untouched() {
        let config = VehicleConfiguration::default();
        let state = EngineState::idling(&config);
        let mut rng = SimRng::with_seed(3);
        let next = RpmModel::update(&state, &engaged(500.0, 1.0), &config, &mut rng, 0.0);
        assert_eq!(next, state);
    }

    #[test]
    fn test_engaged_target_uses_gearing() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(3);
        let input = RpmInput {
            throttle: 1.0,
            clutch: 1.0,
            drive_wheel_rpm: 300.0,
            gear_ratio: 2.0,
        };
        let (target, smooth_time) = RpmModel::target_rpm(&input, &config, &mut rng);
        assert_eq!(target, 300.0 * 2.0 * 4.0);
        assert_eq!(smooth_time, ENGAGED_SMOOTH_TIME);
    }

    #[test]
    fn test_engaged_coast_scales_target() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(3);
        let (target, _) = RpmModel::target_rpm(&engaged(500.0, 0.0), &config, &mut rng);
        assert!((target - 500.0 * 4.0 * COAST_RPM_FACTOR).abs() < 1e-3);
    }

    #[test]
    fn test_free_rev_target_is_jittered_around_throttle() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(9);
        let input = RpmInput {
            throttle: -0.5,
            clutch: 0.0,
            drive_wheel_rpm: 0.0,
            gear_ratio: 1.0,
        };
        for _ in 0..50 {
            let (target, smooth_time) = RpmModel::target_rpm(&input, &config, &mut rng);
            assert!((target - 3500.0).abs() <= FREE_REV_JITTER);
            assert_eq!(smooth_time, FREE_REV_SMOOTH_TIME);
        }
    }

    #[test]
    fn test_rpm_converges_monotonically_with_constant_input() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(11);
        let input = engaged(500.0, 1.0);
        let target = 500.0 * 4.0;
        let mut state = EngineState::idling(&config);
        let mut previous_gap = (state.rpm - target).abs();
        for _ in 0..100 {
            state = RpmModel::update(&state, &input, &config, &mut rng, 0.02);
            let gap = (state.rpm - target).abs();
            assert!(gap <= previous_gap + 1e-3);
            previous_gap = gap;
        }
        assert!(previous_gap < 1.0);
    }

    #[test]
    fn test_rpm_never_negative() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(5);
        let mut state = EngineState {
            rpm: 10.0,
            rpm_velocity: -50_000.0,
            ..Default::default()
        };
        state = RpmModel::update(&state, &engaged(0.0, 0.0), &config, &mut rng, 0.02);
        assert!(state.rpm >= 0.0);
    }

    #[test]
    fn test_rev_limiter_activation_is_idempotent() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(2);
        let input = engaged(config.max_rpm, 1.0);
        let mut state = EngineState {
            rpm: config.max_rpm,
            ..Default::default()
        };

        state = RpmModel::update(&state, &input, &config, &mut rng, 0.02);
        assert!(state.rev_limiter_active);
        let first_cooldown = state.rev_limiter_cooldown;

        state.rpm = config.max_rpm;
        state = RpmModel::update(&state, &input, &config, &mut rng, 0.02);
        assert!(state.rev_limiter_active);
        assert!(state.rev_limiter_cooldown < first_cooldown);
    }

    #[test]
    fn test_rev_limiter_releases_after_cooldown_and_drop() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(4);
        let input = engaged(config.max_rpm, 1.0);
        let mut state = EngineState {
            rpm: config.max_rpm,
            ..Default::default()
        };

        let mut released_at = None;
        for tick in 0..100 {
            state = RpmModel::update(&state, &input, &config, &mut rng, 0.02);
            if tick == 0 {
                assert!(state.rev_limiter_active);
            }
            if !state.rev_limiter_active {
                released_at = Some(tick);
                break;
            }
        }
        let released_at = released_at.expect("limiter should release");
        assert!(released_at as f32 * 0.02 >= REV_LIMITER_COOLDOWN - 0.02);
    }

    #[test]
    fn test_rev_limiter_caps_but_never_raises_target() {
        let config = VehicleConfiguration::default();
        let limited = EngineState {
            rpm: 0.985 * config.max_rpm,
            rev_limiter_active: true,
            rev_limiter_cooldown: REV_LIMITER_COOLDOWN,
            ..Default::default()
        };
        let free_rev = |throttle: f32| RpmInput {
            throttle,
            clutch: 0.0,
            drive_wheel_rpm: 0.0,
            gear_ratio: 1.0,
        };

        let mut lifted = limited;
        let mut floored = limited;
        let mut rng_lifted = SimRng::with_seed(8);
        let mut rng_floored = SimRng::with_seed(8);
        for _ in 0..10 {
            lifted = RpmModel::update(&lifted, &free_rev(0.0), &config, &mut rng_lifted, 0.02);
            floored =
                RpmModel::update(&floored, &free_rev(1.0), &config, &mut rng_floored, 0.02);
        }

        assert!(lifted.rpm < floored.rpm);
        assert!(lifted.rpm < config.max_rpm * REV_LIMITER_TARGET - REV_LIMITER_JITTER);
        assert!(floored.rpm <= limited.rpm);
    }
}
