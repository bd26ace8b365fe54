//! Per-tick vehicle orchestration
//!
//! Standalone implementation that doesn't depend on Bevy. The controller
//! reads an input snapshot and chassis feedback, advances the engine and the
//! gearbox, and writes torque, brake and steering targets into the wheels.

use super::chassis::ChassisFeedback;
use super::config::{ConfigError, VehicleConfiguration};
use super::engine::{EngineState, RpmInput, RpmModel};
use super::gearbox::{GearBox, GearboxInput};
use super::rng::SimRng;
use super::types::{
    GearState, Input, MovementDirection, CLUTCH_ENGAGED_THRESHOLD, HORSEPOWER_TORQUE_CONSTANT,
};
use super::wheels::WheelSet;

/// Engine speed below which no torque is produced
const STALL_RPM: f32 = 1.0;

/// How the pedal was routed on the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PedalAction {
    #[default]
    Idle,
    Drive,
    Brake,
    EngineBrake,
}

/// One vehicle's drivetrain and chassis controller
#[derive(Debug, Clone)]
pub struct VehicleController {
    config: VehicleConfiguration,
    engine: EngineState,
    gearbox: GearBox,
    wheels: WheelSet,
    rng: SimRng,
    speed: f32,
    movement: MovementDirection,
    last_action: PedalAction,
}

impl VehicleController {
    /// Build a controller, rejecting invalid configurations
    pub fn new(config: VehicleConfiguration) -> Result<Self, ConfigError> {
        Self::with_rng(config, SimRng::new())
    }

    /// Build a controller whose jitter is reproducible
    pub fn new_with_seed(config: VehicleConfiguration, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, SimRng::with_seed(seed))
    }

    fn with_rng(config: VehicleConfiguration, rng: SimRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let wheels = WheelSet::new(&config.wheels);
        Ok(Self {
            engine: EngineState::idling(&config),
            gearbox: GearBox::new(),
            wheels,
            rng,
            speed: 0.0,
            movement: MovementDirection::Stationary,
            last_action: PedalAction::Idle,
            config,
        })
    }

    pub fn config(&self) -> &VehicleConfiguration {
        &self.config
    }

    pub fn engine(&self) -> &EngineState {
        &self.engine
    }

    pub fn gearbox(&self) -> &GearBox {
        &self.gearbox
    }

    pub fn wheels(&self) -> &WheelSet {
        &self.wheels
    }

    /// Mutable access for the physics collaborator to report feedback
    pub fn wheels_mut(&mut self) -> &mut WheelSet {
        &mut self.wheels
    }

    pub fn rpm(&self) -> f32 {
        self.engine.rpm
    }

    /// Engine speed over redline; may exceed 1 during limiter overshoot
    pub fn rpm_ratio(&self) -> f32 {
        self.engine.rpm / self.config.max_rpm
    }

    pub fn gear_index(&self) -> usize {
        self.gearbox.gear_index()
    }

    pub fn gear_state(&self) -> GearState {
        self.gearbox.state()
    }

    pub fn gear_label(&self) -> String {
        self.gearbox.label()
    }

    /// Body speed (m/s) seen on the last tick
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn movement(&self) -> MovementDirection {
        self.movement
    }

    pub fn last_action(&self) -> PedalAction {
        self.last_action
    }

    /// True while the gearbox holds the clutch open
    pub fn is_declutched(&self) -> bool {
        self.gearbox.is_declutched()
    }

    /// Clutch actually transmitted this tick
    pub fn effective_clutch(&self, input: &Input) -> f32 {
        if self.gearbox.is_declutched() {
            0.0
        } else {
            input.clutch
        }
    }

    /// Advance the vehicle by one fixed tick
    pub fn tick(&mut self, input: &Input, chassis: &ChassisFeedback, delta_secs: f32) {
        self.speed = chassis.speed;
        self.movement = MovementDirection::from_forward_velocity(chassis.forward_velocity);
        let clutch = self.effective_clutch(input);

        let rpm_input = RpmInput {
            throttle: input.throttle,
            clutch,
            drive_wheel_rpm: self.wheels.average_drive_rpm(),
            gear_ratio: self.config.gear_ratio(self.gearbox.gear_index()),
        };
        self.engine = RpmModel::update(
            &self.engine,
            &rpm_input,
            &self.config,
            &mut self.rng,
            delta_secs,
        );

        let gearbox_input = GearboxInput {
            throttle: input.throttle,
            clutch,
            rpm: self.engine.rpm,
            movement: self.movement,
        };
        self.gearbox
            .step(&gearbox_input, &self.config, &mut self.rng, delta_secs);

        self.wheels.set_motor_torque(0.0);
        self.wheels.set_brake_torque(0.0);
        self.last_action = self.route_pedal(input.throttle, clutch);

        if input.hand_brake {
            self.wheels.set_brake_torque(self.config.max_brake_torque);
        }

        let steer_angle = self.config.max_steer_angle
            * self.config.steering_angle_curve.evaluate(self.speed)
            * input.steer;
        self.wheels.set_steer_angle(steer_angle);

        self.spin_wheels(delta_secs);
    }

    fn route_pedal(&mut self, throttle: f32, clutch: f32) -> PedalAction {
        let reverse = self.gearbox.state() == GearState::RunningReverse;
        if (throttle > 0.0 && !reverse) || (throttle < 0.0 && reverse) {
            let torque = self.drive_torque(clutch) * throttle;
            self.wheels.set_motor_torque(torque);
            PedalAction::Drive
        } else if throttle != 0.0 {
            self.wheels
                .set_brake_torque(self.config.max_brake_torque * throttle.abs());
            PedalAction::Brake
        } else if self.movement.is_moving() {
            self.wheels.set_motor_torque(self.engine_braking_torque());
            PedalAction::EngineBrake
        } else {
            PedalAction::Idle
        }
    }

    /// Full-throttle wheel torque for the current rpm, gear and clutch
    pub fn drive_torque(&self, clutch: f32) -> f32 {
        let rpm = self.engine.rpm;
        if clutch <= CLUTCH_ENGAGED_THRESHOLD || rpm < STALL_RPM {
            return 0.0;
        }
        let normalized = (rpm / self.config.max_rpm).clamp(0.0, 1.0);
        self.config.horsepower * self.config.horsepower_curve.evaluate(normalized) / rpm
            * self.config.gear_ratio(self.gearbox.gear_index())
            * self.config.differential_ratio
            * HORSEPOWER_TORQUE_CONSTANT
            * clutch
    }

    /// Torque opposing the direction of travel while coasting
    pub fn engine_braking_torque(&self) -> f32 {
        let resistance = self.config.engine_braking_factor * self.engine.rpm / self.config.max_rpm;
        -self.movement.sign()
            * resistance
            * self.config.gear_ratio(self.gearbox.gear_index())
            * self.config.differential_ratio
    }

    /// Roll the wheel meshes at the body's ground speed
    fn spin_wheels(&mut self, delta_secs: f32) {
        let direction = self.movement.sign();
        let speed = self.speed;
        for wheel in self.wheels.all_mut() {
            let circumference = wheel.circumference();
            if circumference <= f32::EPSILON {
                continue;
            }
            let revolutions = direction * speed / circumference * delta_secs;
            wheel.visual.spin_angle =
                (wheel.visual.spin_angle + revolutions * 360.0).rem_euclid(360.0);
        }
    }

    #[cfg(test)]
    pub(crate) fn force_engine(&mut self, engine: EngineState) {
        self.engine = engine;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> VehicleController {
        VehicleController::new_with_seed(VehicleConfiguration::default(), 42)
            .expect("default config is valid")
    }

    fn feedback(forward_velocity: f32) -> ChassisFeedback {
        ChassisFeedback {
            forward_velocity,
            speed: forward_velocity.abs(),
        }
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let config = VehicleConfiguration {
            gear_ratios: vec![],
            ..Default::default()
        };
        assert!(VehicleController::new(config).is_err());
    }

    #[test]
    fn test_stalled_engine_produces_no_torque() {
        let mut vehicle = controller();
        vehicle.force_engine(EngineState::default());
        assert_eq!(vehicle.drive_torque(1.0), 0.0);
    }

    #[test]
    fn test_open_clutch_produces_no_torque() {
        let vehicle = controller();
        assert_eq!(vehicle.drive_torque(0.05), 0.0);
    }

    #[test]
    fn test_engine_braking_opposes_motion() {
        let mut vehicle = controller();
        let input = Input::new(0.0, 0.0, 1.0, false);
        vehicle.tick(&input, &feedback(5.0), 0.02);
        assert_eq!(vehicle.last_action(), PedalAction::EngineBrake);
        assert!(vehicle.wheels().drive().all(|w| w.actuation.motor_torque < 0.0));

        let mut reversing = controller();
        reversing.tick(&input, &feedback(-5.0), 0.02);
        assert!(reversing.wheels().drive().all(|w| w.actuation.motor_torque > 0.0));
    }

    #[test]
    fn test_idle_when_stationary_without_input() {
        let mut vehicle = controller();
        vehicle.tick(&Input::default(), &feedback(0.0), 0.02);
        assert_eq!(vehicle.last_action(), PedalAction::Idle);
        assert!(vehicle.wheels().all().iter().all(|w| w.actuation.motor_torque == 0.0
            && w.actuation.brake_torque == 0.0));
    }

    #[test]
    fn test_steering_scales_with_speed_curve() {
        let mut vehicle = controller();
        vehicle.tick(&Input::new(0.0, 1.0, 1.0, false), &feedback(0.0), 0.02);
        let expected = vehicle.config().max_steer_angle;
        assert!(vehicle
            .wheels()
            .steer()
            .all(|w| (w.actuation.steer_angle - expected).abs() < 1e-4));
        assert!(vehicle.wheels().drive().all(|w| w.actuation.steer_angle == 0.0));

        vehicle.tick(&Input::new(0.0, -1.0, 1.0, false), &feedback(20.0), 0.02);
        let expected = -vehicle.config().max_steer_angle * 0.6;
        assert!(vehicle
            .wheels()
            .steer()
            .all(|w| (w.actuation.steer_angle - expected).abs() < 1e-3));
    }

    #[test]
    fn test_wheel_spin_follows_ground_speed() {
        let mut vehicle = controller();
        let radius = vehicle.wheels().all()[0].radius;
        let circumference = 2.0 * std::f32::consts::PI * radius;
        // a quarter revolution in one tick
        let speed = circumference * 0.25 / 0.1;
        vehicle.tick(&Input::default(), &feedback(speed), 0.1);
        let spin = vehicle.wheels().all()[0].visual.spin_angle;
        assert!((spin - 90.0).abs() < 1e-2);

        let mut backward = controller();
        backward.tick(&Input::default(), &feedback(-speed), 0.1);
        let spin = backward.wheels().all()[0].visual.spin_angle;
        assert!((spin - 270.0).abs() < 1e-2);
    }
}
