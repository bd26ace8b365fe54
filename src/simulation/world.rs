//! Main simulation world that ties everything together
//!
//! This is the entry point for running the drivetrain simulation
//! without any Bevy dependencies. It owns one vehicle, the chassis that
//! moves it and the race session in front of it.

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use super::chassis::{ChassisPhysics, PointMassChassis};
use super::config::VehicleConfiguration;
use super::controller::VehicleController;
use super::dashboard::{DashboardReadout, EngineAudioMix, EngineSoundLimits, NeedleRange};
use super::session::{
    CheckpointResult, CheckpointTracker, InputResolver, RaceTimer, RawControls, SessionConfig,
    SessionState,
};
use super::types::{Input, MPS_TO_KMH};

/// Running totals over a session
#[derive(Debug, Clone, Default)]
pub struct DriveStats {
    /// m/s
    pub top_speed: f32,
    pub peak_rpm: f32,
    pub gear_changes: usize,
    pub boosts_collected: usize,
    pub ticks: usize,
}

/// The main simulation world
pub struct SimWorld {
    pub vehicle: VehicleController,
    pub chassis: PointMassChassis,
    pub timer: RaceTimer,
    pub checkpoints: CheckpointTracker,
    pub session: SessionState,
    pub needle: NeedleRange,
    pub sound: EngineSoundLimits,
    pub stats: DriveStats,

    /// Simulation time
    pub time: f32,

    session_config: SessionConfig,
    resolver: InputResolver,
    last_input: Input,
}

impl SimWorld {
    fn new_internal(vehicle: VehicleController, session_config: SessionConfig) -> Self {
        let chassis = PointMassChassis::new(vehicle.config());
        let timer = RaceTimer::new(&session_config);
        let session = SessionState {
            gameplay_active: timer.gameplay_active(),
        };
        Self {
            vehicle,
            chassis,
            timer,
            checkpoints: CheckpointTracker::new(session_config.checkpoint_count),
            session,
            needle: NeedleRange::default(),
            sound: EngineSoundLimits::default(),
            stats: DriveStats::default(),
            time: 0.0,
            session_config,
            resolver: InputResolver::new(),
            last_input: Input::default(),
        }
    }

    pub fn new(config: VehicleConfiguration, session_config: SessionConfig) -> Result<Self> {
        let vehicle = VehicleController::new(config).context("Invalid vehicle configuration")?;
        Ok(Self::new_internal(vehicle, session_config))
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(
        config: VehicleConfiguration,
        session_config: SessionConfig,
        seed: u64,
    ) -> Result<Self> {
        let vehicle = VehicleController::new_with_seed(config, seed)
            .context("Invalid vehicle configuration")?;
        Ok(Self::new_internal(vehicle, session_config))
    }

    /// Build a world from a YAML vehicle file
    pub fn from_config_file(
        path: impl AsRef<Path>,
        session_config: SessionConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let config = VehicleConfiguration::from_yaml_file(path)
            .with_context(|| format!("Failed to load vehicle config from {}", path.display()))?;
        match seed {
            Some(seed) => Self::new_with_seed(config, session_config, seed),
            None => Self::new(config, session_config),
        }
    }

    /// The prototype car on a default session
    pub fn create_test_world() -> Result<Self> {
        Self::new(VehicleConfiguration::default(), SessionConfig::default())
    }

    pub fn create_test_world_with_seed(seed: u64) -> Result<Self> {
        Self::new_with_seed(VehicleConfiguration::default(), SessionConfig::default(), seed)
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    /// Input snapshot fed to the vehicle on the last tick
    pub fn last_input(&self) -> Input {
        self.last_input
    }

    /// Advance the world by one fixed tick
    pub fn tick(&mut self, raw: &RawControls, delta_secs: f32) {
        if delta_secs <= 0.0 {
            return;
        }

        self.timer.update(delta_secs);
        self.session.gameplay_active = self.timer.gameplay_active();

        let input = self.resolver.resolve(
            raw,
            self.session,
            self.vehicle.is_declutched(),
            delta_secs,
        );
        self.last_input = input;

        let gear_before = self.vehicle.gear_index();
        let feedback = self.chassis.feedback();
        self.vehicle.tick(&input, &feedback, delta_secs);
        self.chassis.integrate(self.vehicle.wheels_mut(), delta_secs);

        if self.vehicle.gear_index() != gear_before {
            self.stats.gear_changes += 1;
        }
        self.stats.top_speed = self.stats.top_speed.max(self.chassis.feedback().speed);
        self.stats.peak_rpm = self.stats.peak_rpm.max(self.vehicle.rpm());
        self.stats.ticks += 1;
        self.time += delta_secs;
    }

    /// The car drove through checkpoint `index`
    pub fn reach_checkpoint(&mut self, index: usize) -> CheckpointResult {
        let result = self.checkpoints.validate(index);
        if result.accepted() {
            self.timer.add_time(self.session_config.checkpoint_bonus);
        }
        result
    }

    /// The car picked up a boost
    pub fn collect_boost(&mut self) {
        self.stats.boosts_collected += 1;
        self.timer.add_time(self.session_config.boost_bonus);
    }

    pub fn dashboard(&self) -> DashboardReadout {
        DashboardReadout::from_controller(&self.vehicle, &self.needle)
    }

    pub fn engine_audio(&self) -> EngineAudioMix {
        EngineAudioMix::from_rpm_ratio(self.vehicle.rpm_ratio(), &self.sound)
    }

    pub fn distance(&self) -> f32 {
        self.chassis.odometer
    }

    pub fn print_summary(&self) {
        let readout = self.dashboard();
        info!("=== Drivetrain Simulation Summary ===");
        info!("Time: {:.2}s ({:?})", self.time, self.timer.phase());
        info!(
            "Gear: {} ({:?}), RPM: {}, Speed: {} km/h ({:?})",
            readout.gear,
            self.vehicle.gear_state(),
            readout.rpm,
            readout.speed_kmh,
            self.vehicle.movement()
        );
        info!(
            "Input: throttle={:.2}, steer={:.2}, clutch={:.2}, handbrake={}",
            self.last_input.throttle,
            self.last_input.steer,
            self.last_input.clutch,
            self.last_input.hand_brake
        );
        info!(
            "Timer: {}, Checkpoints: {} (next {}/{}), Laps: {}",
            self.timer.display(),
            self.checkpoints.passed,
            self.checkpoints.next_index() + 1,
            self.checkpoints.total(),
            self.checkpoints.laps
        );
        info!(
            "Position: ({:.1}, {:.1}), Distance: {:.1} m",
            self.chassis.position.x,
            self.chassis.position.z,
            self.distance()
        );
    }

    /// Final statistics for a finished run
    pub fn print_statistics(&self) {
        info!("Total ticks: {}", self.stats.ticks);
        info!("Simulated time: {:.2}s", self.time);
        info!("Top speed: {:.1} km/h", self.stats.top_speed * MPS_TO_KMH);
        info!("Peak RPM: {:.0}", self.stats.peak_rpm);
        info!("Gear changes: {}", self.stats.gear_changes);
        info!("Distance driven: {:.1} m", self.distance());
        info!("Checkpoints passed: {}", self.checkpoints.passed);
        info!("Laps completed: {}", self.checkpoints.laps);
        info!("Boosts collected: {}", self.stats.boosts_collected);
        info!("Game over: {}", self.timer.is_game_over());
    }
}
