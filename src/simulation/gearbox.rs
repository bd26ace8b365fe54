//! Gear selection state machine
//!
//! Delayed phases of a gear change are modeled as a pending shift record
//! advanced by the tick's delta time instead of blocking waits. At most one
//! shift sequence is pending at a time.

use log::debug;

use super::config::VehicleConfiguration;
use super::rng::SimRng;
use super::types::{GearState, MovementDirection, CLUTCH_ENGAGED_THRESHOLD};

/// Time an upshift waits before confirming the rpm is still high
pub const UPSHIFT_CHECK_DELAY: f32 = 0.7;

/// Time a downshift waits before confirming the rpm is still low
pub const DOWNSHIFT_CHECK_DELAY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Up,
    Down,
}

impl ShiftDirection {
    fn check_delay(self) -> f32 {
        match self {
            ShiftDirection::Up => UPSHIFT_CHECK_DELAY,
            ShiftDirection::Down => DOWNSHIFT_CHECK_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftPhase {
    /// Waiting to confirm the shift is still wanted
    Checking,
    /// Declutched while the new gear engages
    Changing,
}

/// A gear change in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingShift {
    pub direction: ShiftDirection,
    pub phase: ShiftPhase,
    pub elapsed: f32,
    pub deadline: f32,
}

impl PendingShift {
    fn new(direction: ShiftDirection) -> Self {
        Self {
            direction,
            phase: ShiftPhase::Checking,
            elapsed: 0.0,
            deadline: direction.check_delay(),
        }
    }
}

/// What the gearbox reads each tick
#[derive(Debug, Clone, Copy)]
pub struct GearboxInput {
    pub throttle: f32,
    /// Effective clutch for this tick
    pub clutch: f32,
    pub rpm: f32,
    pub movement: MovementDirection,
}

#[derive(Debug, Clone, Default)]
pub struct GearBox {
    state: GearState,
    gear_index: usize,
    pending: Option<PendingShift>,
    /// Time spent in reverse since the last stop check
    reverse_hold: f32,
}

impl GearBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GearState {
        self.state
    }

    pub fn gear_index(&self) -> usize {
        self.gear_index
    }

    pub fn pending(&self) -> Option<&PendingShift> {
        self.pending.as_ref()
    }

    pub fn is_shifting(&self) -> bool {
        self.pending.is_some()
    }

    /// Neutral and Changing hold the clutch open
    pub fn is_declutched(&self) -> bool {
        matches!(self.state, GearState::Neutral | GearState::Changing)
    }

    /// Display label: "N", "R" or the 1-based gear number
    pub fn label(&self) -> String {
        match self.state {
            GearState::Neutral => "N".to_string(),
            GearState::RunningReverse => "R".to_string(),
            _ => (self.gear_index + 1).to_string(),
        }
    }

    /// Evaluate one fixed tick
    pub fn step(
        &mut self,
        input: &GearboxInput,
        config: &VehicleConfiguration,
        rng: &mut SimRng,
        delta_secs: f32,
    ) {
        let carried = self.pending.is_some();
        let mut started = false;

        match self.state {
            GearState::Neutral => {
                if (input.throttle > 0.0 && !input.movement.is_backward())
                    || input.movement.is_forward()
                {
                    self.state = GearState::Running;
                }
                if (input.throttle < 0.0 && !input.movement.is_forward())
                    || input.movement.is_backward()
                {
                    self.enter_reverse();
                }
            }
            GearState::Running if input.clutch > CLUTCH_ENGAGED_THRESHOLD => {
                if input.rpm > config.increase_gear_rpm(rng) {
                    started |= self.request_shift(ShiftDirection::Up, config);
                } else if input.rpm < config.decrease_gear_rpm(rng)
                    && !(self.gear_index == 0 && input.movement.is_moving())
                {
                    started |= self.request_shift(ShiftDirection::Down, config);
                }
            }
            GearState::RunningReverse => {
                self.reverse_hold += delta_secs;
                if self.reverse_hold >= config.gear_change_duration {
                    self.reverse_hold = 0.0;
                    if !input.movement.is_backward() {
                        debug!("reverse released");
                        self.state = GearState::Neutral;
                    }
                }
            }
            GearState::Running | GearState::CheckingChange | GearState::Changing => {}
        }

        if !input.movement.is_forward() && self.gear_index > 0 {
            started |= self.force_downshift();
        }

        if carried && !started {
            self.advance_pending(input, config, rng, delta_secs);
        }
    }

    /// Begin a gear change sequence
    ///
    /// Returns false when a sequence is already pending. A downshift from
    /// first gear is dropped and leaves the box in neutral.
    pub fn request_shift(
        &mut self,
        direction: ShiftDirection,
        config: &VehicleConfiguration,
    ) -> bool {
        if self.pending.is_some() {
            return false;
        }
        if direction == ShiftDirection::Down && self.gear_index == 0 {
            debug!("downshift below first gear dropped");
            self.state = GearState::Neutral;
            return false;
        }
        debug!(
            "{:?} shift requested from gear {} (top {})",
            direction,
            self.gear_index + 1,
            config.top_gear() + 1
        );
        self.pending = Some(PendingShift::new(direction));
        self.state = GearState::CheckingChange;
        true
    }

    /// Vehicle stopped or rolling back in a high gear: drop toward first
    fn force_downshift(&mut self) -> bool {
        match self.pending {
            Some(PendingShift {
                direction: ShiftDirection::Down,
                ..
            }) => false,
            _ => {
                self.pending = Some(PendingShift::new(ShiftDirection::Down));
                self.state = GearState::CheckingChange;
                true
            }
        }
    }

    fn enter_reverse(&mut self) {
        if self.state != GearState::RunningReverse {
            self.reverse_hold = 0.0;
        }
        self.state = GearState::RunningReverse;
    }

    fn advance_pending(
        &mut self,
        input: &GearboxInput,
        config: &VehicleConfiguration,
        rng: &mut SimRng,
        delta_secs: f32,
    ) {
        let Some(mut pending) = self.pending else {
            return;
        };
        pending.elapsed += delta_secs;
        if pending.elapsed < pending.deadline {
            self.pending = Some(pending);
            return;
        }

        match pending.phase {
            ShiftPhase::Checking => {
                let confirmed = match pending.direction {
                    ShiftDirection::Up => {
                        input.rpm >= config.increase_gear_rpm(rng)
                            && self.gear_index < config.top_gear()
                    }
                    ShiftDirection::Down => {
                        input.rpm <= config.decrease_gear_rpm(rng) && self.gear_index > 0
                    }
                };
                if confirmed {
                    self.pending = Some(PendingShift {
                        phase: ShiftPhase::Changing,
                        elapsed: 0.0,
                        deadline: config.gear_change_duration,
                        ..pending
                    });
                    self.state = GearState::Changing;
                } else {
                    debug!("{:?} shift aborted at {:.0} rpm", pending.direction, input.rpm);
                    self.pending = None;
                    self.state = GearState::Running;
                }
            }
            ShiftPhase::Changing => {
                self.commit(pending.direction, config);
                self.pending = None;
                self.state = GearState::Neutral;
            }
        }
    }

    fn commit(&mut self, direction: ShiftDirection, config: &VehicleConfiguration) {
        let target = match direction {
            ShiftDirection::Up => self.gear_index.checked_add(1),
            ShiftDirection::Down => self.gear_index.checked_sub(1),
        };
        match target {
            Some(gear) if gear <= config.top_gear() => {
                debug!("gear {} engaged", gear + 1);
                self.gear_index = gear;
            }
            _ => debug!("{:?} shift out of range dropped", direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn input(throttle: f32, rpm: f32, movement: MovementDirection) -> GearboxInput {
        GearboxInput {
            throttle,
            clutch: 1.0,
            rpm,
            movement,
        }
    }

    fn run(
        gearbox: &mut GearBox,
        input: &GearboxInput,
        seconds: f32,
        config: &VehicleConfiguration,
        rng: &mut SimRng,
    ) -> Vec<GearState> {
        let ticks = (seconds / DT).round() as usize;
        (0..ticks)
            .map(|_| {
                gearbox.step(input, config, rng, DT);
                gearbox.state()
            })
            .collect()
    }

    #[test]
    fn test_neutral_selects_direction() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(1);

        let mut forward = GearBox::new();
        forward.step(&input(1.0, 700.0, MovementDirection::Stationary), &config, &mut rng, DT);
        assert_eq!(forward.state(), GearState::Running);

        let mut backward = GearBox::new();
        backward.step(&input(-1.0, 700.0, MovementDirection::Stationary), &config, &mut rng, DT);
        assert_eq!(backward.state(), GearState::RunningReverse);

        let mut rolling_back = GearBox::new();
        rolling_back.step(&input(1.0, 700.0, MovementDirection::Backward), &config, &mut rng, DT);
        assert_eq!(rolling_back.state(), GearState::RunningReverse);
    }

    #[test]
    fn test_neutral_and_changing_are_declutched() {
        let gearbox = GearBox::new();
        assert!(gearbox.is_declutched());
        assert_eq!(gearbox.label(), "N");
    }

    #[test]
    fn test_upshift_sequence_commits_one_gear() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        let high = input(1.0, config.max_rpm * 0.95, MovementDirection::Forward);

        let mut states = Vec::new();
        let mut ticks = 0;
        while gearbox.gear_index() == 0 && ticks < 200 {
            gearbox.step(&high, &config, &mut rng, DT);
            states.push(gearbox.state());
            ticks += 1;
        }

        assert_eq!(gearbox.gear_index(), 1);
        assert_eq!(gearbox.state(), GearState::Neutral);
        assert_eq!(gearbox.label(), "N");

        let elapsed = ticks as f32 * DT;
        let expected = UPSHIFT_CHECK_DELAY + config.gear_change_duration;
        assert!(elapsed >= expected && elapsed <= expected + 4.0 * DT);

        states.dedup();
        assert_eq!(
            states,
            vec![
                GearState::Running,
                GearState::CheckingChange,
                GearState::Changing,
                GearState::Neutral
            ]
        );
    }

    #[test]
    fn test_upshift_aborts_when_rpm_drops() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        let high = input(1.0, config.max_rpm * 0.95, MovementDirection::Forward);
        gearbox.step(&high, &config, &mut rng, DT);
        gearbox.step(&high, &config, &mut rng, DT);
        assert!(gearbox.is_shifting());

        let mid = input(1.0, config.max_rpm * 0.5, MovementDirection::Forward);
        let states = run(&mut gearbox, &mid, UPSHIFT_CHECK_DELAY + DT, &config, &mut rng);
        assert_eq!(states.last(), Some(&GearState::Running));
        assert!(!gearbox.is_shifting());
        assert_eq!(gearbox.gear_index(), 0);
    }

    #[test]
    fn test_no_downshift_below_first_while_rolling() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        let low = input(0.5, 800.0, MovementDirection::Forward);
        let states = run(&mut gearbox, &low, 1.0, &config, &mut rng);
        assert!(states.iter().all(|s| *s == GearState::Running));
        assert_eq!(gearbox.gear_index(), 0);
    }

    #[test]
    fn test_request_rejected_while_pending() {
        let config = VehicleConfiguration::default();
        let mut gearbox = GearBox::new();
        gearbox.gear_index = 2;
        assert!(gearbox.request_shift(ShiftDirection::Up, &config));
        assert!(!gearbox.request_shift(ShiftDirection::Down, &config));
        assert_eq!(
            gearbox.pending().map(|p| p.direction),
            Some(ShiftDirection::Up)
        );
    }

    #[test]
    fn test_downshift_request_in_first_gear_goes_neutral() {
        let config = VehicleConfiguration::default();
        let mut gearbox = GearBox::new();
        gearbox.state = GearState::Running;
        assert!(!gearbox.request_shift(ShiftDirection::Down, &config));
        assert_eq!(gearbox.state(), GearState::Neutral);
        assert!(!gearbox.is_shifting());
    }

    #[test]
    fn test_stopping_forces_back_to_first_gear() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        gearbox.gear_index = 3;
        gearbox.state = GearState::Running;

        let stopped = input(0.0, 700.0, MovementDirection::Stationary);
        run(&mut gearbox, &stopped, 5.0, &config, &mut rng);
        assert_eq!(gearbox.gear_index(), 0);
    }

    #[test]
    fn test_stop_override_replaces_pending_upshift() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        gearbox.gear_index = 1;
        assert!(gearbox.request_shift(ShiftDirection::Up, &config));

        gearbox.step(&input(0.0, 700.0, MovementDirection::Stationary), &config, &mut rng, DT);
        let pending = gearbox.pending().copied().expect("downshift pending");
        assert_eq!(pending.direction, ShiftDirection::Down);
        assert_eq!(pending.elapsed, 0.0);
    }

    #[test]
    fn test_reverse_returns_to_neutral_once_stopped() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        gearbox.step(&input(-1.0, 700.0, MovementDirection::Stationary), &config, &mut rng, DT);
        assert_eq!(gearbox.state(), GearState::RunningReverse);
        assert_eq!(gearbox.label(), "R");

        let backing = input(-1.0, 700.0, MovementDirection::Backward);
        let states = run(&mut gearbox, &backing, 1.0, &config, &mut rng);
        assert!(states.iter().all(|s| *s == GearState::RunningReverse));

        let stopped = input(0.0, 700.0, MovementDirection::Stationary);
        let states = run(&mut gearbox, &stopped, config.gear_change_duration + DT, &config, &mut rng);
        assert_eq!(states.last(), Some(&GearState::Neutral));
    }

    #[test]
    fn test_gear_index_bounded_at_top() {
        let config = VehicleConfiguration::default();
        let mut rng = SimRng::with_seed(8);
        let mut gearbox = GearBox::new();
        gearbox.gear_index = config.top_gear();
        gearbox.state = GearState::Running;

        let screaming = input(1.0, config.max_rpm, MovementDirection::Forward);
        for _ in 0..500 {
            gearbox.step(&screaming, &config, &mut rng, DT);
            assert!(gearbox.gear_index() <= config.top_gear());
        }
        assert_eq!(gearbox.gear_index(), config.top_gear());
    }
}
