//! Race session bookkeeping
//!
//! Countdown, race timer, checkpoint laps and input resolution. None of it
//! touches the drivetrain directly; `SimWorld` wires it in front of the
//! vehicle controller.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::types::{lerp, Input};

/// Seconds of countdown before gameplay starts
pub const DEFAULT_COUNTDOWN: f32 = 3.0;

/// Seconds "Go!" stays up after the countdown, input still blocked
pub const DEFAULT_GO_DURATION: f32 = 1.0;

/// Race time on the clock when the countdown ends
pub const DEFAULT_STARTING_TIME: f32 = 10.0;

/// Seconds added by a boost pickup
pub const DEFAULT_BOOST_BONUS: f32 = 10.0;

/// Seconds added by a validated checkpoint
pub const DEFAULT_CHECKPOINT_BONUS: f32 = 10.0;

pub const DEFAULT_CHECKPOINT_COUNT: usize = 4;

/// Remaining time at which the warning tick starts
pub const WARNING_THRESHOLD: f32 = 4.0;

/// Above this the timer is shown in whole seconds
const WHOLE_SECONDS_ABOVE: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub countdown: f32,
    /// Only applies after a non-zero countdown
    pub go_duration: f32,
    pub starting_time: f32,
    pub boost_bonus: f32,
    pub checkpoint_bonus: f32,
    pub checkpoint_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown: DEFAULT_COUNTDOWN,
            go_duration: DEFAULT_GO_DURATION,
            starting_time: DEFAULT_STARTING_TIME,
            boost_bonus: DEFAULT_BOOST_BONUS,
            checkpoint_bonus: DEFAULT_CHECKPOINT_BONUS,
            checkpoint_count: DEFAULT_CHECKPOINT_COUNT,
        }
    }
}

/// Whether the player's controls reach the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub gameplay_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    Countdown,
    Racing,
    GameOver,
}

/// Countdown followed by a race clock that runs down to game over
#[derive(Debug, Clone)]
pub struct RaceTimer {
    phase: RacePhase,
    countdown_remaining: f32,
    go_duration: f32,
    /// Set once the countdown has run out
    go_remaining: Option<f32>,
    /// Seconds left on the race clock
    pub time_remaining: f32,
    /// Total race seconds elapsed since the countdown ended
    pub elapsed: f32,
}

impl RaceTimer {
    pub fn new(config: &SessionConfig) -> Self {
        let mut timer = Self {
            phase: RacePhase::Countdown,
            countdown_remaining: config.countdown,
            go_duration: config.go_duration.max(0.0),
            go_remaining: None,
            time_remaining: config.starting_time,
            elapsed: 0.0,
        };
        if timer.countdown_remaining <= 0.0 {
            timer.phase = RacePhase::Racing;
        }
        timer
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == RacePhase::GameOver
    }

    /// Only the racing phase lets input through
    pub fn gameplay_active(&self) -> bool {
        self.phase == RacePhase::Racing
    }

    /// Advance the timer
    pub fn update(&mut self, delta_secs: f32) {
        if delta_secs <= 0.0 {
            return;
        }
        match self.phase {
            RacePhase::Countdown => match self.go_remaining {
                None => {
                    self.countdown_remaining -= delta_secs;
                    if self.countdown_remaining <= 0.0 {
                        self.countdown_remaining = 0.0;
                        info!("Go! {:.1}s on the clock", self.time_remaining);
                        self.go_remaining = Some(self.go_duration);
                        if self.go_duration <= 0.0 {
                            self.phase = RacePhase::Racing;
                        }
                    }
                }
                Some(remaining) => {
                    let remaining = remaining - delta_secs;
                    self.go_remaining = Some(remaining.max(0.0));
                    if remaining <= 0.0 {
                        self.phase = RacePhase::Racing;
                    }
                }
            },
            RacePhase::Racing => {
                self.elapsed += delta_secs;
                self.time_remaining -= delta_secs;
                if self.time_remaining <= 0.0 {
                    self.time_remaining = 0.0;
                    self.phase = RacePhase::GameOver;
                    info!("Game over after {:.1}s", self.elapsed);
                }
            }
            RacePhase::GameOver => {}
        }
    }

    /// Add bonus seconds; ignored once the game is over
    pub fn add_time(&mut self, seconds: f32) {
        if self.is_game_over() {
            return;
        }
        self.time_remaining += seconds;
        info!("+{:.0}s, {:.1}s remaining", seconds, self.time_remaining);
    }

    /// Pitch of the warning tick, `None` while there is time to spare
    pub fn warning_pitch(&self) -> Option<f32> {
        if self.phase != RacePhase::Racing || self.time_remaining > WARNING_THRESHOLD {
            return None;
        }
        Some(1.0 + (WARNING_THRESHOLD - self.time_remaining) * 0.25)
    }

    /// Text shown on the timer
    pub fn display(&self) -> String {
        match self.phase {
            RacePhase::Countdown if self.go_remaining.is_some() => "Go!".to_string(),
            RacePhase::Countdown => format!("{:.0}", self.countdown_remaining.ceil()),
            _ if self.time_remaining > WHOLE_SECONDS_ABOVE => {
                format!("{:.0}", self.time_remaining)
            }
            _ => format!("{:.1}", self.time_remaining),
        }
    }
}

/// Outcome of reaching a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointResult {
    /// Not the checkpoint expected next
    Rejected,
    Passed,
    /// Passed the last checkpoint and wrapped to the first
    LapCompleted,
}

impl CheckpointResult {
    pub fn accepted(self) -> bool {
        self != CheckpointResult::Rejected
    }
}

/// Ordered checkpoint validation with lap counting
#[derive(Debug, Clone)]
pub struct CheckpointTracker {
    total: usize,
    next_index: usize,
    pub passed: usize,
    pub laps: usize,
}

impl CheckpointTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            next_index: 0,
            passed: 0,
            laps: 0,
        }
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn validate(&mut self, index: usize) -> CheckpointResult {
        if self.total == 0 || index != self.next_index {
            warn!(
                "checkpoint {} reached out of order, expected {}",
                index, self.next_index
            );
            return CheckpointResult::Rejected;
        }

        self.passed += 1;
        self.next_index += 1;
        if self.next_index >= self.total {
            self.next_index = 0;
            self.laps += 1;
            info!("Lap {} completed", self.laps);
            CheckpointResult::LapCompleted
        } else {
            CheckpointResult::Passed
        }
    }

    /// Counter text, e.g. "Goal(s): 3"
    pub fn display(&self) -> String {
        format!("Goal(s): {}", self.passed)
    }
}

/// Controls as polled from a device, before gating and clutch easing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawControls {
    pub throttle: f32,
    pub steer: f32,
    /// Clutch pedal held down
    pub clutch_pedal: bool,
    pub hand_brake: bool,
}

/// Turns raw controls into the per-tick `Input` snapshot
#[derive(Debug, Clone, Default)]
pub struct InputResolver {
    clutch: f32,
}

impl InputResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one tick's input
    ///
    /// With gameplay inactive every axis reads zero. The clutch drops to zero
    /// while the pedal is held or the gearbox is declutched, and otherwise
    /// eases back toward full engagement.
    pub fn resolve(
        &mut self,
        raw: &RawControls,
        session: SessionState,
        gearbox_declutched: bool,
        delta_secs: f32,
    ) -> Input {
        if !session.gameplay_active {
            self.clutch = 0.0;
            return Input::default();
        }

        self.clutch = if raw.clutch_pedal || gearbox_declutched {
            0.0
        } else {
            lerp(self.clutch, 1.0, delta_secs)
        };
        Input::new(raw.throttle, raw.steer, self.clutch, raw.hand_brake)
    }
}
