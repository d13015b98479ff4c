use crate::imports::*;

use super::physics::TrainParams;

/// Performance sub-record accumulated by the scoring engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Performance {
    /// Running score; may go negative until completion flooring
    pub score: i64,
    pub safety_violations: u32,
    /// Ride comfort in [0, 1]; non-increasing except on reset
    pub comfort: si::Ratio,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            score: 0,
            safety_violations: 0,
            comfort: 1.0 * uc::R,
        }
    }
}

/// The sole mutable aggregate of the simulation, exclusively owned by
/// [super::DriverTrainSim] and mutated only through its tick components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrainState {
    /// Simulated time since session start
    pub time: si::Time,
    /// index for time steps
    pub i: usize,
    /// Linear-along-track distance from the route origin
    pub offset: si::Length,
    pub speed: si::Velocity,
    /// Binding speed limit reported by the rule evaluator this tick
    pub speed_limit: si::Velocity,
    pub throttle: si::Ratio,
    pub brake: si::Ratio,
    /// Latch; cleared only by explicit operator release
    pub emergency_brake: bool,
    pub passengers: u32,
    pub capacity: u32,
    /// Greater than zero means the train is held at a platform
    pub dwell_remaining: si::Time,
    /// Station at or behind the train, cached for the tick
    pub current_station: usize,
    /// Next stopping station, cached for the tick
    pub next_station: usize,
    pub dt: si::Time,
    /// Acceleration achieved by the physics step (comfort scoring input)
    pub accel: si::Acceleration,
    pub perf: Performance,
}

impl Default for TrainState {
    fn default() -> Self {
        Self {
            time: si::Time::ZERO,
            i: 1,
            offset: si::Length::ZERO,
            speed: si::Velocity::ZERO,
            speed_limit: si::Velocity::ZERO,
            throttle: si::Ratio::ZERO,
            brake: si::Ratio::ZERO,
            emergency_brake: false,
            passengers: 0,
            capacity: 0,
            dwell_remaining: si::Time::ZERO,
            current_station: 0,
            next_station: 1,
            dt: si::Time::ZERO,
            accel: si::Acceleration::ZERO,
            perf: Default::default(),
        }
    }
}

impl TrainState {
    pub fn new(params: &TrainParams) -> Self {
        Self {
            passengers: params.passengers_init,
            capacity: params.capacity,
            speed_limit: params.speed_max,
            ..Self::default()
        }
    }
}

impl Valid for TrainState {
    fn valid() -> Self {
        Self::new(&TrainParams::default())
    }
}

/// Custom vector of [TrainState] saved by the driver every
/// `save_interval` ticks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainStateHistoryVec(pub Vec<TrainState>);

impl TrainStateHistoryVec {
    pub fn push(&mut self, state: TrainState) {
        self.0.push(state);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
