use crate::imports::*;

use crate::train::Performance;

/// Score bonuses, penalties, and comfort thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreParams {
    pub spad_penalty: i64,
    /// |accel| beyond this decays comfort
    pub comfort_accel_threshold: si::Acceleration,
    /// Per-second comfort retention factor while over the threshold
    pub comfort_decay_per_s: f64,
    /// |accel| beyond this also costs score, once per episode
    pub harsh_accel_threshold: si::Acceleration,
    pub harsh_penalty: i64,
    pub arrival_bonus: i64,
    /// Comfort above this at arrival earns the smooth-ride bonus
    pub comfort_bonus_threshold: f64,
    pub comfort_arrival_bonus: i64,
    /// Service bonus per boarding passenger
    pub board_bonus_per_passenger: i64,
    pub completion_bonus_max: i64,
    /// Elapsed session time at which the completion time bonus reaches
    /// zero
    pub completion_par_time: si::Time,
    pub completion_comfort_bonus: i64,
    pub violation_penalty: i64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            spad_penalty: 500,
            comfort_accel_threshold: 0.9 * uc::MPS2,
            comfort_decay_per_s: 0.97,
            harsh_accel_threshold: 1.3 * uc::MPS2,
            harsh_penalty: 25,
            arrival_bonus: 100,
            comfort_bonus_threshold: 0.9,
            comfort_arrival_bonus: 50,
            board_bonus_per_passenger: 1,
            completion_bonus_max: 1000,
            completion_par_time: 2.0 * uc::HR,
            completion_comfort_bonus: 500,
            violation_penalty: 200,
        }
    }
}

impl Init for ScoreParams {
    fn init(&mut self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.comfort_decay_per_s) || self.comfort_decay_per_s == 0.0 {
            return Err(Error::Init("comfort decay must lie in (0, 1]".into()));
        }
        if self.completion_par_time <= si::Time::ZERO {
            return Err(Error::Init("completion par time must be positive".into()));
        }
        if self.comfort_accel_threshold <= si::Acceleration::ZERO
            || self.harsh_accel_threshold < self.comfort_accel_threshold
        {
            return Err(Error::Init(
                "comfort thresholds must be positive with harsh >= comfort".into(),
            ));
        }
        Ok(())
    }
}
impl SerdeAPI for ScoreParams {}

/// Pure accumulator over the [Performance] sub-record.  Holds only the
/// edge-trigger latches that keep integer penalties frame-rate
/// independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    pub params: ScoreParams,
    harsh_latched: bool,
    completed: bool,
}

impl Init for ScoreKeeper {
    fn init(&mut self) -> Result<(), Error> {
        self.params.init()
    }
}

impl ScoreKeeper {
    pub fn new(params: ScoreParams) -> Self {
        Self {
            params,
            harsh_latched: false,
            completed: false,
        }
    }

    pub fn reset(&mut self) {
        self.harsh_latched = false;
        self.completed = false;
    }

    /// One safety violation per SPAD crossing event.
    pub fn record_spad(&mut self, perf: &mut Performance) {
        perf.safety_violations += 1;
        perf.score -= self.params.spad_penalty;
    }

    /// Decays comfort while |accel| is over the comfort threshold;
    /// charges the harsh penalty once per excursion over the harsher one.
    pub fn record_comfort(
        &mut self,
        perf: &mut Performance,
        accel: si::Acceleration,
        dt: si::Time,
    ) {
        let mag = accel.abs();
        if mag > self.params.comfort_accel_threshold {
            let retain = self.params.comfort_decay_per_s.powf(dt.get::<si::second>());
            perf.comfort = (perf.comfort * retain).max(si::Ratio::ZERO);
        }
        if mag > self.params.harsh_accel_threshold {
            if !self.harsh_latched {
                self.harsh_latched = true;
                perf.score -= self.params.harsh_penalty;
            }
        } else {
            self.harsh_latched = false;
        }
    }

    /// On-time bonus plus smooth-ride and boarding service bonuses.
    pub fn record_arrival(&mut self, perf: &mut Performance, boarded: u32) {
        perf.score += self.params.arrival_bonus;
        if perf.comfort.get::<si::ratio>() > self.params.comfort_bonus_threshold {
            perf.score += self.params.comfort_arrival_bonus;
        }
        perf.score += boarded as i64 * self.params.board_bonus_per_passenger;
    }

    /// Runs exactly once per session; later calls are no-ops.  The final
    /// score is floored at zero.
    pub fn record_completion(&mut self, perf: &mut Performance, elapsed: si::Time) {
        if self.completed {
            return;
        }
        self.completed = true;
        let frac = 1.0 - (elapsed / self.params.completion_par_time).get::<si::ratio>();
        let time_bonus = (self.params.completion_bonus_max as f64 * frac.max(0.0)).round() as i64;
        let comfort_bonus = (self.params.completion_comfort_bonus as f64
            * perf.comfort.get::<si::ratio>())
        .round() as i64;
        perf.score += time_bonus + comfort_bonus
            - perf.safety_violations as i64 * self.params.violation_penalty;
        perf.score = perf.score.max(0);
    }
}
