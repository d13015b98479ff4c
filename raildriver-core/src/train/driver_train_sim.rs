use crate::imports::*;

use crate::control::ControlInputs;
use crate::rules::{self, Hint, RuleParams};
use crate::scoring::{ScoreKeeper, ScoreParams};
use crate::track::{Aspect, Route, TrackFeatures, TrackGenParams};

use super::dwell::{DwellController, DwellParams};
use super::physics::{self, TrainParams};
use super::resistance::TrainRes;
use super::train_state::{TrainState, TrainStateHistoryVec};

/// Session lifecycle as seen by external consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Loading,
    Running,
    Paused,
    Completed,
}

/// Wall-clock bookkeeping with a clamped per-tick delta so a stalled
/// frame cannot produce an unstable physics step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Simulated session time; spans spent paused are not simulated
    pub elapsed: si::Time,
    /// Host timestamp of the previous call
    pub last_stamp: Option<si::Time>,
    /// Upper bound on a single physics step
    pub dt_max: si::Time,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            elapsed: si::Time::ZERO,
            last_stamp: None,
            dt_max: 0.05 * uc::S,
        }
    }
}

impl SimulationClock {
    /// Raw elapsed time since the previous stamp; records `now`.
    pub fn stamp(&mut self, now: si::Time) -> si::Time {
        let dt_raw = match self.last_stamp {
            Some(prev) => (now - prev).max(si::Time::ZERO),
            None => si::Time::ZERO,
        };
        self.last_stamp = Some(now);
        dt_raw
    }
}

/// One-shot notifications for UI/audio collaborators, drained with
/// [DriverTrainSim::take_events].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Horn,
    CrossingAdvisory { distance: si::Length },
    Spad,
    StationArrival {
        station: String,
        alighted: u32,
        boarded: u32,
    },
    Departure { station: String },
    StationOverrun { station: String },
    JourneyComplete { score: i64 },
}

/// Read-only per-tick telemetry for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub speed_kmh: f64,
    pub throttle_pct: f64,
    pub brake_pct: f64,
    pub passengers: u32,
    pub capacity: u32,
    pub current_station: String,
    pub next_station: String,
    pub dist_to_next_km: f64,
    pub route_progress_pct: f64,
    pub signal_aspect: Aspect,
    pub active_hint: Option<String>,
    pub dwell_seconds_remaining: Option<f64>,
    pub score: i64,
    pub safety_violations: u32,
    pub session_state: SessionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ActiveHint {
    text: String,
    priority: u8,
    expires: si::Time,
}

/// Simulation in which the operator drives the train manually against
/// signal aspects, station speed zones, and level crossings.
///
/// The driver exclusively owns the mutable [TrainState] and advances it
/// one clamped time step at a time in fixed component order: controls,
/// rule evaluation, physics, station dwell, scoring.  External
/// collaborators read [TelemetrySnapshot]s and drained [SimEvent]s; the
/// only inbound surface is [ControlInputs].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverTrainSim {
    pub route: Route,
    pub features: TrackFeatures,
    pub train: TrainParams,
    pub train_res: TrainRes,
    pub rule_params: RuleParams,
    pub gen_params: TrackGenParams,
    pub dwell: DwellController,
    pub score: ScoreKeeper,
    #[serde(default)]
    pub state: TrainState,
    pub clock: SimulationClock,
    pub session: SessionState,
    #[serde(skip)]
    rng: SimRng,
    seed: Option<u64>,
    /// Aspect governing the train this tick, for the snapshot
    aspect: Aspect,
    /// SPAD idempotence latch: the signal already charged with a
    /// violation
    spad_signal: Option<usize>,
    hint: Option<ActiveHint>,
    #[serde(skip)]
    events: Vec<SimEvent>,
    /// Custom vector of [Self::state]
    #[serde(default, skip_serializing_if = "TrainStateHistoryVec::is_empty")]
    pub history: TrainStateHistoryVec,
    save_interval: Option<usize>,
}

impl DriverTrainSim {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        route: Route,
        train: TrainParams,
        train_res: TrainRes,
        rule_params: RuleParams,
        gen_params: TrackGenParams,
        dwell_params: DwellParams,
        score_params: ScoreParams,
        seed: Option<u64>,
        save_interval: Option<usize>,
    ) -> anyhow::Result<Self> {
        let rng = SimRng::from_seed_opt(seed);
        let state = TrainState::new(&train);
        let mut sim = Self {
            route,
            features: Default::default(),
            train,
            train_res,
            rule_params,
            gen_params,
            dwell: DwellController::new(dwell_params),
            score: ScoreKeeper::new(score_params),
            state,
            clock: Default::default(),
            session: SessionState::Loading,
            rng,
            seed,
            aspect: Aspect::Green,
            spad_signal: None,
            hint: None,
            events: vec![],
            history: Default::default(),
            save_interval,
        };
        sim.init()?;
        sim.features = TrackFeatures::generate(&sim.route, &sim.gen_params, &mut sim.rng);
        Ok(sim)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn set_save_interval(&mut self, save_interval: Option<usize>) {
        self.save_interval = save_interval;
    }

    pub fn get_save_interval(&self) -> Option<usize> {
        self.save_interval
    }

    /// Drains the events accumulated since the previous call.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances the session using a host timestamp; dt is derived from
    /// the previous stamp and clamped to `clock.dt_max`.
    pub fn step_at(&mut self, inputs: ControlInputs, now: si::Time) {
        let dt_raw = self.clock.stamp(now);
        self.step(inputs, dt_raw);
    }

    /// Advances the session by `dt_raw`, clamped to `clock.dt_max`.
    /// Control inputs are polled exactly once per call; session-control
    /// inputs work even while paused or completed.  While paused the
    /// update is skipped entirely, so time spent paused is simply not
    /// simulated.
    pub fn step(&mut self, inputs: ControlInputs, dt_raw: si::Time) {
        let inputs = inputs.sanitized();

        if inputs.restart {
            self.restart();
        }
        if inputs.pause_toggle {
            self.session = match self.session {
                SessionState::Running => SessionState::Paused,
                SessionState::Paused => SessionState::Running,
                other => other,
            };
        }
        if inputs.horn {
            self.events.push(SimEvent::Horn);
        }
        match self.session {
            SessionState::Loading => self.session = SessionState::Running,
            SessionState::Paused | SessionState::Completed => return,
            SessionState::Running => {}
        }

        let dt = dt_raw.max(si::Time::ZERO).min(self.clock.dt_max);
        if dt <= si::Time::ZERO {
            return;
        }
        self.clock.elapsed += dt;
        self.solve_step(&inputs, dt);
        self.save_state();
        self.state.i += 1;
    }

    fn solve_step(&mut self, inputs: &ControlInputs, dt: si::Time) {
        self.state.dt = dt;
        self.state.time += dt;

        // refresh cached station context from position alone
        self.state.current_station = self.route.current_index(self.state.offset);
        self.state.next_station = self.route.next_index(self.state.offset);

        physics::apply_controls(&mut self.state, inputs, &self.train, dt);

        let outcome = rules::evaluate(
            &self.state,
            &self.route,
            &mut self.features,
            &self.rule_params,
            self.train.speed_max,
        );
        self.state.speed_limit = outcome.speed_limit;
        self.aspect = outcome.aspect;
        if let Some(idx) = outcome.spad {
            self.trigger_spad(idx);
        }
        if let Some((_, dist)) = outcome.crossing {
            self.set_hint(
                format!(
                    "Level crossing in {:.2} km. Sound horn.",
                    dist.get::<si::kilometer>()
                ),
                Hint::LevelCrossingAhead.priority(),
            );
            self.events.push(SimEvent::CrossingAdvisory { distance: dist });
        }
        if let Some(hint) = outcome.hint {
            if hint != Hint::LevelCrossingAhead {
                self.set_hint(hint.text().into(), hint.priority());
            }
        }

        let limited = physics::advance(
            &mut self.state,
            &self.train_res,
            &self.train,
            outcome.enforced_limit,
            self.route.len_total(),
            dt,
        );
        if limited && outcome.enforced_limit < self.train.speed_max {
            self.set_hint(Hint::SpeedLimited.text().into(), Hint::SpeedLimited.priority());
        }

        // comfort uses the acceleration the physics step achieved, before
        // any dwell snap zeroes the speed
        self.score
            .record_comfort(&mut self.state.perf, self.state.accel, dt);

        let dout = self.dwell.update(
            &mut self.state,
            &self.route,
            self.rule_params.station_zone_radius,
            &mut self.rng,
            dt,
        );
        if let Some(ex) = dout.arrived {
            self.score.record_arrival(&mut self.state.perf, ex.boarded);
            let name = self.route.stations[ex.station].name.clone();
            self.set_hint(
                format!(
                    "Stop at {}: -{} +{} passengers",
                    name, ex.alighted, ex.boarded
                ),
                Hint::StationStop.priority(),
            );
            self.events.push(SimEvent::StationArrival {
                station: name,
                alighted: ex.alighted,
                boarded: ex.boarded,
            });
        }
        if dout.departed {
            self.events.push(SimEvent::Departure {
                station: self.route.stations[self.state.current_station].name.clone(),
            });
        }
        if let Some(idx) = dout.overran {
            self.events.push(SimEvent::StationOverrun {
                station: self.route.stations[idx].name.clone(),
            });
        }
        if dout.completed {
            self.score
                .record_completion(&mut self.state.perf, self.clock.elapsed);
            self.session = SessionState::Completed;
            self.events.push(SimEvent::JourneyComplete {
                score: self.state.perf.score,
            });
        }

        self.enforce_invariants();
        self.expire_hint();
    }

    /// Latches the emergency brake in response to a SPAD.  Idempotent per
    /// signal: re-evaluating while still past the same signal neither
    /// re-latches nor charges further violations.
    fn trigger_spad(&mut self, signal_idx: usize) {
        if self.spad_signal == Some(signal_idx) {
            return;
        }
        self.spad_signal = Some(signal_idx);
        self.state.emergency_brake = true;
        self.state.brake = 1.0 * uc::R;
        self.state.throttle = si::Ratio::ZERO;
        self.score.record_spad(&mut self.state.perf);
        self.set_hint(Hint::Spad.text().into(), Hint::Spad.priority());
        self.events.push(SimEvent::Spad);
    }

    fn set_hint(&mut self, text: String, priority: u8) {
        let replace = self
            .hint
            .as_ref()
            .map_or(true, |h| h.expires <= self.clock.elapsed || priority >= h.priority);
        if replace {
            self.hint = Some(ActiveHint {
                text,
                priority,
                expires: self.clock.elapsed + self.rule_params.hint_duration,
            });
        }
    }

    fn expire_hint(&mut self) {
        if let Some(h) = &self.hint {
            if h.expires <= self.clock.elapsed {
                self.hint = None;
            }
        }
    }

    /// Defensive clamps; a single bad frame must not end the session.
    fn enforce_invariants(&mut self) {
        let len = self.route.len_total();
        if self.state.offset < si::Length::ZERO || self.state.offset > len {
            log::warn!(
                "{}",
                Error::StateInvariantViolation(format!(
                    "position {} m outside [0, {}]",
                    self.state.offset.get::<si::meter>(),
                    len.get::<si::meter>()
                ))
            );
            self.state.offset = self.state.offset.max(si::Length::ZERO).min(len);
        }
        if self.state.speed < si::Velocity::ZERO || self.state.speed > self.train.speed_max {
            log::warn!(
                "{}",
                Error::StateInvariantViolation(format!(
                    "speed {} km/h outside [0, {}]",
                    self.state.speed.get::<si::kilometer_per_hour>(),
                    self.train.speed_max.get::<si::kilometer_per_hour>()
                ))
            );
            self.state.speed = self
                .state
                .speed
                .max(si::Velocity::ZERO)
                .min(self.train.speed_max);
        }
        if self.state.passengers > self.state.capacity {
            log::warn!(
                "{}",
                Error::StateInvariantViolation(format!(
                    "passengers {} over capacity {}",
                    self.state.passengers, self.state.capacity
                ))
            );
            self.state.passengers = self.state.capacity;
        }
    }

    fn save_state(&mut self) {
        if let Some(interval) = self.save_interval {
            if self.state.i % interval == 0 {
                self.history.push(self.state);
            }
        }
    }

    /// Full synchronous reset between ticks: fresh train state, clock,
    /// and score, plus a newly drawn track layout from the same
    /// distribution parameters.
    pub fn restart(&mut self) {
        self.features = TrackFeatures::generate(&self.route, &self.gen_params, &mut self.rng);
        self.state = TrainState::new(&self.train);
        self.dwell.reset();
        self.score.reset();
        self.clock.elapsed = si::Time::ZERO;
        self.clock.last_stamp = None;
        self.spad_signal = None;
        self.aspect = Aspect::Green;
        self.hint = None;
        self.events.clear();
        self.history.clear();
        self.session = SessionState::Running;
    }

    /// Assembles the read-only telemetry for this tick.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let state = &self.state;
        TelemetrySnapshot {
            speed_kmh: state.speed.get::<si::kilometer_per_hour>(),
            throttle_pct: state.throttle.get::<si::percent>(),
            brake_pct: state.brake.get::<si::percent>(),
            passengers: state.passengers,
            capacity: state.capacity,
            current_station: self.route.stations[state.current_station].name.clone(),
            next_station: self.route.stations[state.next_station].name.clone(),
            dist_to_next_km: self
                .route
                .dist_to(state.next_station, state.offset)
                .get::<si::kilometer>(),
            route_progress_pct: self.route.progress(state.offset).get::<si::percent>(),
            signal_aspect: self.aspect,
            active_hint: self
                .hint
                .as_ref()
                .filter(|h| h.expires > self.clock.elapsed)
                .map(|h| h.text.clone()),
            dwell_seconds_remaining: if state.dwell_remaining > si::Time::ZERO {
                Some(state.dwell_remaining.get::<si::second>())
            } else {
                None
            },
            score: state.perf.score,
            safety_violations: state.perf.safety_violations,
            session_state: self.session,
        }
    }
}

impl Init for DriverTrainSim {
    fn init(&mut self) -> Result<(), Error> {
        self.route.init()?;
        self.train.init()?;
        self.train_res.init()?;
        self.rule_params.init()?;
        self.gen_params.init()?;
        self.dwell.init()?;
        self.score.init()?;
        Ok(())
    }
}
impl SerdeAPI for DriverTrainSim {}

impl Default for DriverTrainSim {
    fn default() -> Self {
        Self::new(
            Route::valid(),
            TrainParams::default(),
            TrainRes::valid(),
            RuleParams::default(),
            TrackGenParams::default(),
            DwellParams::default(),
            ScoreParams::default(),
            None,
            None,
        )
        .unwrap()
    }
}

impl Valid for DriverTrainSim {
    fn valid() -> Self {
        Self::new(
            Route::valid(),
            TrainParams::default(),
            TrainRes::valid(),
            RuleParams::default(),
            TrackGenParams::default(),
            DwellParams::default(),
            ScoreParams::default(),
            Some(42),
            Some(1),
        )
        .unwrap()
    }
}
