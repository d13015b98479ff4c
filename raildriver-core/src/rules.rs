use crate::imports::*;

use crate::track::{Aspect, Route, TrackFeatures};
use crate::train::TrainState;

/// Rule-zone tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleParams {
    /// Radius of the reduced-speed zone around stations; also the
    /// arrival-detection zone of the dwell controller
    pub station_zone_radius: si::Length,
    pub station_speed_limit: si::Velocity,
    /// Cap while a Yellow aspect is in the lookahead window
    pub caution_speed_limit: si::Velocity,
    pub signal_lookahead: si::Length,
    /// Half-width of the stop-boundary band around a Red signal
    pub spad_epsilon: si::Length,
    /// Speed above which crossing the boundary counts as a SPAD
    pub spad_speed_threshold: si::Velocity,
    pub crossing_warning_window: si::Length,
    /// How long a hint stays on display
    pub hint_duration: si::Time,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            station_zone_radius: 1.8 * uc::KM,
            station_speed_limit: 50.0 * uc::KPH,
            caution_speed_limit: 60.0 * uc::KPH,
            signal_lookahead: 4.0 * uc::KM,
            spad_epsilon: 120.0 * uc::M,
            spad_speed_threshold: 0.5 * uc::KPH,
            crossing_warning_window: 1.0 * uc::KM,
            hint_duration: 3.0 * uc::S,
        }
    }
}

impl Init for RuleParams {
    fn init(&mut self) -> Result<(), Error> {
        if self.station_zone_radius <= si::Length::ZERO
            || self.signal_lookahead <= si::Length::ZERO
            || self.spad_epsilon <= si::Length::ZERO
            || self.crossing_warning_window <= si::Length::ZERO
        {
            return Err(Error::Init("rule zone distances must be positive".into()));
        }
        if self.station_speed_limit <= si::Velocity::ZERO
            || self.caution_speed_limit <= si::Velocity::ZERO
        {
            return Err(Error::Init("rule speed caps must be positive".into()));
        }
        Ok(())
    }
}
impl SerdeAPI for RuleParams {}

/// Operator-facing advisory.  Pure display data: generating a hint never
/// mutates simulation state, and higher-priority safety messages override
/// lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hint {
    /// Red signal crossed above the safety threshold
    Spad,
    StopSignalAhead,
    CautionSignalAhead,
    LevelCrossingAhead,
    StationStop,
    SpeedLimited,
}

impl Hint {
    /// Higher values win the display slot.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Spad => 3,
            Self::StopSignalAhead => 2,
            Self::CautionSignalAhead | Self::LevelCrossingAhead | Self::StationStop => 1,
            Self::SpeedLimited => 0,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Spad)
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Spad => "Signal passed at danger! Emergency braking engaged.",
            Self::StopSignalAhead => "Red signal ahead. Stop before signal.",
            Self::CautionSignalAhead => "Caution: Yellow signal ahead. Prepare to slow.",
            Self::LevelCrossingAhead => "Level crossing ahead. Sound horn.",
            Self::StationStop => "Station stop.",
            Self::SpeedLimited => "Speed limited in this section.",
        }
    }
}

/// Per-tick output of the rule evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutcome {
    /// Most restrictive limit for telemetry, including a Red's zero cap
    pub speed_limit: si::Velocity,
    /// Limit the physics integrator bleeds toward.  Excludes the Red
    /// stop demand: stopping before a Red is the operator's job, and
    /// crossing it is enforced through the SPAD emergency latch instead.
    pub enforced_limit: si::Velocity,
    /// Aspect governing the train, for display
    pub aspect: Aspect,
    pub hint: Option<Hint>,
    /// Red signal whose stop boundary the train has crossed above the
    /// safety speed threshold
    pub spad: Option<usize>,
    /// Crossing that first entered its warning window, with distance
    pub crossing: Option<(usize, si::Length)>,
}

fn raise(slot: &mut Option<Hint>, new: Hint) {
    if slot.map_or(true, |h| new.priority() >= h.priority()) {
        *slot = Some(new);
    }
}

/// Derives the binding speed limit and safety events from the current
/// position.  The only mutation is the one-shot crossing `warned` latch.
pub fn evaluate(
    state: &TrainState,
    route: &Route,
    features: &mut TrackFeatures,
    params: &RuleParams,
    speed_max: si::Velocity,
) -> RuleOutcome {
    let mut enforced = speed_max;
    let mut hint: Option<Hint> = None;

    // station slow zone around the next stopping station
    let next = &route.stations[state.next_station];
    if (next.offset - state.offset).abs() <= params.station_zone_radius {
        enforced = enforced.min(params.station_speed_limit);
    }

    // upcoming signal; most restrictive wins
    let mut aspect = Aspect::Green;
    let mut must_stop = false;
    if let Some((_, sig)) = features.next_signal(state.offset, params.signal_lookahead) {
        aspect = sig.aspect;
        match sig.aspect {
            Aspect::Green => {}
            Aspect::Yellow => {
                enforced = enforced.min(params.caution_speed_limit);
                raise(&mut hint, Hint::CautionSignalAhead);
            }
            Aspect::Red => {
                must_stop = true;
                raise(&mut hint, Hint::StopSignalAhead);
            }
        }
    }
    let speed_limit = if must_stop { si::Velocity::ZERO } else { enforced };

    // stop boundary crossed at speed
    let mut spad = None;
    if state.speed > params.spad_speed_threshold {
        if let Some((idx, _)) = features.red_at_boundary(state.offset, params.spad_epsilon) {
            spad = Some(idx);
            raise(&mut hint, Hint::Spad);
        }
    }

    // one-shot crossing advisory, independent of speed limiting
    let crossing = features.arm_crossing_warning(state.offset, params.crossing_warning_window);
    if crossing.is_some() {
        raise(&mut hint, Hint::LevelCrossingAhead);
    }

    RuleOutcome {
        speed_limit,
        enforced_limit: enforced,
        aspect,
        hint,
        spad,
        crossing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{LevelCrossing, CrossingKind, Signal};

    fn route() -> Route {
        Route::valid()
    }

    fn state_at(offset: si::Length, speed: si::Velocity, route: &Route) -> TrainState {
        let mut state = TrainState::default();
        state.offset = offset;
        state.speed = speed;
        state.current_station = route.current_index(offset);
        state.next_station = route.next_index(offset);
        state
    }

    #[test]
    fn test_station_zone_caps_speed() {
        let route = route();
        let params = RuleParams::default();
        let mut features = TrackFeatures::default();
        // 1 km short of Dadar (10 km)
        let state = state_at(9.0 * uc::KM, 80.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert_eq!(out.speed_limit, params.station_speed_limit);
        assert_eq!(out.enforced_limit, params.station_speed_limit);
        // open track far from any station
        let state = state_at(15.0 * uc::KM, 80.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert_eq!(out.speed_limit, 160.0 * uc::KPH);
    }

    #[test]
    fn test_yellow_caps_and_most_restrictive_wins() {
        let route = route();
        let params = RuleParams::default();
        let mut features = TrackFeatures {
            signals: vec![Signal {
                offset: 16.0 * uc::KM,
                aspect: Aspect::Yellow,
            }],
            crossings: vec![],
        };
        let state = state_at(14.0 * uc::KM, 100.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert_eq!(out.speed_limit, params.caution_speed_limit);
        assert_eq!(out.aspect, Aspect::Yellow);
        assert_eq!(out.hint, Some(Hint::CautionSignalAhead));

        // same yellow inside a station zone: the tighter station cap wins
        let mut features = TrackFeatures {
            signals: vec![Signal {
                offset: 9.5 * uc::KM,
                aspect: Aspect::Yellow,
            }],
            crossings: vec![],
        };
        let state = state_at(9.0 * uc::KM, 100.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert_eq!(out.speed_limit, params.station_speed_limit);
    }

    #[test]
    fn test_red_zeroes_reported_limit_only() {
        let route = route();
        let params = RuleParams::default();
        let mut features = TrackFeatures {
            signals: vec![Signal {
                offset: 50.0 * uc::KM,
                aspect: Aspect::Red,
            }],
            crossings: vec![],
        };
        let state = state_at(47.0 * uc::KM, 80.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert_eq!(out.speed_limit, si::Velocity::ZERO);
        // the integrator is not asked to stop the train; the SPAD latch is
        // the enforcement
        assert_eq!(out.enforced_limit, 160.0 * uc::KPH);
        assert_eq!(out.hint, Some(Hint::StopSignalAhead));
        assert!(out.spad.is_none());
    }

    #[test]
    fn test_spad_requires_boundary_and_speed() {
        let route = route();
        let params = RuleParams::default();
        let mut features = TrackFeatures {
            signals: vec![Signal {
                offset: 50.0 * uc::KM,
                aspect: Aspect::Red,
            }],
            crossings: vec![],
        };
        // at the boundary but crawling below the threshold: no SPAD
        let state = state_at(50.05 * uc::KM, 0.3 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert!(out.spad.is_none());
        // at the boundary above the threshold
        let state = state_at(50.05 * uc::KM, 20.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert_eq!(out.spad, Some(0));
        assert_eq!(out.hint, Some(Hint::Spad));
        // well before the boundary, no SPAD regardless of speed
        let state = state_at(49.0 * uc::KM, 120.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert!(out.spad.is_none());
    }

    #[test]
    fn test_crossing_advisory_is_one_shot() {
        let route = route();
        let params = RuleParams::default();
        let mut features = TrackFeatures {
            signals: vec![],
            crossings: vec![LevelCrossing {
                offset: 60.0 * uc::KM,
                kind: CrossingKind::Automatic,
                warned: false,
            }],
        };
        let state = state_at(59.5 * uc::KM, 60.0 * uc::KPH, &route);
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert!(out.crossing.is_some());
        assert_eq!(out.hint, Some(Hint::LevelCrossingAhead));
        let out = evaluate(&state, &route, &mut features, &params, 160.0 * uc::KPH);
        assert!(out.crossing.is_none());
    }
}
