use crate::imports::*;

use super::station::Route;

/// Displayed state of a lineside signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aspect {
    #[default]
    Green,
    Yellow,
    Red,
}

impl Aspect {
    /// Single-letter code for compact display.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Green => "G",
            Self::Yellow => "Y",
            Self::Red => "R",
        }
    }
}

/// A fixed-aspect signal.  The aspect never changes after generation; the
/// only runtime-derived quantity is distance to the train, which is
/// recomputed every tick and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub offset: si::Length,
    pub aspect: Aspect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossingKind {
    #[default]
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelCrossing {
    pub offset: si::Length,
    pub kind: CrossingKind,
    /// One-shot advisory latch, set when the train first enters the
    /// warning window.
    #[serde(default)]
    pub warned: bool,
}

/// Parameters governing procedural placement of signals and crossings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackGenParams {
    pub signal_start_margin: si::Length,
    pub signal_end_margin: si::Length,
    /// Minimum gap between consecutive signals
    pub signal_gap_min: si::Length,
    /// Uniform random extra on top of the minimum gap
    pub signal_gap_extra: si::Length,
    /// No red aspect within this radius of a station
    pub signal_station_exclusion: si::Length,
    pub red_weight: f64,
    pub yellow_weight: f64,
    pub crossing_start_margin: si::Length,
    pub crossing_end_margin: si::Length,
    pub crossing_gap_min: si::Length,
    pub crossing_gap_extra: si::Length,
    /// No crossing within this radius of a station
    pub crossing_station_exclusion: si::Length,
    /// Fraction of crossings with manned gates
    pub manual_crossing_frac: f64,
}

impl Default for TrackGenParams {
    fn default() -> Self {
        Self {
            signal_start_margin: 20.0 * uc::KM,
            signal_end_margin: 5.0 * uc::KM,
            signal_gap_min: 20.0 * uc::KM,
            signal_gap_extra: 15.0 * uc::KM,
            signal_station_exclusion: 3.0 * uc::KM,
            red_weight: 0.10,
            yellow_weight: 0.15,
            crossing_start_margin: 30.0 * uc::KM,
            crossing_end_margin: 20.0 * uc::KM,
            crossing_gap_min: 18.0 * uc::KM,
            crossing_gap_extra: 25.0 * uc::KM,
            crossing_station_exclusion: 4.0 * uc::KM,
            manual_crossing_frac: 0.25,
        }
    }
}

impl Init for TrackGenParams {
    fn init(&mut self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.red_weight)
            || !(0.0..=1.0).contains(&self.yellow_weight)
            || self.red_weight + self.yellow_weight > 1.0
        {
            return Err(Error::Init(
                "aspect weights must lie in [0, 1] and sum to at most 1".into(),
            ));
        }
        if self.signal_gap_min <= si::Length::ZERO || self.crossing_gap_min <= si::Length::ZERO {
            return Err(Error::Init("feature gaps must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.manual_crossing_frac) {
            return Err(Error::Init("manual crossing fraction must lie in [0, 1]".into()));
        }
        Ok(())
    }
}
impl SerdeAPI for TrackGenParams {}

/// Signals and level crossings for one session.  Generated once at
/// session start and immutable thereafter except for the crossing
/// `warned` latches; restart draws a fresh layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub signals: Vec<Signal>,
    pub crossings: Vec<LevelCrossing>,
}

impl TrackFeatures {
    /// Draw a layout along `route` from `params`.
    pub fn generate(route: &Route, params: &TrackGenParams, rng: &mut SimRng) -> Self {
        let len = route.len_total();

        let mut signals = vec![];
        let mut pos = params.signal_start_margin;
        while pos < len - params.signal_end_margin {
            let r: f64 = rng.0.gen();
            let mut aspect = if r < params.red_weight {
                Aspect::Red
            } else if r < params.red_weight + params.yellow_weight {
                Aspect::Yellow
            } else {
                Aspect::Green
            };
            // keep station approaches simple
            let near_station = route
                .stations
                .iter()
                .any(|s| (s.offset - pos).abs() < params.signal_station_exclusion);
            if near_station && aspect == Aspect::Red {
                aspect = Aspect::Yellow;
            }
            signals.push(Signal { offset: pos, aspect });
            pos += params.signal_gap_min + rng.0.gen::<f64>() * params.signal_gap_extra;
        }

        let mut crossings = vec![];
        let mut pos = params.crossing_start_margin;
        while pos < len - params.crossing_end_margin {
            let near_station = route
                .stations
                .iter()
                .any(|s| (s.offset - pos).abs() < params.crossing_station_exclusion);
            if !near_station {
                let kind = if rng.0.gen::<f64>() < params.manual_crossing_frac {
                    CrossingKind::Manual
                } else {
                    CrossingKind::Automatic
                };
                crossings.push(LevelCrossing {
                    offset: pos,
                    kind,
                    warned: false,
                });
            }
            pos += params.crossing_gap_min + rng.0.gen::<f64>() * params.crossing_gap_extra;
        }

        Self { signals, crossings }
    }

    /// First signal at or ahead of `position` within `lookahead`.
    pub fn next_signal(
        &self,
        position: si::Length,
        lookahead: si::Length,
    ) -> Option<(usize, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .find(|(_, s)| s.offset >= position && s.offset - position <= lookahead)
    }

    /// Red signal whose stop boundary lies within `epsilon` of
    /// `position`, behind or ahead.
    pub fn red_at_boundary(
        &self,
        position: si::Length,
        epsilon: si::Length,
    ) -> Option<(usize, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .filter(|(_, s)| s.aspect == Aspect::Red)
            .find(|(_, s)| (s.offset - position).abs() < epsilon)
    }

    /// Arms the advisory for the first unwarned crossing inside the
    /// warning window ahead of `position`, returning its index and
    /// distance.  Each crossing warns at most once per session.
    pub fn arm_crossing_warning(
        &mut self,
        position: si::Length,
        window: si::Length,
    ) -> Option<(usize, si::Length)> {
        let (idx, crossing) = self
            .crossings
            .iter_mut()
            .enumerate()
            .find(|(_, c)| !c.warned && c.offset >= position && c.offset - position < window)?;
        crossing.warned = true;
        Some((idx, crossing.offset - position))
    }

    /// Clears all transient per-session latches.
    pub fn reset_latches(&mut self) {
        for crossing in &mut self.crossings {
            crossing.warned = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated() -> (Route, TrackGenParams, TrackFeatures) {
        let route = Route::valid();
        let params = TrackGenParams::default();
        let mut rng = SimRng::from_seed_u64(7);
        let features = TrackFeatures::generate(&route, &params, &mut rng);
        (route, params, features)
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let route = Route::valid();
        let params = TrackGenParams::default();
        let a = TrackFeatures::generate(&route, &params, &mut SimRng::from_seed_u64(99));
        let b = TrackFeatures::generate(&route, &params, &mut SimRng::from_seed_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_signal_margins_and_spacing() {
        let (route, params, features) = generated();
        assert!(!features.signals.is_empty());
        for sig in &features.signals {
            assert!(sig.offset >= params.signal_start_margin);
            assert!(sig.offset < route.len_total() - params.signal_end_margin);
        }
        for pair in features.signals.windows(2) {
            assert!(pair[1].offset - pair[0].offset >= params.signal_gap_min);
        }
    }

    #[test]
    fn test_no_red_near_station() {
        let (route, params, features) = generated();
        for sig in features.signals.iter().filter(|s| s.aspect == Aspect::Red) {
            for station in &route.stations {
                assert!((station.offset - sig.offset).abs() >= params.signal_station_exclusion);
            }
        }
    }

    #[test]
    fn test_crossing_exclusion_zones() {
        let (route, params, features) = generated();
        assert!(!features.crossings.is_empty());
        for crossing in &features.crossings {
            for station in &route.stations {
                assert!(
                    (station.offset - crossing.offset).abs()
                        >= params.crossing_station_exclusion
                );
            }
        }
    }

    #[test]
    fn test_crossing_warning_is_one_shot() {
        let mut features = TrackFeatures {
            signals: vec![],
            crossings: vec![LevelCrossing {
                offset: 10.0 * uc::KM,
                kind: CrossingKind::Automatic,
                warned: false,
            }],
        };
        let armed = features.arm_crossing_warning(9.5 * uc::KM, 1.0 * uc::KM);
        assert!(armed.is_some());
        // second pass through the same window stays quiet
        assert!(features
            .arm_crossing_warning(9.6 * uc::KM, 1.0 * uc::KM)
            .is_none());
        features.reset_latches();
        assert!(features
            .arm_crossing_warning(9.6 * uc::KM, 1.0 * uc::KM)
            .is_some());
    }

    #[test]
    fn test_next_signal_window() {
        let features = TrackFeatures {
            signals: vec![
                Signal {
                    offset: 5.0 * uc::KM,
                    aspect: Aspect::Green,
                },
                Signal {
                    offset: 30.0 * uc::KM,
                    aspect: Aspect::Red,
                },
            ],
            crossings: vec![],
        };
        // behind the train
        assert!(features.next_signal(6.0 * uc::KM, 4.0 * uc::KM).is_none());
        let (idx, sig) = features.next_signal(27.0 * uc::KM, 4.0 * uc::KM).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(sig.aspect, Aspect::Red);
        // red boundary detection straddles the signal
        assert!(features
            .red_at_boundary(30.05 * uc::KM, 0.12 * uc::KM)
            .is_some());
        assert!(features
            .red_at_boundary(29.5 * uc::KM, 0.12 * uc::KM)
            .is_none());
    }
}
