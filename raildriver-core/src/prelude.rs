pub use crate::control::{BrakeIntent, ControlInputs, ThrottleIntent};
pub use crate::error::Error;
pub use crate::rng::SimRng;
pub use crate::rules::{Hint, RuleOutcome, RuleParams};
pub use crate::scoring::{ScoreKeeper, ScoreParams};
pub use crate::track::{
    Aspect, CrossingKind, LevelCrossing, Route, RouteStation, Signal, TrackFeatures,
    TrackGenParams,
};
pub use crate::train::{
    DriverTrainSim, DwellController, DwellOutcome, DwellParams, DwellPhase, PassengerExchange,
    Performance, SessionState, SimEvent, SimulationClock, TelemetrySnapshot, TrainParams,
    TrainRes, TrainState, TrainStateHistoryVec,
};
pub use crate::traits::{Init, SerdeAPI, Valid};
