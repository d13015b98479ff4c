mod feature;
mod station;

pub use feature::{Aspect, CrossingKind, LevelCrossing, Signal, TrackFeatures, TrackGenParams};
pub use station::{Route, RouteStation};
