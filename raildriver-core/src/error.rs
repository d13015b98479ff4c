use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Station table is unusable: fewer than two stations or offsets not
    /// strictly increasing.  Fatal at session construction.
    #[error("invalid route data: {0}")]
    InvalidRouteData(String),
    /// Operator input outside its legal range.  Inputs are clamped in
    /// place rather than failing the tick; this variant only surfaces
    /// through validating constructors and diagnostics.
    #[error("control input out of range: {0}")]
    ControlInputOutOfRange(String),
    /// A state invariant had to be repaired mid-tick.  Logged and
    /// clamped, never fatal: the simulation must always produce a valid
    /// next frame.
    #[error("state invariant violation: {0}")]
    StateInvariantViolation(String),
    #[error("Init failed: {0}")]
    Init(String),
    #[error("{0}")]
    Other(String),
}

pub type SimResult<T> = Result<T, Error>;
