//! Simulation core for a single-train driving session.
//!
//! One train traverses a fixed route while the operator works the
//! throttle and brake against signal aspects, station speed zones, and
//! level crossings.  [train::DriverTrainSim] owns the mutable
//! [train::TrainState] and advances it one clamped time step at a time:
//! rule evaluation, physics integration, station dwell, then scoring.
//! External collaborators (rendering, audio, UI) read the per-tick
//! [train::TelemetrySnapshot] and drained [train::SimEvent]s; the only
//! writable surface they get is [control::ControlInputs].
//!
//! Physical quantities use `uom` SI types throughout; see [si] and [uc].

pub mod control;
pub mod error;
pub(crate) mod imports;
pub mod prelude;
pub mod rng;
pub mod rules;
pub mod scoring;
pub mod si;
pub mod track;
pub mod train;
pub mod traits;
pub mod uc;
pub mod utils;

pub use error::Error;
