mod driver_train_sim;
mod dwell;
pub mod physics;
mod resistance;
mod train_state;

pub use driver_train_sim::{
    DriverTrainSim, SessionState, SimEvent, SimulationClock, TelemetrySnapshot,
};
pub use dwell::{DwellController, DwellOutcome, DwellParams, DwellPhase, PassengerExchange};
pub use physics::TrainParams;
pub use resistance::{Aerodynamic, Rolling, TrainRes};
pub use train_state::{Performance, TrainState, TrainStateHistoryVec};
