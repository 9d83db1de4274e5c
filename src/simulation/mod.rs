pub mod driver;
pub mod event;
pub mod experiment;
pub mod state;

pub use driver::{run_trial, TrialOutcome};
pub use event::{DepartureEvent, DepartureRecord};
pub use experiment::Experiment;
pub use state::SimulationState;
