mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::HomewatchOrchestrator;
pub use types::{ComponentState, ShutdownReason};
