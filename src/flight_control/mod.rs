pub mod air_data;
pub mod common;
pub mod events;
mod flight_phase;
mod glide_computer;
pub mod slow_derived;
pub mod stage;
pub mod statistics;
mod supervisor;
pub mod task;
pub mod working_band;
#[cfg(test)]
mod tests;

pub use flight_phase::{FlightPhase, PhaseClassifier, PhaseEdge, PhaseEdgeDetector};
pub use glide_computer::GlideComputer;
pub use supervisor::{Feeds, Supervisor};
