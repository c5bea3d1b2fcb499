//! Airspace proximity warnings: the hazard register, the intercept solver and the manager
//! keeping one warning record per relevant hazard.

mod hazard;
mod intercept;
mod manager;
mod warning;
#[cfg(test)]
mod tests;

pub use hazard::{
    AltitudeLimit, AltitudeRef, Boundary, GroundResolver, Hazard, HazardClass, HazardGeometryError, HazardId,
    HazardRegister, LocalShape, RegisteredHazard, SeaLevel, VerticalBand,
};
pub use intercept::{AircraftState, InterceptSolution, InterceptSolver};
pub use manager::{AirspaceWarningManager, PassSummary};
pub use warning::{Acknowledgement, WarningRecord, WarningState};
