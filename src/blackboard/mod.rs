//! Shared flight state: the published snapshot store, the lease facade for long-lived
//! subsystems and the raw input types.

mod derived;
mod fix;
mod protected;
mod store;
mod trace;

pub use derived::DerivedState;
pub use fix::Fix;
pub use protected::{ExclusiveLease, Lease, Protected};
pub use store::{Blackboard, FlightSnapshot};
pub use trace::{Trace, TracePoint};
