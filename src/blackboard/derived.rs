use super::trace::Trace;
use crate::airspace::{HazardId, WarningRecord};
use crate::flight_control::{
    FlightPhase,
    air_data::AirData,
    slow_derived::TeammateInfo,
    statistics::FlightStatistics,
    task::TaskProgress,
    working_band::WorkingBand,
};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;

/// Everything the orchestrator derives from the fix stream.
///
/// Recomputed every cycle from the latest fix and the previous state. Fields that can be
/// unavailable are `Option`s, `None` meaning "unavailable".
#[derive(Debug, Clone, Default)]
pub struct DerivedState {
    /// Incremented with every publication.
    pub version: u64,
    /// Timestamp of the fix this state was derived from.
    pub time: Option<DateTime<Utc>>,
    pub local_time: Option<DateTime<FixedOffset>>,
    pub air: AirData,
    pub phase: FlightPhase,
    pub statistics: FlightStatistics,
    /// Task progress, `None` without a task plan.
    pub task: Option<TaskProgress>,
    pub working_band: Option<WorkingBand>,
    /// Full-scale deflection of the vario gauge in m/s.
    pub vario_scale: Option<f64>,
    pub teammate: Option<TeammateInfo>,
    /// All tracked warning records, most severe first.
    pub warnings: Vec<WarningRecord>,
    /// Hazards currently demanding attention, most severe first.
    pub alerts: Vec<HazardId>,
    pub trace: Arc<Trace>,
    /// Number of backward time jumps seen so far.
    pub time_warps: u32,
}
