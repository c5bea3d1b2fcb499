//! Tunable parameters of the glide computer.
//!
//! The settings collaborator owns persistence; this crate only consumes the in-memory values.
//! All structs deserialize with `#[serde(default)]`, so a partial document keeps the tuned
//! defaults for every omitted key. Durations are stored as seconds and exposed as
//! [`TimeDelta`] through accessor methods.

use crate::flight_control::common::polar::GlidePolar;
use chrono::{FixedOffset, Offset, TimeDelta, Utc};

/// Converts a second-valued setting into a [`TimeDelta`] with millisecond resolution.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn secs(value: f64) -> TimeDelta {
    TimeDelta::milliseconds((value.max(0.0) * 1000.0).round() as i64)
}

/// Root settings object handed to [`crate::flight_control::GlideComputer`].
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ComputerSettings {
    /// Offset of local time from UTC in minutes.
    pub utc_offset_minutes: i32,
    /// Minimum spacing between two idle requests issued by the fix path.
    pub idle_min_interval_s: f64,
    /// Throttle interval of the slow derived values (vario scale, teammate).
    pub slow_interval_s: f64,
    pub phase: FlightPhaseSettings,
    pub airspace: AirspaceSettings,
    pub trace: TraceSettings,
    pub air_data: AirDataSettings,
    pub working_band: WorkingBandSettings,
    pub vario_scale: VarioScaleSettings,
    /// Age after which a reported teammate position is no longer used.
    pub teammate_timeout_s: f64,
    pub polar: GlidePolar,
}

impl Default for ComputerSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            idle_min_interval_s: 0.5,
            slow_interval_s: 10.0,
            phase: FlightPhaseSettings::default(),
            airspace: AirspaceSettings::default(),
            trace: TraceSettings::default(),
            air_data: AirDataSettings::default(),
            working_band: WorkingBandSettings::default(),
            vario_scale: VarioScaleSettings::default(),
            teammate_timeout_s: 120.0,
            polar: GlidePolar::default(),
        }
    }
}

impl ComputerSettings {
    /// Local time zone as a fixed offset. Out-of-range offsets fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
    }

    pub fn idle_min_interval(&self) -> TimeDelta { secs(self.idle_min_interval_s) }

    pub fn slow_interval(&self) -> TimeDelta { secs(self.slow_interval_s) }

    pub fn teammate_timeout(&self) -> TimeDelta { secs(self.teammate_timeout_s) }
}

/// Hysteresis thresholds of the takeoff/landing classifier.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FlightPhaseSettings {
    /// Ground speed (m/s) at or above which the aircraft counts as moving like it flies.
    pub takeoff_speed: f64,
    /// Ground speed (m/s) below which the aircraft counts as standing or rolling out.
    pub landing_speed: f64,
    /// Absolute vertical speed (m/s) that alone indicates flight.
    pub climb_threshold: f64,
    /// How long the flying condition must hold before takeoff is declared.
    pub takeoff_dwell_s: f64,
    /// How long the landed condition must hold before landing is declared.
    pub landing_dwell_s: f64,
}

impl Default for FlightPhaseSettings {
    fn default() -> Self {
        Self {
            takeoff_speed: 10.0,
            landing_speed: 5.0,
            climb_threshold: 3.0,
            takeoff_dwell_s: 10.0,
            landing_dwell_s: 30.0,
        }
    }
}

impl FlightPhaseSettings {
    pub fn takeoff_dwell(&self) -> TimeDelta { secs(self.takeoff_dwell_s) }

    pub fn landing_dwell(&self) -> TimeDelta { secs(self.landing_dwell_s) }
}

/// How the intercept solver extrapolates the aircraft's vertical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, strum_macros::Display)]
pub enum ProjectionMode {
    /// Straight line along the current track with the current vertical speed.
    Track,
    /// Straight line along the current track, descending along the glide path at the
    /// configured `MacCready` setting.
    GlidePath,
}

/// Parameters of the airspace warning engine.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AirspaceSettings {
    /// Vertical margin (m) added on both sides of every hazard band.
    pub altitude_buffer: f64,
    /// Maximum look-ahead distance (m) of the intercept solver.
    pub horizon_distance: f64,
    /// Maximum look-ahead time (s) of the intercept solver and the vertical relevance test.
    pub horizon_time_s: f64,
    /// Intercept distance (m) at or below which a hazard is NEAR.
    pub near_distance: f64,
    /// Intercept time (s) at or below which a hazard is NEAR.
    pub near_time_s: f64,
    /// Ground speed (m/s) below which no intercept is predicted.
    pub min_intercept_speed: f64,
    /// How long warning and inside acknowledgements last.
    pub ack_duration_s: f64,
    /// Number of hazards without a record evaluated by an incremental idle pass.
    pub incremental_budget: usize,
    pub projection: ProjectionMode,
    /// `MacCready` setting (m/s) for [`ProjectionMode::GlidePath`].
    pub mac_cready: f64,
}

impl Default for AirspaceSettings {
    fn default() -> Self {
        Self {
            altitude_buffer: 30.0,
            horizon_distance: 2000.0,
            horizon_time_s: 120.0,
            near_distance: 1000.0,
            near_time_s: 60.0,
            min_intercept_speed: 1.0,
            ack_duration_s: 30.0,
            incremental_budget: 16,
            projection: ProjectionMode::Track,
            mac_cready: 0.5,
        }
    }
}

impl AirspaceSettings {
    pub fn ack_duration(&self) -> TimeDelta { secs(self.ack_duration_s) }
}

#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TraceSettings {
    pub min_spacing_s: f64,
    pub capacity: usize,
}

impl Default for TraceSettings {
    fn default() -> Self { Self { min_spacing_s: 0.5, capacity: 8192 } }
}

impl TraceSettings {
    pub fn min_spacing(&self) -> TimeDelta { secs(self.min_spacing_s) }
}

/// Low-pass filter gains of the air-data stage, each in `(0, 1]`.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AirDataSettings {
    pub vario_gain: f64,
    pub wind_gain: f64,
}

impl Default for AirDataSettings {
    fn default() -> Self { Self { vario_gain: 0.3, wind_gain: 0.1 } }
}

#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct WorkingBandSettings {
    /// Height (m) above the takeoff altitude below which the band floor never drops.
    pub safety_height: f64,
}

impl Default for WorkingBandSettings {
    fn default() -> Self { Self { safety_height: 300.0 } }
}

#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct VarioScaleSettings {
    pub window_s: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for VarioScaleSettings {
    fn default() -> Self { Self { window_s: 300.0, min: 2.0, max: 10.0, step: 0.5 } }
}

impl VarioScaleSettings {
    pub fn window(&self) -> TimeDelta { secs(self.window_s) }
}
