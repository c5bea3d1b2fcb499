use crate::blackboard::Trace;
use crate::flight_control::common::geo::GeoPoint;
use crate::settings::VarioScaleSettings;
use chrono::{DateTime, TimeDelta, Utc};

/// Bearing and range from the own aircraft to the teammate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeammateInfo {
    /// Bearing in degrees from the own position to the teammate.
    pub bearing: f64,
    /// Range in metres.
    pub range: f64,
    /// Age of the teammate report when this value was computed.
    pub age: TimeDelta,
}

/// A teammate position as reported by the team collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeammateReport {
    pub location: GeoPoint,
    pub time: DateTime<Utc>,
}

/// Rate limiter of the slow derived values.
#[derive(Debug, Clone, Default)]
pub struct Throttle {
    last_run: Option<DateTime<Utc>>,
}

impl Throttle {
    /// Returns `true` and restarts the interval if at least `interval` has passed since the
    /// last accepted call. A timestamp before the last run restarts the interval as well.
    pub fn ready(&mut self, now: DateTime<Utc>, interval: TimeDelta) -> bool {
        let due = self.last_run.is_none_or(|last| now - last >= interval || now < last);
        if due {
            self.last_run = Some(now);
        }
        due
    }

    pub fn reset(&mut self) { self.last_run = None; }
}

/// Full-scale deflection of the vario gauge: the peak absolute vertical speed of the trace
/// window, rounded up to the next step and clamped.
pub fn vario_scale(trace: &Trace, now: DateTime<Utc>, settings: &VarioScaleSettings) -> f64 {
    let peak = trace.peak_vertical_speed(now - settings.window()).unwrap_or(0.0);
    let step = if settings.step > 0.0 { settings.step } else { 0.5 };
    let rounded = (peak / step).ceil() * step;
    rounded.clamp(settings.min, settings.max.max(settings.min))
}

/// Bearing and range to the teammate, unavailable without an own position or with a report
/// older than `timeout`.
pub fn teammate_info(
    own: Option<GeoPoint>,
    report: Option<TeammateReport>,
    now: DateTime<Utc>,
    timeout: TimeDelta,
) -> Option<TeammateInfo> {
    let own = own?;
    let report = report?;
    let age = now - report.time;
    if age > timeout {
        return None;
    }
    Some(TeammateInfo { bearing: own.bearing(&report.location), range: own.distance(&report.location), age })
}
