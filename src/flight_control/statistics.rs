use crate::flight_control::common::geo::GeoPoint;
use chrono::{DateTime, TimeDelta, Utc};

/// Accumulated per-flight statistics, reset on every takeoff and on time warps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightStatistics {
    pub takeoff_time: Option<DateTime<Utc>>,
    pub takeoff_location: Option<GeoPoint>,
    pub takeoff_altitude: Option<f64>,
    pub landing_time: Option<DateTime<Utc>>,
    /// Time spent flying since the last takeoff.
    pub flight_time: TimeDelta,
    pub max_altitude: Option<f64>,
    pub min_altitude: Option<f64>,
    /// Distance over ground covered while flying, in metres.
    pub distance_flown: f64,
    last_sample: Option<(DateTime<Utc>, Option<GeoPoint>)>,
}

impl FlightStatistics {
    /// Starts a new flight at `time`.
    pub fn begin(&mut self, time: DateTime<Utc>, location: Option<GeoPoint>, altitude: Option<f64>) {
        *self = Self {
            takeoff_time: Some(time),
            takeoff_location: location,
            takeoff_altitude: altitude,
            max_altitude: altitude,
            min_altitude: altitude,
            last_sample: Some((time, location)),
            ..Self::default()
        };
    }

    pub fn end(&mut self, time: DateTime<Utc>) {
        self.landing_time = Some(time);
        self.last_sample = None;
    }

    /// Integrates one flying sample. Altitude and location are optional; missing values only
    /// leave their respective aggregates untouched.
    pub fn accumulate(&mut self, time: DateTime<Utc>, location: Option<GeoPoint>, altitude: Option<f64>) {
        if let Some((last_time, last_location)) = self.last_sample {
            let dt = time - last_time;
            if dt > TimeDelta::zero() {
                self.flight_time += dt;
            }
            if let (Some(a), Some(b)) = (last_location, location) {
                self.distance_flown += a.distance(&b);
            }
        }
        if let Some(alt) = altitude {
            self.max_altitude = Some(self.max_altitude.map_or(alt, |m| m.max(alt)));
            self.min_altitude = Some(self.min_altitude.map_or(alt, |m| m.min(alt)));
        }
        let location = location.or(self.last_sample.and_then(|s| s.1));
        self.last_sample = Some((time, location));
    }

    pub fn reset(&mut self) { *self = Self::default(); }
}
