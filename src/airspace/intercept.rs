use super::hazard::{LocalShape, RegisteredHazard};
use crate::flight_control::common::{geo::GeoPoint, polar::GlidePolar, vec2d::Vec2D};
use crate::settings::{AirspaceSettings, ProjectionMode};
use chrono::TimeDelta;
use itertools::Itertools;

/// The aircraft state the warning engine projects from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AircraftState {
    pub location: GeoPoint,
    /// Altitude MSL in metres; `None` leaves the vertical checks open.
    pub altitude: Option<f64>,
    /// Ground speed in m/s.
    pub ground_speed: f64,
    /// Track over ground in degrees.
    pub track: f64,
    /// Vertical speed in m/s.
    pub vertical_speed: Option<f64>,
}

/// Predicted first entry into a hazard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptSolution {
    /// Time until the boundary is reached.
    pub time: TimeDelta,
    /// Distance flown until the boundary is reached, in metres.
    pub distance: f64,
    /// Projected altitude at the boundary, if the own altitude is known.
    pub altitude: Option<f64>,
}

impl InterceptSolution {
    fn new(distance: f64, seconds: f64, altitude: Option<f64>) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let time = TimeDelta::milliseconds((seconds * 1000.0).round() as i64);
        Self { time, distance, altitude }
    }
}

/// Projects the aircraft path onto hazard outlines.
#[derive(Debug, Clone, Copy)]
pub struct InterceptSolver<'a> {
    settings: &'a AirspaceSettings,
    polar: &'a GlidePolar,
}

impl<'a> InterceptSolver<'a> {
    pub fn new(settings: &'a AirspaceSettings, polar: &'a GlidePolar) -> Self { Self { settings, polar } }

    /// Vertical speed along the projected path: the measured one for [`ProjectionMode::Track`],
    /// the sink at the speed to fly for [`ProjectionMode::GlidePath`].
    pub fn projected_climb(&self, aircraft: &AircraftState) -> f64 {
        match self.settings.projection {
            ProjectionMode::Track => aircraft.vertical_speed.unwrap_or(0.0),
            ProjectionMode::GlidePath => self
                .polar
                .speed_to_fly(self.settings.mac_cready)
                .map_or(0.0, |v| -self.polar.sink(v).max(0.0)),
        }
    }

    /// Earliest entry into `hazard` along the projected path.
    ///
    /// `shape` is the outline of `hazard` in a plane centred on the aircraft. The path is cut
    /// into the stretches that lie over the outline; within each, the projected altitude is
    /// solved for the first point inside the band widened by the altitude buffer. The path is
    /// bounded by the horizon distance and by what is flown within the horizon time.
    ///
    /// # Returns
    /// `None` below the minimum intercept speed or when the path does not enter the hazard
    /// within the horizon.
    pub fn solve(
        &self,
        hazard: &RegisteredHazard,
        shape: &LocalShape,
        aircraft: &AircraftState,
    ) -> Option<InterceptSolution> {
        let speed = aircraft.ground_speed;
        if !speed.is_finite() || speed < self.settings.min_intercept_speed {
            return None;
        }
        let slope = self.projected_climb(aircraft) / speed;
        let horizon = self.settings.horizon_distance.min(speed * self.settings.horizon_time_s);
        let altitude_at = |distance: f64| aircraft.altitude.map(|alt| alt + slope * distance);
        let dir = Vec2D::from_bearing(aircraft.track, 1.0);

        let mut stops = vec![0.0];
        stops.extend(shape.ray_crossings(dir, horizon));
        stops.push(horizon);
        stops
            .into_iter()
            .tuple_windows()
            .filter(|&(from, to)| to > from && shape.contains(dir * ((from + to) / 2.0)))
            .find_map(|(from, to)| self.band_entry(hazard, altitude_at(from), slope, from, to))
            .map(|d| InterceptSolution::new(d, d / speed, altitude_at(d)))
    }

    /// First distance in `[from, to]` at which a path starting at `altitude` with `slope`
    /// metres per metre is inside the widened band. An unknown altitude enters at `from`.
    fn band_entry(
        &self,
        hazard: &RegisteredHazard,
        altitude: Option<f64>,
        slope: f64,
        from: f64,
        to: f64,
    ) -> Option<f64> {
        let Some(altitude) = altitude else {
            return Some(from);
        };
        let buffer = self.settings.altitude_buffer;
        let offset = if hazard.band_contains(altitude, buffer) {
            0.0
        } else if altitude < hazard.base() - buffer && slope > 0.0 {
            (hazard.base() - buffer - altitude) / slope
        } else if altitude > hazard.top() + buffer && slope < 0.0 {
            (hazard.top() + buffer - altitude) / slope
        } else {
            return None;
        };
        let entry = from + offset;
        (entry <= to).then_some(entry)
    }
}
