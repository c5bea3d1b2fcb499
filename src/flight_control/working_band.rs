use crate::flight_control::statistics::FlightStatistics;
use crate::settings::WorkingBandSettings;

/// Altitude range the pilot is currently working in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingBand {
    /// Lowest usable altitude: takeoff altitude plus the safety height.
    pub floor: f64,
    /// Highest altitude reached since takeoff, never below the floor.
    pub ceiling: f64,
    /// Position of the current altitude within the band, `0` at the floor, `1` at the ceiling.
    /// Negative while below the floor; `1` while the band has no height yet.
    pub fraction: f64,
}

impl WorkingBand {
    /// Computes the band from the flight statistics, or `None` when no takeoff altitude or
    /// no current altitude is known.
    pub fn compute(
        altitude: Option<f64>,
        stats: &FlightStatistics,
        settings: &WorkingBandSettings,
    ) -> Option<WorkingBand> {
        let altitude = altitude?;
        let floor = stats.takeoff_altitude? + settings.safety_height;
        let ceiling = stats.max_altitude.map_or(floor, |max| max.max(floor));
        let span = ceiling - floor;
        let fraction = if span > f64::EPSILON {
            (altitude - floor) / span
        } else if altitude >= floor {
            1.0
        } else {
            0.0
        };
        Some(WorkingBand { floor, ceiling, fraction })
    }
}
