use crate::flight_control::common::{geo::GeoPoint, vec2d::Vec2D};
use chrono::{DateTime, Utc};

/// One timestamped sample of the aircraft's position, velocity and sensor state.
///
/// Every sensor field is optional; `None` marks it invalid for this sample. A `Fix` is
/// immutable once built and is handed to the glide computer by value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Fix {
    /// UTC time of the sample.
    time: DateTime<Utc>,
    /// GNSS position.
    location: Option<GeoPoint>,
    /// GNSS altitude above mean sea level in metres.
    gps_altitude: Option<f64>,
    /// Pressure altitude in metres, preferred over GNSS altitude when present.
    baro_altitude: Option<f64>,
    /// Ground speed in m/s.
    ground_speed: Option<f64>,
    /// Track over ground in degrees.
    track: Option<f64>,
    /// True airspeed in m/s.
    airspeed: Option<f64>,
    /// True heading of the fuselage in degrees.
    heading: Option<f64>,
    /// Vertical speed from an external variometer in m/s.
    vario: Option<f64>,
}

impl Fix {
    /// Creates a fix at `time` with every sensor field invalid.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            location: None,
            gps_altitude: None,
            baro_altitude: None,
            ground_speed: None,
            track: None,
            airspeed: None,
            heading: None,
            vario: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location).filter(GeoPoint::is_finite);
        self
    }

    #[must_use]
    pub fn with_gps_altitude(mut self, altitude: f64) -> Self {
        self.gps_altitude = finite(altitude);
        self
    }

    #[must_use]
    pub fn with_baro_altitude(mut self, altitude: f64) -> Self {
        self.baro_altitude = finite(altitude);
        self
    }

    /// Sets ground speed (m/s) and track (degrees) together.
    #[must_use]
    pub fn with_ground_velocity(mut self, speed: f64, track: f64) -> Self {
        self.ground_speed = finite(speed).map(|s| s.max(0.0));
        self.track = finite(track);
        self
    }

    /// Sets true airspeed (m/s) and heading (degrees) together.
    #[must_use]
    pub fn with_air_velocity(mut self, airspeed: f64, heading: f64) -> Self {
        self.airspeed = finite(airspeed).map(|s| s.max(0.0));
        self.heading = finite(heading);
        self
    }

    #[must_use]
    pub fn with_vario(mut self, vario: f64) -> Self {
        self.vario = finite(vario);
        self
    }

    pub fn time(&self) -> DateTime<Utc> { self.time }
    pub fn location(&self) -> Option<GeoPoint> { self.location }
    pub fn gps_altitude(&self) -> Option<f64> { self.gps_altitude }
    pub fn baro_altitude(&self) -> Option<f64> { self.baro_altitude }
    pub fn ground_speed(&self) -> Option<f64> { self.ground_speed }
    pub fn track(&self) -> Option<f64> { self.track }
    pub fn airspeed(&self) -> Option<f64> { self.airspeed }
    pub fn heading(&self) -> Option<f64> { self.heading }
    pub fn vario(&self) -> Option<f64> { self.vario }

    /// Best available altitude: barometric first, GNSS as fallback.
    pub fn altitude(&self) -> Option<f64> { self.baro_altitude.or(self.gps_altitude) }

    /// Velocity over ground as an east/north vector in m/s.
    pub fn ground_velocity(&self) -> Option<Vec2D<f64>> {
        Some(Vec2D::from_bearing(self.track?, self.ground_speed?))
    }

    /// Velocity through the air mass as an east/north vector in m/s.
    pub fn air_velocity(&self) -> Option<Vec2D<f64>> {
        Some(Vec2D::from_bearing(self.heading?, self.airspeed?))
    }
}

fn finite(value: f64) -> Option<f64> { value.is_finite().then_some(value) }
