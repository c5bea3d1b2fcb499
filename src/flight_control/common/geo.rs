use super::vec2d::Vec2D;

/// Mean earth radius in metres (FAI sphere).
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// A WGS84 location in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Deserialize, serde::Serialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }

    pub const fn lat(&self) -> f64 { self.lat }

    pub const fn lon(&self) -> f64 { self.lon }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat.abs() <= 90.0
    }

    /// Great circle distance to `other` in metres (haversine).
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS * a.sqrt().min(1.0).asin()
    }

    /// Initial great circle bearing towards `other` in degrees `[0, 360)`.
    pub fn bearing(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lon = (other.lon - self.lon).to_radians();
        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        normalize_degrees(y.atan2(x).to_degrees())
    }

    /// Location reached after travelling `distance` metres along `bearing_deg`.
    pub fn offset(&self, bearing_deg: f64, distance: f64) -> GeoPoint {
        let delta = distance / EARTH_RADIUS;
        let theta = bearing_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        GeoPoint::new(lat2.to_degrees(), normalize_longitude(lon2.to_degrees()))
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Equirectangular projection into a local east/north plane around an origin.
///
/// Accurate to well below a metre over the few kilometres the warning and task code
/// look at, which keeps all geometry in plain `Vec2D<f64>` arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct FlatProjection {
    origin: GeoPoint,
    cos_lat: f64,
}

impl FlatProjection {
    pub fn new(origin: GeoPoint) -> Self {
        Self { origin, cos_lat: origin.lat.to_radians().cos().max(1e-6) }
    }

    pub fn project(&self, point: &GeoPoint) -> Vec2D<f64> {
        let d_lon = normalize_longitude(point.lon - self.origin.lon);
        let x = d_lon.to_radians() * EARTH_RADIUS * self.cos_lat;
        let y = (point.lat - self.origin.lat).to_radians() * EARTH_RADIUS;
        Vec2D::new(x, y)
    }

    pub fn unproject(&self, v: Vec2D<f64>) -> GeoPoint {
        let lat = self.origin.lat + (v.y() / EARTH_RADIUS).to_degrees();
        let lon = self.origin.lon + (v.x() / (EARTH_RADIUS * self.cos_lat)).to_degrees();
        GeoPoint::new(lat, normalize_longitude(lon))
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wraps a longitude in degrees into `[-180, 180)`.
pub fn normalize_longitude(lon: f64) -> f64 { (lon + 180.0).rem_euclid(360.0) - 180.0 }
