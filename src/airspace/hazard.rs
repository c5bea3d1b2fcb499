use crate::flight_control::common::{
    geo::{FlatProjection, GeoPoint},
    vec2d::Vec2D,
};
use crate::warn;
use itertools::Itertools;
use std::collections::HashMap;
use strum_macros::{Display, EnumIter};

/// Stable identifier of a hazard, assigned by whoever loads the airspace set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize)]
pub struct HazardId(pub u32);

impl std::fmt::Display for HazardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

/// Priority class of a hazard. Declared from most to least severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, serde::Deserialize, serde::Serialize,
)]
pub enum HazardClass {
    Prohibited,
    Restricted,
    Danger,
    Controlled,
    Other,
}

/// Horizontal outline of a hazard.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Boundary {
    /// Closed polygon; the closing edge from the last back to the first vertex is implicit.
    Polygon(Vec<GeoPoint>),
    Circle { center: GeoPoint, radius: f64 },
}

impl Boundary {
    /// Point used to look up the ground elevation of AGL-referenced limits.
    fn reference_point(&self) -> Option<GeoPoint> {
        match self {
            Boundary::Circle { center, .. } => Some(*center),
            Boundary::Polygon(vertices) => {
                if vertices.is_empty() {
                    return None;
                }
                let n = vertices.len() as f64;
                let (lat, lon) = vertices.iter().fold((0.0, 0.0), |(lat, lon), v| (lat + v.lat(), lon + v.lon()));
                Some(GeoPoint::new(lat / n, lon / n))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Deserialize, serde::Serialize)]
pub enum AltitudeRef {
    /// Above mean sea level.
    Msl,
    /// Above ground level.
    Agl,
}

/// One limit of a vertical band, in metres.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AltitudeLimit {
    pub altitude: f64,
    pub reference: AltitudeRef,
}

impl AltitudeLimit {
    pub const fn msl(altitude: f64) -> Self { Self { altitude, reference: AltitudeRef::Msl } }

    pub const fn agl(altitude: f64) -> Self { Self { altitude, reference: AltitudeRef::Agl } }

    fn resolve(&self, ground: f64) -> f64 {
        match self.reference {
            AltitudeRef::Msl => self.altitude,
            AltitudeRef::Agl => self.altitude + ground,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VerticalBand {
    pub base: AltitudeLimit,
    pub top: AltitudeLimit,
}

/// Reasons a hazard cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HazardGeometryError {
    TooFewVertices(HazardId),
    NonFiniteCoordinate(HazardId),
    NonPositiveRadius(HazardId),
    InvertedBand(HazardId),
}

impl std::error::Error for HazardGeometryError {}

/// An airspace volume the pilot has to be warned about.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Hazard {
    pub id: HazardId,
    pub name: String,
    pub class: HazardClass,
    pub boundary: Boundary,
    pub band: VerticalBand,
}

impl Hazard {
    /// Checks the outline and the band for evaluability.
    ///
    /// A band whose limits use different references can only be checked after resolving it,
    /// which [`HazardRegister::new`] does.
    ///
    /// # Errors
    /// The first [`HazardGeometryError`] found.
    pub fn validate(&self) -> Result<(), HazardGeometryError> {
        let id = self.id;
        match &self.boundary {
            Boundary::Polygon(vertices) => {
                if vertices.len() < 3 {
                    return Err(HazardGeometryError::TooFewVertices(id));
                }
                if !vertices.iter().all(GeoPoint::is_finite) {
                    return Err(HazardGeometryError::NonFiniteCoordinate(id));
                }
            }
            Boundary::Circle { center, radius } => {
                if !center.is_finite() || !radius.is_finite() {
                    return Err(HazardGeometryError::NonFiniteCoordinate(id));
                }
                if *radius <= 0.0 {
                    return Err(HazardGeometryError::NonPositiveRadius(id));
                }
            }
        }
        let VerticalBand { base, top } = self.band;
        if !base.altitude.is_finite() || !top.altitude.is_finite() {
            return Err(HazardGeometryError::NonFiniteCoordinate(id));
        }
        if base.reference == top.reference && base.altitude > top.altitude {
            return Err(HazardGeometryError::InvertedBand(id));
        }
        Ok(())
    }
}

/// Terrain elevation lookup used to turn AGL limits into MSL.
pub trait GroundResolver {
    /// Ground elevation in metres MSL at `location`, `None` if unknown.
    fn ground_elevation(&self, location: &GeoPoint) -> Option<f64>;
}

impl<F> GroundResolver for F
where F: Fn(&GeoPoint) -> Option<f64>
{
    fn ground_elevation(&self, location: &GeoPoint) -> Option<f64> { self(location) }
}

/// Resolver for a flat world at sea level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaLevel;

impl GroundResolver for SeaLevel {
    fn ground_elevation(&self, _: &GeoPoint) -> Option<f64> { Some(0.0) }
}

/// A validated hazard with its band resolved to MSL.
#[derive(Debug, Clone)]
pub struct RegisteredHazard {
    hazard: Hazard,
    base: f64,
    top: f64,
}

impl RegisteredHazard {
    pub fn hazard(&self) -> &Hazard { &self.hazard }

    pub fn id(&self) -> HazardId { self.hazard.id }

    /// Band base in metres MSL.
    pub fn base(&self) -> f64 { self.base }

    /// Band top in metres MSL.
    pub fn top(&self) -> f64 { self.top }

    /// Whether `altitude` lies in the band widened by `buffer` on both sides.
    pub fn band_contains(&self, altitude: f64, buffer: f64) -> bool {
        altitude >= self.base - buffer && altitude <= self.top + buffer
    }

    /// Whether the band widened by `buffer` overlaps `[low, high]`.
    pub fn band_overlaps(&self, low: f64, high: f64, buffer: f64) -> bool {
        high >= self.base - buffer && low <= self.top + buffer
    }

    /// Outline in the plane of `projection`.
    pub fn local_shape(&self, projection: &FlatProjection) -> LocalShape {
        match &self.hazard.boundary {
            Boundary::Polygon(vertices) => {
                LocalShape::Polygon(vertices.iter().map(|v| projection.project(v)).collect())
            }
            Boundary::Circle { center, radius } => {
                LocalShape::Circle { center: projection.project(center), radius: *radius }
            }
        }
    }
}

/// Hazard outline projected into a local plane, in metres.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalShape {
    Polygon(Vec<Vec2D<f64>>),
    Circle { center: Vec2D<f64>, radius: f64 },
}

impl LocalShape {
    const ON_EDGE: f64 = 1e-6;

    /// Boundary-inclusive containment test.
    pub fn contains(&self, p: Vec2D<f64>) -> bool {
        match self {
            LocalShape::Circle { center, radius } => p.euclid_distance(center) <= *radius,
            LocalShape::Polygon(vertices) => {
                let mut inside = false;
                for (a, b) in vertices.iter().circular_tuple_windows() {
                    if p.distance_to_segment(a, b) <= Self::ON_EDGE {
                        return true;
                    }
                    if (a.y() > p.y()) != (b.y() > p.y()) {
                        let x = a.x() + (p.y() - a.y()) / (b.y() - a.y()) * (b.x() - a.x());
                        if p.x() < x {
                            inside = !inside;
                        }
                    }
                }
                inside
            }
        }
    }

    /// Horizontal distance from `p` to the area; zero inside.
    pub fn distance(&self, p: Vec2D<f64>) -> f64 {
        if self.contains(p) {
            return 0.0;
        }
        match self {
            LocalShape::Circle { center, radius } => (p.euclid_distance(center) - radius).max(0.0),
            LocalShape::Polygon(vertices) => vertices
                .iter()
                .circular_tuple_windows()
                .map(|(a, b)| p.distance_to_segment(a, b))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// Distances along the ray from the origin in unit direction `dir` at which the ray meets
    /// the boundary, ascending and limited to `max_distance`.
    pub fn ray_crossings(&self, dir: Vec2D<f64>, max_distance: f64) -> Vec<f64> {
        let mut hits: Vec<f64> = match self {
            LocalShape::Circle { center, radius } => {
                // |t·dir - c|² = r²
                let b = dir.dot(*center);
                let disc = b * b - (center.abs_sq() - radius * radius);
                if disc < 0.0 {
                    Vec::new()
                } else {
                    let root = disc.sqrt();
                    vec![b - root, b + root]
                }
            }
            LocalShape::Polygon(vertices) => vertices
                .iter()
                .circular_tuple_windows()
                .filter_map(|(a, b)| {
                    let edge = *b - *a;
                    let denom = dir.cross(edge);
                    if denom.abs() < f64::EPSILON {
                        return None;
                    }
                    let t = a.cross(edge) / denom;
                    let s = a.cross(dir) / denom;
                    (0.0..=1.0).contains(&s).then_some(t)
                })
                .collect(),
        };
        hits.retain(|t| (0.0..=max_distance).contains(t));
        hits.sort_by(f64::total_cmp);
        hits
    }
}

/// The loaded hazard set.
///
/// AGL limits are resolved once here. Hazards failing [`Hazard::validate`] are kept aside and
/// never evaluated.
#[derive(Debug, Default)]
pub struct HazardRegister {
    entries: Vec<RegisteredHazard>,
    index: HashMap<HazardId, usize>,
    rejected: Vec<HazardGeometryError>,
}

impl HazardRegister {
    pub fn new(hazards: Vec<Hazard>, ground: &dyn GroundResolver) -> Self {
        let mut register = Self::default();
        for hazard in hazards {
            match Self::register(hazard, ground) {
                Ok(entry) => {
                    register.index.insert(entry.id(), register.entries.len());
                    register.entries.push(entry);
                }
                Err(e) => {
                    warn!("Skipping hazard with invalid geometry: {e:?}");
                    register.rejected.push(e);
                }
            }
        }
        register
    }

    fn register(hazard: Hazard, ground: &dyn GroundResolver) -> Result<RegisteredHazard, HazardGeometryError> {
        hazard.validate()?;
        let VerticalBand { base, top } = hazard.band;
        let elevation = if base.reference == AltitudeRef::Agl || top.reference == AltitudeRef::Agl {
            hazard.boundary.reference_point().and_then(|p| ground.ground_elevation(&p)).unwrap_or_else(|| {
                warn!("No ground elevation for {} {}, treating AGL as MSL", hazard.id, hazard.name);
                0.0
            })
        } else {
            0.0
        };
        let (base, top) = (base.resolve(elevation), top.resolve(elevation));
        if base > top {
            return Err(HazardGeometryError::InvertedBand(hazard.id));
        }
        Ok(RegisteredHazard { hazard, base, top })
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entries(&self) -> &[RegisteredHazard] { &self.entries }

    pub fn get(&self, id: HazardId) -> Option<&RegisteredHazard> { self.index.get(&id).map(|&i| &self.entries[i]) }

    pub fn position(&self, id: HazardId) -> Option<usize> { self.index.get(&id).copied() }

    pub fn contains(&self, id: HazardId) -> bool { self.index.contains_key(&id) }

    /// Hazards that failed validation when the register was built.
    pub fn rejected(&self) -> &[HazardGeometryError] { &self.rejected }
}
