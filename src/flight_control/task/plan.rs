use crate::flight_control::common::{
    geo::{FlatProjection, GeoPoint},
    vec2d::Vec2D,
};
use strum_macros::Display;

/// Shape of the area a task point has to be reached in.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ObservationZone {
    /// Circle of `radius` metres around the point.
    Cylinder { radius: f64 },
    /// Line of `length` metres through the point, perpendicular to the adjoining leg.
    Line { length: f64 },
}

impl ObservationZone {
    fn is_valid(&self) -> bool {
        match self {
            ObservationZone::Cylinder { radius } => radius.is_finite() && *radius > 0.0,
            ObservationZone::Line { length } => length.is_finite() && *length > 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TaskPoint {
    name: String,
    location: GeoPoint,
    zone: ObservationZone,
}

impl TaskPoint {
    pub fn new(name: impl Into<String>, location: GeoPoint, zone: ObservationZone) -> Self {
        Self { name: name.into(), location, zone }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn location(&self) -> GeoPoint { self.location }
    pub fn zone(&self) -> ObservationZone { self.zone }
}

#[derive(Debug, Display)]
pub enum TaskPlanError {
    TooFewPoints,
    InvalidLocation(usize),
    InvalidZone(usize),
}

impl std::error::Error for TaskPlanError {}

/// Validated, ordered list of task points: start, turn points, finish.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPlan {
    points: Vec<TaskPoint>,
    /// `legs[k]` is the length of the leg ending at point `k`; `legs[0]` is zero.
    legs: Vec<f64>,
}

impl TaskPlan {
    /// Builds a plan from its points.
    ///
    /// # Errors
    /// [`TaskPlanError`] if fewer than two points are given, or a point has a non-finite
    /// location or a degenerate zone.
    pub fn new(points: Vec<TaskPoint>) -> Result<Self, TaskPlanError> {
        if points.len() < 2 {
            return Err(TaskPlanError::TooFewPoints);
        }
        for (i, p) in points.iter().enumerate() {
            if !p.location.is_finite() {
                return Err(TaskPlanError::InvalidLocation(i));
            }
            if !p.zone.is_valid() {
                return Err(TaskPlanError::InvalidZone(i));
            }
        }
        let legs = std::iter::once(0.0)
            .chain(points.windows(2).map(|w| w[0].location.distance(&w[1].location)))
            .collect();
        Ok(Self { points, legs })
    }

    pub fn points(&self) -> &[TaskPoint] { &self.points }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn last_index(&self) -> usize { self.points.len() - 1 }

    /// Length of the leg ending at `index` in metres.
    pub fn leg(&self, index: usize) -> f64 { self.legs.get(index).copied().unwrap_or(0.0) }

    /// Nominal task distance from start to finish.
    pub fn total_distance(&self) -> f64 { self.legs.iter().sum() }

    /// Sum of the legs after `index`.
    pub fn distance_after(&self, index: usize) -> f64 { self.legs.iter().skip(index + 1).sum() }

    /// Sum of the legs up to and including the one ending at `index`.
    pub fn distance_until(&self, index: usize) -> f64 { self.legs.iter().take(index + 1).sum() }

    /// Direction of flight through point `index`: the outbound leg for the start, the inbound
    /// leg for every other point.
    fn flight_direction(&self, index: usize) -> f64 {
        if index == 0 {
            self.points[0].location.bearing(&self.points[1].location)
        } else {
            self.points[index - 1].location.bearing(&self.points[index].location)
        }
    }

    /// Whether `location` lies in the zone of point `index`.
    ///
    /// For lines "inside" means beyond the line in flight direction and within half its
    /// length laterally.
    pub fn is_inside(&self, index: usize, location: &GeoPoint) -> bool {
        let point = &self.points[index];
        match point.zone {
            ObservationZone::Cylinder { radius } => point.location.distance(location) <= radius,
            ObservationZone::Line { length } => {
                let (along, lateral) = self.line_coordinates(index, location);
                along >= 0.0 && lateral.abs() <= length / 2.0
            }
        }
    }

    /// Whether the path from `from` to `to` crosses the line of point `index` in flight
    /// direction. Always `false` for cylinders.
    pub fn crosses_line(&self, index: usize, from: &GeoPoint, to: &GeoPoint) -> bool {
        let ObservationZone::Line { length } = self.points[index].zone else {
            return false;
        };
        let (a0, l0) = self.line_coordinates(index, from);
        let (a1, l1) = self.line_coordinates(index, to);
        if a0 >= 0.0 || a1 < 0.0 {
            return false;
        }
        let t = a0 / (a0 - a1);
        let lateral = l0 + (l1 - l0) * t;
        lateral.abs() <= length / 2.0
    }

    /// `(along, lateral)` coordinates in metres relative to the line through point `index`;
    /// `lateral` is signed.
    fn line_coordinates(&self, index: usize, location: &GeoPoint) -> (f64, f64) {
        let proj = FlatProjection::new(self.points[index].location);
        let v = proj.project(location);
        let dir = Vec2D::from_bearing(self.flight_direction(index), 1.0);
        (v.dot(dir), dir.cross(v))
    }
}
