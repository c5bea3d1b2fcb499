use crate::flight_control::common::geo::GeoPoint;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;

/// A single sample of the position history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
    pub altitude: Option<f64>,
    pub vertical_speed: Option<f64>,
}

/// Bounded, time-ordered position history.
///
/// Points closer than the configured minimum spacing to the previous one are rejected; once
/// `capacity` is reached the oldest point is evicted.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    points: VecDeque<TracePoint>,
    capacity: usize,
}

impl Trace {
    pub fn new(capacity: usize) -> Self {
        Self { points: VecDeque::with_capacity(capacity.min(1024)), capacity: capacity.max(1) }
    }

    /// Appends `point` if it lies at least `min_spacing` after the last stored point.
    ///
    /// # Returns
    /// `true` if the point was accepted.
    pub fn push(&mut self, point: TracePoint, min_spacing: TimeDelta) -> bool {
        if !self.accepts(point.time, min_spacing) {
            return false;
        }
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
        true
    }

    /// Whether a point at `time` would be accepted by [`Trace::push`].
    pub fn accepts(&self, time: DateTime<Utc>, min_spacing: TimeDelta) -> bool {
        self.points.back().is_none_or(|last| time - last.time >= min_spacing)
    }

    pub fn clear(&mut self) { self.points.clear(); }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn last(&self) -> Option<&TracePoint> { self.points.back() }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TracePoint> { self.points.iter() }

    /// Points newer than `since`, newest first.
    pub fn iter_since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &TracePoint> {
        self.points.iter().rev().take_while(move |p| p.time >= since)
    }

    /// Largest absolute vertical speed among the points newer than `since`.
    pub fn peak_vertical_speed(&self, since: DateTime<Utc>) -> Option<f64> {
        self.iter_since(since).filter_map(|p| p.vertical_speed).map(f64::abs).reduce(f64::max)
    }
}
