use bitvec::prelude::*;
use chrono::{DateTime, TimeDelta, Utc};

/// Progress along the active task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskProgress {
    /// Index of the task point currently aimed at.
    pub active_index: usize,
    /// One flag per task point, set once its zone has been reached.
    pub zone_entered: BitVec,
    pub started: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub finished: bool,
    pub finish_time: Option<DateTime<Utc>>,
    /// Distance achieved along the legs, in metres.
    pub distance_achieved: Option<f64>,
    /// Distance still to fly along the legs, in metres.
    pub distance_remaining: Option<f64>,
    /// Time since the start.
    pub elapsed: Option<TimeDelta>,
}

impl TaskProgress {
    pub(crate) fn new(points: usize) -> Self {
        Self { zone_entered: bitvec![0; points], ..Self::default() }
    }

    pub fn has_entered(&self, index: usize) -> bool {
        self.zone_entered.get(index).is_some_and(|flag| *flag)
    }

    /// Average task speed in m/s, available once started and some time has passed.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_speed(&self) -> Option<f64> {
        let secs = self.elapsed?.num_milliseconds() as f64 / 1000.0;
        let achieved = self.distance_achieved?;
        (secs > 0.0).then(|| achieved / secs)
    }
}

/// Transitions observed while advancing the progress by one fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTransition {
    Started,
    ZoneEntered(usize),
    Finished,
}
