use super::{
    plan::{ObservationZone, TaskPlan},
    progress::{TaskProgress, TaskTransition},
};
use crate::flight_control::common::geo::GeoPoint;
use crate::{info, log};
use chrono::{DateTime, Utc};
use strum_macros::Display;

/// How the active task point moves on once its zone has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum AdvanceMode {
    /// The pilot selects the next point by hand.
    Manual,
    /// The next point is activated as soon as the active zone was reached.
    #[default]
    Auto,
}

/// Owner of the task plan and its progress.
///
/// Lives behind a [`crate::blackboard::Protected`] facade: the orchestrator advances it once per
/// fix, UI code replaces the plan or changes the active point through exclusive leases.
#[derive(Debug, Default)]
pub struct TaskManager {
    plan: Option<TaskPlan>,
    progress: TaskProgress,
    mode: AdvanceMode,
    /// Previous location fed to [`TaskManager::update_progress`].
    last_location: Option<GeoPoint>,
    /// Whether the previous location was inside the start zone.
    inside_start: bool,
    /// The active zone was reached and the point is waiting to be advanced.
    pending_advance: bool,
    /// Progress as it was when the task was finished.
    finish_snapshot: Option<TaskProgress>,
}

impl TaskManager {
    pub fn new(plan: Option<TaskPlan>, mode: AdvanceMode) -> Self {
        let mut manager = Self { mode, ..Self::default() };
        manager.set_plan(plan);
        manager
    }

    /// Replaces the plan and resets all progress.
    pub fn set_plan(&mut self, plan: Option<TaskPlan>) {
        let points = plan.as_ref().map_or(0, TaskPlan::len);
        if let Some(p) = &plan {
            info!("Loaded task with {} points, {:.1} km", p.len(), p.total_distance() / 1000.0);
        }
        self.plan = plan;
        self.progress = TaskProgress::new(points);
        self.last_location = None;
        self.inside_start = false;
        self.pending_advance = false;
        self.finish_snapshot = None;
    }

    pub fn plan(&self) -> Option<&TaskPlan> { self.plan.as_ref() }

    pub fn progress(&self) -> &TaskProgress { &self.progress }

    pub fn mode(&self) -> AdvanceMode { self.mode }

    pub fn set_mode(&mut self, mode: AdvanceMode) { self.mode = mode; }

    /// Advances the progress with one position.
    ///
    /// Only the active point is observed. The start is taken when leaving the start cylinder
    /// (or crossing the start line); every other point counts when its zone is entered; the
    /// last point finishes the task.
    ///
    /// # Returns
    /// The transitions that happened with this position, in order.
    pub fn update_progress(&mut self, time: DateTime<Utc>, location: Option<GeoPoint>) -> Vec<TaskTransition> {
        let mut transitions = Vec::new();
        let Some(plan) = &self.plan else {
            return transitions;
        };
        let Some(location) = location else {
            self.progress.distance_achieved = None;
            self.progress.distance_remaining = None;
            return transitions;
        };
        let index = self.progress.active_index;
        let previous = self.last_location.replace(location);

        if !self.progress.finished && !self.pending_advance {
            let reached = if index == 0 {
                let inside = plan.is_inside(0, &location);
                let reached = match plan.points()[0].zone() {
                    ObservationZone::Cylinder { .. } => self.inside_start && !inside,
                    ObservationZone::Line { .. } => {
                        previous.is_some_and(|from| plan.crosses_line(0, &from, &location))
                    }
                };
                self.inside_start = inside;
                reached
            } else {
                match plan.points()[index].zone() {
                    ObservationZone::Cylinder { .. } => plan.is_inside(index, &location),
                    ObservationZone::Line { .. } => {
                        previous.is_some_and(|from| plan.crosses_line(index, &from, &location))
                    }
                }
            };
            if reached {
                self.progress.zone_entered.set(index, true);
                transitions.push(TaskTransition::ZoneEntered(index));
                if index == 0 {
                    self.progress.started = true;
                    self.progress.start_time = Some(time);
                    transitions.push(TaskTransition::Started);
                    log!("Task started at {time}");
                }
                if index == plan.last_index() {
                    self.progress.finished = true;
                    self.progress.finish_time = Some(time);
                    transitions.push(TaskTransition::Finished);
                    log!("Task finished at {time}");
                } else {
                    self.pending_advance = true;
                }
            }
        }

        self.update_distances(&location);
        self.progress.elapsed = self.progress.start_time.map(|start| time - start);
        if transitions.contains(&TaskTransition::Finished) {
            self.finish_snapshot = Some(self.progress.clone());
        }
        transitions
    }

    fn update_distances(&mut self, location: &GeoPoint) {
        let Some(plan) = &self.plan else {
            return;
        };
        let total = plan.total_distance();
        let (achieved, remaining) = if self.progress.finished {
            (total, 0.0)
        } else if !self.progress.started {
            (0.0, total)
        } else {
            let target = self.progress.active_index.max(1);
            let to_target = plan.points()[target].location().distance(location);
            let achieved = plan.distance_until(target - 1) + (plan.leg(target) - to_target).max(0.0);
            (achieved, to_target + plan.distance_after(target))
        };
        self.progress.distance_achieved = Some(achieved);
        self.progress.distance_remaining = Some(remaining);
    }

    /// Moves the active point on if its zone was reached and the mode is automatic.
    ///
    /// # Returns
    /// The new active index if it changed.
    pub fn advance_auto(&mut self) -> Option<usize> {
        if self.mode != AdvanceMode::Auto || !self.pending_advance {
            return None;
        }
        self.pending_advance = false;
        self.select_next()
    }

    /// Activates the next task point. Returns the new index if it changed.
    pub fn select_next(&mut self) -> Option<usize> {
        let last = self.plan.as_ref()?.last_index();
        if self.progress.active_index >= last {
            return None;
        }
        self.progress.active_index += 1;
        self.pending_advance = false;
        Some(self.progress.active_index)
    }

    /// Activates the previous task point. Returns the new index if it changed.
    pub fn select_previous(&mut self) -> Option<usize> {
        self.plan.as_ref()?;
        if self.progress.active_index == 0 {
            return None;
        }
        self.progress.active_index -= 1;
        self.pending_advance = false;
        if self.progress.active_index == 0 {
            self.inside_start = false;
        }
        Some(self.progress.active_index)
    }

    /// Stores the current progress as the finish state to fall back to. Called on takeoff;
    /// replaced by the real finish state when the task is finished.
    pub fn snapshot_finish(&mut self) {
        self.finish_snapshot = Some(self.progress.clone());
    }

    /// Restores the progress as it was at the finish, if the task had been finished.
    ///
    /// # Returns
    /// `true` if the progress was restored.
    pub fn restore_finish(&mut self) -> bool {
        if !self.progress.finished {
            return false;
        }
        match self.finish_snapshot.clone() {
            Some(snapshot) if snapshot.finished => {
                self.progress = snapshot;
                true
            }
            _ => false,
        }
    }
}
