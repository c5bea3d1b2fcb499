use super::{
    air_data::AirDataComputer,
    events::FlightEvent,
    flight_phase::{FlightPhase, PhaseClassifier, PhaseEdge, PhaseEdgeDetector},
    slow_derived::{self, TeammateReport, Throttle},
    stage::{PIPELINE, Stage},
    task::{TaskManager, TaskTransition},
    working_band::WorkingBand,
};
use crate::airspace::AircraftState;
use crate::blackboard::{DerivedState, FlightSnapshot, Fix, Trace, TracePoint};
use crate::flight_control::common::geo::GeoPoint;
use crate::keychain::Keychain;
use crate::settings::ComputerSettings;
use crate::{event, info, log, warn};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// State carried through the stages of one fix cycle.
#[derive(Debug)]
struct Cycle {
    fix: Fix,
    /// Previous fix time if this fix jumped back in time.
    warped_from: Option<DateTime<Utc>>,
}

/// The orchestrator: sole writer of the derived state.
///
/// [`GlideComputer::on_fix`] runs the stages of [`PIPELINE`] in order for every new fix;
/// [`GlideComputer::on_idle`] runs the lower-priority work (trace logging and the airspace
/// warning pass). Neither ever aborts: a stage lacking its inputs marks its outputs
/// unavailable and the cycle carries on.
#[derive(Debug)]
pub struct GlideComputer {
    settings: ComputerSettings,
    keychain: Keychain,
    /// Working copy of the derived state, published as a whole.
    derived: DerivedState,
    last_fix: Option<Fix>,
    air_data: AirDataComputer,
    classifier: PhaseClassifier,
    edges: PhaseEdgeDetector,
    trace: Arc<Trace>,
    slow_throttle: Throttle,
    teammate: Option<TeammateReport>,
    /// Fix time of the last idle request handed out by [`GlideComputer::on_fix`].
    last_idle_request: Option<DateTime<Utc>>,
}

impl GlideComputer {
    pub fn new(settings: ComputerSettings, keychain: Keychain) -> Self {
        let trace = Arc::new(Trace::new(settings.trace.capacity));
        Self {
            classifier: PhaseClassifier::new(settings.phase),
            derived: DerivedState { trace: Arc::clone(&trace), ..DerivedState::default() },
            settings,
            keychain,
            last_fix: None,
            air_data: AirDataComputer::default(),
            edges: PhaseEdgeDetector::default(),
            trace,
            slow_throttle: Throttle::default(),
            teammate: None,
            last_idle_request: None,
        }
    }

    pub fn settings(&self) -> &ComputerSettings { &self.settings }

    pub fn keychain(&self) -> &Keychain { &self.keychain }

    /// The working copy of the derived state, as of the last stage run.
    pub fn derived(&self) -> &DerivedState { &self.derived }

    /// Stores the latest reported teammate position; picked up by the next slow update.
    pub fn set_teammate_position(&mut self, location: GeoPoint, time: DateTime<Utc>) {
        self.teammate = Some(TeammateReport { location, time });
    }

    /// Processes one fix.
    ///
    /// A fix carrying the same timestamp as the previous one is ignored unless `force` is set.
    ///
    /// # Returns
    /// Whether the idle path should run as well; `true` at most once per
    /// `idle_min_interval` of fix time.
    pub fn on_fix(&mut self, fix: Fix, force: bool) -> bool {
        if !force && self.last_fix.is_some_and(|last| last.time() == fix.time()) {
            event!("Ignoring duplicate fix at {}", fix.time());
            return false;
        }
        let mut cycle = Cycle { fix, warped_from: None };
        for stage in PIPELINE {
            self.run_stage(stage, &mut cycle);
        }
        self.last_fix = Some(fix);

        let now = fix.time();
        let due = self.last_idle_request.is_none_or(|last| now - last >= self.settings.idle_min_interval());
        if due {
            self.last_idle_request = Some(now);
        }
        due
    }

    fn run_stage(&mut self, stage: Stage, cycle: &mut Cycle) {
        match stage {
            Stage::LocalTime => self.local_time(cycle),
            Stage::AirData => {
                if cycle.warped_from.is_some() {
                    self.air_data.reset();
                }
                self.derived.air = self.air_data.update(&cycle.fix, &self.settings.air_data);
            }
            Stage::TaskProgress => self.task_progress(cycle),
            Stage::WorkingBand => {
                self.derived.working_band = WorkingBand::compute(
                    cycle.fix.altitude(),
                    &self.derived.statistics,
                    &self.settings.working_band,
                );
            }
            Stage::TaskMode => {
                let advanced = self.keychain.task().write(TaskManager::advance_auto);
                if let Some(index) = advanced {
                    log!("Advanced to task point {index}");
                    if let Some(task) = self.derived.task.as_mut() {
                        task.active_index = index;
                    }
                }
            }
            Stage::FlightPhase => self.flight_phase(cycle),
            Stage::SlowDerived => self.slow_derived(cycle),
            Stage::Publish => self.publish(Some(cycle.fix)),
        }
    }

    fn local_time(&mut self, cycle: &mut Cycle) {
        let time = cycle.fix.time();
        self.derived.time = Some(time);
        self.derived.local_time = Some(time.with_timezone(&self.settings.utc_offset()));

        let Some(previous) = self.last_fix.map(|f| f.time()) else {
            return;
        };
        if time >= previous {
            return;
        }
        warn!("Time warp from {previous} back to {time}, resetting history");
        cycle.warped_from = Some(previous);
        self.trace = Arc::new(Trace::new(self.settings.trace.capacity));
        self.derived.trace = Arc::clone(&self.trace);
        self.derived.statistics.reset();
        self.derived.time_warps += 1;
        self.classifier.reset_timers();
        self.slow_throttle.reset();
        self.last_idle_request = None;
        self.keychain.events().emit(FlightEvent::TimeWarp { from: previous, to: time });
    }

    fn task_progress(&mut self, cycle: &Cycle) {
        let time = cycle.fix.time();
        let (transitions, progress) = self.keychain.task().write(|tm| {
            let transitions: Vec<(TaskTransition, Option<String>)> = tm
                .update_progress(time, cycle.fix.location())
                .into_iter()
                .map(|transition| {
                    let name = match transition {
                        TaskTransition::ZoneEntered(index) => {
                            tm.plan().and_then(|plan| plan.points().get(index)).map(|p| p.name().to_string())
                        }
                        _ => None,
                    };
                    (transition, name)
                })
                .collect();
            let progress = tm.plan().is_some().then(|| tm.progress().clone());
            (transitions, progress)
        });
        self.derived.task = progress;
        let events = self.keychain.events();
        for (transition, name) in transitions {
            let event = match transition {
                TaskTransition::Started => FlightEvent::TaskStart { time },
                TaskTransition::Finished => FlightEvent::TaskFinish { time },
                TaskTransition::ZoneEntered(index) => {
                    FlightEvent::ZoneEntry { time, index, name: name.unwrap_or_default() }
                }
            };
            events.emit(event);
        }
    }

    fn flight_phase(&mut self, cycle: &Cycle) {
        let fix = &cycle.fix;
        let time = fix.time();
        let phase = self.classifier.update(time, fix.ground_speed(), self.derived.air.vertical_speed);
        match self.edges.update(phase) {
            Some(PhaseEdge::Takeoff) => self.on_takeoff(fix),
            Some(PhaseEdge::Landing) => self.on_landing(fix),
            None if phase == FlightPhase::Flying => {
                self.derived.statistics.accumulate(time, fix.location(), fix.altitude());
            }
            None => {}
        }
        self.derived.phase = phase;
    }

    /// Starts a new flight: statistics restart and the task progress is snapshotted so a
    /// finish can later be restored.
    fn on_takeoff(&mut self, fix: &Fix) {
        info!("Takeoff at {}", fix.time());
        self.derived.statistics.begin(fix.time(), fix.location(), fix.altitude());
        self.keychain.task().write(TaskManager::snapshot_finish);
        self.keychain.events().emit(FlightEvent::Takeoff { time: fix.time(), location: fix.location() });
    }

    /// Closes the flight and undoes progress drift accumulated after a finished task.
    fn on_landing(&mut self, fix: &Fix) {
        info!("Landing at {}", fix.time());
        self.derived.statistics.end(fix.time());
        let restored = self.keychain.task().write(|tm| tm.restore_finish().then(|| tm.progress().clone()));
        if let Some(progress) = restored {
            log!("Restored task state of the finish");
            self.derived.task = Some(progress);
        }
        self.keychain.events().emit(FlightEvent::Landing { time: fix.time(), location: fix.location() });
    }

    fn slow_derived(&mut self, cycle: &Cycle) {
        let now = cycle.fix.time();
        if !self.slow_throttle.ready(now, self.settings.slow_interval()) {
            return;
        }
        self.derived.vario_scale = Some(slow_derived::vario_scale(&self.trace, now, &self.settings.vario_scale));
        self.derived.teammate =
            slow_derived::teammate_info(cycle.fix.location(), self.teammate, now, self.settings.teammate_timeout());
    }

    fn publish(&mut self, fix: Option<Fix>) {
        self.derived.version += 1;
        let snapshot = FlightSnapshot { fix: fix.or(self.last_fix), derived: self.derived.clone() };
        self.keychain.blackboard().publish(snapshot);
    }

    /// Runs the idle path at the current wall-clock time.
    pub fn on_idle(&mut self, exhaustive: bool) { self.on_idle_at(exhaustive, Utc::now()); }

    /// Runs the idle path at `now`: logs the latest fix into the trace, runs one airspace
    /// warning pass and publishes the result.
    ///
    /// Acknowledgement expiry is evaluated against `now`, so warnings resurface here even
    /// while no fixes arrive.
    pub fn on_idle_at(&mut self, exhaustive: bool, now: DateTime<Utc>) {
        self.log_trace();
        let aircraft = self.aircraft_state();
        let warnings = self.keychain.warnings();
        let summary = warnings.write(|m| m.update(aircraft.as_ref(), now, exhaustive));
        event!("Warning pass: {summary:?}");
        let (records, alerts) = warnings.read(|m| (m.warnings(), m.alerts(now)));
        self.derived.warnings = records;
        self.derived.alerts = alerts;
        self.derived.trace = Arc::clone(&self.trace);
        self.publish(None);
    }

    fn log_trace(&mut self) {
        let Some(fix) = self.last_fix else {
            return;
        };
        let Some(location) = fix.location() else {
            return;
        };
        let spacing = self.settings.trace.min_spacing();
        if !self.trace.accepts(fix.time(), spacing) {
            return;
        }
        let point = TracePoint {
            time: fix.time(),
            location,
            altitude: fix.altitude(),
            vertical_speed: self.derived.air.vertical_speed,
        };
        Arc::make_mut(&mut self.trace).push(point, spacing);
    }

    /// The aircraft as seen by the warning engine, `None` without a position.
    fn aircraft_state(&self) -> Option<AircraftState> {
        let fix = self.last_fix?;
        Some(AircraftState {
            location: fix.location()?,
            altitude: fix.altitude(),
            ground_speed: fix.ground_speed().unwrap_or(0.0),
            track: fix.track().unwrap_or(0.0),
            vertical_speed: self.derived.air.vertical_speed,
        })
    }
}
