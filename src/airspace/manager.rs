use super::{
    hazard::{Hazard, HazardId, HazardRegister, GroundResolver, RegisteredHazard},
    intercept::{AircraftState, InterceptSolution, InterceptSolver},
    warning::{WarningRecord, WarningState},
};
use crate::flight_control::common::{geo::FlatProjection, polar::GlidePolar, vec2d::Vec2D};
use crate::settings::{AirspaceSettings, secs};
use crate::{alert, event, info};
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use std::collections::HashMap;

/// Outcome of classifying one hazard against the aircraft.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Classification {
    state: WarningState,
    solution: Option<InterceptSolution>,
    distance: f64,
}

/// Counters of one warning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassSummary {
    pub evaluated: usize,
    pub created: usize,
    pub pruned: usize,
}

/// Owner of the warning records.
///
/// Shared through a [`crate::blackboard::Protected`] facade: the orchestrator runs the passes,
/// UI code acknowledges through exclusive leases.
#[derive(Debug)]
pub struct AirspaceWarningManager {
    register: HazardRegister,
    records: HashMap<HazardId, WarningRecord>,
    settings: AirspaceSettings,
    polar: GlidePolar,
    utc_offset: FixedOffset,
    /// Rotating position of the incremental scan for hazards without a record.
    cursor: usize,
}

impl AirspaceWarningManager {
    pub fn new(
        register: HazardRegister,
        settings: AirspaceSettings,
        polar: GlidePolar,
        utc_offset: FixedOffset,
    ) -> Self {
        Self { register, records: HashMap::new(), settings, polar, utc_offset, cursor: 0 }
    }

    pub fn register(&self) -> &HazardRegister { &self.register }

    pub fn settings(&self) -> &AirspaceSettings { &self.settings }

    pub fn set_settings(&mut self, settings: AirspaceSettings, polar: GlidePolar, utc_offset: FixedOffset) {
        self.settings = settings;
        self.polar = polar;
        self.utc_offset = utc_offset;
    }

    /// Replaces the hazard set. Records of hazards that are still present survive with their
    /// acknowledgements, all others are dropped.
    pub fn set_hazards(&mut self, hazards: Vec<Hazard>, ground: &dyn GroundResolver) {
        self.register = HazardRegister::new(hazards, ground);
        let register = &self.register;
        self.records.retain(|id, _| register.contains(*id));
        self.cursor = 0;
        info!("Loaded {} hazards, {} rejected, {} records kept", register.len(), register.rejected().len(), self.records.len());
    }

    pub fn record(&self, id: HazardId) -> Option<&WarningRecord> { self.records.get(&id) }

    pub fn records(&self) -> impl Iterator<Item = &WarningRecord> { self.records.values() }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Runs one warning pass at `now`.
    ///
    /// An exhaustive pass classifies every hazard; an incremental one classifies all hazards
    /// with a record plus up to `incremental_budget` others, continuing where the previous pass
    /// stopped. Without an aircraft state nothing is classified, only pruning happens.
    pub fn update(&mut self, aircraft: Option<&AircraftState>, now: DateTime<Utc>, exhaustive: bool) -> PassSummary {
        let mut summary = PassSummary::default();
        if let Some(aircraft) = aircraft {
            for index in self.selection(exhaustive) {
                let Some(entry) = self.register.entries().get(index) else {
                    continue;
                };
                summary.evaluated += 1;
                let id = entry.id();
                match classify(entry, aircraft, &self.settings, &self.polar) {
                    Some(c) => {
                        let fresh = !self.records.contains_key(&id);
                        let record = self.records.entry(id).or_insert_with(|| {
                            WarningRecord::new(id, entry.hazard().name.clone(), entry.hazard().class, now)
                        });
                        let previous = record.state();
                        record.apply(c.state, c.solution, c.distance, fresh, now);
                        if fresh {
                            summary.created += 1;
                        }
                        if record.state() != previous {
                            event!("Hazard {id} {} changed {previous} -> {}", record.name(), record.state());
                            if record.state() > previous && record.is_alerting(now) {
                                alert!("{} {}: {}", record.state(), record.class(), record.name());
                            }
                        }
                    }
                    None => {
                        if let Some(record) = self.records.get_mut(&id) {
                            record.mark_irrelevant(now);
                        }
                    }
                }
            }
        }
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_prunable(now));
        summary.pruned = before - self.records.len();
        summary
    }

    /// Register indices to classify in this pass.
    fn selection(&mut self, exhaustive: bool) -> Vec<usize> {
        let n = self.register.len();
        if exhaustive || n == 0 {
            return (0..n).collect();
        }
        let mut selected: Vec<usize> = self.records.keys().filter_map(|id| self.register.position(*id)).collect();
        let mut fresh = 0;
        let mut steps = 0;
        while fresh < self.settings.incremental_budget && steps < n {
            let index = (self.cursor + steps) % n;
            steps += 1;
            if !self.records.contains_key(&self.register.entries()[index].id()) {
                selected.push(index);
                fresh += 1;
            }
        }
        self.cursor = (self.cursor + steps) % n;
        selected
    }

    /// Acknowledges the NEAR warning of `id` for the acknowledgement duration.
    ///
    /// # Returns
    /// `false` if no record exists for `id`.
    pub fn ack_warning(&mut self, id: HazardId, now: DateTime<Utc>) -> bool {
        let until = now + self.settings.ack_duration();
        self.records.get_mut(&id).map(|r| r.ack_warning.set(until)).is_some()
    }

    /// Acknowledges the INSIDE warning of `id` for the acknowledgement duration.
    pub fn ack_inside(&mut self, id: HazardId, now: DateTime<Utc>) -> bool {
        let until = now + self.settings.ack_duration();
        self.records.get_mut(&id).map(|r| r.ack_inside.set(until)).is_some()
    }

    /// Silences `id` until the next local midnight.
    pub fn ack_day(&mut self, id: HazardId, now: DateTime<Utc>) -> bool {
        let until = next_local_midnight(now, self.utc_offset);
        self.records.get_mut(&id).map(|r| r.ack_day.set(until)).is_some()
    }

    /// Hazards currently demanding attention, most severe first.
    pub fn alerts(&self, now: DateTime<Utc>) -> Vec<HazardId> {
        let mut alerting: Vec<&WarningRecord> = self.records.values().filter(|r| r.is_alerting(now)).collect();
        alerting.sort_by(|a, b| severity_order(a, b));
        alerting.into_iter().map(WarningRecord::hazard).collect()
    }

    /// Copies of all records, most severe first.
    pub fn warnings(&self) -> Vec<WarningRecord> {
        let mut records: Vec<WarningRecord> = self.records.values().cloned().collect();
        records.sort_by(severity_order);
        records
    }
}

fn severity_order(a: &WarningRecord, b: &WarningRecord) -> std::cmp::Ordering {
    let time = |r: &WarningRecord| r.solution().map_or(TimeDelta::MAX, |s| s.time);
    b.state()
        .cmp(&a.state())
        .then(a.class().cmp(&b.class()))
        .then(time(a).cmp(&time(b)))
        .then(a.hazard().cmp(&b.hazard()))
}

/// First instant of the next local day.
fn next_local_midnight(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    now.with_timezone(&offset)
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_local_timezone(offset).single())
        .map_or(now + TimeDelta::days(1), |local| local.with_timezone(&Utc))
}

/// Classifies one hazard, `None` if it is out of reach.
fn classify(
    entry: &RegisteredHazard,
    aircraft: &AircraftState,
    settings: &AirspaceSettings,
    polar: &GlidePolar,
) -> Option<Classification> {
    let solver = InterceptSolver::new(settings, polar);
    let buffer = settings.altitude_buffer;
    if let Some(altitude) = aircraft.altitude {
        let reach = solver.projected_climb(aircraft) * settings.horizon_time_s;
        if !entry.band_overlaps(altitude + reach.min(0.0), altitude + reach.max(0.0), buffer) {
            return None;
        }
    }
    let shape = entry.local_shape(&FlatProjection::new(aircraft.location));
    let origin = Vec2D::zero();
    let distance = shape.distance(origin);
    if distance > settings.horizon_distance + settings.near_distance {
        return None;
    }
    if shape.contains(origin) && aircraft.altitude.is_none_or(|alt| entry.band_contains(alt, buffer)) {
        return Some(Classification { state: WarningState::Inside, solution: None, distance });
    }
    let solution = solver.solve(entry, &shape, aircraft);
    let near_time = secs(settings.near_time_s);
    let state = match solution {
        Some(s) if s.distance <= settings.near_distance || s.time <= near_time => WarningState::Near,
        _ => WarningState::Clear,
    };
    Some(Classification { state, solution, distance })
}
