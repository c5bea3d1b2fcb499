use super::{
    hazard::{HazardClass, HazardId},
    intercept::InterceptSolution,
};
use chrono::{DateTime, Utc};
use strum_macros::Display;

/// Severity of a warning, ordered from harmless to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display)]
pub enum WarningState {
    #[default]
    Clear,
    Near,
    Inside,
}

/// One acknowledgement slot of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Acknowledgement {
    expiry: Option<DateTime<Utc>>,
}

impl Acknowledgement {
    /// Never acknowledged counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expiry.is_none_or(|expiry| now > expiry) }

    pub fn expiry(&self) -> Option<DateTime<Utc>> { self.expiry }

    pub(crate) fn set(&mut self, expiry: DateTime<Utc>) { self.expiry = Some(expiry); }

    pub(crate) fn clear(&mut self) { self.expiry = None; }
}

/// Warning bookkeeping for one relevant hazard.
#[derive(Debug, Clone, PartialEq)]
pub struct WarningRecord {
    hazard: HazardId,
    name: String,
    class: HazardClass,
    state: WarningState,
    solution: Option<InterceptSolution>,
    /// Horizontal distance to the outline at the last evaluation.
    distance: Option<f64>,
    relevant: bool,
    pub(crate) ack_warning: Acknowledgement,
    pub(crate) ack_inside: Acknowledgement,
    pub(crate) ack_day: Acknowledgement,
    updated: DateTime<Utc>,
}

impl WarningRecord {
    pub(crate) fn new(hazard: HazardId, name: String, class: HazardClass, now: DateTime<Utc>) -> Self {
        Self {
            hazard,
            name,
            class,
            state: WarningState::Clear,
            solution: None,
            distance: None,
            relevant: true,
            ack_warning: Acknowledgement::default(),
            ack_inside: Acknowledgement::default(),
            ack_day: Acknowledgement::default(),
            updated: now,
        }
    }

    pub fn hazard(&self) -> HazardId { self.hazard }
    pub fn name(&self) -> &str { &self.name }
    pub fn class(&self) -> HazardClass { self.class }
    pub fn state(&self) -> WarningState { self.state }
    pub fn solution(&self) -> Option<&InterceptSolution> { self.solution.as_ref() }
    pub fn distance(&self) -> Option<f64> { self.distance }
    pub fn is_relevant(&self) -> bool { self.relevant }
    pub fn updated(&self) -> DateTime<Utc> { self.updated }
    pub fn ack_warning(&self) -> &Acknowledgement { &self.ack_warning }
    pub fn ack_inside(&self) -> &Acknowledgement { &self.ack_inside }
    pub fn ack_day(&self) -> &Acknowledgement { &self.ack_day }

    /// Applies a new classification.
    ///
    /// Escalation clears the acknowledgement of the tier entered so the pilot has to confirm
    /// again; de-escalation keeps all acknowledgements. An existing CLEAR record escalates to
    /// NEAR before it may become INSIDE in a later cycle.
    pub(crate) fn apply(
        &mut self,
        state: WarningState,
        solution: Option<InterceptSolution>,
        distance: f64,
        fresh: bool,
        now: DateTime<Utc>,
    ) {
        let state = if !fresh && self.state == WarningState::Clear && state == WarningState::Inside {
            WarningState::Near
        } else {
            state
        };
        if state > self.state {
            match state {
                WarningState::Near => self.ack_warning.clear(),
                WarningState::Inside => self.ack_inside.clear(),
                WarningState::Clear => {}
            }
        }
        self.state = state;
        self.solution = solution;
        self.distance = Some(distance);
        self.relevant = true;
        self.updated = now;
    }

    /// Marks the hazard as out of reach. The record is CLEAR from now on.
    pub(crate) fn mark_irrelevant(&mut self, now: DateTime<Utc>) {
        self.state = WarningState::Clear;
        self.solution = None;
        self.relevant = false;
        self.updated = now;
    }

    /// Whether an unexpired acknowledgement hides this record from the alert list.
    pub fn is_suppressed(&self, now: DateTime<Utc>) -> bool {
        if !self.ack_day.is_expired(now) {
            return true;
        }
        match self.state {
            WarningState::Near => !self.ack_warning.is_expired(now),
            WarningState::Inside => !self.ack_inside.is_expired(now),
            WarningState::Clear => false,
        }
    }

    /// NEAR or INSIDE and not suppressed.
    pub fn is_alerting(&self, now: DateTime<Utc>) -> bool {
        self.state != WarningState::Clear && !self.is_suppressed(now)
    }

    pub fn all_acks_expired(&self, now: DateTime<Utc>) -> bool {
        self.ack_warning.is_expired(now) && self.ack_inside.is_expired(now) && self.ack_day.is_expired(now)
    }

    /// Prunable once out of reach, CLEAR and without a live acknowledgement.
    pub fn is_prunable(&self, now: DateTime<Utc>) -> bool {
        !self.relevant && self.state == WarningState::Clear && self.all_acks_expired(now)
    }
}
