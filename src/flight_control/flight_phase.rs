use crate::settings::FlightPhaseSettings;
use chrono::{DateTime, Utc};
use strum_macros::Display;

/// Coarse flight phase of the aircraft.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Display)]
pub enum FlightPhase {
    #[default]
    NotFlying,
    Flying,
}

/// Edge raised when the classification changes between two cycles.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Display)]
pub enum PhaseEdge {
    Takeoff,
    Landing,
}

/// Hysteresis classifier turning noisy ground speed and climb samples into a [`FlightPhase`].
///
/// A new phase is only adopted after its condition held continuously for the configured dwell
/// time. Samples that satisfy neither condition (speeds between the landing and takeoff
/// thresholds) cancel a pending transition, which is what rejects GPS chatter around
/// standstill.
#[derive(Debug, Clone)]
pub struct PhaseClassifier {
    settings: FlightPhaseSettings,
    phase: FlightPhase,
    /// Start of the run of samples supporting the opposite phase.
    pending_since: Option<DateTime<Utc>>,
}

impl PhaseClassifier {
    pub fn new(settings: FlightPhaseSettings) -> Self {
        Self { settings, phase: FlightPhase::NotFlying, pending_since: None }
    }

    pub fn phase(&self) -> FlightPhase { self.phase }

    /// Feeds one sample and returns the resulting classification.
    ///
    /// A missing ground speed keeps the current phase and leaves a pending transition
    /// untouched; the dwell timer simply does not advance on such a cycle.
    pub fn update(
        &mut self,
        time: DateTime<Utc>,
        ground_speed: Option<f64>,
        vertical_speed: Option<f64>,
    ) -> FlightPhase {
        let Some(speed) = ground_speed else {
            return self.phase;
        };
        let climb = vertical_speed.map_or(0.0, f64::abs);
        let (supports_switch, dwell) = match self.phase {
            FlightPhase::NotFlying => (
                speed >= self.settings.takeoff_speed || climb >= self.settings.climb_threshold,
                self.settings.takeoff_dwell(),
            ),
            FlightPhase::Flying => (
                speed < self.settings.landing_speed && climb < self.settings.climb_threshold,
                self.settings.landing_dwell(),
            ),
        };
        if !supports_switch {
            self.pending_since = None;
            return self.phase;
        }
        let since = *self.pending_since.get_or_insert(time);
        if time - since >= dwell {
            self.phase = match self.phase {
                FlightPhase::NotFlying => FlightPhase::Flying,
                FlightPhase::Flying => FlightPhase::NotFlying,
            };
            self.pending_since = None;
        }
        self.phase
    }

    /// Drops a pending transition. Called after a time warp.
    pub fn reset_timers(&mut self) { self.pending_since = None; }
}

/// Compares consecutive classifications and reports each change exactly once.
#[derive(Debug, Clone, Default)]
pub struct PhaseEdgeDetector {
    last: FlightPhase,
}

impl PhaseEdgeDetector {
    pub fn update(&mut self, current: FlightPhase) -> Option<PhaseEdge> {
        let previous = std::mem::replace(&mut self.last, current);
        match (previous, current) {
            (FlightPhase::NotFlying, FlightPhase::Flying) => Some(PhaseEdge::Takeoff),
            (FlightPhase::Flying, FlightPhase::NotFlying) => Some(PhaseEdge::Landing),
            _ => None,
        }
    }

    pub fn last(&self) -> FlightPhase { self.last }
}
