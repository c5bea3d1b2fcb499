use crate::flight_control::common::geo::GeoPoint;
use chrono::{DateTime, Utc};
use strum_macros::Display;
use tokio::sync::broadcast;

/// One-shot notifications raised by the orchestrator.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum FlightEvent {
    Takeoff { time: DateTime<Utc>, location: Option<GeoPoint> },
    Landing { time: DateTime<Utc>, location: Option<GeoPoint> },
    TaskStart { time: DateTime<Utc> },
    TaskFinish { time: DateTime<Utc> },
    ZoneEntry { time: DateTime<Utc>, index: usize, name: String },
    TimeWarp { from: DateTime<Utc>, to: DateTime<Utc> },
}

/// Broadcast hub fanning [`FlightEvent`]s out to audio, logging and UI subscribers.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<FlightEvent>,
}

impl EventHub {
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlightEvent> { self.tx.subscribe() }

    /// Sends `event` to all current subscribers. Having none is not an error.
    pub fn emit(&self, event: FlightEvent) {
        crate::event!("Emitting {event}");
        let _ = self.tx.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self { Self::new() }
}
