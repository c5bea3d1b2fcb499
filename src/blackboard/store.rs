use super::{derived::DerivedState, fix::Fix};
use std::sync::Arc;
use tokio::sync::watch;

/// The published pair of raw input and derived state.
#[derive(Debug, Clone, Default)]
pub struct FlightSnapshot {
    pub fix: Option<Fix>,
    pub derived: DerivedState,
}

/// Single-writer store of the current [`FlightSnapshot`].
///
/// The orchestrator builds every snapshot off to the side and swaps it in as a whole, so a
/// reader only ever holds complete snapshots. Reading never blocks the writer for longer
/// than an `Arc` clone.
#[derive(Debug)]
pub struct Blackboard {
    tx: watch::Sender<Arc<FlightSnapshot>>,
}

impl Blackboard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(FlightSnapshot::default()));
        Self { tx }
    }

    /// The current snapshot.
    pub fn read(&self) -> Arc<FlightSnapshot> { Arc::clone(&self.tx.borrow()) }

    /// A receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FlightSnapshot>> { self.tx.subscribe() }

    /// Version of the current snapshot.
    pub fn version(&self) -> u64 { self.tx.borrow().derived.version }

    /// Replaces the current snapshot.
    pub(crate) fn publish(&self, snapshot: FlightSnapshot) {
        crate::event!("Publishing snapshot v{}", snapshot.derived.version);
        self.tx.send_replace(Arc::new(snapshot));
    }
}

impl Default for Blackboard {
    fn default() -> Self { Self::new() }
}
