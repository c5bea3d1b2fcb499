use super::{glide_computer::GlideComputer, slow_derived::TeammateReport};
use crate::blackboard::Fix;
use crate::info;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Sending halves feeding a running [`Supervisor`].
#[derive(Debug, Clone)]
pub struct Feeds {
    pub fixes: mpsc::Sender<Fix>,
    pub teammates: mpsc::Sender<TeammateReport>,
}

/// Dedicated task owning the [`GlideComputer`].
///
/// Fixes are processed as they arrive; the idle path runs whenever a fix asks for it and on a
/// timer, so acknowledgement expiry keeps being evaluated without fixes.
pub struct Supervisor {
    computer: GlideComputer,
    fixes: mpsc::Receiver<Fix>,
    teammates: mpsc::Receiver<TeammateReport>,
    cancel: CancellationToken,
}

impl Supervisor {
    /// Capacity of the fix queue.
    const FIX_QUEUE: usize = 64;
    /// Capacity of the teammate report queue.
    const TEAMMATE_QUEUE: usize = 8;
    /// Lower bound of the idle timer period.
    const MIN_IDLE_PERIOD: Duration = Duration::from_millis(10);

    /// Creates a new instance of `Supervisor` together with the senders feeding it.
    pub fn new(computer: GlideComputer, cancel: CancellationToken) -> (Supervisor, Feeds) {
        let (fix_tx, fix_rx) = mpsc::channel(Self::FIX_QUEUE);
        let (mate_tx, mate_rx) = mpsc::channel(Self::TEAMMATE_QUEUE);
        (
            Self { computer, fixes: fix_rx, teammates: mate_rx, cancel },
            Feeds { fixes: fix_tx, teammates: mate_tx },
        )
    }

    /// Runs the orchestrator until cancelled or until the fix stream closes.
    ///
    /// One exhaustive idle pass runs at startup. Pending fixes always win over the idle timer.
    ///
    /// # Returns
    /// The orchestrator, for inspection after shutdown.
    pub async fn run(mut self) -> GlideComputer {
        info!("Supervisor started");
        self.computer.on_idle(true);

        let period = self
            .computer
            .settings()
            .idle_min_interval()
            .to_std()
            .map_or(Self::MIN_IDLE_PERIOD, |p| p.max(Self::MIN_IDLE_PERIOD));
        let mut idle = tokio::time::interval(period);
        idle.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Supervisor cancelled");
                    break;
                }
                fix = self.fixes.recv() => {
                    let Some(fix) = fix else {
                        info!("Fix stream closed");
                        break;
                    };
                    if self.computer.on_fix(fix, false) {
                        self.computer.on_idle(false);
                    }
                }
                Some(report) = self.teammates.recv() => {
                    self.computer.set_teammate_position(report.location, report.time);
                }
                _ = idle.tick() => self.computer.on_idle(false),
            }
        }
        self.computer
    }
}
