use crate::airspace::{AirspaceWarningManager, GroundResolver, Hazard, HazardRegister};
use crate::blackboard::{Blackboard, Protected};
use crate::flight_control::{
    events::EventHub,
    task::{AdvanceMode, TaskManager, TaskPlan},
};
use crate::settings::ComputerSettings;
use std::sync::Arc;

/// Bundle of the handles shared between the orchestrator and its readers: the published
/// flight state, the task manager, the warning manager and the event hub.
///
/// Built once at startup and cloned into every task that needs access. Several keychains can
/// coexist; nothing in the crate is global.
#[derive(Debug, Clone)]
pub struct Keychain {
    /// The published flight state.
    blackboard: Arc<Blackboard>,
    /// The task plan and its progress.
    task: Arc<Protected<TaskManager>>,
    /// The hazard set and its warning records.
    warnings: Arc<Protected<AirspaceWarningManager>>,
    /// One-shot flight events.
    events: EventHub,
}

impl Keychain {
    /// Creates a new `Keychain`.
    ///
    /// # Arguments
    /// - `settings`: Settings the warning manager is configured from.
    /// - `plan`: The initial task plan, if any.
    /// - `hazards`: The initial hazard set.
    /// - `ground`: Terrain lookup resolving AGL limits of `hazards`.
    pub fn new(
        settings: &ComputerSettings,
        plan: Option<TaskPlan>,
        hazards: Vec<Hazard>,
        ground: &dyn GroundResolver,
    ) -> Self {
        let register = HazardRegister::new(hazards, ground);
        let warnings =
            AirspaceWarningManager::new(register, settings.airspace, settings.polar, settings.utc_offset());
        Self {
            blackboard: Arc::new(Blackboard::new()),
            task: Arc::new(Protected::new(TaskManager::new(plan, AdvanceMode::Auto))),
            warnings: Arc::new(Protected::new(warnings)),
            events: EventHub::new(),
        }
    }

    /// Provides a cloned reference to the blackboard.
    pub fn blackboard(&self) -> Arc<Blackboard> { Arc::clone(&self.blackboard) }

    /// Provides a cloned reference to the task manager facade.
    pub fn task(&self) -> Arc<Protected<TaskManager>> { Arc::clone(&self.task) }

    /// Provides a cloned reference to the warning manager facade.
    pub fn warnings(&self) -> Arc<Protected<AirspaceWarningManager>> { Arc::clone(&self.warnings) }

    pub fn events(&self) -> &EventHub { &self.events }
}
