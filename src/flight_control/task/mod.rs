mod plan;
mod progress;
mod task_manager;

pub use plan::{ObservationZone, TaskPlan, TaskPlanError, TaskPoint};
pub use progress::{TaskProgress, TaskTransition};
pub use task_manager::{AdvanceMode, TaskManager};
