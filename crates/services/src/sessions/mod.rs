mod plan;
mod recorder;
mod service;

// Public API of the session subsystem.
pub use crate::error::{SessionError, StudyPlanError};
pub use plan::{PlanPolicy, StudyPlanBuilder, due_cards, priority_score};
pub use recorder::SessionRecorder;
pub use service::StudyPlanService;
