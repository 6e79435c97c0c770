#![forbid(unsafe_code)]

pub mod analysis;
pub mod app_services;
pub mod card_service;
pub mod error;
pub mod review_service;
pub mod sessions;

pub use recall_core::Clock;

pub use analysis::{AnalyzerPolicy, CardStats, PerformanceAnalyzer};
pub use app_services::{AppServices, ServicePolicies};
pub use card_service::{CardService, CollectionStats};
pub use error::{
    AppServicesError, CardServiceError, PolicyError, ReviewServiceError, SessionError,
    StudyPlanError,
};
pub use review_service::{PersistedReview, ReviewResult, ReviewService};
pub use sessions::{PlanPolicy, SessionRecorder, StudyPlanBuilder, StudyPlanService};
