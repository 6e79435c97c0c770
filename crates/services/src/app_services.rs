use std::sync::Arc;

use serde::{Deserialize, Serialize};

use recall_core::scheduler::{Scheduler, SchedulerPolicy};
use storage::repository::Storage;

use crate::Clock;
use crate::analysis::{AnalyzerPolicy, PerformanceAnalyzer};
use crate::card_service::CardService;
use crate::error::AppServicesError;
use crate::review_service::ReviewService;
use crate::sessions::{PlanPolicy, SessionRecorder, StudyPlanBuilder, StudyPlanService};

/// Tunable thresholds for every scheduling component.
///
/// Deserializes from `[scheduler]`, `[analyzer]` and `[plan]` tables; missing
/// tables or keys keep their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServicePolicies {
    pub scheduler: SchedulerPolicy,
    pub analyzer: AnalyzerPolicy,
    pub plan: PlanPolicy,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    card_service: Arc<CardService>,
    reviews: Arc<ReviewService>,
    recorder: Arc<SessionRecorder>,
    plans: Arc<StudyPlanService>,
    storage: Storage,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if a policy is invalid or storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policies: ServicePolicies,
    ) -> Result<Self, AppServicesError> {
        // Validate before touching the database.
        let scheduler = Scheduler::try_with_policy(policies.scheduler)?;
        let builder = plan_builder(policies)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage, clock, scheduler, builder))
    }

    /// Build services over an existing storage bundle.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if a policy is invalid.
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        policies: ServicePolicies,
    ) -> Result<Self, AppServicesError> {
        let scheduler = Scheduler::try_with_policy(policies.scheduler)?;
        let builder = plan_builder(policies)?;
        Ok(Self::assemble(storage, clock, scheduler, builder))
    }

    fn assemble(
        storage: Storage,
        clock: Clock,
        scheduler: Scheduler,
        builder: StudyPlanBuilder,
    ) -> Self {
        let card_service = Arc::new(CardService::new(clock, Arc::clone(&storage.cards)));
        let reviews = Arc::new(ReviewService::with_scheduler(scheduler).with_clock(clock));
        let recorder = Arc::new(SessionRecorder::new(clock, Arc::clone(&storage.sessions)));
        let plans = Arc::new(
            StudyPlanService::new(
                clock,
                Arc::clone(&storage.cards),
                Arc::clone(&storage.sessions),
            )
            .with_builder(builder),
        );

        Self {
            card_service,
            reviews,
            recorder,
            plans,
            storage,
        }
    }

    #[must_use]
    pub fn card_service(&self) -> Arc<CardService> {
        Arc::clone(&self.card_service)
    }

    #[must_use]
    pub fn reviews(&self) -> Arc<ReviewService> {
        Arc::clone(&self.reviews)
    }

    #[must_use]
    pub fn recorder(&self) -> Arc<SessionRecorder> {
        Arc::clone(&self.recorder)
    }

    #[must_use]
    pub fn plans(&self) -> Arc<StudyPlanService> {
        Arc::clone(&self.plans)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

fn plan_builder(policies: ServicePolicies) -> Result<StudyPlanBuilder, AppServicesError> {
    let analyzer = PerformanceAnalyzer::with_policy(policies.analyzer)?;
    Ok(StudyPlanBuilder::new()
        .with_analyzer(analyzer)
        .with_policy(policies.plan)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::scheduler::SchedulerError;
    use recall_core::time::fixed_clock;

    use crate::error::PolicyError;

    #[test]
    fn invalid_policies_are_rejected() {
        let mut policies = ServicePolicies::default();
        policies.scheduler.min_ease = 3.0;
        assert!(matches!(
            AppServices::from_storage(Storage::in_memory(), fixed_clock(), policies),
            Err(AppServicesError::Scheduler(
                SchedulerError::InvalidEaseBounds { .. }
            ))
        ));

        let mut policies = ServicePolicies::default();
        policies.plan.max_duration = 0;
        assert!(matches!(
            AppServices::from_storage(Storage::in_memory(), fixed_clock(), policies),
            Err(AppServicesError::Policy(PolicyError::ZeroMaxDuration))
        ));
    }

    #[test]
    fn policies_deserialize_with_defaults() {
        let json = serde_json::json!({ "plan": { "max_duration": 45 } });
        let policies: ServicePolicies = serde_json::from_value(json).unwrap();
        assert_eq!(policies.plan.max_duration, 45);
        assert_eq!(policies.plan.minutes_per_focus_card, 2);
        assert_eq!(policies.analyzer, AnalyzerPolicy::default());
        assert_eq!(policies.scheduler, SchedulerPolicy::default());

        let unknown = serde_json::json!({ "planner": {} });
        assert!(serde_json::from_value::<ServicePolicies>(unknown).is_err());
    }

    #[tokio::test]
    async fn services_share_one_storage() {
        let services =
            AppServices::from_storage(Storage::in_memory(), fixed_clock(), ServicePolicies::default())
                .unwrap();
        let card = services.card_service().add_card("Q", "A").await.unwrap();
        services
            .reviews()
            .review_card_persisted_by_id(card.id(), services.storage().cards.as_ref(), 0.9)
            .await
            .unwrap();

        let plan = services
            .plans()
            .plan_for_user(&recall_core::model::UserId::new("alice").unwrap())
            .await
            .unwrap();
        assert!(plan.is_empty());
    }
}
