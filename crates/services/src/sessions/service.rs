use std::sync::Arc;

use recall_core::model::{PerformanceReport, StudyRecommendation, UserId};
use storage::repository::{CardRepository, StudySessionRepository};

use super::plan::StudyPlanBuilder;
use crate::Clock;
use crate::error::StudyPlanError;

/// Loads cards and a user's session history, then plans or analyzes.
#[derive(Clone)]
pub struct StudyPlanService {
    clock: Clock,
    cards: Arc<dyn CardRepository>,
    sessions: Arc<dyn StudySessionRepository>,
    builder: StudyPlanBuilder,
}

impl StudyPlanService {
    #[must_use]
    pub fn new(
        clock: Clock,
        cards: Arc<dyn CardRepository>,
        sessions: Arc<dyn StudySessionRepository>,
    ) -> Self {
        Self {
            clock,
            cards,
            sessions,
            builder: StudyPlanBuilder::new(),
        }
    }

    #[must_use]
    pub fn with_builder(mut self, builder: StudyPlanBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Study plan for `user_id` as of the clock's current date.
    ///
    /// # Errors
    ///
    /// Returns `StudyPlanError::Storage` if cards or sessions cannot be loaded.
    pub async fn plan_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<StudyRecommendation, StudyPlanError> {
        let cards = self.cards.list_cards().await?;
        let sessions = self.sessions.list_sessions(user_id).await?;
        Ok(self.builder.build(&cards, &sessions, self.clock.today()))
    }

    /// # Errors
    ///
    /// Returns `StudyPlanError::Storage` if the session history cannot be loaded.
    pub async fn analyze_user(&self, user_id: &UserId) -> Result<PerformanceReport, StudyPlanError> {
        let sessions = self.sessions.list_sessions(user_id).await?;
        Ok(self.builder.analyzer().analyze(&sessions))
    }
}
