use chrono::{DateTime, Utc};

use recall_core::{
    model::{CardId, EnhancedCard},
    scheduler::{ScheduledReview, Scheduler},
    time::Clock,
};
use storage::repository::CardRepository;

use crate::error::ReviewServiceError;

//
// ─── REVIEW RESULT ─────────────────────────────────────────────────────────────
//

/// Result of processing a review: the score, when it happened, and the new schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub card_id: CardId,
    pub performance: f64,
    pub reviewed_at: DateTime<Utc>,
    pub scheduled: ScheduledReview,
}

/// Result of a persisted review: the stored card and the applied outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedReview {
    pub card: EnhancedCard,
    pub result: ReviewResult,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Coordinates applying a user's review to a card using the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
}

impl ReviewService {
    /// Review service with the default policy and the real-time clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a review service with a custom scheduler (still uses default clock).
    #[must_use]
    pub fn with_scheduler(scheduler: Scheduler) -> Self {
        Self {
            clock: Clock::default(),
            scheduler,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Apply a performance score to an in-memory card at the clock's current time.
    pub fn review_card(&self, card: &mut EnhancedCard, performance: f64) -> ReviewResult {
        let reviewed_at = self.now();
        let scheduled = self.scheduler.apply_review(card, performance, reviewed_at);
        log::debug!(
            "card {} reviewed at {performance}: {} review, interval {} days, ease {:.2}",
            card.id(),
            scheduled.classification,
            scheduled.state.interval(),
            scheduled.state.ease_factor(),
        );
        ReviewResult {
            card_id: card.id(),
            performance,
            reviewed_at,
            scheduled,
        }
    }

    /// Apply a review to an in-memory card and persist the updated card.
    ///
    /// If persistence fails, the card is rolled back to its original state.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if the write fails.
    pub async fn review_card_persisted(
        &self,
        card: &mut EnhancedCard,
        performance: f64,
        cards: &dyn CardRepository,
    ) -> Result<ReviewResult, ReviewServiceError> {
        let original = card.clone();
        let result = self.review_card(card, performance);

        match cards.upsert_card(card).await {
            Ok(()) => {
                log::info!(
                    "card {} due again on {}",
                    card.id(),
                    result.scheduled.next_review_date
                );
                Ok(result)
            }
            Err(err) => {
                log::warn!("rolling back review of card {}: {err}", card.id());
                *card = original;
                Err(err.into())
            }
        }
    }

    /// Load a card, apply a review, and persist the updated card.
    ///
    /// Uses the service clock for `reviewed_at` to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card is missing.
    /// Returns storage errors if persistence fails.
    pub async fn review_card_persisted_by_id(
        &self,
        card_id: CardId,
        cards: &dyn CardRepository,
        performance: f64,
    ) -> Result<PersistedReview, ReviewServiceError> {
        let mut card = cards.get_card(card_id).await?;
        let result = self
            .review_card_persisted(&mut card, performance, cards)
            .await?;
        Ok(PersistedReview { card, result })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
