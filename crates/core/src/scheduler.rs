use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EnhancedCard, ReviewClassification, SpacedRepetitionState};

/// Longest interval a policy may configure (about 10,000 years).
///
/// Keeps `today + interval` inside the calendar range `NaiveDate` can represent.
pub const MAX_INTERVAL_LIMIT: u32 = 3_650_000;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("thresholds must satisfy 0 <= weak ({weak}) <= strong ({strong}) <= 1")]
    InvalidThresholds { weak: f64, strong: f64 },

    #[error("ease bounds must satisfy 1 <= min ({min}) <= initial ({initial}) <= max ({max})")]
    InvalidEaseBounds { min: f64, initial: f64, max: f64 },

    #[error("ease adjustments must be finite and non-negative, got {provided}")]
    InvalidEaseStep { provided: f64 },

    #[error("intervals must satisfy 1 <= initial ({initial}) <= max ({max}) <= 3650000")]
    InvalidIntervalBounds { initial: u32, max: u32 },
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Numeric policy of the ease-factor/interval model.
///
/// Defaults:
///
/// * a score `>= 0.8` is strong: streak +1, ease +0.15 (ceiling 2.5)
/// * a score `< 0.6` is weak: streak reset, ease -0.2 (floor 1.3)
/// * new cards start at interval 1 and ease 2.5
/// * intervals saturate at 36,500 days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerPolicy {
    pub strong_threshold: f64,
    pub weak_threshold: f64,
    pub ease_bonus: f64,
    pub ease_penalty: f64,
    pub min_ease: f64,
    pub max_ease: f64,
    pub initial_ease: f64,
    pub initial_interval: u32,
    pub max_interval: u32,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            strong_threshold: 0.8,
            weak_threshold: 0.6,
            ease_bonus: 0.15,
            ease_penalty: 0.2,
            min_ease: 1.3,
            max_ease: 2.5,
            initial_ease: 2.5,
            initial_interval: 1,
            max_interval: 36_500,
        }
    }
}

impl SchedulerPolicy {
    /// Check the policy for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the `SchedulerError` variant naming the first violated rule.
    pub fn validate(self) -> Result<Self, SchedulerError> {
        let (weak, strong) = (self.weak_threshold, self.strong_threshold);
        if !(0.0..=1.0).contains(&weak) || !(0.0..=1.0).contains(&strong) || weak > strong {
            return Err(SchedulerError::InvalidThresholds { weak, strong });
        }

        let (min, initial, max) = (self.min_ease, self.initial_ease, self.max_ease);
        if !(min.is_finite() && initial.is_finite() && max.is_finite())
            || min < 1.0
            || min > initial
            || initial > max
        {
            return Err(SchedulerError::InvalidEaseBounds { min, initial, max });
        }

        for step in [self.ease_bonus, self.ease_penalty] {
            if !step.is_finite() || step < 0.0 {
                return Err(SchedulerError::InvalidEaseStep { provided: step });
            }
        }

        if self.initial_interval == 0
            || self.initial_interval > self.max_interval
            || self.max_interval > MAX_INTERVAL_LIMIT
        {
            return Err(SchedulerError::InvalidIntervalBounds {
                initial: self.initial_interval,
                max: self.max_interval,
            });
        }

        Ok(self)
    }

    /// Classify a performance score against the strong/weak thresholds.
    ///
    /// NaN fails both comparisons and lands in `Neutral`.
    #[must_use]
    pub fn classify(&self, performance: f64) -> ReviewClassification {
        if performance >= self.strong_threshold {
            ReviewClassification::Strong
        } else if performance < self.weak_threshold {
            ReviewClassification::Weak
        } else {
            ReviewClassification::Neutral
        }
    }
}

//
// ─── SCHEDULED REVIEW ──────────────────────────────────────────────────────────
//

/// Result of scheduling one review.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledReview {
    pub next_review_date: NaiveDate,
    pub state: SpacedRepetitionState,
    pub classification: ReviewClassification,
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Adaptive spaced-repetition scheduler.
///
/// Holds only its policy; every call is a pure function of the card snapshot,
/// the performance score, and the supplied date.
///
/// # Examples
///
/// ```
/// # use recall_core::scheduler::Scheduler;
/// # use recall_core::model::{Card, CardId, EnhancedCard};
/// # use recall_core::time::fixed_today;
/// let scheduler = Scheduler::new();
/// let card = EnhancedCard::new(Card::new(CardId::new(1), "Q", "A")?);
///
/// let review = scheduler.compute_next_review(&card, 0.9, fixed_today());
/// assert_eq!(review.state.interval(), 3);
/// # Ok::<(), recall_core::model::CardError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    policy: SchedulerPolicy,
}

impl Scheduler {
    /// Create a scheduler with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with a custom policy.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the policy is inconsistent.
    pub fn try_with_policy(policy: SchedulerPolicy) -> Result<Self, SchedulerError> {
        Ok(Self {
            policy: policy.validate()?,
        })
    }

    #[must_use]
    pub fn policy(&self) -> &SchedulerPolicy {
        &self.policy
    }

    /// Compute the state a card would have after a review on `today`.
    ///
    /// `performance` is expected in `[0, 1]`; the range is the caller's
    /// responsibility and is not checked here.
    ///
    /// The streak and ease factor are updated first, then the interval is
    /// derived from the updated values: a zero streak resets the interval to
    /// the initial interval, otherwise the previous interval is multiplied by
    /// the new ease factor and rounded up.
    #[must_use]
    pub fn compute_next_review(
        &self,
        card: &EnhancedCard,
        performance: f64,
        today: NaiveDate,
    ) -> ScheduledReview {
        let policy = &self.policy;
        let (previous_interval, mut ease, mut streak) = match card.spaced_repetition() {
            Some(state) => (
                state.interval(),
                state.ease_factor(),
                state.consecutive_correct(),
            ),
            None => (policy.initial_interval, policy.initial_ease, 0),
        };

        let classification = policy.classify(performance);
        match classification {
            ReviewClassification::Strong => {
                streak = streak.saturating_add(1);
                ease = (ease + policy.ease_bonus).min(policy.max_ease);
            }
            ReviewClassification::Weak => {
                streak = 0;
                ease = (ease - policy.ease_penalty).max(policy.min_ease);
            }
            ReviewClassification::Neutral => {}
        }
        // Stored states may predate the current policy.
        ease = ease.clamp(policy.min_ease, policy.max_ease);

        let interval = if streak == 0 {
            policy.initial_interval
        } else {
            self.grow_interval(previous_interval, ease)
        };

        let next_review_date = today
            .checked_add_days(Days::new(u64::from(interval)))
            .unwrap_or(NaiveDate::MAX);

        ScheduledReview {
            next_review_date,
            state: SpacedRepetitionState::new_unchecked(interval, ease, streak, next_review_date),
            classification,
        }
    }

    /// Apply a completed review to the card in place.
    ///
    /// Replaces the scheduling state, stamps `last_reviewed`, and appends the
    /// score to the performance history. "Today" is the UTC date of `reviewed_at`.
    pub fn apply_review(
        &self,
        card: &mut EnhancedCard,
        performance: f64,
        reviewed_at: DateTime<Utc>,
    ) -> ScheduledReview {
        let scheduled = self.compute_next_review(card, performance, reviewed_at.date_naive());
        card.record_review(scheduled.state.clone(), performance, reviewed_at);
        scheduled
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn grow_interval(&self, previous: u32, ease: f64) -> u32 {
        let max = self.policy.max_interval;
        let grown = (f64::from(previous) * ease).ceil();
        if grown >= f64::from(max) {
            max
        } else {
            (grown as u32).max(1)
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
