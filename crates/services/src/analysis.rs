//! Session-history analysis: per-card accuracy and recall speed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use recall_core::model::{CardId, PerformanceReport, StudySession};

use crate::error::PolicyError;

pub const REVIEW_BASICS_MESSAGE: &str = "Consider reviewing basic concepts more thoroughly";
pub const TIMED_RECALL_MESSAGE: &str = "Practice quick recall with timed review sessions";

/// Thresholds used to classify cards and trigger recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerPolicy {
    /// Cards strictly below this accuracy are weak.
    pub weak_accuracy: f64,
    /// Cards strictly above this accuracy are strong.
    pub strong_accuracy: f64,
    pub low_average_accuracy: f64,
    pub slow_recall_ms: u64,
    /// Share of slow cards above which timed practice is recommended.
    pub slow_card_share: f64,
}

impl Default for AnalyzerPolicy {
    fn default() -> Self {
        Self {
            weak_accuracy: 0.7,
            strong_accuracy: 0.9,
            low_average_accuracy: 0.7,
            slow_recall_ms: 10_000,
            slow_card_share: 0.3,
        }
    }
}

impl AnalyzerPolicy {
    /// Check the policy and hand it back unchanged.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` when a ratio leaves `[0, 1]`, the accuracy
    /// thresholds are inverted, or the slow-recall threshold is zero.
    pub fn validate(self) -> Result<Self, PolicyError> {
        for (name, value) in [
            ("weak_accuracy", self.weak_accuracy),
            ("strong_accuracy", self.strong_accuracy),
            ("low_average_accuracy", self.low_average_accuracy),
            ("slow_card_share", self.slow_card_share),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::RatioOutOfRange { name, value });
            }
        }
        if self.weak_accuracy > self.strong_accuracy {
            return Err(PolicyError::AccuracyOrder {
                weak: self.weak_accuracy,
                strong: self.strong_accuracy,
            });
        }
        if self.slow_recall_ms == 0 {
            return Err(PolicyError::ZeroSlowRecall);
        }
        Ok(self)
    }
}

/// Aggregated outcomes for one card across a set of sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardStats {
    pub correct: u32,
    pub total: u32,
    pub total_time_ms: u64,
}

impl CardStats {
    fn record(&mut self, was_correct: bool, time_spent_ms: u64) {
        self.total = self.total.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
        self.total_time_ms = self.total_time_ms.saturating_add(time_spent_ms);
    }

    /// Fraction of correct answers; zero when nothing was recorded.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_time_ms(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.total_time_ms as f64 / f64::from(self.total)
    }
}

/// Classifies cards into strengths and weaknesses from finished sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceAnalyzer {
    policy: AnalyzerPolicy,
}

impl PerformanceAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `PolicyError` if the policy does not validate.
    pub fn with_policy(policy: AnalyzerPolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            policy: policy.validate()?,
        })
    }

    #[must_use]
    pub fn policy(&self) -> &AnalyzerPolicy {
        &self.policy
    }

    /// Per-card aggregates keyed by id, in ascending id order.
    #[must_use]
    pub fn card_stats(&self, sessions: &[StudySession]) -> BTreeMap<CardId, CardStats> {
        let mut stats: BTreeMap<CardId, CardStats> = BTreeMap::new();
        for outcome in sessions.iter().flat_map(StudySession::outcomes) {
            stats
                .entry(outcome.card_id)
                .or_default()
                .record(outcome.was_correct, outcome.time_spent_ms);
        }
        stats
    }

    /// Build the strengths/weaknesses report. Empty input yields an empty report.
    #[must_use]
    pub fn analyze(&self, sessions: &[StudySession]) -> PerformanceReport {
        let stats = self.card_stats(sessions);
        if stats.is_empty() {
            return PerformanceReport::default();
        }

        let mut report = PerformanceReport::default();
        for (id, card) in &stats {
            let accuracy = card.accuracy();
            if accuracy < self.policy.weak_accuracy {
                report.weaknesses.push(*id);
            } else if accuracy > self.policy.strong_accuracy {
                report.strengths.push(*id);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let card_count = stats.len() as f64;

        let mean_accuracy = stats.values().map(CardStats::accuracy).sum::<f64>() / card_count;
        if mean_accuracy < self.policy.low_average_accuracy {
            report.recommendations.push(REVIEW_BASICS_MESSAGE.to_string());
        }

        #[allow(clippy::cast_precision_loss)]
        let slow_cards = stats
            .values()
            .filter(|card| card.average_time_ms() > self.policy.slow_recall_ms as f64)
            .count() as f64;
        if slow_cards > card_count * self.policy.slow_card_share {
            report.recommendations.push(TIMED_RECALL_MESSAGE.to_string());
        }

        log::debug!(
            "analyzed {} cards: {} strong, {} weak, mean accuracy {mean_accuracy:.3}",
            stats.len(),
            report.strengths.len(),
            report.weaknesses.len(),
        );
        report
    }
}
