use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use recall_core::model::{EnhancedCard, StudyRecommendation, StudySession};

use crate::analysis::PerformanceAnalyzer;
use crate::error::PolicyError;

/// Session-length heuristic: minutes per card, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanPolicy {
    pub minutes_per_focus_card: u32,
    pub minutes_per_due_card: u32,
    pub max_duration: u32,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            minutes_per_focus_card: 2,
            minutes_per_due_card: 1,
            max_duration: 30,
        }
    }
}

impl PlanPolicy {
    /// # Errors
    ///
    /// Returns `PolicyError::ZeroMaxDuration` when the cap would always suggest zero minutes.
    pub fn validate(self) -> Result<Self, PolicyError> {
        if self.max_duration == 0 {
            return Err(PolicyError::ZeroMaxDuration);
        }
        Ok(self)
    }

    /// Minutes suggested for `focus` weak cards within `due` due cards.
    #[must_use]
    pub fn suggested_duration(&self, focus: usize, due: usize) -> u32 {
        let focus = u32::try_from(focus).unwrap_or(u32::MAX);
        let due = u32::try_from(due).unwrap_or(u32::MAX);
        focus
            .saturating_mul(self.minutes_per_focus_card)
            .saturating_add(due.saturating_mul(self.minutes_per_due_card))
            .min(self.max_duration)
    }
}

/// Urgency of a card; higher is more urgent.
///
/// Never-reviewed cards score `1.0`. Reviewed cards score
/// `(days_overdue + 1) / ease_factor`, which is negative for cards not yet due.
#[must_use]
pub fn priority_score(card: &EnhancedCard, today: NaiveDate) -> f64 {
    match (card.spaced_repetition(), card.days_overdue(today)) {
        (Some(state), Some(overdue)) => {
            #[allow(clippy::cast_precision_loss)]
            let days = overdue.saturating_add(1) as f64;
            days / state.ease_factor()
        }
        _ => 1.0,
    }
}

/// Due cards, most urgent first. Equal scores keep their input order.
#[must_use]
pub fn due_cards(cards: &[EnhancedCard], today: NaiveDate) -> Vec<&EnhancedCard> {
    let mut scored: Vec<(f64, &EnhancedCard)> = cards
        .iter()
        .filter(|card| card.is_due(today))
        .map(|card| (priority_score(card, today), card))
        .collect();
    scored.sort_by(|a, b| descending(a.0, b.0));
    scored.into_iter().map(|(_, card)| card).collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Combines due-card selection with weak-card prioritization.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudyPlanBuilder {
    analyzer: PerformanceAnalyzer,
    policy: PlanPolicy,
}

impl StudyPlanBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_analyzer(mut self, analyzer: PerformanceAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// # Errors
    ///
    /// Returns `PolicyError` if the policy does not validate.
    pub fn with_policy(mut self, policy: PlanPolicy) -> Result<Self, PolicyError> {
        self.policy = policy.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn analyzer(&self) -> &PerformanceAnalyzer {
        &self.analyzer
    }

    /// Build the study plan for `today`.
    ///
    /// Weak due cards come first in priority order, followed by the remaining
    /// due cards. Cards that are not due are never included.
    #[must_use]
    pub fn build(
        &self,
        cards: &[EnhancedCard],
        sessions: &[StudySession],
        today: NaiveDate,
    ) -> StudyRecommendation {
        let report = self.analyzer.analyze(sessions);
        let weak: HashSet<_> = report.weaknesses.iter().copied().collect();

        let due = due_cards(cards, today);
        let due_count = due.len();
        let (focus, rest): (Vec<&EnhancedCard>, Vec<&EnhancedCard>) =
            due.into_iter().partition(|card| weak.contains(&card.id()));

        let suggested_duration = self.policy.suggested_duration(focus.len(), due_count);
        log::debug!(
            "plan for {today}: {due_count} due, {} focus, {suggested_duration} min",
            focus.len()
        );

        StudyRecommendation {
            cards: focus.into_iter().chain(rest).cloned().collect(),
            suggested_duration,
            focus_areas: report.recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use recall_core::model::{
        ActiveSession, Card, CardId, CardOutcome, SessionId, SpacedRepetitionState, UserId,
    };
    use recall_core::time::{fixed_now, fixed_today};

    use crate::analysis::{REVIEW_BASICS_MESSAGE, TIMED_RECALL_MESSAGE};

    fn new_card(id: u64) -> EnhancedCard {
        EnhancedCard::new(Card::new(CardId::new(id), format!("Q{id}"), format!("A{id}")).unwrap())
    }

    fn scheduled(id: u64, ease: f64, due_in_days: i64) -> EnhancedCard {
        let state = SpacedRepetitionState::from_persisted(
            3,
            ease,
            1,
            fixed_today() + Duration::days(due_in_days),
        )
        .unwrap();
        let card = Card::new(CardId::new(id), format!("Q{id}"), format!("A{id}")).unwrap();
        EnhancedCard::from_persisted(card, Some(state), None, vec![0.9])
    }

    fn session(outcomes: &[(u64, bool, u64)]) -> StudySession {
        let mut active = ActiveSession::start(UserId::new("alice").unwrap(), fixed_now());
        for &(card, correct, ms) in outcomes {
            active.record(CardOutcome::new(CardId::new(card), correct, ms));
        }
        active.finish(fixed_now()).unwrap().assign_id(SessionId::new(1))
    }

    fn ids(raw: &[u64]) -> Vec<CardId> {
        raw.iter().copied().map(CardId::new).collect()
    }

    #[test]
    fn empty_inputs_give_empty_plan() {
        let plan = StudyPlanBuilder::new().build(&[], &[], fixed_today());
        assert!(plan.is_empty());
        assert_eq!(plan.suggested_duration, 0);
        assert!(plan.focus_areas.is_empty());
    }

    #[test]
    fn weak_card_leads_regardless_of_priority() {
        let cards = vec![
            scheduled(1, 1.3, -10),
            scheduled(2, 2.5, -5),
            scheduled(3, 2.5, 0),
        ];
        let history = [session(&[
            (1, true, 1_000),
            (2, true, 1_000),
            (3, true, 1_000),
            (3, false, 1_000),
        ])];

        let plan = StudyPlanBuilder::new().build(&cards, &history, fixed_today());
        assert_eq!(plan.card_ids(), ids(&[3, 1, 2]));
        // One focus card counts twice: 1*2 + 3.
        assert_eq!(plan.suggested_duration, 5);
        assert!(plan.focus_areas.is_empty());
    }

    #[test]
    fn due_today_is_included_and_tomorrow_is_not() {
        let cards = vec![scheduled(1, 2.5, 1), scheduled(2, 2.5, 0)];
        let plan = StudyPlanBuilder::new().build(&cards, &[], fixed_today());
        assert_eq!(plan.card_ids(), ids(&[2]));
        assert_eq!(plan.suggested_duration, 1);
    }

    #[test]
    fn priority_orders_overdue_before_new_before_due_today() {
        let today = fixed_today();
        let cards = vec![
            scheduled(1, 2.5, 0),
            new_card(2),
            scheduled(3, 2.0, -3),
            scheduled(4, 2.5, -20),
        ];

        assert!((priority_score(&cards[0], today) - 0.4).abs() < 1e-12);
        assert!((priority_score(&cards[1], today) - 1.0).abs() < f64::EPSILON);
        assert!((priority_score(&cards[2], today) - 2.0).abs() < 1e-12);

        let order: Vec<_> = due_cards(&cards, today).iter().map(|c| c.id()).collect();
        assert_eq!(order, ids(&[4, 3, 2, 1]));
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let cards = vec![new_card(9), new_card(3), new_card(5)];
        let order: Vec<_> = due_cards(&cards, fixed_today())
            .iter()
            .map(|c| c.id())
            .collect();
        assert_eq!(order, ids(&[9, 3, 5]));
    }

    #[test]
    fn weak_cards_that_are_not_due_stay_out() {
        let cards = vec![scheduled(1, 2.5, 4), new_card(2)];
        let history = [session(&[(1, false, 12_000), (2, true, 1_000)])];

        let plan = StudyPlanBuilder::new().build(&cards, &history, fixed_today());
        assert_eq!(plan.card_ids(), ids(&[2]));
        assert_eq!(plan.suggested_duration, 1);
        assert_eq!(
            plan.focus_areas,
            vec![REVIEW_BASICS_MESSAGE, TIMED_RECALL_MESSAGE]
        );
    }

    #[test]
    fn duration_is_capped() {
        let cards: Vec<_> = (1..=40).map(new_card).collect();
        let history = [session(&[(1, false, 1_000), (2, false, 1_000)])];
        let plan = StudyPlanBuilder::new().build(&cards, &history, fixed_today());
        assert_eq!(plan.cards.len(), 40);
        assert_eq!(plan.suggested_duration, 30);
        assert_eq!(&plan.card_ids()[..2], &ids(&[1, 2])[..]);
    }

    #[test]
    fn custom_plan_policy() {
        let policy = PlanPolicy {
            minutes_per_due_card: 3,
            max_duration: 60,
            ..PlanPolicy::default()
        };
        assert_eq!(policy.suggested_duration(1, 4), 14);
        assert_eq!(policy.suggested_duration(usize::MAX, usize::MAX), 60);

        let zero = PlanPolicy {
            max_duration: 0,
            ..PlanPolicy::default()
        };
        assert!(matches!(
            StudyPlanBuilder::new().with_policy(zero),
            Err(PolicyError::ZeroMaxDuration)
        ));
    }
}
