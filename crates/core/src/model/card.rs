use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CardId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CardError {
    #[error("card front text cannot be empty")]
    EmptyFront,

    #[error("card back text cannot be empty")]
    EmptyBack,

    #[error("interval must be at least 1 day, got {0}")]
    InvalidInterval(u32),

    #[error("ease factor must be finite and >= 1.0, got {0}")]
    InvalidEaseFactor(f64),
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// Study content: a question on the front, its answer on the back.
///
/// Both sides are trimmed and must be non-empty. A card only changes through
/// [`Card::edit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CardFields")]
pub struct Card {
    id: CardId,
    front: String,
    back: String,
}

#[derive(Deserialize)]
struct CardFields {
    id: CardId,
    front: String,
    back: String,
}

impl TryFrom<CardFields> for Card {
    type Error = CardError;

    fn try_from(fields: CardFields) -> Result<Self, Self::Error> {
        Card::new(fields.id, fields.front, fields.back)
    }
}

impl Card {
    /// Creates a card with validated front/back text.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyFront` or `CardError::EmptyBack` when a side is blank.
    pub fn new(
        id: CardId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Self, CardError> {
        let (front, back) = validate_sides(front.into(), back.into())?;
        Ok(Self { id, front, back })
    }

    /// Replaces both sides of the card.
    ///
    /// On error the card is left untouched.
    ///
    /// # Errors
    ///
    /// Same rules as [`Card::new`].
    pub fn edit(
        &mut self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<(), CardError> {
        let (front, back) = validate_sides(front.into(), back.into())?;
        self.front = front;
        self.back = back;
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }
}

fn validate_sides(front: String, back: String) -> Result<(String, String), CardError> {
    let front = front.trim();
    if front.is_empty() {
        return Err(CardError::EmptyFront);
    }
    let back = back.trim();
    if back.is_empty() {
        return Err(CardError::EmptyBack);
    }
    Ok((front.to_owned(), back.to_owned()))
}

//
// ─── SPACED REPETITION STATE ───────────────────────────────────────────────────
//

/// Scheduling state of a card that has been reviewed at least once.
///
/// # Fields
///
/// * `interval` - days between the last review and the next one (always >= 1)
/// * `ease_factor` - interval growth multiplier, kept inside the scheduler's ease bounds
/// * `consecutive_correct` - strong reviews in a row since the last weak one
/// * `next_review_date` - calendar date the card becomes due again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StateFields")]
pub struct SpacedRepetitionState {
    interval: u32,
    ease_factor: f64,
    consecutive_correct: u32,
    next_review_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFields {
    interval: u32,
    ease_factor: f64,
    consecutive_correct: u32,
    next_review_date: NaiveDate,
}

impl TryFrom<StateFields> for SpacedRepetitionState {
    type Error = CardError;

    fn try_from(f: StateFields) -> Result<Self, Self::Error> {
        SpacedRepetitionState::from_persisted(
            f.interval,
            f.ease_factor,
            f.consecutive_correct,
            f.next_review_date,
        )
    }
}

impl SpacedRepetitionState {
    /// Rehydrate a state from storage.
    ///
    /// Only structural sanity is checked here; the ease bounds belong to the
    /// scheduler policy and are re-applied on the next review.
    ///
    /// # Errors
    ///
    /// Returns `CardError::InvalidInterval` for a zero interval and
    /// `CardError::InvalidEaseFactor` for a non-finite or sub-1.0 ease.
    pub fn from_persisted(
        interval: u32,
        ease_factor: f64,
        consecutive_correct: u32,
        next_review_date: NaiveDate,
    ) -> Result<Self, CardError> {
        if interval == 0 {
            return Err(CardError::InvalidInterval(interval));
        }
        if !ease_factor.is_finite() || ease_factor < 1.0 {
            return Err(CardError::InvalidEaseFactor(ease_factor));
        }
        Ok(Self {
            interval,
            ease_factor,
            consecutive_correct,
            next_review_date,
        })
    }

    pub(crate) fn new_unchecked(
        interval: u32,
        ease_factor: f64,
        consecutive_correct: u32,
        next_review_date: NaiveDate,
    ) -> Self {
        Self {
            interval,
            ease_factor,
            consecutive_correct,
            next_review_date,
        }
    }

    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    #[must_use]
    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    #[must_use]
    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    #[must_use]
    pub fn next_review_date(&self) -> NaiveDate {
        self.next_review_date
    }
}

//
// ─── ENHANCED CARD ─────────────────────────────────────────────────────────────
//

/// A card together with its review history and scheduling state.
///
/// A fresh card has no `spaced_repetition` state and is always due. Only the
/// scheduler mutates the state, timestamp, and performance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedCard {
    card: Card,
    #[serde(default)]
    spaced_repetition: Option<SpacedRepetitionState>,
    #[serde(default)]
    last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    performance: Vec<f64>,
}

impl EnhancedCard {
    /// Wrap a never-reviewed card.
    #[must_use]
    pub fn new(card: Card) -> Self {
        Self {
            card,
            spaced_repetition: None,
            last_reviewed: None,
            performance: Vec::new(),
        }
    }

    /// Rehydrate a card with existing scheduling data.
    #[must_use]
    pub fn from_persisted(
        card: Card,
        spaced_repetition: Option<SpacedRepetitionState>,
        last_reviewed: Option<DateTime<Utc>>,
        performance: Vec<f64>,
    ) -> Self {
        Self {
            card,
            spaced_repetition,
            last_reviewed,
            performance,
        }
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.card.id()
    }

    #[must_use]
    pub fn card(&self) -> &Card {
        &self.card
    }

    /// Mutable access to the content, for explicit edits.
    pub fn card_mut(&mut self) -> &mut Card {
        &mut self.card
    }

    #[must_use]
    pub fn spaced_repetition(&self) -> Option<&SpacedRepetitionState> {
        self.spaced_repetition.as_ref()
    }

    #[must_use]
    pub fn last_reviewed(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed
    }

    /// Performance scores in review order.
    #[must_use]
    pub fn performance(&self) -> &[f64] {
        &self.performance
    }

    #[must_use]
    pub fn review_count(&self) -> usize {
        self.performance.len()
    }

    /// Mean of the performance history, `None` before the first review.
    #[must_use]
    pub fn average_performance(&self) -> Option<f64> {
        if self.performance.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let len = self.performance.len() as f64;
        Some(self.performance.iter().sum::<f64>() / len)
    }

    /// A card is due when it was never reviewed or its review date is today or earlier.
    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        match &self.spaced_repetition {
            None => true,
            Some(state) => today >= state.next_review_date,
        }
    }

    /// Whole days since the card became due; negative when not yet due.
    ///
    /// `None` for cards that were never reviewed.
    #[must_use]
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        self.spaced_repetition
            .as_ref()
            .map(|state| (today - state.next_review_date).num_days())
    }

    pub(crate) fn record_review(
        &mut self,
        state: SpacedRepetitionState,
        performance: f64,
        reviewed_at: DateTime<Utc>,
    ) {
        self.spaced_repetition = Some(state);
        self.last_reviewed = Some(reviewed_at);
        self.performance.push(performance);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_today;
    use chrono::Duration;

    fn build_card(id: u64) -> Card {
        Card::new(CardId::new(id), "What is 2+2?", "4").unwrap()
    }

    #[test]
    fn card_trims_and_rejects_blank_sides() {
        let card = Card::new(CardId::new(1), "  Q  ", "\tA\n").unwrap();
        assert_eq!(card.front(), "Q");
        assert_eq!(card.back(), "A");

        assert_eq!(
            Card::new(CardId::new(1), "  ", "A").unwrap_err(),
            CardError::EmptyFront
        );
        assert_eq!(
            Card::new(CardId::new(1), "Q", "").unwrap_err(),
            CardError::EmptyBack
        );
    }

    #[test]
    fn failed_edit_leaves_card_untouched() {
        let mut card = build_card(1);
        assert!(card.edit("new front", " ").is_err());
        assert_eq!(card.front(), "What is 2+2?");

        card.edit("2+3?", "5").unwrap();
        assert_eq!(card.front(), "2+3?");
        assert_eq!(card.back(), "5");
        assert_eq!(card.id(), CardId::new(1));
    }

    #[test]
    fn new_card_is_always_due() {
        let card = EnhancedCard::new(build_card(1));
        assert!(card.is_due(fixed_today()));
        assert_eq!(card.days_overdue(fixed_today()), None);
        assert_eq!(card.average_performance(), None);
    }

    #[test]
    fn due_check_is_inclusive_of_today() {
        let today = fixed_today();
        let due_today = SpacedRepetitionState::from_persisted(3, 2.5, 1, today).unwrap();
        let due_tomorrow =
            SpacedRepetitionState::from_persisted(3, 2.5, 1, today + Duration::days(1)).unwrap();

        let a = EnhancedCard::from_persisted(build_card(1), Some(due_today), None, vec![0.9]);
        let b = EnhancedCard::from_persisted(build_card(2), Some(due_tomorrow), None, vec![0.9]);

        assert!(a.is_due(today));
        assert_eq!(a.days_overdue(today), Some(0));
        assert!(!b.is_due(today));
        assert_eq!(b.days_overdue(today), Some(-1));
    }

    #[test]
    fn persisted_state_rejects_zero_interval_and_bad_ease() {
        let today = fixed_today();
        assert_eq!(
            SpacedRepetitionState::from_persisted(0, 2.5, 0, today).unwrap_err(),
            CardError::InvalidInterval(0)
        );
        assert!(matches!(
            SpacedRepetitionState::from_persisted(1, f64::NAN, 0, today),
            Err(CardError::InvalidEaseFactor(_))
        ));
    }

    #[test]
    fn serde_uses_camel_case_and_validates() {
        let today = fixed_today();
        let state = SpacedRepetitionState::from_persisted(8, 2.5, 2, today).unwrap();
        let card = EnhancedCard::from_persisted(build_card(7), Some(state), None, vec![0.9, 1.0]);

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["spacedRepetition"]["easeFactor"], 2.5);
        assert_eq!(json["spacedRepetition"]["nextReviewDate"], "2023-11-14");

        let back: EnhancedCard = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);

        let blank = r#"{"card":{"id":1,"front":" ","back":"A"}}"#;
        assert!(serde_json::from_str::<EnhancedCard>(blank).is_err());
    }

    #[test]
    fn average_performance_is_mean_of_history() {
        let card = EnhancedCard::from_persisted(build_card(1), None, None, vec![0.5, 1.0]);
        assert_eq!(card.review_count(), 2);
        assert!((card.average_performance().unwrap() - 0.75).abs() < f64::EPSILON);
    }
}
