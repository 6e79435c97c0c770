use serde::{Deserialize, Serialize};

use crate::model::card::EnhancedCard;
use crate::model::ids::CardId;

/// Strong/weak classification derived from session history.
///
/// Both id lists are in ascending id order and never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub strengths: Vec<CardId>,
    pub weaknesses: Vec<CardId>,
    pub recommendations: Vec<String>,
}

/// An ordered, time-boxed study plan. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecommendation {
    pub cards: Vec<EnhancedCard>,
    /// Suggested session length in minutes.
    pub suggested_duration: u32,
    pub focus_areas: Vec<String>,
}

impl StudyRecommendation {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.iter().map(EnhancedCard::id).collect()
    }
}
