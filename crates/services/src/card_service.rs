use std::sync::Arc;

use recall_core::model::{Card, CardId, EnhancedCard};
use storage::repository::CardRepository;

use crate::Clock;
use crate::error::CardServiceError;

/// Orchestrates card creation, edits and listing.
#[derive(Clone)]
pub struct CardService {
    clock: Clock,
    cards: Arc<dyn CardRepository>,
}

/// Aggregate counts over the whole card collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: u32,
    pub due: u32,
    /// Cards that were never reviewed.
    pub new: u32,
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl CardService {
    #[must_use]
    pub fn new(clock: Clock, cards: Arc<dyn CardRepository>) -> Self {
        Self { clock, cards }
    }

    /// Create a new, never-reviewed card and persist it under the next free id.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Card` for validation failures.
    /// Returns `CardServiceError::Storage` if persistence fails, with
    /// `StorageError::Conflict` when another writer took the id first.
    pub async fn add_card(
        &self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<EnhancedCard, CardServiceError> {
        let id = self.cards.next_card_id().await?;
        let card = EnhancedCard::new(Card::new(id, front, back)?);
        self.cards.insert_card(&card).await?;
        log::info!("added card {id}");
        Ok(card)
    }

    /// Replace the text of an existing card; scheduling state and history are kept.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` (`NotFound`) for an unknown id and
    /// `CardServiceError::Card` if the new text is blank.
    pub async fn edit_card(
        &self,
        id: CardId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<EnhancedCard, CardServiceError> {
        let mut card = self.cards.get_card(id).await?;
        card.card_mut().edit(front, back)?;
        self.cards.upsert_card(&card).await?;
        log::info!("edited card {id}");
        Ok(card)
    }

    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn get_card(&self, id: CardId) -> Result<EnhancedCard, CardServiceError> {
        Ok(self.cards.get_card(id).await?)
    }

    /// All cards, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn list_cards(&self) -> Result<Vec<EnhancedCard>, CardServiceError> {
        let cards = self.cards.list_cards().await?;
        Ok(cards)
    }

    /// Totals for the collection as of the clock's current date.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn stats(&self) -> Result<CollectionStats, CardServiceError> {
        let today = self.clock.today();
        let cards = self.cards.list_cards().await?;
        let due = cards.iter().filter(|c| c.is_due(today)).count();
        let new = cards.iter().filter(|c| c.spaced_repetition().is_none()).count();
        Ok(CollectionStats {
            total: saturating_u32(cards.len()),
            due: saturating_u32(due),
            new: saturating_u32(new),
        })
    }
}
