use async_trait::async_trait;
use recall_core::model::{CardId, EnhancedCard, FinishedSession, SessionId, StudySession, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Record store for cards and their scheduling state.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Persist or replace a card record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the card cannot be stored.
    async fn upsert_card(&self, card: &EnhancedCard) -> Result<(), StorageError>;

    /// Persist a card under an ID that must not be taken yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a card with the same ID exists.
    async fn insert_card(&self, card: &EnhancedCard) -> Result<(), StorageError>;

    /// Fetch a card by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_card(&self, id: CardId) -> Result<EnhancedCard, StorageError>;

    /// All cards, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be read or decoded.
    async fn list_cards(&self) -> Result<Vec<EnhancedCard>, StorageError>;

    /// An ID not yet used by any stored card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn next_card_id(&self) -> Result<CardId, StorageError>;
}

/// Append-only store for finalized study sessions.
#[async_trait]
pub trait StudySessionRepository: Send + Sync {
    /// Persist a finished session and assign its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(&self, session: FinishedSession)
    -> Result<StudySession, StorageError>;

    /// Sessions owned by `user_id`, oldest first (ties broken by ID).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be read or decoded.
    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<StudySession>, StorageError>;

    /// Every stored session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be read or decoded.
    async fn list_all_sessions(&self) -> Result<Vec<StudySession>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    cards: Arc<Mutex<BTreeMap<CardId, EnhancedCard>>>,
    sessions: Arc<Mutex<HashMap<SessionId, StudySession>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn sort_sessions(sessions: &mut [StudySession]) {
    sessions.sort_by_key(|s| (s.started_at(), s.id()));
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn upsert_card(&self, card: &EnhancedCard) -> Result<(), StorageError> {
        let mut guard = self.cards.lock().map_err(poisoned)?;
        guard.insert(card.id(), card.clone());
        Ok(())
    }

    async fn insert_card(&self, card: &EnhancedCard) -> Result<(), StorageError> {
        let mut guard = self.cards.lock().map_err(poisoned)?;
        if guard.contains_key(&card.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(card.id(), card.clone());
        Ok(())
    }

    async fn get_card(&self, id: CardId) -> Result<EnhancedCard, StorageError> {
        let guard = self.cards.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_cards(&self) -> Result<Vec<EnhancedCard>, StorageError> {
        let guard = self.cards.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn next_card_id(&self) -> Result<CardId, StorageError> {
        let guard = self.cards.lock().map_err(poisoned)?;
        let next = guard
            .keys()
            .next_back()
            .map_or(1, |id| id.value().saturating_add(1));
        Ok(CardId::new(next))
    }
}

#[async_trait]
impl StudySessionRepository for InMemoryRepository {
    async fn insert_session(
        &self,
        session: FinishedSession,
    ) -> Result<StudySession, StorageError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        let next = guard
            .keys()
            .map(SessionId::value)
            .max()
            .map_or(1, |v| v.saturating_add(1));
        let stored = session.assign_id(SessionId::new(next));
        guard.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<StudySession>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        let mut out: Vec<StudySession> = guard
            .values()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect();
        sort_sessions(&mut out);
        Ok(out)
    }

    async fn list_all_sessions(&self) -> Result<Vec<StudySession>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        let mut out: Vec<StudySession> = guard.values().cloned().collect();
        sort_sessions(&mut out);
        Ok(out)
    }
}

/// Repository handles shared by the services layer.
#[derive(Clone)]
pub struct Storage {
    pub cards: Arc<dyn CardRepository>,
    pub sessions: Arc<dyn StudySessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let cards: Arc<dyn CardRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn StudySessionRepository> = Arc::new(repo);
        Self { cards, sessions }
    }
}
