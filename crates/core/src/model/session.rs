use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CardId, SessionId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error("ended_at is before started_at")]
    InvalidTimeRange,
}

/// Result of showing one card during a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOutcome {
    pub card_id: CardId,
    pub was_correct: bool,
    pub time_spent_ms: u64,
}

impl CardOutcome {
    #[must_use]
    pub fn new(card_id: CardId, was_correct: bool, time_spent_ms: u64) -> Self {
        Self {
            card_id,
            was_correct,
            time_spent_ms,
        }
    }
}

//
// ─── ACTIVE SESSION ────────────────────────────────────────────────────────────
//

/// A study session that is still collecting outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    user_id: UserId,
    started_at: DateTime<Utc>,
    outcomes: Vec<CardOutcome>,
}

impl ActiveSession {
    #[must_use]
    pub fn start(user_id: UserId, started_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            started_at,
            outcomes: Vec::new(),
        }
    }

    /// Append an outcome; order of recording is preserved.
    pub fn record(&mut self, outcome: CardOutcome) {
        self.outcomes.push(outcome);
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn outcomes(&self) -> &[CardOutcome] {
        &self.outcomes
    }

    /// Close the session. No outcome can be added afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::InvalidTimeRange` if `ended_at` is before the start.
    pub fn finish(self, ended_at: DateTime<Utc>) -> Result<FinishedSession, StudySessionError> {
        if ended_at < self.started_at {
            return Err(StudySessionError::InvalidTimeRange);
        }
        Ok(FinishedSession {
            user_id: self.user_id,
            started_at: self.started_at,
            ended_at,
            outcomes: self.outcomes,
        })
    }
}

//
// ─── FINISHED SESSION ──────────────────────────────────────────────────────────
//

/// A closed session waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    user_id: UserId,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    outcomes: Vec<CardOutcome>,
}

impl FinishedSession {
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn outcomes(&self) -> &[CardOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn assign_id(self, id: SessionId) -> StudySession {
        StudySession {
            id,
            user_id: self.user_id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            outcomes: self.outcomes,
        }
    }
}

//
// ─── STUDY SESSION ─────────────────────────────────────────────────────────────
//

/// A finalized, immutable study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionFields")]
pub struct StudySession {
    id: SessionId,
    user_id: UserId,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    outcomes: Vec<CardOutcome>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFields {
    id: SessionId,
    user_id: UserId,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    outcomes: Vec<CardOutcome>,
}

impl TryFrom<SessionFields> for StudySession {
    type Error = StudySessionError;

    fn try_from(f: SessionFields) -> Result<Self, Self::Error> {
        StudySession::from_persisted(f.id, f.user_id, f.started_at, f.ended_at, f.outcomes)
    }
}

impl StudySession {
    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::InvalidTimeRange` if `ended_at` precedes `started_at`.
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        outcomes: Vec<CardOutcome>,
    ) -> Result<Self, StudySessionError> {
        if ended_at < started_at {
            return Err(StudySessionError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            user_id,
            started_at,
            ended_at,
            outcomes,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn outcomes(&self) -> &[CardOutcome] {
        &self.outcomes
    }
}
