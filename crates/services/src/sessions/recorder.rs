use std::sync::Arc;

use recall_core::model::{ActiveSession, CardId, CardOutcome, StudySession, UserId};
use storage::repository::StudySessionRepository;

use crate::Clock;
use crate::error::SessionError;

/// Starts, fills and finalizes study sessions.
///
/// Sessions are only written once finished; an abandoned `ActiveSession`
/// leaves no trace in storage.
#[derive(Clone)]
pub struct SessionRecorder {
    clock: Clock,
    sessions: Arc<dyn StudySessionRepository>,
}

impl SessionRecorder {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn StudySessionRepository>) -> Self {
        Self { clock, sessions }
    }

    #[must_use]
    pub fn start(&self, user_id: UserId) -> ActiveSession {
        ActiveSession::start(user_id, self.clock.now())
    }

    pub fn record(
        &self,
        session: &mut ActiveSession,
        card_id: CardId,
        was_correct: bool,
        time_spent_ms: u64,
    ) {
        session.record(CardOutcome::new(card_id, was_correct, time_spent_ms));
    }

    /// Close the session at the current time and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Session` if the clock reads earlier than the
    /// session start, or `SessionError::Storage` if the write fails.
    pub async fn finish(&self, session: ActiveSession) -> Result<StudySession, SessionError> {
        let finished = session.finish(self.clock.now())?;
        let stored = self.sessions.insert_session(finished).await?;
        log::info!(
            "stored session {} for {} with {} outcomes",
            stored.id(),
            stored.user_id(),
            stored.outcomes().len()
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use recall_core::model::{SessionId, StudySessionError};
    use recall_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[tokio::test]
    async fn finish_persists_outcomes_in_order() {
        let repo = Arc::new(InMemoryRepository::new());
        let recorder = SessionRecorder::new(fixed_clock(), repo.clone());

        let mut active = recorder.start(alice());
        recorder.record(&mut active, CardId::new(4), true, 1_200);
        recorder.record(&mut active, CardId::new(2), false, 9_000);
        let stored = recorder.finish(active).await.unwrap();

        assert_eq!(stored.id(), SessionId::new(1));
        assert_eq!(stored.started_at(), fixed_now());
        assert_eq!(stored.ended_at(), fixed_now());
        let cards: Vec<_> = stored.outcomes().iter().map(|o| o.card_id).collect();
        assert_eq!(cards, vec![CardId::new(4), CardId::new(2)]);

        assert_eq!(repo.list_sessions(&alice()).await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn finish_rejects_clock_before_start() {
        let repo = Arc::new(InMemoryRepository::new());
        let active = ActiveSession::start(alice(), fixed_now() + Duration::minutes(1));
        let recorder = SessionRecorder::new(fixed_clock(), repo.clone());

        let err = recorder.finish(active).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Session(StudySessionError::InvalidTimeRange)
        ));
        assert!(repo.list_all_sessions().await.unwrap().is_empty());
    }
}
