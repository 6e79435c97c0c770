use recall_core::model::{FinishedSession, SessionId, StudySession, UserId};

use super::SqliteRepository;
use super::mapping::{db, encode, i64_to_u64, map_session_row};
use crate::repository::{StorageError, StudySessionRepository};

#[async_trait::async_trait]
impl StudySessionRepository for SqliteRepository {
    async fn insert_session(
        &self,
        session: FinishedSession,
    ) -> Result<StudySession, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        // The record embeds its own id, so reserve the row first.
        let res = sqlx::query(
            r"
                INSERT INTO study_sessions (user_id, started_at, record)
                VALUES (?1, ?2, '{}')
            ",
        )
        .bind(session.user_id().as_str())
        .bind(session.started_at())
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        let id = SessionId::new(i64_to_u64("session_id", res.last_insert_rowid())?);
        let stored = session.assign_id(id);

        sqlx::query("UPDATE study_sessions SET record = ?1 WHERE id = ?2")
            .bind(encode(&stored)?)
            .bind(res.last_insert_rowid())
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        tx.commit().await.map_err(db)?;
        Ok(stored)
    }

    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<StudySession>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT record FROM study_sessions
                WHERE user_id = ?1
                ORDER BY started_at ASC, id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn list_all_sessions(&self) -> Result<Vec<StudySession>, StorageError> {
        let rows = sqlx::query("SELECT record FROM study_sessions ORDER BY started_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        rows.iter().map(map_session_row).collect()
    }
}
