use chrono::Utc;
use recall_core::model::{CardId, EnhancedCard};

use super::SqliteRepository;
use super::mapping::{db, encode_card, i64_to_u64, id_to_i64, map_card_row};
use crate::repository::{CardRepository, StorageError};

#[async_trait::async_trait]
impl CardRepository for SqliteRepository {
    async fn upsert_card(&self, card: &EnhancedCard) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO cards (id, record, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                record = excluded.record,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id_to_i64("card_id", card.id().value())?)
        .bind(encode_card(card)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(())
    }

    async fn insert_card(&self, card: &EnhancedCard) -> Result<(), StorageError> {
        let result = sqlx::query("INSERT INTO cards (id, record, updated_at) VALUES (?1, ?2, ?3)")
            .bind(id_to_i64("card_id", card.id().value())?)
            .bind(encode_card(card)?)
            .bind(Utc::now())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StorageError::Conflict)
            }
            Err(err) => Err(db(err)),
        }
    }

    async fn get_card(&self, id: CardId) -> Result<EnhancedCard, StorageError> {
        let row = sqlx::query("SELECT id, record FROM cards WHERE id = ?1")
            .bind(id_to_i64("card_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or(StorageError::NotFound)?;

        map_card_row(&row)
    }

    async fn list_cards(&self) -> Result<Vec<EnhancedCard>, StorageError> {
        let rows = sqlx::query("SELECT id, record FROM cards ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        rows.iter().map(map_card_row).collect()
    }

    async fn next_card_id(&self) -> Result<CardId, StorageError> {
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM cards")
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;

        Ok(CardId::new(i64_to_u64("card_id", next)?))
    }
}
