use recall_core::model::{CardId, EnhancedCard, StudySession};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn db<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

/// Encode a card record, refusing scores JSON cannot represent.
pub(crate) fn encode_card(card: &EnhancedCard) -> Result<String, StorageError> {
    if let Some(bad) = card.performance().iter().find(|p| !p.is_finite()) {
        return Err(StorageError::Serialization(format!(
            "card {} has non-finite performance {bad}",
            card.id()
        )));
    }
    encode(card)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_card_row(row: &sqlx::sqlite::SqliteRow) -> Result<EnhancedCard, StorageError> {
    let id = CardId::new(i64_to_u64("card_id", row.try_get("id").map_err(ser)?)?);
    let record: String = row.try_get("record").map_err(ser)?;
    let card: EnhancedCard = decode(&record)?;
    if card.id() != id {
        return Err(StorageError::Serialization(format!(
            "record for card {id} holds card {}",
            card.id()
        )));
    }
    Ok(card)
}

pub(crate) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StudySession, StorageError> {
    let record: String = row.try_get("record").map_err(ser)?;
    decode(&record)
}
