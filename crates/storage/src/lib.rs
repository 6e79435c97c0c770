#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CardRepository, InMemoryRepository, Storage, StorageError, StudySessionRepository,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
