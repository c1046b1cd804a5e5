use thiserror::Error;

use crate::score::{NewScore, ScoreEntry};

mod rest;
mod sql;

pub use rest::RestStore;
pub use sql::SqlStore;
#[cfg(test)]
pub(crate) use sql::in_memory;

/// Columns projected by every read and returned by every insert.
pub const COLUMNS: &str = "name,score,created_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed store response: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Score,
    CreatedAt,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: Direction,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: Direction) -> Self {
        Self { key, direction }
    }
}

/// An ordered, limited read of the scores collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreQuery {
    pub order: Vec<SortOrder>,
    pub limit: usize,
}

impl ScoreQuery {
    /// Highest score first; equal scores rank by earliest submission.
    pub fn leaderboard(limit: usize) -> Self {
        Self {
            order: vec![
                SortOrder::new(SortKey::Score, Direction::Descending),
                SortOrder::new(SortKey::CreatedAt, Direction::Ascending),
            ],
            limit,
        }
    }
}

/// An external ordered-record store holding the scores collection.
///
/// Each call is a single round trip; implementations never retry.
#[rocket::async_trait]
pub trait ScoreStore: Send + Sync {
    async fn query(&self, query: &ScoreQuery) -> StoreResult<Vec<ScoreEntry>>;

    /// Appends one record and returns it as stored, including `created_at`.
    async fn insert(&self, score: &NewScore) -> StoreResult<ScoreEntry>;
}

/// Whether `table` can be spliced into a statement or URL path as-is.
pub fn is_valid_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
