use chrono::{DateTime, SubsecRound, Utc};
use sqlx::any::{AnyPool, AnyPoolOptions, AnyRow};
use sqlx::Row;
use tokio::sync::OnceCell;

use super::*;
use crate::score::{parse_timestamp, GameScore};

/// `created_at` is kept as fixed-width UTC text so that ordering the column
/// lexically is the same as ordering it chronologically.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Scores stored in a SQL database reached through an `sqlx` pool.
pub struct SqlStore {
    pool: AnyPool,
    table: String,
    schema: OnceCell<()>,
}

impl SqlStore {
    pub fn new(pool: AnyPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            schema: OnceCell::new(),
        }
    }

    /// Builds a pool without opening a connection, so an unreachable
    /// database only shows up once a request needs it.
    pub fn connect_lazy(database_url: &str, table: impl Into<String>) -> StoreResult<Self> {
        let pool = AnyPoolOptions::new().connect_lazy(database_url)?;
        Ok(Self::new(pool, table))
    }

    /// Creates the scores table on first use.
    async fn ensure_schema(&self) -> StoreResult<()> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(&format!(
                    "CREATE TABLE IF NOT EXISTS {} (name TEXT NOT NULL, score BIGINT NOT NULL, created_at TEXT NOT NULL)",
                    self.table
                ))
                .execute(&self.pool)
                .await?;
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    /// Inserts `score` stamped with `created_at`.
    pub async fn insert_at(
        &self,
        score: &NewScore,
        created_at: DateTime<Utc>,
    ) -> StoreResult<ScoreEntry> {
        self.ensure_schema().await?;

        let created_at = created_at.trunc_subsecs(6);
        sqlx::query(&format!(
            "INSERT INTO {} (name, score, created_at) VALUES ($1, $2, $3)",
            self.table
        ))
        .bind(score.name.as_str())
        .bind(i64::from(score.score))
        .bind(created_at.format(TIMESTAMP_FORMAT).to_string())
        .execute(&self.pool)
        .await?;

        Ok(score.clone().into_entry(created_at))
    }
}

fn order_clause(query: &ScoreQuery) -> String {
    query
        .order
        .iter()
        .map(|order| {
            let direction = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            format!("{} {}", order.key.column(), direction)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_row(row: AnyRow) -> StoreResult<ScoreEntry> {
    let name = row.try_get::<String, _>("name")?;
    let score = row.try_get::<i64, _>("score")?;
    let created_at = row.try_get::<String, _>("created_at")?;

    let score = GameScore::try_from(score)
        .map_err(|_| StoreError::Malformed(format!("score {} is out of range", score)))?;
    let created_at = parse_timestamp(&created_at)
        .map_err(|err| StoreError::Malformed(format!("created_at {:?}: {}", created_at, err)))?;

    Ok(ScoreEntry {
        name,
        score,
        created_at,
    })
}

#[rocket::async_trait]
impl ScoreStore for SqlStore {
    async fn query(&self, query: &ScoreQuery) -> StoreResult<Vec<ScoreEntry>> {
        self.ensure_schema().await?;

        let mut statement = format!("SELECT {} FROM {}", COLUMNS, self.table);
        if !query.order.is_empty() {
            statement.push_str(" ORDER BY ");
            statement.push_str(&order_clause(query));
        }
        statement.push_str(&format!(" LIMIT {}", query.limit));

        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        rows.into_iter().map(decode_row).collect()
    }

    async fn insert(&self, score: &NewScore) -> StoreResult<ScoreEntry> {
        self.insert_at(score, Utc::now()).await
    }
}

#[cfg(test)]
pub(crate) async fn in_memory() -> SqlStore {
    // A single connection, otherwise every pooled connection gets its own database
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open an in-memory database");
    SqlStore::new(pool, "scores")
}
