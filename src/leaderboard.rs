use std::sync::Arc;

use crate::config::{Config, StoreConfig};
use crate::error::{LeaderboardError, LeaderboardResult};
use crate::score::{normalize_score, Initials, NewScore, ScoreEntry};
use crate::store::{RestStore, ScoreQuery, ScoreStore, SqlStore};

enum Backend {
    Ready(Arc<dyn ScoreStore>),
    Unconfigured { reason: String },
}

/// Validates submissions and forwards them to the configured store.
/// Holds no score data of its own.
pub struct LeaderboardService {
    backend: Backend,
    limit: usize,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn ScoreStore>, limit: usize) -> Self {
        Self {
            backend: Backend::Ready(store),
            limit,
        }
    }

    /// A service whose every store access fails with `ConfigurationMissing`.
    pub fn unconfigured(reason: impl Into<String>, limit: usize) -> Self {
        Self {
            backend: Backend::Unconfigured {
                reason: reason.into(),
            },
            limit,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let store: Result<Arc<dyn ScoreStore>, String> = match &config.store {
            StoreConfig::Sql {
                database_url,
                table,
            } => SqlStore::connect_lazy(database_url, table.as_str())
                .map(|store| Arc::new(store) as Arc<dyn ScoreStore>)
                .map_err(|err| format!("DATABASE_URL: {}", err)),
            StoreConfig::Rest {
                base_url,
                service_key,
                table,
            } => Ok(Arc::new(RestStore::new(
                base_url,
                service_key.as_str(),
                table,
            ))),
            StoreConfig::Missing { reason } => Err(reason.clone()),
        };

        match store {
            Ok(store) => Self::new(store, config.limit),
            Err(reason) => {
                tracing::warn!(%reason, "store is not configured, every request will fail");
                Self::unconfigured(reason, config.limit)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.backend, Backend::Ready(_))
    }

    fn store(&self) -> LeaderboardResult<&dyn ScoreStore> {
        match &self.backend {
            Backend::Ready(store) => Ok(store.as_ref()),
            Backend::Unconfigured { reason } => Err(LeaderboardError::ConfigurationMissing {
                reason: reason.clone(),
            }),
        }
    }

    /// The best `limit` scores, highest first, earliest first among equals.
    pub async fn list_top(&self) -> LeaderboardResult<Vec<ScoreEntry>> {
        let store = self.store()?;
        let entries = store.query(&ScoreQuery::leaderboard(self.limit)).await?;
        Ok(entries)
    }

    /// Normalizes and stores one score. Initials are checked before the store
    /// is touched; the score is clamped and never causes a rejection.
    pub async fn submit_score(
        &self,
        raw_name: &str,
        raw_score: f64,
    ) -> LeaderboardResult<ScoreEntry> {
        let name = match Initials::parse(raw_name) {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(raw_name, "rejected submission without usable initials");
                return Err(err);
            }
        };
        let score = NewScore::new(name, normalize_score(raw_score));

        let store = self.store()?;
        let entry = store.insert(&score).await?;
        tracing::info!(name = %entry.name, score = entry.score, "score submitted");
        Ok(entry)
    }
}
