use crate::store::is_valid_table_name;

pub const DEFAULT_TABLE: &str = "scores";
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_ALLOW_ORIGIN: &str = "*";

/// Where scores live, or why that could not be worked out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreConfig {
    Sql {
        database_url: String,
        table: String,
    },
    Rest {
        base_url: String,
        service_key: String,
        table: String,
    },
    Missing {
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub store: StoreConfig,
    pub allow_origin: String,
    pub limit: usize,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let limit = match var("LEADERBOARD_LIMIT") {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "LEADERBOARD_LIMIT is not a positive integer, using {}",
                        DEFAULT_LIMIT
                    );
                    DEFAULT_LIMIT
                }
            },
        };

        Self {
            store: store_config(&var),
            allow_origin: var("CORS_ALLOW_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOW_ORIGIN.to_owned()),
            limit,
        }
    }
}

fn store_config(var: &impl Fn(&str) -> Option<String>) -> StoreConfig {
    let table = var("SCORES_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_owned());
    if !is_valid_table_name(&table) {
        return StoreConfig::Missing {
            reason: format!("SCORES_TABLE {:?} is not a valid table name", table),
        };
    }

    let sql = || match var("DATABASE_URL") {
        Some(database_url) => StoreConfig::Sql {
            database_url,
            table: table.clone(),
        },
        None => StoreConfig::Missing {
            reason: "Missing DATABASE_URL".to_owned(),
        },
    };
    let rest = || match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_ROLE")) {
        (Some(base_url), Some(service_key)) => StoreConfig::Rest {
            base_url,
            service_key,
            table: table.clone(),
        },
        _ => StoreConfig::Missing {
            reason: "Missing SUPABASE_URL or SUPABASE_SERVICE_ROLE".to_owned(),
        },
    };

    match var("LEADERBOARD_STORE").map(|backend| backend.trim().to_lowercase()) {
        Some(backend) if backend == "sql" => sql(),
        Some(backend) if backend == "rest" => rest(),
        Some(backend) => StoreConfig::Missing {
            reason: format!("unknown LEADERBOARD_STORE {:?}, expected sql or rest", backend),
        },
        None => match rest() {
            StoreConfig::Missing { .. } => match sql() {
                StoreConfig::Missing { .. } => StoreConfig::Missing {
                    reason: "Missing DATABASE_URL, or SUPABASE_URL and SUPABASE_SERVICE_ROLE"
                        .to_owned(),
                },
                config => config,
            },
            config => config,
        },
    }
}
