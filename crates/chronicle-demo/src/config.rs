//! Demo configuration, read from the environment.

use crate::error::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where events are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process memory; everything is lost on exit.
    InMemory,
    /// A `PostgreSQL` database.
    Postgres {
        /// Connection string.
        database_url: String,
        /// Pool size.
        max_connections: u32,
    },
}

/// Demo configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Event store selection.
    pub store: StoreConfig,
}

impl DemoConfig {
    /// Reads `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS` from the process
    /// environment. Without `DATABASE_URL` the in-memory store is used.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let Some(database_url) = database_url else {
            return Ok(Self {
                store: StoreConfig::InMemory,
            });
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
            })?,
        };
        if max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            store: StoreConfig::Postgres {
                database_url,
                max_connections,
            },
        })
    }
}
