use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::types::DatabaseType;

/// Settings shared by every statement created from it.
///
/// When both `db_prefix` and `swap_pre` are non-empty and differ, each compiled statement has
/// `swap_pre` replaced with `db_prefix`. This lets SQL be written once against a placeholder
/// prefix and run against whatever prefix a deployment uses.
///
/// ```rust
/// use sql_statement::prelude::*;
///
/// let config = QueryConfig::from_json(r#"{ "dialect": "postgres", "db_prefix": "app_" }"#)?;
/// assert_eq!(config.dialect, DatabaseType::Postgres);
/// # Ok::<(), QueryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub dialect: DatabaseType,
    pub db_prefix: String,
    pub swap_pre: String,
    pub escape_by_default: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            dialect: DatabaseType::default(),
            db_prefix: String::new(),
            swap_pre: String::new(),
            escape_by_default: true,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub fn new(dialect: DatabaseType) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    /// Returns `QueryError::Json` for malformed JSON and `QueryError::ConfigError` when
    /// validation fails.
    pub fn from_json(raw: &str) -> Result<Self, QueryError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: DatabaseType) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_db_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.db_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_swap_pre(mut self, swap_pre: impl Into<String>) -> Self {
        self.swap_pre = swap_pre.into();
        self
    }

    #[must_use]
    pub fn with_escape_by_default(mut self, escape: bool) -> Self {
        self.escape_by_default = escape;
        self
    }

    /// Whether compiled statements should have `swap_pre` rewritten to `db_prefix`.
    #[must_use]
    pub fn swaps_prefix(&self) -> bool {
        !self.db_prefix.is_empty() && !self.swap_pre.is_empty() && self.db_prefix != self.swap_pre
    }

    /// Check that both prefixes are usable inside an identifier.
    ///
    /// # Errors
    /// Returns `QueryError::ConfigError` if a prefix contains whitespace or quote characters.
    pub fn validate(&self) -> Result<(), QueryError> {
        for (field, value) in [("db_prefix", &self.db_prefix), ("swap_pre", &self.swap_pre)] {
            if value
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '`'))
            {
                return Err(QueryError::ConfigError(format!(
                    "{field} must not contain whitespace or quotes: {value:?}"
                )));
            }
        }
        Ok(())
    }
}
