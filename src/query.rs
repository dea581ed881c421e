use std::fmt;

use chrono::{DateTime, Utc};

use crate::binds::{Binds, compile, protected_ranges};
use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::query_utils::{highlight_keywords, is_write_type, swap_prefix_outside};

/// A single statement that can be run against a database.
///
/// Implementations hold the raw SQL and its binds, produce the final SQL text, and carry the
/// bookkeeping a caller records around execution: timing and the error, if any. The trait is
/// object safe, so callers may hold a `Box<dyn QueryInterface>`; `Query` adds chaining and
/// `Into<Binds>` conversions on its inherent methods of the same names.
pub trait QueryInterface {
    /// Set the raw SQL for this statement and compile `binds` into it.
    ///
    /// # Errors
    /// Returns `QueryError` if the binds do not fit the statement's markers.
    fn set_query(&mut self, sql: &str, binds: Binds, escape: bool) -> Result<(), QueryError>;

    /// The final SQL after binding and any prefix swap.
    fn get_query(&self) -> &str;

    /// Record execution time. A missing `end` means now.
    fn set_duration(&mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>);

    /// Execution time in seconds with `decimals` fractional digits.
    fn get_duration(&self, decimals: usize) -> String;

    fn set_error(&mut self, code: i32, message: &str);

    fn has_error(&self) -> bool;

    fn get_error_code(&self) -> i32;

    fn get_error_message(&self) -> &str;

    /// Whether the statement writes data or schema.
    fn is_write_type(&self) -> bool;

    /// Replace table prefix `orig` with `swap` in the final SQL.
    fn swap_prefix(&mut self, orig: &str, swap: &str);
}

/// An error reported by the database for a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub code: i32,
    pub message: String,
}

/// A statement's SQL, binds, and execution bookkeeping.
///
/// ```rust
/// use sql_statement::prelude::*;
///
/// let mut query = Query::with_config(QueryConfig::new(DatabaseType::Postgres));
/// query.set_query(
///     "SELECT * FROM users WHERE id = ? AND active = ?",
///     vec![BindValue::Int(4), BindValue::Bool(true)],
///     true,
/// )?;
/// assert_eq!(query.get_query(), "SELECT * FROM users WHERE id = 4 AND active = TRUE");
/// assert!(!query.is_write_type());
/// # Ok::<(), QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    config: QueryConfig,
    original: String,
    compiled: String,
    binds: Binds,
    escape: bool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    error: Option<QueryFailure>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            escape: config.escape_by_default,
            config,
            original: String::new(),
            compiled: String::new(),
            binds: Binds::None,
            start: None,
            end: None,
            error: None,
        }
    }

    /// Build a statement from `sql` and `binds`, escaping per `config.escape_by_default`.
    ///
    /// # Errors
    /// Returns `QueryError` if the binds do not fit the statement's markers.
    pub fn prepare(
        config: QueryConfig,
        sql: &str,
        binds: impl Into<Binds>,
    ) -> Result<Self, QueryError> {
        let escape = config.escape_by_default;
        let mut query = Self::with_config(config);
        query.set_query(sql, binds, escape)?;
        Ok(query)
    }

    /// Replace the binds and recompile from the original SQL.
    ///
    /// # Errors
    /// Returns `QueryError` if the binds do not fit the statement's markers. The statement is
    /// left unchanged on error.
    pub fn set_binds(
        &mut self,
        binds: impl Into<Binds>,
        escape: bool,
    ) -> Result<&mut Self, QueryError> {
        let original = std::mem::take(&mut self.original);
        let result = self.compile_into(&original, binds.into(), escape);
        self.original = original;
        result.map(|()| self)
    }

    /// Set the raw SQL and compile `binds` into it, resetting timing and error state.
    ///
    /// # Errors
    /// Returns `QueryError` if the binds do not fit the statement's markers. The statement is
    /// left unchanged on error.
    pub fn set_query(
        &mut self,
        sql: &str,
        binds: impl Into<Binds>,
        escape: bool,
    ) -> Result<&mut Self, QueryError> {
        self.compile_into(sql, binds.into(), escape)?;
        self.original = sql.to_string();
        self.start = None;
        self.end = None;
        self.error = None;
        Ok(self)
    }

    /// Record execution time. A missing `end` means now.
    pub fn set_duration(
        &mut self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> &mut Self {
        self.start = Some(start);
        self.end = Some(end.unwrap_or_else(Utc::now));
        self
    }

    pub fn set_error(&mut self, code: i32, message: &str) -> &mut Self {
        tracing::warn!(
            code,
            error_message = message,
            sql = %self.original,
            "statement error recorded"
        );
        tracing::debug!(sql = %self.compiled, "failing statement");
        self.error = Some(QueryFailure {
            code,
            message: message.to_string(),
        });
        self
    }

    /// Replace table prefix `orig` with `swap` in the final SQL. String literals, comments and
    /// unbound named markers keep their text, so bound values are never rewritten.
    pub fn swap_prefix(&mut self, orig: &str, swap: &str) -> &mut Self {
        let protected = protected_ranges(&self.compiled, self.config.dialect);
        let swapped = swap_prefix_outside(&self.compiled, orig, swap, &protected).into_owned();
        if swapped != self.compiled {
            tracing::debug!(orig, swap, "swapped table prefix");
            self.compiled = swapped;
        }
        self
    }

    fn compile_into(&mut self, sql: &str, binds: Binds, escape: bool) -> Result<(), QueryError> {
        let mut compiled = compile(sql, &binds, self.config.dialect, escape)?.into_owned();
        if self.config.swaps_prefix() {
            let protected = protected_ranges(&compiled, self.config.dialect);
            compiled = swap_prefix_outside(
                &compiled,
                &self.config.swap_pre,
                &self.config.db_prefix,
                &protected,
            )
            .into_owned();
        }

        tracing::debug!(
            dialect = ?self.config.dialect,
            binds = binds.len(),
            escape,
            "compiled statement"
        );

        self.compiled = compiled;
        self.binds = binds;
        self.escape = escape;
        Ok(())
    }

    /// The SQL as given, before binding.
    #[must_use]
    pub fn get_original_query(&self) -> &str {
        &self.original
    }

    #[must_use]
    pub fn binds(&self) -> &Binds {
        &self.binds
    }

    #[must_use]
    pub fn escape(&self) -> bool {
        self.escape
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    #[must_use]
    pub fn error(&self) -> Option<&QueryFailure> {
        self.error.as_ref()
    }

    /// Start time as Unix seconds with `decimals` fractional digits, or `""` if never started.
    #[must_use]
    pub fn get_start_time(&self, decimals: usize) -> String {
        self.start.map_or_else(String::new, |start| {
            let secs = start.timestamp_micros() as f64 / 1_000_000.0;
            format!("{secs:.decimals$}")
        })
    }

    /// Mark the start of execution, clearing any previous end time.
    pub fn mark_start(&mut self) -> &mut Self {
        self.start = Some(Utc::now());
        self.end = None;
        self
    }

    /// Mark the end of execution and log the statement with its duration.
    pub fn finish(&mut self) -> &mut Self {
        let end = Utc::now();
        let start = self.start.unwrap_or(end);
        self.set_duration(start, Some(end));
        tracing::debug!(
            sql = %self.compiled,
            duration = %self.get_duration(6),
            failed = self.error.is_some(),
            "statement finished"
        );
        self
    }

    /// The final SQL as HTML with keywords in `<strong>` tags.
    #[must_use]
    pub fn debug_display(&self) -> String {
        highlight_keywords(&self.compiled)
    }

    fn duration_secs(&self) -> f64 {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return 0.0;
        };
        let delta = end.signed_duration_since(start);
        let secs = delta
            .num_microseconds()
            .map_or(delta.num_seconds() as f64, |us| us as f64 / 1_000_000.0);
        secs.max(0.0)
    }
}

impl QueryInterface for Query {
    fn set_query(&mut self, sql: &str, binds: Binds, escape: bool) -> Result<(), QueryError> {
        Query::set_query(self, sql, binds, escape).map(|_| ())
    }

    fn get_query(&self) -> &str {
        &self.compiled
    }

    fn set_duration(&mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) {
        Query::set_duration(self, start, end);
    }

    fn get_duration(&self, decimals: usize) -> String {
        let secs = self.duration_secs();
        format!("{secs:.decimals$}")
    }

    fn set_error(&mut self, code: i32, message: &str) {
        Query::set_error(self, code, message);
    }

    fn has_error(&self) -> bool {
        self.error.is_some()
    }

    fn get_error_code(&self) -> i32 {
        self.error.as_ref().map_or(0, |e| e.code)
    }

    fn get_error_message(&self) -> &str {
        self.error.as_ref().map_or("", |e| e.message.as_str())
    }

    fn is_write_type(&self) -> bool {
        is_write_type(&self.compiled)
    }

    fn swap_prefix(&mut self, orig: &str, swap: &str) {
        Query::swap_prefix(self, orig, swap);
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compiled)
    }
}
