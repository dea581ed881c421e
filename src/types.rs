use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be bound into a statement.
///
/// ```rust
/// use sql_statement::prelude::*;
///
/// let binds = vec![
///     BindValue::Int(1),
///     BindValue::Text("alice".into()),
///     BindValue::List(vec![BindValue::Int(2), BindValue::Int(3)]),
/// ];
/// # let _ = binds;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// A group of values, rendered as `(a,b,c)` for `IN` clauses
    List(Vec<BindValue>),
}

impl BindValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let BindValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let BindValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[BindValue]> {
        if let BindValue::List(values) = self {
            Some(values)
        } else {
            None
        }
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Int(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        BindValue::Int(i64::from(value))
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        BindValue::Float(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        BindValue::Bool(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl From<NaiveDateTime> for BindValue {
    fn from(value: NaiveDateTime) -> Self {
        BindValue::Timestamp(value)
    }
}

impl From<JsonValue> for BindValue {
    fn from(value: JsonValue) -> Self {
        BindValue::JSON(value)
    }
}

impl From<Vec<u8>> for BindValue {
    fn from(value: Vec<u8>) -> Self {
        BindValue::Blob(value)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindValue::Null, Into::into)
    }
}

/// The SQL dialect a statement is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    Postgres,
    /// `SQLite` database
    #[default]
    Sqlite,
    /// SQL Server database
    Mssql,
    /// `MySQL` / `MariaDB` database
    Mysql,
}
