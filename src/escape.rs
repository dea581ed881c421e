use std::fmt::Write;

use crate::error::QueryError;
use crate::types::{BindValue, DatabaseType};

/// Renders bind values as SQL literal text.
pub trait Escaper {
    /// Escape a string's contents for use between single quotes (no quotes added).
    fn escape_string(&self, raw: &str) -> String;

    /// Render a bind value as a quoted, escaped SQL literal.
    ///
    /// # Errors
    /// Returns `QueryError::ParameterError` for values that have no literal form
    /// (non-finite floats, empty or nested lists).
    fn escape_value(&self, value: &BindValue) -> Result<String, QueryError>;

    /// Render a bind value without quoting text.
    ///
    /// # Errors
    /// Same as [`Escaper::escape_value`].
    fn raw_value(&self, value: &BindValue) -> Result<String, QueryError>;
}

impl Escaper for DatabaseType {
    fn escape_string(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' if matches!(self, DatabaseType::Mysql) => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out
    }

    fn escape_value(&self, value: &BindValue) -> Result<String, QueryError> {
        render(*self, value, true, false)
    }

    fn raw_value(&self, value: &BindValue) -> Result<String, QueryError> {
        render(*self, value, false, false)
    }
}

fn render(
    dialect: DatabaseType,
    value: &BindValue,
    escape: bool,
    nested: bool,
) -> Result<String, QueryError> {
    let quote = |s: &str| {
        if escape {
            format!("'{}'", dialect.escape_string(s))
        } else {
            s.to_string()
        }
    };

    let rendered = match value {
        // negatives are parenthesized so `x -?` cannot become a `--` comment
        BindValue::Int(i) if *i < 0 => format!("({i})"),
        BindValue::Int(i) => i.to_string(),
        BindValue::Float(f) if !f.is_finite() => {
            return Err(QueryError::ParameterError(format!(
                "float {f} has no SQL literal"
            )));
        }
        BindValue::Float(f) if f.is_sign_negative() => format!("({f})"),
        BindValue::Float(f) => f.to_string(),
        BindValue::Text(s) => quote(s),
        BindValue::Bool(b) => match (dialect, b) {
            (DatabaseType::Postgres, true) => "TRUE".to_string(),
            (DatabaseType::Postgres, false) => "FALSE".to_string(),
            (_, b) => i64::from(*b).to_string(),
        },
        BindValue::Timestamp(dt) => quote(&dt.format("%F %T%.f").to_string()),
        BindValue::Null => "NULL".to_string(),
        BindValue::JSON(jval) => quote(&jval.to_string()),
        BindValue::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2);
            for b in bytes {
                // writing to a String cannot fail
                let _ = write!(hex, "{b:02x}");
            }
            match dialect {
                DatabaseType::Postgres => format!("'\\x{hex}'"),
                DatabaseType::Sqlite | DatabaseType::Mysql => format!("X'{hex}'"),
                DatabaseType::Mssql => format!("0x{hex}"),
            }
        }
        BindValue::List(values) => {
            if nested {
                return Err(QueryError::ParameterError(
                    "nested bind lists are not supported".to_string(),
                ));
            }
            if values.is_empty() {
                return Err(QueryError::ParameterError(
                    "empty bind list has no SQL form".to_string(),
                ));
            }
            let parts = values
                .iter()
                .map(|v| render(dialect, v, escape, true))
                .collect::<Result<Vec<_>, _>>()?;
            format!("({})", parts.join(","))
        }
    };
    Ok(rendered)
}
