use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;

mod scanner;

use scanner::{MarkerKind, scan};

use crate::error::QueryError;
use crate::escape::Escaper;
use crate::types::{BindValue, DatabaseType};

/// Values to substitute into a statement's markers.
///
/// Positional values fill `?` markers in order; named values fill `:name:` markers by name.
///
/// ```rust
/// use sql_statement::prelude::*;
///
/// let positional: Binds = vec![BindValue::Int(1), BindValue::Text("a".into())].into();
/// let named: Binds = vec![("id", BindValue::Int(1))].into();
/// # let _ = (positional, named);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Binds {
    #[default]
    None,
    Positional(Vec<BindValue>),
    Named(Vec<(String, BindValue)>),
}

impl Binds {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Binds::None => true,
            Binds::Positional(values) => values.is_empty(),
            Binds::Named(values) => values.is_empty(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Binds::None => 0,
            Binds::Positional(values) => values.len(),
            Binds::Named(values) => values.len(),
        }
    }

    /// Look up a named bind.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindValue> {
        match self {
            Binds::Named(values) => values.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<Vec<BindValue>> for Binds {
    fn from(values: Vec<BindValue>) -> Self {
        Binds::Positional(values)
    }
}

impl From<&[BindValue]> for Binds {
    fn from(values: &[BindValue]) -> Self {
        Binds::Positional(values.to_vec())
    }
}

impl From<BindValue> for Binds {
    fn from(value: BindValue) -> Self {
        Binds::Positional(vec![value])
    }
}

impl<K: Into<String>> From<Vec<(K, BindValue)>> for Binds {
    fn from(values: Vec<(K, BindValue)>) -> Self {
        Binds::Named(values.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<Option<Binds>> for Binds {
    fn from(binds: Option<Binds>) -> Self {
        binds.unwrap_or_default()
    }
}

/// Byte ranges of `sql` holding data rather than SQL structure: string literals, comments,
/// dollar-quoted bodies, and unbound named markers.
#[must_use]
pub fn protected_ranges(sql: &str, dialect: DatabaseType) -> Vec<Range<usize>> {
    scan(sql, matches!(dialect, DatabaseType::Mysql)).protected
}

/// Substitute `binds` into the markers of `sql`.
///
/// Markers inside string literals, quoted identifiers, comments, and dollar-quoted bodies are
/// left alone. Positional binds must match the `?` marker count exactly; named markers without a
/// matching bind stay as written. With `escape` off, text values are inserted unquoted.
///
/// Returns a borrowed `Cow` when there is nothing to bind.
///
/// # Errors
/// Returns `QueryError::BindCountMismatch`, `QueryError::DuplicateBind`, or the escaper's
/// `QueryError::ParameterError`.
pub fn compile<'a>(
    sql: &'a str,
    binds: &Binds,
    dialect: DatabaseType,
    escape: bool,
) -> Result<Cow<'a, str>, QueryError> {
    if binds.is_empty() {
        return Ok(Cow::Borrowed(sql));
    }

    let markers = scan(sql, matches!(dialect, DatabaseType::Mysql)).markers;
    let render = |value: &BindValue| {
        if escape {
            dialect.escape_value(value)
        } else {
            dialect.raw_value(value)
        }
    };

    let mut out = String::with_capacity(sql.len() + binds.len() * 8);
    let mut last = 0;

    match binds {
        Binds::None => return Ok(Cow::Borrowed(sql)),
        Binds::Positional(values) => {
            let positional = markers
                .iter()
                .filter(|m| m.kind == MarkerKind::Positional);
            let expected = positional.clone().count();
            if expected != values.len() {
                return Err(QueryError::BindCountMismatch {
                    expected,
                    actual: values.len(),
                });
            }
            for (marker, value) in positional.zip(values) {
                out.push_str(&sql[last..marker.start]);
                out.push_str(&render(value)?);
                last = marker.end;
            }
        }
        Binds::Named(values) => {
            let mut seen = HashSet::with_capacity(values.len());
            for (name, _) in values {
                if !seen.insert(name.as_str()) {
                    return Err(QueryError::DuplicateBind(name.clone()));
                }
            }
            for marker in markers.iter().filter(|m| m.kind == MarkerKind::Named) {
                let Some(value) = binds.get(marker.name(sql)) else {
                    continue;
                };
                out.push_str(&sql[last..marker.start]);
                out.push_str(&render(value)?);
                last = marker.end;
            }
        }
    }

    if last == 0 {
        return Ok(Cow::Borrowed(sql));
    }
    out.push_str(&sql[last..]);
    Ok(Cow::Owned(out))
}
