use std::borrow::Cow;
use std::ops::Range;

use lazy_static::lazy_static;
use regex::{Captures, Regex, RegexBuilder};

lazy_static! {
    static ref WRITE_TYPE: Regex = Regex::new(
        r#"(?i)^\s*"?(SET|INSERT|UPDATE|DELETE|REPLACE|CREATE|DROP|TRUNCATE|LOAD|COPY|ALTER|RENAME|GRANT|REVOKE|LOCK|UNLOCK|REINDEX|MERGE)\s"#
    )
    .expect("valid static pattern");
    static ref KEYWORDS: Regex = Regex::new(
        r"(?i)\b(SELECT|DISTINCT|FROM|WHERE|AND|LEFT JOIN|RIGHT JOIN|INNER JOIN|JOIN|ORDER BY|GROUP BY|LIMIT|INSERT|INTO|VALUES|UPDATE|DELETE|SET|OR|HAVING|OFFSET|NOT IN|IN|NOT LIKE|LIKE|COUNT|MAX|MIN|ON|AS|AVG|SUM)\b"
    )
    .expect("valid static pattern");
}

/// Whether `sql` mutates stored data or schema.
#[must_use]
pub fn is_write_type(sql: &str) -> bool {
    WRITE_TYPE.is_match(sql)
}

/// Replace table prefix `orig` with `swap`, case-insensitively.
///
/// An occurrence is replaced only when a non-word character precedes it and a non-whitespace
/// character follows it, so `orig` must be a prefix of some identifier, and a prefix at the very
/// start of the text is left alone.
#[must_use]
pub fn swap_prefix<'a>(sql: &'a str, orig: &str, swap: &str) -> Cow<'a, str> {
    swap_prefix_outside(sql, orig, swap, &[])
}

/// [`swap_prefix`], except occurrences starting inside any of the `protected` byte ranges are
/// kept as written.
#[must_use]
pub fn swap_prefix_outside<'a>(
    sql: &'a str,
    orig: &str,
    swap: &str,
    protected: &[Range<usize>],
) -> Cow<'a, str> {
    if orig.is_empty() {
        return Cow::Borrowed(sql);
    }
    let pattern = format!(r"(\W){}(\S)", regex::escape(orig));
    let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return Cow::Borrowed(sql);
    };
    re.replace_all(sql, |caps: &Captures<'_>| {
        let at = caps.get(0).map_or(0, |m| m.start()) + caps[1].len();
        if protected.iter().any(|r| r.contains(&at)) {
            caps[0].to_string()
        } else {
            format!("{}{}{}", &caps[1], swap, &caps[2])
        }
    })
}

/// HTML-escape `sql` and wrap SQL keywords in `<strong>` tags.
#[must_use]
pub fn highlight_keywords(sql: &str) -> String {
    let mut escaped = String::with_capacity(sql.len());
    for c in sql.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    KEYWORDS
        .replace_all(&escaped, "<strong>${1}</strong>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_keywords_classify() {
        for kw in [
            "SET", "INSERT", "UPDATE", "DELETE", "REPLACE", "CREATE", "DROP", "TRUNCATE", "LOAD",
            "COPY", "ALTER", "RENAME", "GRANT", "REVOKE", "LOCK", "UNLOCK", "REINDEX", "MERGE",
        ] {
            assert!(is_write_type(&format!("{kw} x")), "{kw}");
            assert!(is_write_type(&format!("  \n{} x", kw.to_lowercase())), "{kw}");
        }
    }

    #[test]
    fn reads_do_not_classify() {
        assert!(!is_write_type("SELECT * FROM t"));
        assert!(!is_write_type("WITH x AS (DELETE FROM t) SELECT 1"));
        assert!(!is_write_type("INSERTED"));
        assert!(!is_write_type("-- comment\nSELECT 1"));
    }

    #[test]
    fn leading_quote_is_allowed() {
        assert!(is_write_type("\"UPDATE t SET a = 1"));
    }

    #[test]
    fn swaps_prefix_after_non_word() {
        let res = swap_prefix("SELECT * FROM db_users JOIN DB_roles ON 1", "db_", "app_");
        assert_eq!(res, "SELECT * FROM app_users JOIN app_roles ON 1");
    }

    #[test]
    fn swap_requires_boundaries() {
        assert_eq!(swap_prefix("db_users", "db_", "app_"), "db_users");
        assert_eq!(swap_prefix("SELECT mydb_x FROM t", "db_", "app_"), "SELECT mydb_x FROM t");
        assert_eq!(swap_prefix("SELECT x FROM db_ ", "db_", "app_"), "SELECT x FROM db_ ");
    }

    #[test]
    fn swap_replacement_is_literal() {
        assert_eq!(swap_prefix(" db_t", "db_", "$1_"), " $1_t");
    }

    #[test]
    fn protected_ranges_keep_prefix() {
        let sql = "SELECT 'db_x' FROM db_t";
        assert_eq!(
            swap_prefix_outside(sql, "db_", "app_", &[7..13]),
            "SELECT 'db_x' FROM app_t"
        );
        assert_eq!(swap_prefix(sql, "db_", "app_"), "SELECT 'app_x' FROM app_t");
    }

    #[test]
    fn highlights_and_escapes() {
        let html = highlight_keywords("select a from t where b < 'x'");
        assert_eq!(
            html,
            "<strong>select</strong> a <strong>from</strong> t <strong>where</strong> b &lt; &#039;x&#039;"
        );
    }
}
