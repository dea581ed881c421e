use std::ops::Range;

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MarkerKind {
    Positional,
    Named,
}

/// A bind marker's byte range in the source SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Marker {
    pub(super) start: usize,
    pub(super) end: usize,
    pub(super) kind: MarkerKind,
}

impl Marker {
    /// Name of a `:name:` marker, without the colons.
    pub(super) fn name<'a>(&self, sql: &'a str) -> &'a str {
        &sql[self.start + 1..self.end - 1]
    }
}

/// Result of one pass over a statement.
///
/// `protected` holds the byte ranges that carry data rather than SQL structure: string literals,
/// comments, dollar-quoted bodies, and named markers. Quoted identifiers are not protected.
#[derive(Debug, Default)]
pub(super) struct Scan {
    pub(super) markers: Vec<Marker>,
    pub(super) protected: Vec<Range<usize>>,
}

fn at(bytes: &[u8], idx: usize, pair: &[u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(pair.as_slice())
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `?` not followed by a digit; `?1` belongs to the driver.
fn is_positional_marker(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'?') && !bytes.get(idx + 1).is_some_and(u8::is_ascii_digit)
}

/// Parse `:name:` at `idx`, returning the exclusive end of the marker.
///
/// Postgres casts (`a::int::text`) never match: the opening colon must not follow a colon and
/// the closing colon must not precede one.
fn named_marker_end(bytes: &[u8], idx: usize) -> Option<usize> {
    if idx > 0 && bytes[idx - 1] == b':' {
        return None;
    }
    let name_len = bytes[idx + 1..].iter().take_while(|b| is_ident_byte(**b)).count();
    let close = idx + 1 + name_len;
    if name_len == 0 || bytes.get(close) != Some(&b':') || bytes.get(close + 1) == Some(&b':') {
        return None;
    }
    Some(close + 1)
}

/// Parse an opening `$tag$` at `idx`, returning the tag and the index of its closing `$`.
/// `$1` placeholders are rejected.
fn dollar_tag(sql: &str, idx: usize) -> Option<(String, usize)> {
    let bytes = sql.as_bytes();
    let tag_len = bytes[idx + 1..].iter().take_while(|b| is_ident_byte(**b)).count();
    let close = idx + 1 + tag_len;
    if bytes.get(close) != Some(&b'$') || bytes.get(idx + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    Some((sql[idx + 1..close].to_string(), close))
}

/// Whether `$tag$` closes at `idx`.
fn closes_dollar(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    bytes.get(idx + 1..end) == Some(tag.as_bytes()) && bytes.get(end) == Some(&b'$')
}

/// Walk `sql` once, collecting bind markers and protected ranges. With `backslash_escapes`,
/// `\'` inside a single-quoted literal does not end it.
pub(super) fn scan(sql: &str, backslash_escapes: bool) -> Scan {
    let mut out = Scan::default();
    let mut state = State::Normal;
    let mut opened = 0;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                opened = idx;
                match b {
                    b'\'' => state = State::SingleQuoted,
                    b'"' => state = State::DoubleQuoted,
                    b'`' => state = State::Backticked,
                    _ if at(bytes, idx, b"--") => state = State::LineComment,
                    _ if at(bytes, idx, b"/*") => {
                        state = State::BlockComment(1);
                        idx += 1;
                    }
                    b'$' => {
                        if let Some((tag, close)) = dollar_tag(sql, idx) {
                            state = State::DollarQuoted(tag);
                            idx = close;
                        }
                    }
                    _ if is_positional_marker(bytes, idx) => out.markers.push(Marker {
                        start: idx,
                        end: idx + 1,
                        kind: MarkerKind::Positional,
                    }),
                    b':' => {
                        if let Some(end) = named_marker_end(bytes, idx) {
                            out.markers.push(Marker {
                                start: idx,
                                end,
                                kind: MarkerKind::Named,
                            });
                            out.protected.push(idx..end);
                            idx = end - 1;
                        }
                    }
                    _ => {}
                }
            }
            State::SingleQuoted => {
                if backslash_escapes && b == b'\\' {
                    idx += 1;
                } else if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                        out.protected.push(opened..idx + 1);
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Backticked => {
                if b == b'`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                    out.protected.push(opened..idx);
                }
            }
            State::BlockComment(depth) => {
                if at(bytes, idx, b"/*") {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if at(bytes, idx, b"*/") {
                    idx += 1;
                    if depth == 1 {
                        state = State::Normal;
                        out.protected.push(opened..idx + 1);
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && closes_dollar(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                    out.protected.push(opened..idx + 1);
                }
            }
        }

        idx += 1;
    }

    // unterminated literal or comment runs to the end
    if matches!(
        state,
        State::SingleQuoted | State::LineComment | State::BlockComment(_) | State::DollarQuoted(_)
    ) {
        out.protected.push(opened..bytes.len());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<MarkerKind> {
        scan(sql, false).markers.iter().map(|m| m.kind).collect()
    }

    fn protected<'a>(sql: &'a str) -> Vec<&'a str> {
        scan(sql, false)
            .protected
            .into_iter()
            .map(|r| &sql[r])
            .collect()
    }

    #[test]
    fn finds_positional_markers() {
        let markers = scan("select * from t where a = ? and b = ?", false).markers;
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].start, 26);
        assert_eq!(markers[1].end, 37);
    }

    #[test]
    fn numbered_placeholders_are_not_markers() {
        assert!(kinds("select ?1, ?2").is_empty());
    }

    #[test]
    fn skips_literals_identifiers_and_comments() {
        let sql = "select '?', \"a?\", `b?` -- ?\n/* ? /* ? */ ? */ from t where a = ?";
        assert_eq!(kinds(sql), vec![MarkerKind::Positional]);
    }

    #[test]
    fn skips_dollar_quoted_bodies() {
        let sql = "select $fn$ ? :x: $fn$, ?";
        assert_eq!(kinds(sql), vec![MarkerKind::Positional]);
    }

    #[test]
    fn named_markers_ignore_casts() {
        let sql = "select a::int::text, :id: from t";
        let markers = scan(sql, false).markers;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name(sql), "id");
    }

    #[test]
    fn backslash_escapes_keep_literal_open() {
        let sql = r"select 'a\'', ?";
        assert_eq!(scan(sql, true).markers.len(), 1);
        // read as a doubled quote, the literal swallows the rest
        assert!(scan(sql, false).markers.is_empty());
    }

    #[test]
    fn protects_data_but_not_identifiers() {
        let sql = "select \"db_t\".a, 'x''y', :n: -- c\nfrom t /* a /* b */ */ where $q$z$q$";
        assert_eq!(
            protected(sql),
            vec!["'x''y'", ":n:", "-- c", "/* a /* b */ */", "$q$z$q$"]
        );
    }

    #[test]
    fn unterminated_literal_is_protected_to_end() {
        assert_eq!(protected("select 'open"), vec!["'open"]);
    }
}
