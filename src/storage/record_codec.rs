//! Line encoding for the description store.
//!
//! One record per line: `<artifact id><DELIMITER><escaped text>`. Identifiers
//! never contain the delimiter, so a line is always split on its first
//! occurrence. Description text is escaped so that it can contain neither a
//! line break nor the delimiter:
//!
//! | text            | stored |
//! |-----------------|--------|
//! | `\`             | `\\`   |
//! | line feed       | `\n`   |
//! | carriage return | `\r`   |
//! | `DELIMITER`     | `\d`   |
//!
//! Unknown escape sequences decode verbatim, which keeps stores written
//! without escaping readable.

/// Separator between identifier and text.
pub const DELIMITER: &str = "<-----delimiter----->";

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with(DELIMITER) {
            out.push_str("\\d");
            rest = &rest[DELIMITER.len()..];
            continue;
        }
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

pub fn unescape_text(stored: &str) -> String {
    let mut out = String::with_capacity(stored.len());
    let mut chars = stored.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('d') => out.push_str(DELIMITER),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encodes one record, without the trailing newline.
pub fn encode_record(id: &str, text: &str) -> String {
    format!("{}{}{}", id, DELIMITER, escape_text(text))
}

/// Splits a stored line into its raw identifier and decoded text.
///
/// Returns `None` for lines that carry no delimiter.
pub fn decode_record(line: &str) -> Option<(&str, String)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (id, text) = line.split_once(DELIMITER)?;
    Some((id.trim(), unescape_text(text)))
}
