//! Reader for Java-style `.properties` files.
//!
//! Supported syntax:
//! - `key=value`, `key: value` and `key value` separators
//! - `#` and `!` comment lines
//! - a trailing backslash continues the entry on the next line, whose leading
//!   whitespace is dropped
//! - escapes `\t`, `\n`, `\r`, `\f`, `\uXXXX`; any other escaped character
//!   stands for itself

use super::ConfigError;
use std::collections::BTreeMap;

/// Parse properties text. Later entries override earlier ones.
pub fn parse_properties(text: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut properties = BTreeMap::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        let key = unescape(key).map_err(|message| ConfigError::Malformed {
            line: line_no,
            message,
        })?;
        let value = unescape(value).map_err(|message| ConfigError::Malformed {
            line: line_no,
            message,
        })?;
        properties.insert(key, value);
    }

    Ok(properties)
}

/// An odd number of trailing backslashes means the last one escapes the
/// line break.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                let value = line[i + 1..].trim_start_matches(is_property_whitespace);
                return (&line[..key_end], value);
            }
            c if is_property_whitespace(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches(is_property_whitespace);
    let rest = rest
        .strip_prefix(['=', ':'])
        .map(|r| r.trim_start_matches(is_property_whitespace))
        .unwrap_or(rest);
    (key, rest)
}

fn is_property_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .ok_or_else(|| format!("malformed \\uxxxx escape: \\u{hex}"))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| format!("invalid unicode escape: \\u{hex}"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}
