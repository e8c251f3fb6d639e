//! Parser for the `.properties` text format
//!
//! Supports `#`/`!` comments, `=`/`:`/whitespace separators, trailing-backslash
//! line continuations and the usual escapes (`\t`, `\n`, `\r`, `\f`, `\uXXXX`).

use crate::error::{PropertyError, Result};

/// Parse property text into ordered `(key, value)` pairs.
///
/// Duplicated keys are kept in order; callers inserting into a map get
/// last-wins semantics.
pub fn parse(text: &str) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let line_number = index + 1;
        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_entry(&logical);
        entries.push((
            unescape(raw_key, line_number)?,
            unescape(raw_value, line_number)?,
        ));
    }

    Ok(entries)
}

/// An odd number of trailing backslashes marks a continued line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

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
                let value = line[i + 1..].trim_start();
                return (&line[..i], value);
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start();
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start();
    }
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String> {
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
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .ok_or_else(|| PropertyError::InvalidEscape {
                        line,
                        reason: format!("malformed \\u escape {:?}", hex),
                    })?;
                let ch = char::from_u32(code).ok_or_else(|| PropertyError::InvalidEscape {
                    line,
                    reason: format!("\\u{} is not a scalar value", hex),
                })?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}
