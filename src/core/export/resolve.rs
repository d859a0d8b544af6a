//! Index pattern resolution
//!
//! A pattern without `*` names exactly one index. With `*`, shell-style
//! wildcards apply to the whole name: `*` matches any run of characters,
//! `?` a single character and `[...]` a character set (`[!...]` negated).

use crate::domain::{DumpError, IndexName, Result};
use regex::Regex;

/// Indices from `available` selected by `pattern`, sorted and deduplicated
///
/// # Errors
///
/// Returns a validation error if the pattern is empty or cannot be compiled.
pub fn match_indices(pattern: &str, available: &[IndexName]) -> Result<Vec<IndexName>> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(DumpError::Validation("index pattern cannot be empty".to_string()));
    }

    let mut matched: Vec<IndexName> = if pattern.contains('*') {
        let matcher = wildcard_regex(pattern)?;
        available
            .iter()
            .filter(|index| matcher.is_match(index.as_str()))
            .cloned()
            .collect()
    } else {
        available
            .iter()
            .filter(|index| index.as_str() == pattern)
            .cloned()
            .collect()
    };

    matched.sort();
    matched.dedup();
    Ok(matched)
}

fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::with_capacity(pattern.len() * 2 + 2);
    source.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    if c == '\\' || c == '[' {
                        class.push('\\');
                    }
                    class.push(c);
                }
                if closed && !class.is_empty() && class != "^" {
                    source.push('[');
                    source.push_str(&class);
                    source.push(']');
                } else {
                    // Unterminated or empty set matches literally
                    source.push_str(&regex::escape("["));
                    source.push_str(&regex::escape(class.trim_start_matches('^')));
                    if closed {
                        source.push_str(&regex::escape("]"));
                    }
                }
            }
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    source.push('$');

    Regex::new(&source)
        .map_err(|e| DumpError::Validation(format!("Invalid index pattern '{pattern}': {e}")))
}
