//! Attribute path segment handling.

use std::borrow::Cow;

use morph_model::ATTRIBUTE_DELIMITER;

/// Sentinel flush target addressing the whole record.
pub const RECORD_IDENTIFIER: &str = "record";

/// Trailing segment XML-shaped storage appends to every value path.
const VALUE_MARKER: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#value";

/// Splits a canonical path into its segment URIs.
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(ATTRIBUTE_DELIMITER).collect()
}

/// Longest common segment prefix of a set of canonical paths.
///
/// Falls back to the record sentinel when the set is empty, the prefix is
/// empty, or any member disagrees with the computed prefix.
pub fn common_prefix<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let paths: Vec<&str> = paths.into_iter().collect();
    let Some(first) = paths.first() else {
        return RECORD_IDENTIFIER.to_string();
    };

    let mut prefix = segments(first);
    for path in &paths[1..] {
        let other = segments(path);
        let shared = prefix
            .iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
        if prefix.is_empty() {
            return RECORD_IDENTIFIER.to_string();
        }
    }

    let joined = join(&prefix);
    // Guard against a degenerate prefix some member does not actually start
    // with (possible when a segment is itself a prefix of another's segment
    // text was never split; the segment-wise computation avoids that, but the
    // check keeps the contract explicit).
    let delimited = format!("{joined}{ATTRIBUTE_DELIMITER}");
    for path in &paths {
        if *path != joined && !path.starts_with(&delimited) {
            return RECORD_IDENTIFIER.to_string();
        }
    }
    joined
}

/// Joins segment URIs back into a canonical path.
pub fn join(parts: &[&str]) -> String {
    let mut joined = String::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            joined.push(ATTRIBUTE_DELIMITER);
        }
        joined.push_str(part);
    }
    joined
}

/// Drops the trailing value-marker segment XML-shaped records carry.
///
/// A path consisting solely of the marker is returned unchanged.
pub fn trim_value_marker(path: &str) -> &str {
    let marker_suffix_len = VALUE_MARKER.len() + ATTRIBUTE_DELIMITER.len_utf8();
    if path.len() > marker_suffix_len {
        let (head, tail) = path.split_at(path.len() - marker_suffix_len);
        let mut tail_chars = tail.chars();
        if tail_chars.next() == Some(ATTRIBUTE_DELIMITER) && tail_chars.as_str() == VALUE_MARKER {
            return head;
        }
    }
    path
}

/// Undoes markup escaping applied to persisted parameter values.
///
/// Unknown entities leave the input untouched; decoding is best-effort
/// because the values are compared, never re-emitted.
pub fn unescape_markup(value: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(value).unwrap_or(Cow::Borrowed(value))
}
