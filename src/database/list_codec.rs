//! Brace-delimited text encoding for list columns.
//!
//! `photos` and `tags` are stored as a single TEXT column in the Postgres
//! array literal shape: `{a.jpg,b.jpg}`. Items are joined with `,` and are
//! NOT escaped, so an item containing `,`, `{` or `}` does not survive a
//! round trip. Decoding never fails; malformed text is split as is.

const OPEN: char = '{';
const CLOSE: char = '}';
const SEPARATOR: char = ',';

/// Encode an ordered list into its column text. An empty list is `{}`.
pub fn encode<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::with_capacity(2 + items.iter().map(|s| s.as_ref().len() + 1).sum::<usize>());
    out.push(OPEN);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(item.as_ref());
    }
    out.push(CLOSE);
    out
}

/// Decode column text back into the ordered list.
///
/// The outer `{` and `}` are removed only when both are present, then the
/// rest is split on `,` with trailing empty items dropped. Empty text or an
/// empty interior yields no items.
pub fn decode(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix(OPEN)
        .and_then(|rest| rest.strip_suffix(CLOSE))
        .unwrap_or(trimmed);

    let mut items: Vec<String> = inner.split(SEPARATOR).map(str::to_string).collect();
    while items.last().is_some_and(|item| item.is_empty()) {
        items.pop();
    }
    items
}

/// Decode a nullable column; NULL behaves like empty text.
pub fn decode_column(text: Option<&str>) -> Vec<String> {
    text.map(decode).unwrap_or_default()
}
