//! Canonicalisation of free-text form input.
//!
//! Both functions are total: any input, including the empty string, maps to
//! a normalized string, and applying them twice is the same as applying
//! them once.

/// Tokens at or below this many characters are treated as connector words
/// ("de", "la", "y") and lowercased instead of capitalised.
const CONNECTOR_MAX_CHARS: usize = 2;

/// Normalize a person's name to title case.
///
/// Splits on whitespace, capitalises every token longer than two characters
/// and lowercases the rest, then joins the tokens with single spaces:
///
/// ```
/// use parking_core::normalize::normalize_name;
/// assert_eq!(normalize_name("  juan DE la cruz "), "Juan de la Cruz");
/// ```
pub fn normalize_name(raw: &str) -> String {
  raw
    .split_whitespace()
    .map(|token| {
      if token.chars().count() > CONNECTOR_MAX_CHARS {
        capitalize(token)
      } else {
        token.chars().map(lower).collect()
      }
    })
    .collect::<Vec<String>>()
    .join(" ")
}

/// Normalize a licence plate: uppercase, with hyphens, spaces and periods
/// removed. Lowercase characters without an uppercase form (`ª`, `ᵃ`) are
/// dropped.
///
/// ```
/// use parking_core::normalize::normalize_plate;
/// assert_eq!(normalize_plate("ab-123.c"), "AB123C");
/// ```
pub fn normalize_plate(raw: &str) -> String {
  raw
    .to_uppercase()
    .chars()
    .filter(|&c| !matches!(c, '-' | ' ' | '.') && !c.is_lowercase())
    .collect()
}

fn capitalize(token: &str) -> String {
  let mut chars = token.chars();
  match chars.next() {
    Some(first) => std::iter::once(upper(first)).chain(chars.map(lower)).collect(),
    None => String::new(),
  }
}

// Case mappings that expand to several characters (e.g. `ß` → `SS`) are
// skipped so the token length, and with it the connector rule, stays fixed.

fn upper(c: char) -> char { single(c.to_uppercase()).unwrap_or(c) }

fn lower(c: char) -> char { single(c.to_lowercase()).unwrap_or(c) }

fn single(mut mapped: impl Iterator<Item = char>) -> Option<char> {
  match (mapped.next(), mapped.next()) {
    (Some(c), None) => Some(c),
    _ => None,
  }
}
