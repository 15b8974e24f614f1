//! # Name Normalization
//!
//! Flow display names, provider names and team names are free text typed by
//! people (accents, spaces, mixed case). Everything that compares names goes
//! through the functions in this module so that lookups stay consistent.
//!
//! - [`normalize_key`]: strict comparison key, `[a-z0-9]` only.
//! - [`labelize`]: lower camel-case label used as a callable identifier.
//! - [`identifier_fold`]: loose fold applied to identifiers at lookup time.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Removes diacritics by decomposing the input and dropping combining marks.
///
/// # Example
/// ```rust
/// use datacube_util::strip_accents;
///
/// assert_eq!(strip_accents("Consultas de Veículos"), "Consultas de Veiculos");
/// ```
pub fn strip_accents(input: &str) -> String {
    input.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Projects a name onto its comparison key.
///
/// Accents are stripped, the text is lowercased, and every character outside
/// `[a-z0-9]` is removed. The result is idempotent.
///
/// # Example
/// ```rust
/// use datacube_util::normalize_key;
///
/// assert_eq!(normalize_key("Consultas de Veículos"), "consultasdeveiculos");
/// assert_eq!(normalize_key("DataCube"), "datacube");
/// ```
pub fn normalize_key(input: &str) -> String {
    strip_accents(input)
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

/// Normalizes an optional namespace name.
///
/// Returns `None` for a missing name and for a name that normalizes to an
/// empty key, so `""` or `"???"` never forms a namespace of its own.
pub fn optional_key(input: Option<&str>) -> Option<String> {
    input.map(normalize_key).filter(|key| !key.is_empty())
}

/// Generates a lower camel-case label from a display name.
///
/// Accents are stripped, everything except ASCII alphanumerics and spaces is
/// dropped, and the remaining words are joined: the first lowercased, the
/// rest capitalized. Blank input yields an empty label.
///
/// # Example
/// ```rust
/// use datacube_util::labelize;
///
/// assert_eq!(labelize("Consulta Cnh Paraná Completa"), "consultaCnhParanaCompleta");
/// assert_eq!(labelize("teste AAA"), "testeAaa");
/// assert_eq!(labelize("  "), "");
/// ```
pub fn labelize(input: &str) -> String {
    let cleaned: String = strip_accents(input)
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == ' ')
        .collect();

    let mut label = String::with_capacity(cleaned.len());
    for (index, word) in cleaned.split_whitespace().enumerate() {
        let lower = word.to_ascii_lowercase();
        if index == 0 {
            label.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            label.push(first.to_ascii_uppercase());
            label.push_str(chars.as_str());
        }
    }
    label
}

/// Folds an identifier for lookup: lowercase, with `_` treated as `-`.
///
/// This is looser than [`normalize_key`]: punctuation other than underscore
/// survives, so raw backend ids keep their shape.
pub fn identifier_fold(input: &str) -> String {
    input.to_lowercase().replace('_', "-")
}

/// Compares two identifiers under [`identifier_fold`].
pub fn identifiers_match(left: &str, right: &str) -> bool {
    identifier_fold(left) == identifier_fold(right)
}
