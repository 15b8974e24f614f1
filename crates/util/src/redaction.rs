//! # Secret Redaction
//!
//! Request headers and error bodies can carry the account API key. Anything
//! that ends up in a log line or on stdout goes through [`redact_sensitive`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement token used by [`redact_sensitive`].
pub const REDACTED: &str = "[REDACTED]";

/// Redacts values that look like secrets in a string.
///
/// Header-style (`X-Api-Key: ...`), assignment-style (`API_KEY=...`) and
/// JSON-style (`"api_key": "..."`) secrets keep their key and lose their
/// value. Bare DataCube tokens (`sdc_...`) are replaced entirely.
///
/// # Example
/// ```rust
/// use datacube_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("x-api-key: sdc_abc123"), "x-api-key: [REDACTED]");
/// assert_eq!(redact_sensitive("DATACUBE_API_KEY=abc"), "DATACUBE_API_KEY=[REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    redact_sensitive_with(input, REDACTED)
}

/// Redacts sensitive-looking values, using a custom replacement token.
pub fn redact_sensitive_with(input: &str, replacement: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                if captures.get(2).is_some() {
                    format!("{}{}{}", prefix, replacement, suffix)
                } else {
                    replacement.to_string()
                }
            })
            .to_string();
    }

    redacted
}

/// Returns the compiled redaction patterns, most specific first.
fn redact_patterns() -> &'static [Regex] {
    static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

    &REDACT_PATTERNS
}

fn build_redact_patterns() -> Vec<Regex> {
    let sources = [
        r"(?i)((?:x-api-key|authorization):\s*)([^\s]+(?:\s+[^\s]+)*)",
        r#"(?i)("[A-Za-z0-9_.-]*?(?:api[_-]?key|token|secret|password)[A-Za-z0-9_.-]*"\s*:\s*")([^"]+)(")"#,
        r"(?i)((?:export\s+)?[A-Za-z0-9_]*?(?:API_KEY|TOKEN|SECRET|PASSWORD)[A-Za-z0-9_]*\s*=\s*)([^\s]+)",
        r"(sdc_[A-Za-z0-9_{}-]{3,})",
    ];
    sources
        .iter()
        .filter_map(|source| Regex::new(source).ok())
        .collect()
}
