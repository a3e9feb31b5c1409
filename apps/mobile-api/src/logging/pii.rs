use std::sync::LazyLock;

use regex::Regex;

/// Regex patterns for credential material that must never reach the logs.
pub struct SecretPatterns;

impl SecretPatterns {
    /// Compact signed structures: three base64url segments joined by dots.
    pub fn compact_token() -> &'static Regex {
        static COMPACT: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}").unwrap()
        });
        &COMPACT
    }

    /// `Bearer <anything>` credentials as they appear in raw headers.
    pub fn bearer() -> &'static Regex {
        static BEARER: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"(?i)\bbearer\s+\S+").unwrap()
        });
        &BEARER
    }
}

/// Mask tokens and bearer credentials inside free text.
pub fn redact(input: &str) -> String {
    let tokens = SecretPatterns::compact_token().replace_all(input, "[REDACTED_TOKEN]");
    SecretPatterns::bearer()
        .replace_all(&tokens, "Bearer [REDACTED]")
        .into_owned()
}
