//! Claims carried by API-issued bearer tokens.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which slot a token may be presented in. Immutable once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub aud: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Not-before (seconds since epoch)
    pub nbf: i64,
    /// Expiry (seconds since epoch), strictly after `iat`
    pub exp: i64,
    /// Principal identifier
    pub sub: String,
    /// Roles snapshotted at issuance; later role changes do not apply.
    pub roles: BTreeSet<String>,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Unique per token, so two tokens minted in the same second differ.
    pub jti: String,
}
