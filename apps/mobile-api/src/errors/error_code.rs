//! Error codes for the mobile API.
//!
//! Every error body carries one of these codes. Add new codes here; never
//! pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the mobile API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Authentication required (every 401 shares this code)
    Unauthorized,
    /// Principal lacks a capability
    MissingCapability,
    /// Principal lacks a role
    MissingRole,
    /// Principal does not own the referenced resource
    NotOwner,
    /// Per-principal request budget exhausted
    RateLimited,

    // Request Validation
    /// General bad request error
    BadRequest,
    /// Body could not be parsed as the expected JSON shape
    InvalidJson,
    /// Login credentials were rejected
    InvalidCredentials,

    // Routing
    /// No registered route matched
    RouteNotFound,
    /// Resource not found
    NotFound,

    // Webhooks
    /// Signed payload is not a three-segment compact structure
    MalformedSignature,
    /// Signed payload header has no certificate chain
    MissingCertificateChain,
    /// Certificate chain does not lead to the pinned root
    ChainVerificationFailed,
    /// Signature does not match the leaf certificate key
    SignatureInvalid,

    // System Errors
    /// Configuration error
    ConfigError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::MissingCapability => "MISSING_CAPABILITY",
            Self::MissingRole => "MISSING_ROLE",
            Self::NotOwner => "NOT_OWNER",
            Self::RateLimited => "RATE_LIMITED",

            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",

            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::MalformedSignature => "MALFORMED_SIGNATURE",
            Self::MissingCertificateChain => "MISSING_CERTIFICATE_CHAIN",
            Self::ChainVerificationFailed => "CHAIN_VERIFICATION_FAILED",
            Self::SignatureInvalid => "SIGNATURE_INVALID",

            Self::ConfigError => "CONFIG_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
