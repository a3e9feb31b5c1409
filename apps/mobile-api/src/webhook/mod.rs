//! Signed server-to-server notifications from the app store.
//!
//! Only the outer envelope is verified (x5c chain up to the pinned root,
//! then the ES256 signature). Nested signed fields inherit that trust
//! and are decoded without re-verification.

pub mod compact;
pub mod notification;
pub mod verifier;

use thiserror::Error;

use crate::errors::ErrorCode;

pub use notification::{
    NotificationKind, ProcessingError, TransactionInfo, WebhookClaims, WebhookOutcome,
};
pub use verifier::{ChainTrust, WebhookVerifier};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed signed payload: {0}")]
    MalformedSignature(String),
    #[error("signed payload carries no certificate chain")]
    MissingCertificateChain,
    #[error("certificate chain verification failed: {0}")]
    ChainVerificationFailed(String),
    #[error("payload signature is invalid")]
    SignatureInvalid,
    #[error("webhook verification is not configured: {0}")]
    Config(String),
}

impl WebhookError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WebhookError::MalformedSignature(_) => ErrorCode::MalformedSignature,
            WebhookError::MissingCertificateChain => ErrorCode::MissingCertificateChain,
            WebhookError::ChainVerificationFailed(_) => ErrorCode::ChainVerificationFailed,
            WebhookError::SignatureInvalid => ErrorCode::SignatureInvalid,
            WebhookError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Input that could never verify, regardless of keys or roots.
    pub fn is_malformed(&self) -> bool {
        matches!(self, WebhookError::MalformedSignature(_))
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        WebhookError::MalformedSignature(detail.into())
    }
}
