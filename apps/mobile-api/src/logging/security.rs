//! Security-relevant events, emitted with a stable `event` field so they
//! can be alerted on independently of ordinary request logs.

use tracing::{info, warn};

use crate::trace_ctx;

/// Request turned away by the auth middleware. `reason` stays internal.
pub fn auth_rejected(reason: &str, path: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_AUTH_REJECTED",
        %trace_id,
        reason,
        path,
        "Authentication rejected"
    );
}

pub fn rate_limit_hit(principal_id: &str, limit: u32) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_RATE_LIMIT_HIT",
        %trace_id,
        principal_id,
        limit,
        "Rate limit exceeded"
    );
}

/// A token was blacklisted before its natural expiry.
pub fn token_revoked(principal_id: &str, fingerprint: &str, ttl_secs: u64) {
    let trace_id = trace_ctx::trace_id();

    info!(
        event = "SECURITY_TOKEN_REVOKED",
        %trace_id,
        principal_id,
        fingerprint = &fingerprint[..fingerprint.len().min(12)],
        ttl_secs,
        "Token revoked"
    );
}

pub fn webhook_rejected(reason: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_WEBHOOK_REJECTED",
        %trace_id,
        reason,
        "Signed notification rejected"
    );
}
