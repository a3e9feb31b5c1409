//! Verified notification claims and the plan changes they drive.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::compact::decode_unverified;
use super::WebhookError;
use crate::auth::PrincipalDirectory;
use crate::services::{PlanLedger, PlanMapping, PlanRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Renewal,
    Termination,
    /// Accepted, not actioned
    Other,
}

impl NotificationKind {
    pub fn classify(notification_type: &str) -> Self {
        match notification_type {
            "SUBSCRIBED" | "DID_RENEW" | "OFFER_REDEEMED" => NotificationKind::Renewal,
            "EXPIRED" | "DID_FAIL_TO_RENEW" | "GRACE_PERIOD_EXPIRED" | "REFUND" | "REVOKE" => {
                NotificationKind::Termination
            }
            _ => NotificationKind::Other,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    notification_type: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default, rename = "notificationUUID")]
    notification_uuid: Option<String>,
    #[serde(default)]
    data: Option<RawNotificationData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotificationData {
    #[serde(default)]
    signed_transaction_info: Option<String>,
}

/// Decoded `signedTransactionInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub app_account_token: Option<String>,
    /// Epoch milliseconds
    #[serde(default)]
    pub expires_date: Option<i64>,
    #[serde(default)]
    pub original_transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookClaims {
    pub notification_type: String,
    pub subtype: Option<String>,
    pub notification_uuid: Option<String>,
    pub transaction: Option<TransactionInfo>,
}

impl WebhookClaims {
    /// Build from a verified envelope payload, decoding the nested
    /// transaction without re-verifying it.
    pub fn from_payload(payload: Value) -> Result<Self, WebhookError> {
        let raw: RawNotification = serde_json::from_value(payload)
            .map_err(|e| WebhookError::malformed(format!("payload is not a notification: {e}")))?;

        let transaction = raw
            .data
            .and_then(|d| d.signed_transaction_info)
            .map(|nested| decode_unverified::<TransactionInfo>(&nested))
            .transpose()?;

        Ok(Self {
            notification_type: raw.notification_type,
            subtype: raw.subtype,
            notification_uuid: raw.notification_uuid,
            transaction,
        })
    }

    pub fn kind(&self) -> NotificationKind {
        NotificationKind::classify(&self.notification_type)
    }
}

/// Why a verified notification could not be applied. Reported in the
/// response body; the transport status stays 200.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("notification carries no transaction info")]
    MissingTransaction,
    #[error("transaction carries no usable app account token")]
    MissingAccountToken,
    #[error("no member is linked to the app account token")]
    UnknownSubject,
    #[error("transaction carries no product id")]
    MissingProduct,
    #[error("product '{0}' is not mapped to a plan")]
    UnmappedProduct(String),
    #[error("transaction carries no usable expiry date")]
    MissingExpiry,
    #[error("plan update failed: {0}")]
    Ledger(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Extended { plan: PlanRecord },
    Terminated { subject_id: String, had_plan: bool },
    Ignored,
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookOutcome::Extended { plan } => {
                write!(f, "plan '{}' extended for member {}", plan.plan_id, plan.subject_id)
            }
            WebhookOutcome::Terminated { subject_id, .. } => {
                write!(f, "plan terminated for member {subject_id}")
            }
            WebhookOutcome::Ignored => f.write_str("notification acknowledged"),
        }
    }
}

/// Apply a verified notification to the plan ledger.
pub async fn process(
    claims: &WebhookClaims,
    directory: &dyn PrincipalDirectory,
    ledger: &dyn PlanLedger,
    mapping: &dyn PlanMapping,
) -> Result<WebhookOutcome, ProcessingError> {
    let kind = claims.kind();
    if kind == NotificationKind::Other {
        return Ok(WebhookOutcome::Ignored);
    }

    let tx = claims
        .transaction
        .as_ref()
        .ok_or(ProcessingError::MissingTransaction)?;
    let subject_id = resolve_subject(tx, directory).await?;

    match kind {
        NotificationKind::Renewal => {
            let product_id = tx
                .product_id
                .as_deref()
                .ok_or(ProcessingError::MissingProduct)?;
            let plan_id = mapping
                .plan_for_product(product_id)
                .ok_or_else(|| ProcessingError::UnmappedProduct(product_id.to_string()))?;
            let ends_at = tx
                .expires_date
                .and_then(|ms| {
                    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
                })
                .ok_or(ProcessingError::MissingExpiry)?;

            let plan = ledger
                .extend(&subject_id, &plan_id, ends_at)
                .await
                .map_err(|e| ProcessingError::Ledger(e.to_string()))?;
            info!(
                subject_id = %subject_id,
                plan_id = %plan_id,
                notification_type = %claims.notification_type,
                "plan extended"
            );
            Ok(WebhookOutcome::Extended { plan })
        }
        NotificationKind::Termination => {
            let had_plan = ledger
                .terminate(&subject_id)
                .await
                .map_err(|e| ProcessingError::Ledger(e.to_string()))?;
            info!(
                subject_id = %subject_id,
                had_plan,
                notification_type = %claims.notification_type,
                "plan terminated"
            );
            Ok(WebhookOutcome::Terminated {
                subject_id,
                had_plan,
            })
        }
        NotificationKind::Other => Ok(WebhookOutcome::Ignored),
    }
}

async fn resolve_subject(
    tx: &TransactionInfo,
    directory: &dyn PrincipalDirectory,
) -> Result<String, ProcessingError> {
    let token = tx
        .app_account_token
        .as_deref()
        .and_then(|t| Uuid::parse_str(t).ok())
        .ok_or(ProcessingError::MissingAccountToken)?;
    directory
        .find_by_account_token(&token)
        .await
        .map_err(|e| ProcessingError::Ledger(e.to_string()))?
        .ok_or(ProcessingError::UnknownSubject)
}
