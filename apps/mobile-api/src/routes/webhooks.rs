//! App store server notifications.
//!
//! Unauthenticated: authenticity comes from the signed envelope. Once the
//! envelope verifies, the transport status is always 200 and processing
//! failures are reported in the body, so the store does not retry on
//! business mismatches. Only unreadable input is a 400.

use actix_web::http::Method;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::with_state;
use crate::dispatch::{ApiRequest, PatternError, Reply, RouteTable};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::logging::security;
use crate::state::AppState;
use crate::webhook::{notification, WebhookClaims, WebhookError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    pub signed_payload: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: WebhookStatus,
    pub message: String,
    pub notification_type: Option<String>,
}

pub fn register(table: &mut RouteTable, state: &AppState) -> Result<(), PatternError> {
    table.register(
        "webhooks/app-store",
        Method::POST,
        with_state(state, app_store),
        vec![],
    )
}

async fn app_store(state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let verifier = state
        .webhook
        .as_ref()
        .ok_or_else(|| AppError::config("webhook root certificate is not configured"))?;

    let signed_payload = req
        .json::<NotificationEnvelope>()?
        .signed_payload
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::bad_request(ErrorCode::BadRequest, "signedPayload is required"))?;

    let payload = match verifier.verify(&signed_payload) {
        Ok(payload) => payload,
        Err(e) => {
            security::webhook_rejected(&e.to_string());
            return match e {
                WebhookError::MalformedSignature(_) | WebhookError::Config(_) => Err(e.into()),
                unverifiable => Ok(respond(WebhookStatus::Error, unverifiable.to_string(), None)),
            };
        }
    };

    let declared_type = payload
        .get("notificationType")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let claims = match WebhookClaims::from_payload(payload) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, notification_type = ?declared_type, "verified payload unreadable");
            return Ok(respond(WebhookStatus::Error, e.to_string(), declared_type));
        }
    };

    let notification_type = Some(claims.notification_type.clone());
    match notification::process(
        &claims,
        state.directory.as_ref(),
        state.plans.as_ref(),
        state.plan_mapping.as_ref(),
    )
    .await
    {
        Ok(outcome) => Ok(respond(
            WebhookStatus::Success,
            outcome.to_string(),
            notification_type,
        )),
        Err(e) => {
            warn!(error = %e, notification_type = ?notification_type, "notification not applied");
            Ok(respond(WebhookStatus::Error, e.to_string(), notification_type))
        }
    }
}

fn respond(status: WebhookStatus, message: String, notification_type: Option<String>) -> Reply {
    Reply::Response(HttpResponse::Ok().json(WebhookResponse {
        status,
        message,
        notification_type,
    }))
}
