use std::sync::Arc;

use actix_web::http::Method;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use super::with_state;
use crate::auth::{TokenError, TokenKind};
use crate::dispatch::{ApiRequest, Intercept, PatternError, Reply, RouteTable};
use crate::error::{AppError, AuthRejection};
use crate::errors::ErrorCode;
use crate::logging::security;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenInfo {
    pub subject_id: String,
    pub roles: Vec<String>,
    pub token_kind: TokenKind,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_revoked: Option<bool>,
}

pub fn register(
    table: &mut RouteTable,
    state: &AppState,
    authn: &Arc<dyn Intercept>,
) -> Result<(), PatternError> {
    table.register("auth/token", Method::POST, with_state(state, login), vec![])?;
    table.register(
        "auth/token/refresh",
        Method::POST,
        with_state(state, refresh),
        vec![],
    )?;
    table.register(
        "auth/token/validate",
        Method::GET,
        with_state(state, validate),
        vec![authn.clone()],
    )?;
    table.register(
        "auth/logout",
        Method::POST,
        with_state(state, logout),
        vec![authn.clone()],
    )?;
    Ok(())
}

/// Exchange credentials for an access + refresh pair.
async fn login(state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let body: LoginRequest = req.json()?;
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::bad_request(
            ErrorCode::BadRequest,
            "username and password are required",
        ));
    }

    let rejected =
        || AppError::bad_request(ErrorCode::InvalidCredentials, "Invalid username or password");

    let subject_id = state
        .credentials
        .verify(body.username.trim(), &body.password)
        .await?
        .ok_or_else(rejected)?;
    let principal = state
        .directory
        .find(&subject_id)
        .await?
        .filter(|p| p.is_active())
        .ok_or_else(rejected)?;

    let pair = state.tokens.issue_pair(&principal)?;
    Ok(Reply::Response(HttpResponse::Ok().json(pair)))
}

async fn refresh(state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let body: RefreshRequest = req.json()?;

    match state.tokens.refresh(&body.refresh_token).await {
        Ok(pair) => Ok(Reply::Response(HttpResponse::Ok().json(pair))),
        Err(e @ (TokenError::Config(_) | TokenError::Store(_))) => Err(e.into()),
        Err(e) => {
            let reason = AuthRejection::Invalid(e);
            security::auth_rejected(&reason.to_string(), &req.path);
            Err(AppError::unauthenticated(reason))
        }
    }
}

async fn validate(_state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let ctx = req.auth()?;
    Reply::data(&TokenInfo {
        subject_id: ctx.subject_id().to_string(),
        roles: ctx.claims.roles.iter().cloned().collect(),
        token_kind: ctx.claims.kind,
        issued_at: ctx.claims.iat,
        expires_at: ctx.claims.exp,
    })
}

/// Blacklist the presented access token and, when supplied, a refresh token.
async fn logout(state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let ctx = req.auth()?;
    let body = req.json_opt::<LogoutRequest>()?.unwrap_or_default();

    let revoked = state.tokens.blacklist(&ctx.raw_token).await?;

    let refresh_revoked = match body.refresh_token.as_deref() {
        None => None,
        Some(raw) => match state.tokens.blacklist(raw).await {
            Ok(revoked) => Some(revoked),
            Err(e @ (TokenError::Config(_) | TokenError::Store(_))) => return Err(e.into()),
            // An unreadable refresh token cannot be used either.
            Err(_) => Some(false),
        },
    };

    Reply::data(&LogoutResponse {
        revoked,
        refresh_revoked,
    })
}
