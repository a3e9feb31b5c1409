//! Bearer authentication as a route intercept.
//!
//! Per request: header present, `Bearer <token>` shape, not blacklisted,
//! valid access token, rate limit not exhausted. Each failure is logged
//! with its precise reason; clients only ever see a generic 401 (or 429).
//! On success the [`AuthContext`] is attached to the request.

use std::sync::Arc;

use actix_web::http::header::{self, HeaderMap};
use async_trait::async_trait;

use crate::auth::{AuthContext, TokenError, TokenKind, TokenService};
use crate::dispatch::{ApiRequest, Flow, Intercept};
use crate::error::{AppError, AuthRejection};
use crate::logging::security;
use crate::services::RateLimiter;

pub struct AuthMiddleware {
    tokens: Arc<TokenService>,
    limiter: Arc<RateLimiter>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenService>, limiter: Arc<RateLimiter>) -> Self {
        Self { tokens, limiter }
    }

    /// Run the full check sequence against `headers`.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        path: &str,
    ) -> Result<AuthContext, AppError> {
        let token = bearer_token(headers).map_err(|reason| reject(reason, path))?;

        if self.tokens.is_blacklisted(token).await? {
            return Err(reject(AuthRejection::Blacklisted, path));
        }

        let validated = match self.tokens.validate(token).await {
            Ok(v) => v,
            Err(e @ (TokenError::Config(_) | TokenError::Store(_))) => return Err(e.into()),
            Err(e) => return Err(reject(AuthRejection::Invalid(e), path)),
        };
        validated
            .require_kind(TokenKind::Access)
            .map_err(|e| reject(AuthRejection::Invalid(e), path))?;

        let subject = validated.principal.id.as_str();
        if !self.limiter.admit(subject).await? {
            security::rate_limit_hit(subject, self.limiter.limit_per_minute());
            return Err(AppError::RateLimited);
        }

        Ok(AuthContext {
            principal: validated.principal,
            claims: validated.claims,
            raw_token: token.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl Intercept for AuthMiddleware {
    async fn intercept(&self, req: &mut ApiRequest) -> Result<Flow, AppError> {
        let ctx = self.authenticate(&req.headers, &req.path).await?;
        req.auth = Some(ctx);
        Ok(Flow::Continue)
    }
}

fn reject(reason: AuthRejection, path: &str) -> AppError {
    security::auth_rejected(&reason.to_string(), path);
    AppError::unauthenticated(reason)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthRejection::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthRejection::MalformedHeader)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthRejection::MalformedHeader),
    }
}
