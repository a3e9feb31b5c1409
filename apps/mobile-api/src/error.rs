use std::fmt;

use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::auth::token::TokenError;
use crate::errors::ErrorCode;
use crate::trace_ctx;
use crate::webhook::WebhookError;

/// Detail returned for every redacted fault outside debug mode.
pub const GENERIC_FAULT_DETAIL: &str = "An internal error occurred";

#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

/// Why the auth middleware turned a request away.
///
/// Never rendered to clients; all variants share one public 401 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    MissingHeader,
    MalformedHeader,
    Blacklisted,
    Invalid(TokenError),
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRejection::MissingHeader => f.write_str("missing_authorization_header"),
            AuthRejection::MalformedHeader => f.write_str("malformed_authorization_header"),
            AuthRejection::Blacklisted => f.write_str("token_blacklisted"),
            AuthRejection::Invalid(e) => write!(f, "invalid_token: {e}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: AuthRejection },
    #[error("Forbidden: {detail}")]
    Forbidden { code: ErrorCode, detail: String },
    #[error("Rate limited")]
    RateLimited,
    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error("Bad request: {detail}")]
    BadRequest { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Webhook rejected: {0}")]
    Webhook(#[from] WebhookError),
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthenticated { .. } => ErrorCode::Unauthorized,
            AppError::Forbidden { code, .. } => *code,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::RouteNotFound { .. } => ErrorCode::RouteNotFound,
            AppError::BadRequest { code, .. } => *code,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Webhook(e) => e.code(),
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Client-facing detail. Authentication failures deliberately collapse
    /// into one message so the body never acts as a validation oracle.
    fn detail(&self) -> String {
        match self {
            AppError::Unauthenticated { .. } => "Authentication required".to_string(),
            AppError::Forbidden { detail, .. } => detail.clone(),
            AppError::RateLimited => "Too many requests, retry later".to_string(),
            AppError::RouteNotFound { method, path } => {
                format!("No route matches {method} {path}")
            }
            AppError::BadRequest { detail, .. } => detail.clone(),
            AppError::NotFound { detail } => detail.clone(),
            AppError::Webhook(e) => e.to_string(),
            AppError::Config { detail } => detail.clone(),
            AppError::Internal { detail } => detail.clone(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Webhook(WebhookError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Webhook(_) => StatusCode::BAD_REQUEST,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthenticated(reason: AuthRejection) -> Self {
        Self::Unauthenticated { reason }
    }

    pub fn forbidden(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            detail: detail.into(),
        }
    }

    pub fn route_not_found(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::RouteNotFound {
            method: method.into(),
            path: path.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }

    /// Replace server-fault details with a generic message unless `debug` is set.
    pub fn redacted(self, debug: bool) -> Self {
        match self {
            AppError::Internal { .. } if !debug => AppError::internal(GENERIC_FAULT_DETAIL),
            AppError::Config { .. } | AppError::Webhook(WebhookError::Config(_)) if !debug => {
                AppError::config(GENERIC_FAULT_DETAIL)
            }
            other => other,
        }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let lower = word.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Config(detail) => AppError::config(detail),
            TokenError::Store(detail) => AppError::internal(detail),
            other => AppError::unauthenticated(AuthRejection::Invalid(other)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code().as_str();
        let trace_id = trace_ctx::trace_id();

        let problem_details = ProblemDetails {
            type_: format!("urn:mobile-api:error:{}", code.to_lowercase()),
            title: Self::humanize_code(code),
            status: status.as_u16(),
            detail: self.detail(),
            code: code.to_string(),
            trace_id: trace_id.clone(),
        };

        let mut builder = HttpResponse::build(status);
        builder
            .content_type("application/problem+json")
            .insert_header(("x-trace-id", trace_id));

        match status {
            StatusCode::UNAUTHORIZED => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                builder.insert_header((header::RETRY_AFTER, "60"));
            }
            _ => {}
        }

        builder.json(problem_details)
    }
}
