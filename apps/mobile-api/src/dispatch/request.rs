//! The request view handed to intercepts and handlers.

use std::collections::BTreeMap;

use actix_web::http::header::HeaderMap;
use actix_web::http::Method;
use actix_web::web::Bytes;
use serde::de::DeserializeOwned;

use crate::auth::AuthContext;
use crate::error::{AppError, AuthRejection};
use crate::errors::ErrorCode;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Normalized path, namespace stripped
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Placeholder bindings from the matched route
    pub params: BTreeMap<String, String>,
    /// Attached by the auth intercept; never set by the caller
    pub auth: Option<AuthContext>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: String::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: BTreeMap::new(),
            auth: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn param(&self, name: &str) -> Result<&str, AppError> {
        self.params.get(name).map(String::as_str).ok_or_else(|| {
            AppError::internal(format!("route has no placeholder named '{name}'"))
        })
    }

    /// The attached principal. Reaching a handler without one means the
    /// route was registered without the auth intercept.
    pub fn auth(&self) -> Result<&AuthContext, AppError> {
        self.auth
            .as_ref()
            .ok_or(AppError::unauthenticated(AuthRejection::MissingHeader))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| {
                AppError::bad_request(ErrorCode::InvalidJson, format!("Invalid JSON: {e}"))
            })
    }

    /// Like [`ApiRequest::json`], but an empty body yields `None`.
    pub fn json_opt<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.json().map(Some)
    }
}
