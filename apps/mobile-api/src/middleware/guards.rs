//! Capability, role and ownership guards as route intercepts.
//!
//! Each guard must follow the auth intercept in a route's list; the
//! checks themselves are the predicates on [`AuthContext`].
//!
//! [`AuthContext`]: crate::auth::AuthContext

use async_trait::async_trait;

use crate::dispatch::{ApiRequest, Flow, Intercept};
use crate::error::AppError;

pub struct RequireCapability(pub String);

pub struct RequireRole(pub String);

/// The principal must own the resource named by a path placeholder.
pub struct RequireOwner {
    pub param: String,
}

impl RequireCapability {
    pub fn new(capability: impl Into<String>) -> Self {
        Self(capability.into())
    }
}

impl RequireRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }
}

impl RequireOwner {
    pub fn of(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

#[async_trait(?Send)]
impl Intercept for RequireCapability {
    async fn intercept(&self, req: &mut ApiRequest) -> Result<Flow, AppError> {
        req.auth()?.require_capability(&self.0)?;
        Ok(Flow::Continue)
    }
}

#[async_trait(?Send)]
impl Intercept for RequireRole {
    async fn intercept(&self, req: &mut ApiRequest) -> Result<Flow, AppError> {
        req.auth()?.require_role(&self.0)?;
        Ok(Flow::Continue)
    }
}

#[async_trait(?Send)]
impl Intercept for RequireOwner {
    async fn intercept(&self, req: &mut ApiRequest) -> Result<Flow, AppError> {
        let owner = req.param(&self.param)?;
        req.auth()?.require_owner(owner)?;
        Ok(Flow::Continue)
    }
}
