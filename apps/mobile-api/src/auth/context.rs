//! The authenticated principal attached to a request, and the static
//! capability / role / ownership predicates handlers apply to it.

use serde::Serialize;

use super::claims::TokenClaims;
use super::principal::{Principal, ADMIN_CAPABILITY};
use crate::error::AppError;
use crate::errors::ErrorCode;

#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Live principal as resolved during validation
    pub principal: Principal,
    /// Claims of the presented token (roles are the issuance snapshot)
    pub claims: TokenClaims,
    #[serde(skip)]
    pub raw_token: String,
}

impl AuthContext {
    pub fn subject_id(&self) -> &str {
        &self.principal.id
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.principal.capabilities.contains(capability)
    }

    /// Roles are checked against the token snapshot, not the live record.
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.roles.contains(role)
    }

    pub fn is_owner(&self, owner_id: &str) -> bool {
        self.principal.id == owner_id || self.has_capability(ADMIN_CAPABILITY)
    }

    pub fn require_capability(&self, capability: &str) -> Result<(), AppError> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                ErrorCode::MissingCapability,
                format!("Missing capability: {capability}"),
            ))
        }
    }

    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                ErrorCode::MissingRole,
                format!("Missing role: {role}"),
            ))
        }
    }

    pub fn require_owner(&self, owner_id: &str) -> Result<(), AppError> {
        if self.is_owner(owner_id) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                ErrorCode::NotOwner,
                "You do not have access to this resource",
            ))
        }
    }
}
