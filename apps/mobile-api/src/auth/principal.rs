//! Principals and the directory that resolves them.
//!
//! The directory is owned by the business layer; this crate only consumes
//! it through [`PrincipalDirectory`]. `InMemoryDirectory` backs the binary
//! and the test suites.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Capability every active principal holds; losing it deactivates the account.
pub const BASELINE_CAPABILITY: &str = "read";

/// Capability that satisfies every ownership check.
pub const ADMIN_CAPABILITY: &str = "administer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub roles: BTreeSet<String>,
    pub capabilities: BTreeSet<String>,
}

impl Principal {
    pub fn new<R, C>(id: impl Into<String>, roles: R, capabilities: C) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    /// An ordinary active member.
    pub fn member(id: impl Into<String>) -> Self {
        Self::new(id, ["subscriber"], [BASELINE_CAPABILITY])
    }

    pub fn is_active(&self) -> bool {
        self.capabilities.contains(BASELINE_CAPABILITY)
    }
}

#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Live lookup; `None` when the principal no longer exists.
    async fn find(&self, subject_id: &str) -> Result<Option<Principal>, AppError>;

    /// Map a store-side account token (set at purchase time) to a subject id.
    async fn find_by_account_token(&self, token: &Uuid) -> Result<Option<String>, AppError>;
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Subject id for valid credentials, `None` otherwise.
    async fn verify(&self, username: &str, password: &str) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    principals: DashMap<String, Principal>,
    account_tokens: DashMap<Uuid, String>,
    credentials: DashMap<String, (String, blake3::Hash)>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, principal: Principal) {
        self.principals.insert(principal.id.clone(), principal);
    }

    pub fn remove(&self, subject_id: &str) {
        self.principals.remove(subject_id);
    }

    pub fn revoke_capability(&self, subject_id: &str, capability: &str) {
        if let Some(mut p) = self.principals.get_mut(subject_id) {
            p.capabilities.remove(capability);
        }
    }

    pub fn link_account_token(&self, token: Uuid, subject_id: impl Into<String>) {
        self.account_tokens.insert(token, subject_id.into());
    }

    pub fn set_password(&self, username: &str, subject_id: impl Into<String>, password: &str) {
        self.credentials.insert(
            username.to_lowercase(),
            (subject_id.into(), blake3::hash(password.as_bytes())),
        );
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryDirectory {
    async fn find(&self, subject_id: &str) -> Result<Option<Principal>, AppError> {
        Ok(self.principals.get(subject_id).map(|p| p.value().clone()))
    }

    async fn find_by_account_token(&self, token: &Uuid) -> Result<Option<String>, AppError> {
        Ok(self.account_tokens.get(token).map(|s| s.value().clone()))
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryDirectory {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<String>, AppError> {
        let Some(entry) = self.credentials.get(&username.to_lowercase()) else {
            return Ok(None);
        };
        let (subject_id, digest) = entry.value();
        // blake3::Hash equality is constant-time.
        if *digest == blake3::hash(password.as_bytes()) {
            Ok(Some(subject_id.clone()))
        } else {
            Ok(None)
        }
    }
}
