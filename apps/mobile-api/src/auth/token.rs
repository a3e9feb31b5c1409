//! Bearer token lifecycle: issue, validate, refresh, blacklist.
//!
//! Tokens are HS256 JWTs signed with the process secret. Validation is a
//! pure decode-and-check followed by a mandatory live lookup of the
//! subject; it never attaches anything to a request. That is the auth
//! middleware's job.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::claims::{TokenClaims, TokenKind};
use super::clock::Clock;
use super::principal::{Principal, PrincipalDirectory};
use crate::error::AppError;
use crate::logging::security;
use crate::state::security_config::SecurityConfig;
use crate::store::EphemeralStore;

const BLACKLIST_PREFIX: &str = "blacklist:";
const ROTATION_PREFIX: &str = "rotated:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("signing configuration error: {0}")]
    Config(String),
    #[error("token could not be decoded")]
    MalformedToken,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token issuer or audience mismatch")]
    InvalidClaims,
    #[error("token is not yet valid")]
    NotYetValid,
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
    #[error("token subject no longer exists")]
    SubjectNotFound,
    #[error("token subject is inactive")]
    SubjectInactive,
    #[error("{found} token presented where {expected} token is required")]
    WrongTokenKind { expected: TokenKind, found: TokenKind },
    #[error("token store failure: {0}")]
    Store(String),
}

impl From<AppError> for TokenError {
    fn from(e: AppError) -> Self {
        TokenError::Store(e.to_string())
    }
}

/// Claims that passed every check, plus the live principal they resolve to.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub claims: TokenClaims,
    pub principal: Principal,
}

impl ValidatedToken {
    pub fn require_kind(&self, expected: TokenKind) -> Result<(), TokenError> {
        if self.claims.kind == expected {
            Ok(())
        } else {
            Err(TokenError::WrongTokenKind {
                expected,
                found: self.claims.kind,
            })
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

pub struct TokenService {
    security: SecurityConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn EphemeralStore>,
    directory: Arc<dyn PrincipalDirectory>,
}

impl TokenService {
    pub fn new(
        security: SecurityConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn EphemeralStore>,
        directory: Arc<dyn PrincipalDirectory>,
    ) -> Self {
        Self {
            security,
            clock,
            store,
            directory,
        }
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    /// Deterministic blacklist key material for a raw token.
    pub fn fingerprint(raw_token: &str) -> String {
        blake3::hash(raw_token.as_bytes()).to_hex().to_string()
    }

    /// Mint a signed token for `principal`, snapshotting its roles.
    pub fn issue(&self, principal: &Principal, kind: TokenKind) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.security.ttl(kind).as_secs()).unwrap_or(i64::MAX);
        if ttl <= 0 {
            return Err(TokenError::Config(format!("{kind} token lifetime must be positive")));
        }

        let now = self.clock.now().unix_timestamp();
        let exp = now
            .checked_add(ttl)
            .filter(|exp| OffsetDateTime::from_unix_timestamp(*exp).is_ok())
            .ok_or_else(|| {
                TokenError::Config(format!("{kind} token lifetime of {ttl}s overflows the clock"))
            })?;
        let claims = TokenClaims {
            iss: self.security.issuer.clone(),
            aud: self.security.audience.clone(),
            iat: now,
            nbf: now,
            exp,
            sub: principal.id.clone(),
            roles: principal.roles.clone(),
            kind,
            jti: Uuid::new_v4().to_string(),
        };

        let secret = self.security.secrets.secret()?;
        encode(
            &Header::new(self.security.algorithm),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| TokenError::Config(format!("failed to encode token: {e}")))
    }

    pub fn issue_pair(&self, principal: &Principal) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(principal, TokenKind::Access)?,
            refresh_token: self.issue(principal, TokenKind::Refresh)?,
            token_type: "Bearer",
            expires_in: self.security.access_ttl.as_secs(),
        })
    }

    /// Full validation: signature, issuer/audience, time window, then a live
    /// subject lookup. Does not consult the blacklist.
    pub async fn validate(&self, raw_token: &str) -> Result<ValidatedToken, TokenError> {
        let claims = self.decode_signed(raw_token)?;

        let now = self.clock.now().unix_timestamp();
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        let principal = self
            .directory
            .find(&claims.sub)
            .await?
            .ok_or(TokenError::SubjectNotFound)?;
        if !principal.is_active() {
            return Err(TokenError::SubjectInactive);
        }

        Ok(ValidatedToken { claims, principal })
    }

    /// Exchange a refresh token for a fresh access + refresh pair.
    ///
    /// With `rotation_revokes` on, each refresh token can be exchanged once:
    /// the first exchange claims it atomically and blacklists it.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair, TokenError> {
        if self.is_blacklisted(raw_refresh_token).await? {
            return Err(TokenError::Revoked);
        }

        let validated = self.validate(raw_refresh_token).await?;
        validated.require_kind(TokenKind::Refresh)?;

        if self.security.rotation_revokes {
            let remaining = self.remaining_ttl(&validated.claims);
            let key = format!("{ROTATION_PREFIX}{}", Self::fingerprint(raw_refresh_token));
            if !self.store.admit(&key, 1, remaining).await? {
                return Err(TokenError::Revoked);
            }
        }

        let pair = self.issue_pair(&validated.principal)?;

        if self.security.rotation_revokes {
            self.revoke(raw_refresh_token, &validated.claims).await?;
        }

        Ok(pair)
    }

    /// Record `raw_token` in the blacklist until its natural expiry.
    ///
    /// Only the signature is checked, so tokens of deleted subjects can still
    /// be revoked. Returns `false` for tokens that are already dead.
    pub async fn blacklist(&self, raw_token: &str) -> Result<bool, TokenError> {
        let claims = self.decode_signed(raw_token)?;
        self.revoke(raw_token, &claims).await
    }

    /// Pure existence lookup; works for any string, well-formed or not.
    pub async fn is_blacklisted(&self, raw_token: &str) -> Result<bool, TokenError> {
        let key = format!("{BLACKLIST_PREFIX}{}", Self::fingerprint(raw_token));
        Ok(self.store.exists(&key).await?)
    }

    async fn revoke(&self, raw_token: &str, claims: &TokenClaims) -> Result<bool, TokenError> {
        let ttl = self.remaining_ttl(claims);
        if ttl.is_zero() {
            return Ok(false);
        }

        let fingerprint = Self::fingerprint(raw_token);
        self.store
            .put(&format!("{BLACKLIST_PREFIX}{fingerprint}"), ttl)
            .await?;
        security::token_revoked(&claims.sub, &fingerprint, ttl.as_secs());
        Ok(true)
    }

    fn remaining_ttl(&self, claims: &TokenClaims) -> Duration {
        let remaining = claims.exp.saturating_sub(self.clock.now().unix_timestamp());
        Duration::from_secs(remaining.max(0) as u64)
    }

    /// Signature + issuer/audience check only; time and subject are the
    /// caller's concern.
    fn decode_signed(&self, raw_token: &str) -> Result<TokenClaims, TokenError> {
        let secret = self.security.secrets.secret()?;

        let mut validation = Validation::new(self.security.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[&self.security.issuer]);
        validation.set_audience(&[&self.security.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss", "aud"]);

        decode::<TokenClaims>(raw_token, &DecodingKey::from_secret(secret), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::MissingRequiredClaim(_) => TokenError::InvalidClaims,
                _ => TokenError::MalformedToken,
            })
    }
}
