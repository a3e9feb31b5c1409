use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::auth::claims::TokenKind;
use crate::auth::secret::SecretStore;
use crate::config::Settings;

/// Token signing and lifetime settings
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Resolves (and if needed generates) the HMAC signing secret
    pub secrets: Arc<SecretStore>,
    /// Pinned signing algorithm (HS256)
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Blacklist a refresh token once it has been rotated
    pub rotation_revokes: bool,
}

impl SecurityConfig {
    /// Config with a fixed secret and default lifetimes
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        let defaults = Settings::default();
        Self {
            secrets: Arc::new(SecretStore::fixed(jwt_secret)),
            algorithm: Algorithm::HS256,
            issuer: defaults.issuer,
            audience: defaults.audience,
            access_ttl: defaults.access_ttl,
            refresh_ttl: defaults.refresh_ttl,
            rotation_revokes: defaults.rotation_revokes,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            secrets: Arc::new(SecretStore::new(
                settings.jwt_secret.clone(),
                settings.jwt_secret_file.clone(),
            )),
            algorithm: Algorithm::HS256,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            rotation_revokes: settings.rotation_revokes,
        }
    }

    pub fn with_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_ttl = access;
        self.refresh_ttl = refresh;
        self
    }

    pub fn with_rotation_revokes(mut self, revokes: bool) -> Self {
        self.rotation_revokes = revokes;
        self
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}
