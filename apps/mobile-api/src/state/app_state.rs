use std::sync::Arc;

use super::security_config::SecurityConfig;
use crate::auth::{
    Clock, CredentialVerifier, InMemoryDirectory, PrincipalDirectory, SystemClock, TokenService,
};
use crate::config::Settings;
use crate::error::AppError;
use crate::services::{
    InMemoryPlanLedger, PlanLedger, PlanMapping, RateLimiter, StaticPlanMapping,
};
use crate::store::{EphemeralStore, MemoryStore};
use crate::webhook::WebhookVerifier;

/// Shared services handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub clock: Arc<dyn Clock>,
    /// Blacklist and rate-limit windows
    pub store: Arc<dyn EphemeralStore>,
    pub directory: Arc<dyn PrincipalDirectory>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub tokens: Arc<TokenService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub plans: Arc<dyn PlanLedger>,
    pub plan_mapping: Arc<dyn PlanMapping>,
    /// `None` until a pinned root certificate is configured
    pub webhook: Option<Arc<WebhookVerifier>>,
}

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    settings: Settings,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn EphemeralStore>>,
    directory: Option<(Arc<dyn PrincipalDirectory>, Arc<dyn CredentialVerifier>)>,
    plans: Option<Arc<dyn PlanLedger>>,
    security: Option<SecurityConfig>,
    webhook: Option<Arc<WebhookVerifier>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            clock: None,
            store: None,
            directory: None,
            plans: None,
            security: None,
            webhook: None,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn EphemeralStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// One collaborator usually backs both principal lookup and login.
    pub fn with_directory<D>(mut self, directory: Arc<D>) -> Self
    where
        D: PrincipalDirectory + CredentialVerifier + 'static,
    {
        self.directory = Some((
            directory.clone() as Arc<dyn PrincipalDirectory>,
            directory as Arc<dyn CredentialVerifier>,
        ));
        self
    }

    pub fn with_plan_ledger(mut self, plans: Arc<dyn PlanLedger>) -> Self {
        self.plans = Some(plans);
        self
    }

    /// Overrides the token settings derived from [`Settings`].
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = Some(security);
        self
    }

    pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.webhook = Some(Arc::new(verifier));
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let settings = self.settings;
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let store: Arc<dyn EphemeralStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new(clock.clone())),
        };
        let (directory, credentials) = match self.directory {
            Some(pair) => pair,
            None => {
                let directory = Arc::new(InMemoryDirectory::new());
                (
                    directory.clone() as Arc<dyn PrincipalDirectory>,
                    directory as Arc<dyn CredentialVerifier>,
                )
            }
        };

        let security = self
            .security
            .unwrap_or_else(|| SecurityConfig::from_settings(&settings));
        // Resolve (or generate and persist) the secret now so a bad secret
        // file fails startup rather than the first login.
        security.secrets.secret()?;

        let webhook = match (self.webhook, &settings.webhook_root_cert_path) {
            (Some(verifier), _) => Some(verifier),
            (None, Some(path)) => Some(Arc::new(
                WebhookVerifier::from_path(path, settings.webhook_strict_chain)
                    .map_err(|e| AppError::config(e.to_string()))?,
            )),
            (None, None) => None,
        };

        let tokens = Arc::new(TokenService::new(
            security,
            clock.clone(),
            store.clone(),
            directory.clone(),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            store.clone(),
            settings.rate_limit_per_minute,
        ));
        let plan_mapping: Arc<dyn PlanMapping> =
            Arc::new(StaticPlanMapping::from(settings.product_plans.clone()));

        Ok(AppState {
            settings: Arc::new(settings),
            clock,
            store,
            directory,
            credentials,
            tokens,
            rate_limiter,
            plans: match self.plans {
                Some(plans) => plans,
                None => Arc::new(InMemoryPlanLedger::new()),
            },
            plan_mapping,
            webhook,
        })
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
