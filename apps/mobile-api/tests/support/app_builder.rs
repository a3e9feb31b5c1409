//! Test app assembled the same way `main` assembles the server.

use std::sync::Arc;

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use actix_http::Request;
use mobile_api::auth::{InMemoryDirectory, ManualClock};
use mobile_api::config::CorsPolicy;
use mobile_api::dispatch::serve;
use mobile_api::routes::health;
use mobile_api::services::InMemoryPlanLedger;
use mobile_api::{
    build_dispatcher, build_state, AppError, AppState, CorsGate, RequestTrace, SecurityConfig,
    SecurityHeaders, Settings, StructuredLogger, WebhookVerifier,
};

pub const TEST_SECRET: &[u8] = b"integration-test-signing-secret";
pub const ALLOWED_ORIGIN: &str = "https://app.example.com";

/// Handles the tests keep to arrange state behind the running app.
pub struct TestWorld {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub directory: Arc<InMemoryDirectory>,
    pub plans: Arc<InMemoryPlanLedger>,
}

pub struct TestAppBuilder {
    settings: Settings,
    verifier: Option<WebhookVerifier>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let settings = Settings {
            cors: CorsPolicy::new(true, ALLOWED_ORIGIN),
            ..Settings::default()
        };
        Self {
            settings,
            verifier: None,
        }
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.settings.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.settings.cors = cors;
        self
    }

    pub fn with_product_plan(mut self, product_id: &str, plan_id: &str) -> Self {
        self.settings
            .product_plans
            .insert(product_id.to_string(), plan_id.to_string());
        self
    }

    pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub async fn build(
        self,
    ) -> Result<
        (
            TestWorld,
            impl Service<
                Request,
                Response = ServiceResponse<EitherBody<BoxBody>>,
                Error = actix_web::Error,
            >,
        ),
        AppError,
    > {
        let clock = Arc::new(ManualClock::frozen());
        let directory = Arc::new(InMemoryDirectory::new());
        let plans = Arc::new(InMemoryPlanLedger::new());
        let security = SecurityConfig::new(TEST_SECRET).with_ttls(
            self.settings.access_ttl,
            self.settings.refresh_ttl,
        );
        let cors = self.settings.cors.clone();

        let mut builder = build_state()
            .with_settings(self.settings)
            .with_clock(clock.clone())
            .with_directory(directory.clone())
            .with_plan_ledger(plans.clone())
            .with_security(security);
        if let Some(verifier) = self.verifier {
            builder = builder.with_webhook_verifier(verifier);
        }
        let state = builder.build().await?;

        let dispatcher = web::Data::new(build_dispatcher(&state)?);
        let app = test::init_service(
            App::new()
                .wrap(RequestTrace)
                .wrap(StructuredLogger)
                .wrap(SecurityHeaders)
                .wrap(CorsGate::new(cors))
                .app_data(dispatcher)
                .configure(health::configure)
                .default_service(web::to(serve)),
        )
        .await;

        Ok((
            TestWorld {
                state,
                clock,
                directory,
                plans,
            },
            app,
        ))
    }
}
