use std::time::Duration;

use actix_web::{web, App, HttpServer};
use mobile_api::config::Settings;
use mobile_api::dispatch::serve;
use mobile_api::middleware::{CorsGate, RequestTrace, SecurityHeaders, StructuredLogger};
use mobile_api::routes::{self, build_dispatcher};
use mobile_api::state::build_state;
use tracing::{debug, error, info};

mod telemetry;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let (host, port) = (settings.host.clone(), settings.port);
    let cors = settings.cors.clone();

    let app_state = match build_state().with_settings(settings).build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };
    if app_state.webhook.is_none() {
        info!(
            "WEBHOOK_ROOT_CERT_PATH unset; webhook endpoint will answer with a configuration error"
        );
    }

    let dispatcher = match build_dispatcher(&app_state) {
        Ok(dispatcher) => web::Data::new(dispatcher),
        Err(e) => {
            eprintln!("❌ Failed to build route table: {e}");
            std::process::exit(1);
        }
    };

    let store = app_state.store.clone();
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tick.tick().await;
            match store.purge_expired().await {
                Ok(removed) => debug!(removed, "purged expired store entries"),
                Err(e) => error!(error = %e, "store purge failed"),
            }
        }
    });

    info!(%host, port, "🚀 Starting mobile API");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestTrace)
            .wrap(StructuredLogger)
            .wrap(SecurityHeaders)
            .wrap(CorsGate::new(cors.clone()))
            .app_data(dispatcher.clone())
            .configure(routes::health::configure)
            .default_service(web::to(serve))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
