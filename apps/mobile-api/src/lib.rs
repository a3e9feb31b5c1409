#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod trace_ctx;
pub mod webhook;


// Re-exports for public API
pub use auth::{AuthContext, Principal, TokenService};
pub use config::Settings;
pub use dispatch::{Dispatcher, RouteTable};
pub use error::AppError;
pub use errors::ErrorCode;
pub use middleware::{CorsGate, RequestTrace, SecurityHeaders, StructuredLogger};
pub use routes::build_dispatcher;
pub use state::{build_state, AppState, SecurityConfig};
pub use webhook::WebhookVerifier;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
