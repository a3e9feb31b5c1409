//! Route registrations for the API namespace.
//!
//! Registration order is the resolution order; keep more specific
//! patterns ahead of overlapping general ones.

use std::future::Future;
use std::sync::Arc;

use crate::dispatch::{ApiRequest, Dispatcher, Handler, Intercept, PatternError, Reply, RouteTable};
use crate::error::AppError;
use crate::middleware::AuthMiddleware;
use crate::state::AppState;

pub mod account;
pub mod auth;
pub mod health;
pub mod members;
pub mod webhooks;

/// Build the dispatcher that serves everything under the namespace.
pub fn build_dispatcher(state: &AppState) -> Result<Dispatcher, AppError> {
    let mut table = RouteTable::new(&state.settings.namespace);
    let authn: Arc<dyn Intercept> = Arc::new(AuthMiddleware::new(
        state.tokens.clone(),
        state.rate_limiter.clone(),
    ));

    auth::register(&mut table, state, &authn).map_err(invalid_route)?;
    account::register(&mut table, state, &authn).map_err(invalid_route)?;
    members::register(&mut table, state, &authn).map_err(invalid_route)?;
    webhooks::register(&mut table, state).map_err(invalid_route)?;

    Ok(Dispatcher::new(table, state.settings.debug))
}

/// Adapt an `async fn(AppState, ApiRequest)` into a route handler.
pub(crate) fn with_state<F, Fut>(state: &AppState, handler: F) -> impl Handler
where
    F: Fn(AppState, ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, AppError>> + 'static,
{
    let state = state.clone();
    move |req: ApiRequest| handler(state.clone(), req)
}

fn invalid_route(e: PatternError) -> AppError {
    AppError::internal(format!("invalid route pattern: {e}"))
}
