//! Route resolution, the fail-fast intercept chain, and handler invocation.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use actix_web::error::ResponseError;
use actix_web::HttpResponse;
use async_trait::async_trait;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::request::ApiRequest;
use super::table::{Route, RouteTable};
use crate::error::AppError;

/// What an intercept decided about the request.
pub enum Flow {
    Continue,
    /// Stop the chain and send this response; the handler is skipped.
    Respond(HttpResponse),
}

/// A middleware registered on a route. Returning an error or
/// [`Flow::Respond`] skips every later intercept and the handler.
#[async_trait(?Send)]
pub trait Intercept: Send + Sync + 'static {
    async fn intercept(&self, req: &mut ApiRequest) -> Result<Flow, AppError>;
}

pub enum Reply {
    Response(HttpResponse),
    /// Wrapped in the `{"success": true, "data": ...}` envelope.
    Data(Value),
}

impl Reply {
    pub fn data<T: Serialize>(value: &T) -> Result<Self, AppError> {
        serde_json::to_value(value)
            .map(Reply::Data)
            .map_err(|e| AppError::internal(format!("response serialization failed: {e}")))
    }

    fn into_response(self) -> HttpResponse {
        match self {
            Reply::Response(resp) => resp,
            Reply::Data(data) => HttpResponse::Ok().json(json!({ "success": true, "data": data })),
        }
    }
}

#[async_trait(?Send)]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, req: ApiRequest) -> Result<Reply, AppError>;
}

#[async_trait(?Send)]
impl<F, Fut> Handler for F
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, AppError>> + 'static,
{
    async fn call(&self, req: ApiRequest) -> Result<Reply, AppError> {
        (self)(req).await
    }
}

pub struct Dispatcher {
    table: RouteTable,
    /// Surface raw fault messages in 500 bodies
    debug: bool,
}

impl Dispatcher {
    pub fn new(table: RouteTable, debug: bool) -> Self {
        Self { table, debug }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve, run the chain, invoke the handler. Never fails: every
    /// error and handler panic becomes a problem-details response.
    pub async fn dispatch(&self, req: ApiRequest) -> HttpResponse {
        match self.run(req).await {
            Ok(resp) => resp,
            Err(err) => {
                if err.is_server_fault() {
                    error!(error = %err, "request failed with server fault");
                }
                err.redacted(self.debug).error_response()
            }
        }
    }

    async fn run(&self, mut req: ApiRequest) -> Result<HttpResponse, AppError> {
        let (route, params) = self
            .table
            .resolve(&req.path, &req.method)
            .ok_or_else(|| AppError::route_not_found(req.method.as_str(), req.path.as_str()))?;

        debug!(route = %route.pattern, method = %req.method, "route matched");
        req.path = self.table.normalize(&req.path);
        req.params = params;

        AssertUnwindSafe(run_chain(route, req))
            .catch_unwind()
            .await
            .map_err(|panic| AppError::internal(panic_message(panic.as_ref())))?
    }
}

/// Intercepts in order, then the handler. Panics anywhere in here are
/// caught by the caller.
async fn run_chain(route: &Route, mut req: ApiRequest) -> Result<HttpResponse, AppError> {
    for intercept in &route.intercepts {
        if let Flow::Respond(resp) = intercept.intercept(&mut req).await? {
            return Ok(resp);
        }
    }
    Ok(route.handler.call(req).await?.into_response())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("request panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("request panicked: {msg}")
    } else {
        "request panicked".to_string()
    }
}
