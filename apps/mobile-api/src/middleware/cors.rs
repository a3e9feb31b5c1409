//! CORS gate.
//!
//! When enabled, every response advertises the allowed methods and
//! headers, an allow-listed `Origin` is reflected back, and `OPTIONS`
//! preflights end here with a bare 200 before reaching the dispatcher.
//! `actix-cors` is not used because it rejects preflights from origins
//! outside the allow-list instead of answering them with 200.

use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::http::Method;
use actix_web::{Error as ActixError, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};

use crate::config::cors::{ALLOWED_HEADERS, ALLOWED_METHODS};
use crate::config::CorsPolicy;

pub struct CorsGate {
    policy: Arc<CorsPolicy>,
}

impl CorsGate {
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type InitError = ();
    type Transform = CorsGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsGateMiddleware {
            service,
            policy: self.policy.clone(),
        }))
    }
}

pub struct CorsGateMiddleware<S> {
    service: S,
    policy: Arc<CorsPolicy>,
}

impl<S, B> Service<ServiceRequest> for CorsGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.policy.enabled {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .filter(|o| self.policy.allows(o))
            .and_then(|o| HeaderValue::from_str(o).ok());

        if req.method() == Method::OPTIONS {
            let mut preflight = HttpResponse::Ok().finish();
            apply_cors_headers(preflight.headers_mut(), origin);
            let res = req.into_response(preflight).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            apply_cors_headers(res.headers_mut(), origin);
            Ok(res.map_into_left_body())
        })
    }
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<HeaderValue>) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}
