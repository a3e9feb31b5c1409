//! Bridges actix requests into the dispatcher.

use actix_web::{web, HttpRequest, HttpResponse};

use super::dispatcher::Dispatcher;
use super::request::ApiRequest;

/// Mounted as the actix `default_service`, so every path the actix
/// router does not claim itself lands in the route table.
pub async fn serve(
    req: HttpRequest,
    body: web::Bytes,
    dispatcher: web::Data<Dispatcher>,
) -> HttpResponse {
    let mut api = ApiRequest::new(req.method().clone(), req.path());
    api.query = req.query_string().to_string();
    api.headers = req.headers().clone();
    api.body = body;
    dispatcher.dispatch(api).await
}
