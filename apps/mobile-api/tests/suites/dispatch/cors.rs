// CORS gate in front of the dispatcher.

use actix_web::http::{header, StatusCode};
use actix_web::test;
use mobile_api::config::CorsPolicy;

use crate::common::assert_problem;
use crate::support::app_builder::{TestAppBuilder, ALLOWED_ORIGIN};

#[actix_web::test]
async fn preflight_for_allowed_origin() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/account/me")
        .insert_header((header::ORIGIN, ALLOWED_ORIGIN))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
        Some(ALLOWED_ORIGIN)
    );
    assert!(headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|m| m.contains("POST")));
    assert!(headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|h| h.contains("Authorization")));
    assert!(test::read_body(resp).await.is_empty());
    Ok(())
}

#[actix_web::test]
async fn preflight_for_foreign_origin_omits_allow_origin(
) -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/account/me")
        .insert_header((header::ORIGIN, "https://evil.example.net"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    Ok(())
}

#[actix_web::test]
async fn error_responses_carry_cors_headers() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::get()
        .uri("/api/v1/account/me")
        .insert_header((header::ORIGIN, ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
        Some(ALLOWED_ORIGIN)
    );
    assert_problem(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
    Ok(())
}

#[actix_web::test]
async fn disabled_gate_lets_options_reach_the_dispatcher(
) -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new()
        .with_cors(CorsPolicy::disabled())
        .build()
        .await?;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/account/me")
        .insert_header((header::ORIGIN, ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert_problem(resp, StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND").await;
    Ok(())
}
