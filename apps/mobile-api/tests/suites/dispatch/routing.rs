// Resolution against the production route table.

use actix_web::http::{header, StatusCode};
use actix_web::test;

use crate::common::assert_problem;
use crate::support::app_builder::TestAppBuilder;
use crate::support::auth::{access_token, bearer, seed_member};

#[actix_web::test]
async fn unknown_path_is_route_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::get().uri("/api/v1/nothing/here").to_request();
    let problem = assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "ROUTE_NOT_FOUND",
    )
    .await;
    assert!(problem.detail.contains("GET"), "{}", problem.detail);
    assert!(problem.detail.contains("nothing/here"), "{}", problem.detail);
    Ok(())
}

#[actix_web::test]
async fn method_mismatch_is_route_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::get().uri("/api/v1/auth/token").to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "ROUTE_NOT_FOUND",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn non_numeric_id_does_not_match() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    let token = access_token(&world, &member);

    let req = test::TestRequest::get()
        .uri("/api/v1/members/abc/plan")
        .insert_header(bearer(&token))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "ROUTE_NOT_FOUND",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn trailing_slash_resolves_the_same_route() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    let token = access_token(&world, &member);

    let req = test::TestRequest::get()
        .uri("/api/v1/account/me/")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn health_is_served_outside_the_namespace() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-trace-id"));
    assert_eq!(
        resp.headers().get(header::X_CONTENT_TYPE_OPTIONS).and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(test::read_body(resp).await, "ok");
    Ok(())
}
