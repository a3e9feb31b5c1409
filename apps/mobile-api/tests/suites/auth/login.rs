// Integration tests for the token endpoint.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use crate::common::{assert_problem, read_json};
use crate::support::app_builder::TestAppBuilder;
use crate::support::auth::{bearer, seed_member};

const LOGIN: &str = "/api/v1/auth/token";

#[actix_web::test]
async fn login_issues_a_usable_pair() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    world.directory.set_password("casey", &member.id, "correct horse");

    let req = test::TestRequest::post()
        .uri(LOGIN)
        .set_json(json!({"username": "Casey", "password": "correct horse"}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
    let access = body["access_token"].as_str().expect("access token");
    assert_ne!(access, body["refresh_token"].as_str().expect("refresh token"));

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/token/validate")
        .insert_header(bearer(access))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subject_id"], member.id.as_str());
    assert_eq!(body["data"]["token_kind"], "access");
    Ok(())
}

#[actix_web::test]
async fn wrong_password_is_invalid_credentials() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    world.directory.set_password("casey", &member.id, "correct horse");

    let req = test::TestRequest::post()
        .uri(LOGIN)
        .set_json(json!({"username": "casey", "password": "battery staple"}))
        .to_request();
    let problem = assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_CREDENTIALS",
    )
    .await;
    assert_eq!(problem.detail, "Invalid username or password");
    Ok(())
}

#[actix_web::test]
async fn unknown_user_matches_wrong_password() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::post()
        .uri(LOGIN)
        .set_json(json!({"username": "nobody", "password": "anything"}))
        .to_request();
    let problem = assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_CREDENTIALS",
    )
    .await;
    assert_eq!(problem.detail, "Invalid username or password");
    Ok(())
}

#[actix_web::test]
async fn inactive_principal_cannot_log_in() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    world.directory.set_password("casey", &member.id, "correct horse");
    world.directory.revoke_capability(&member.id, "read");

    let req = test::TestRequest::post()
        .uri(LOGIN)
        .set_json(json!({"username": "casey", "password": "correct horse"}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_CREDENTIALS",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn blank_fields_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::post()
        .uri(LOGIN)
        .set_json(json!({"username": "  ", "password": ""}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "BAD_REQUEST",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn unparseable_body_is_invalid_json() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::post()
        .uri(LOGIN)
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_JSON",
    )
    .await;
    Ok(())
}
