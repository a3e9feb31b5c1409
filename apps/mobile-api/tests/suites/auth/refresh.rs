// Refresh-token exchange and rotation.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use crate::common::{assert_problem, read_json};
use crate::support::app_builder::TestAppBuilder;
use crate::support::auth::{bearer, seed_member, token_pair};

const REFRESH: &str = "/api/v1/auth/token/refresh";

#[actix_web::test]
async fn refresh_rotates_and_retires_the_old_token() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    let pair = token_pair(&world, &member);

    let req = test::TestRequest::post()
        .uri(REFRESH)
        .set_json(json!({"refresh_token": pair.refresh_token}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["access_token"].as_str().expect("access token").to_string();
    assert_ne!(body["refresh_token"].as_str(), Some(pair.refresh_token.as_str()));

    // The rotated token is spent.
    let req = test::TestRequest::post()
        .uri(REFRESH)
        .set_json(json!({"refresh_token": pair.refresh_token}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/account/me")
        .insert_header(bearer(&new_access))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn access_token_cannot_be_exchanged() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    let pair = token_pair(&world, &member);

    let req = test::TestRequest::post()
        .uri(REFRESH)
        .set_json(json!({"refresh_token": pair.access_token}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn expired_refresh_token_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().build().await?;
    let member = seed_member(&world);
    let pair = token_pair(&world, &member);

    world.clock.advance(world.state.settings.refresh_ttl);

    let req = test::TestRequest::post()
        .uri(REFRESH)
        .set_json(json!({"refresh_token": pair.refresh_token}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn garbage_refresh_token_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;

    let req = test::TestRequest::post()
        .uri(REFRESH)
        .set_json(json!({"refresh_token": "not.a.token"}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
    )
    .await;
    Ok(())
}
