// Per-principal request budget behind the auth intercept.

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;

use crate::common::assert_problem;
use crate::support::app_builder::TestAppBuilder;
use crate::support::auth::{access_token, bearer, seed_member};

const ME: &str = "/api/v1/account/me";

#[actix_web::test]
async fn budget_exhaustion_is_429_until_the_window_slides(
) -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().with_rate_limit(3).build().await?;
    let member = seed_member(&world);
    let token = access_token(&world, &member);

    for _ in 0..3 {
        let req = test::TestRequest::get().uri(ME).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri(ME).insert_header(bearer(&token)).to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMITED",
    )
    .await;

    world.clock.advance(Duration::from_secs(61));
    let req = test::TestRequest::get().uri(ME).insert_header(bearer(&token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn budgets_are_per_principal() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().with_rate_limit(1).build().await?;
    let first = seed_member(&world);
    let second = seed_member(&world);
    let first_token = access_token(&world, &first);
    let second_token = access_token(&world, &second);

    let req = test::TestRequest::get().uri(ME).insert_header(bearer(&first_token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::get().uri(ME).insert_header(bearer(&first_token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::TOO_MANY_REQUESTS);

    let req = test::TestRequest::get().uri(ME).insert_header(bearer(&second_token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn zero_limit_disables_limiting() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().with_rate_limit(0).build().await?;
    let member = seed_member(&world);
    let token = access_token(&world, &member);

    for _ in 0..100 {
        let req = test::TestRequest::get().uri(ME).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
    Ok(())
}

#[actix_web::test]
async fn rejected_requests_do_not_spend_budget() -> Result<(), Box<dyn std::error::Error>> {
    let (world, app) = TestAppBuilder::new().with_rate_limit(1).build().await?;
    let member = seed_member(&world);
    let token = access_token(&world, &member);

    for _ in 0..5 {
        let req = test::TestRequest::get().uri(ME).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    let req = test::TestRequest::get().uri(ME).insert_header(bearer(&token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    Ok(())
}
