// Verified notifications applied to the plan ledger.

use actix_web::http::StatusCode;
use actix_web::test;
use mobile_api::services::PlanLedger;
use mobile_api::webhook::WebhookError;
use mobile_api::WebhookVerifier;
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::common::read_json;
use crate::support::app_builder::{TestAppBuilder, TestWorld};
use crate::support::auth::seed_member;
use crate::support::certs::{notification, transaction_info, SigningChain};

const WEBHOOK: &str = "/api/v1/webhooks/app-store";
const PRODUCT: &str = "com.example.app.gold.monthly";
const EXPIRES_MS: i64 = 1_893_456_000_000;

/// A member linked to a fresh app account token.
fn linked_member(world: &TestWorld) -> (String, String) {
    let member = seed_member(world);
    let account_token = Uuid::new_v4();
    world.directory.link_account_token(account_token, member.id.clone());
    (member.id, account_token.to_string())
}

fn builder(chain: &SigningChain) -> Result<TestAppBuilder, WebhookError> {
    Ok(TestAppBuilder::new()
        .with_product_plan(PRODUCT, "gold")
        .with_webhook_verifier(WebhookVerifier::new(chain.root_der.clone(), false)?))
}

#[actix_web::test]
async fn renewal_extends_the_members_plan() -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (world, app) = builder(&chain)?.build().await?;
    let (subject_id, account_token) = linked_member(&world);

    let payload = notification(
        "DID_RENEW",
        Some(transaction_info(PRODUCT, &account_token, EXPIRES_MS)),
    );
    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": chain.sign(&payload)}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["notification_type"], "DID_RENEW");

    let plan = world.plans.current(&subject_id).await?.expect("plan created");
    assert_eq!(plan.plan_id, "gold");
    assert!(plan.active);
    assert_eq!(
        plan.ends_at,
        OffsetDateTime::from_unix_timestamp(EXPIRES_MS / 1000)?
    );
    Ok(())
}

#[actix_web::test]
async fn expiry_terminates_the_members_plan() -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (world, app) = builder(&chain)?.build().await?;
    let (subject_id, account_token) = linked_member(&world);
    world
        .plans
        .extend(&subject_id, "gold", OffsetDateTime::now_utc())
        .await?;

    let payload = notification(
        "EXPIRED",
        Some(transaction_info(PRODUCT, &account_token, EXPIRES_MS)),
    );
    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": chain.sign(&payload)}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let plan = world.plans.current(&subject_id).await?.expect("record kept");
    assert!(!plan.active);
    Ok(())
}

#[actix_web::test]
async fn unactioned_types_are_acknowledged() -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (_world, app) = builder(&chain)?.build().await?;

    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": chain.sign(&notification("PRICE_INCREASE", None))}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "notification acknowledged");
    assert_eq!(body["notification_type"], "PRICE_INCREASE");
    Ok(())
}

#[actix_web::test]
async fn business_mismatches_stay_200_with_error_status(
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (world, app) = builder(&chain)?.build().await?;
    let (subject_id, account_token) = linked_member(&world);

    let cases = [
        notification(
            "DID_RENEW",
            Some(transaction_info("com.example.unmapped", &account_token, EXPIRES_MS)),
        ),
        notification(
            "DID_RENEW",
            Some(transaction_info(PRODUCT, &Uuid::new_v4().to_string(), EXPIRES_MS)),
        ),
        notification("SUBSCRIBED", None),
    ];
    for payload in cases {
        let req = test::TestRequest::post()
            .uri(WEBHOOK)
            .set_json(json!({"signedPayload": chain.sign(&payload)}))
            .to_request();
        let (status, _, body) = read_json(test::call_service(&app, req).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error", "{body}");
        assert!(body["notification_type"].is_string());
    }

    assert!(world.plans.current(&subject_id).await?.is_none());
    Ok(())
}

#[actix_web::test]
async fn unreadable_verified_payloads_stay_200_with_error_status(
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (_world, app) = builder(&chain)?.build().await?;

    let cases = [
        (notification("DID_RENEW", Some("not-a-jws".to_owned())), Some("DID_RENEW")),
        (json!({"foo": 1}), None),
    ];
    for (payload, expected_type) in cases {
        let req = test::TestRequest::post()
            .uri(WEBHOOK)
            .set_json(json!({"signedPayload": chain.sign(&payload)}))
            .to_request();
        let (status, _, body) = read_json(test::call_service(&app, req).await).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "error");
        match expected_type {
            Some(kind) => assert_eq!(body["notification_type"], kind),
            None => assert!(body["notification_type"].is_null()),
        }
    }
    Ok(())
}
