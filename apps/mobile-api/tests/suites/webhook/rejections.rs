// Envelopes that never reach processing.

use actix_web::http::StatusCode;
use actix_web::test;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mobile_api::WebhookVerifier;
use serde_json::json;

use crate::common::{assert_problem, read_json};
use crate::support::app_builder::TestAppBuilder;
use crate::support::certs::{notification, SigningChain};

const WEBHOOK: &str = "/api/v1/webhooks/app-store";

#[actix_web::test]
async fn unconfigured_root_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let (_world, app) = TestAppBuilder::new().build().await?;
    let chain = SigningChain::generate("Store Root CA");

    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": chain.sign(&notification("DID_RENEW", None))}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::INTERNAL_SERVER_ERROR,
        "CONFIG_ERROR",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn missing_signed_payload_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (_world, app) = TestAppBuilder::new()
        .with_webhook_verifier(WebhookVerifier::new(chain.root_der.clone(), false)?)
        .build()
        .await?;

    for body in [json!({}), json!({"signedPayload": ""})] {
        let req = test::TestRequest::post().uri(WEBHOOK).set_json(body).to_request();
        assert_problem(
            test::call_service(&app, req).await,
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
        )
        .await;
    }
    Ok(())
}

#[actix_web::test]
async fn two_segment_payload_is_malformed() -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (_world, app) = TestAppBuilder::new()
        .with_webhook_verifier(WebhookVerifier::new(chain.root_der.clone(), false)?)
        .build()
        .await?;

    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": "eyJhbGciOiJFUzI1NiJ9.e30"}))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "MALFORMED_SIGNATURE",
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn foreign_chain_is_reported_in_the_body() -> Result<(), Box<dyn std::error::Error>> {
    let pinned = SigningChain::generate("Store Root CA");
    let forged = SigningChain::generate("Store Root CA");
    let (_world, app) = TestAppBuilder::new()
        .with_webhook_verifier(WebhookVerifier::new(pinned.root_der.clone(), false)?)
        .build()
        .await?;

    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": forged.sign(&notification("REFUND", None))}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(body["notification_type"].is_null());
    Ok(())
}

#[actix_web::test]
async fn tampered_payload_fails_signature_check() -> Result<(), Box<dyn std::error::Error>> {
    let chain = SigningChain::generate("Store Root CA");
    let (_world, app) = TestAppBuilder::new()
        .with_webhook_verifier(WebhookVerifier::new(chain.root_der.clone(), false)?)
        .build()
        .await?;

    let signed = chain.sign(&notification("DID_RENEW", None));
    let mut parts: Vec<String> = signed.split('.').map(str::to_string).collect();
    parts[1] = URL_SAFE_NO_PAD.encode(json!({"notificationType": "REFUND"}).to_string());

    let req = test::TestRequest::post()
        .uri(WEBHOOK)
        .set_json(json!({"signedPayload": parts.join(".")}))
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    Ok(())
}
