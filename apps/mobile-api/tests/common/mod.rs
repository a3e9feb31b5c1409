#![allow(dead_code)]

// tests/common/mod.rs
use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use actix_web::test;
use api_test_support::problem_details::{assert_problem_details, ProblemDetailsLike};
use serde_json::Value;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    api_test_support::logging::init();
}

/// Read a JSON body, keeping status and headers for assertions.
pub async fn read_json<B>(resp: ServiceResponse<B>) -> (StatusCode, HeaderMap, Value)
where
    B: MessageBody,
{
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|_| panic!("body is not JSON: {}", String::from_utf8_lossy(&body)));
    (status, headers, json)
}

/// Assert a problem-details error response and return the parsed body.
pub async fn assert_problem<B>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_code: &str,
) -> ProblemDetailsLike
where
    B: MessageBody,
{
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = test::read_body(resp).await;
    assert_problem_details(status, &headers, &body, expected_status, expected_code)
}
