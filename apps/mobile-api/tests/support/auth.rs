//! Principals and bearer tokens for integration tests.

use actix_web::http::header;
use api_test_support::unique_helpers::unique_subject_id;
use mobile_api::auth::{Principal, TokenKind, TokenPair, ADMIN_CAPABILITY, BASELINE_CAPABILITY};

use super::app_builder::TestWorld;

/// Register an ordinary member under a unique id.
pub fn seed_member(world: &TestWorld) -> Principal {
    let principal = Principal::member(unique_subject_id());
    world.directory.upsert(principal.clone());
    principal
}

pub fn seed_admin(world: &TestWorld) -> Principal {
    let principal = Principal::new(
        unique_subject_id(),
        ["administrator"],
        [BASELINE_CAPABILITY, ADMIN_CAPABILITY],
    );
    world.directory.upsert(principal.clone());
    principal
}

pub fn access_token(world: &TestWorld, principal: &Principal) -> String {
    world
        .state
        .tokens
        .issue(principal, TokenKind::Access)
        .expect("issue access token")
}

pub fn token_pair(world: &TestWorld, principal: &Principal) -> TokenPair {
    world
        .state
        .tokens
        .issue_pair(principal)
        .expect("issue token pair")
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}
