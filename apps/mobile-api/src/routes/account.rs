use std::collections::BTreeSet;
use std::sync::Arc;

use actix_web::http::Method;
use serde::Serialize;

use super::with_state;
use crate::dispatch::{ApiRequest, Intercept, PatternError, Reply, RouteTable};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccountView<'a> {
    pub id: &'a str,
    /// Roles as of token issuance
    pub roles: &'a BTreeSet<String>,
    pub capabilities: &'a BTreeSet<String>,
}

pub fn register(
    table: &mut RouteTable,
    state: &AppState,
    authn: &Arc<dyn Intercept>,
) -> Result<(), PatternError> {
    table.register(
        "account/me",
        Method::GET,
        with_state(state, me),
        vec![authn.clone()],
    )
}

async fn me(_state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let ctx = req.auth()?;
    Reply::data(&AccountView {
        id: ctx.subject_id(),
        roles: &ctx.claims.roles,
        capabilities: &ctx.principal.capabilities,
    })
}
