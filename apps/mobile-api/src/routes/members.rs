use std::sync::Arc;

use actix_web::http::Method;
use serde::Serialize;

use super::with_state;
use crate::dispatch::{ApiRequest, Intercept, PatternError, Reply, RouteTable};
use crate::error::AppError;
use crate::middleware::{RequireOwner, RequireRole};
use crate::state::AppState;

/// Role allowed to terminate any member's plan.
pub const ADMINISTRATOR_ROLE: &str = "administrator";

#[derive(Debug, Serialize)]
pub struct TerminateResponse {
    pub subject_id: String,
    pub terminated: bool,
}

pub fn register(
    table: &mut RouteTable,
    state: &AppState,
    authn: &Arc<dyn Intercept>,
) -> Result<(), PatternError> {
    table.register(
        "members/{user_id}/plan",
        Method::GET,
        with_state(state, current_plan),
        vec![
            authn.clone(),
            Arc::new(RequireOwner::of("user_id")) as Arc<dyn Intercept>,
        ],
    )?;
    table.register(
        "members/{user_id}/plan/terminate",
        Method::POST,
        with_state(state, terminate_plan),
        vec![
            authn.clone(),
            Arc::new(RequireRole::new(ADMINISTRATOR_ROLE)) as Arc<dyn Intercept>,
        ],
    )?;
    Ok(())
}

async fn current_plan(state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let user_id = req.param("user_id")?;
    let plan = state
        .plans
        .current(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No plan for member {user_id}")))?;
    Reply::data(&plan)
}

async fn terminate_plan(state: AppState, req: ApiRequest) -> Result<Reply, AppError> {
    let user_id = req.param("user_id")?;
    let terminated = state.plans.terminate(user_id).await?;
    Reply::data(&TerminateResponse {
        subject_id: user_id.to_string(),
        terminated,
    })
}
