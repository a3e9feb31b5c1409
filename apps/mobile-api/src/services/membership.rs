//! Plan bookkeeping seams driven by verified subscription notifications.
//!
//! The membership platform owns the real ledger; the in-memory versions
//! here back the binary and the test suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRecord {
    pub subject_id: String,
    pub plan_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub active: bool,
}

#[async_trait]
pub trait PlanLedger: Send + Sync {
    /// Move the subject's plan end date to `ends_at`, creating the plan
    /// if the subject has none.
    async fn extend(
        &self,
        subject_id: &str,
        plan_id: &str,
        ends_at: OffsetDateTime,
    ) -> Result<PlanRecord, AppError>;

    /// Returns `false` when the subject had no plan to terminate.
    async fn terminate(&self, subject_id: &str) -> Result<bool, AppError>;

    async fn current(&self, subject_id: &str) -> Result<Option<PlanRecord>, AppError>;
}

pub trait PlanMapping: Send + Sync {
    fn plan_for_product(&self, product_id: &str) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct InMemoryPlanLedger {
    plans: DashMap<String, PlanRecord>,
}

impl InMemoryPlanLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanLedger for InMemoryPlanLedger {
    async fn extend(
        &self,
        subject_id: &str,
        plan_id: &str,
        ends_at: OffsetDateTime,
    ) -> Result<PlanRecord, AppError> {
        let record = PlanRecord {
            subject_id: subject_id.to_string(),
            plan_id: plan_id.to_string(),
            ends_at,
            active: true,
        };
        self.plans.insert(subject_id.to_string(), record.clone());
        Ok(record)
    }

    async fn terminate(&self, subject_id: &str) -> Result<bool, AppError> {
        Ok(match self.plans.get_mut(subject_id) {
            Some(mut record) => {
                record.active = false;
                true
            }
            None => false,
        })
    }

    async fn current(&self, subject_id: &str) -> Result<Option<PlanRecord>, AppError> {
        Ok(self.plans.get(subject_id).map(|r| r.clone()))
    }
}

/// Product-to-plan lookup loaded once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPlanMapping {
    plans: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for StaticPlanMapping {
    fn from(plans: BTreeMap<String, String>) -> Self {
        Self { plans }
    }
}

impl PlanMapping for StaticPlanMapping {
    fn plan_for_product(&self, product_id: &str) -> Option<String> {
        self.plans.get(product_id).cloned()
    }
}
