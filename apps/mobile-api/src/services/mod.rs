pub mod membership;
pub mod rate_limiter;

pub use membership::{InMemoryPlanLedger, PlanLedger, PlanMapping, PlanRecord, StaticPlanMapping};
pub use rate_limiter::RateLimiter;
