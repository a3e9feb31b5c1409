//! Shared test support for the mobile API
//!
//! Logging bootstrap, problem-details assertions and unique id helpers
//! used by the integration suites of `mobile-api`.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
