//! Error taxonomy for the mobile API.

pub mod error_code;

pub use error_code::ErrorCode;
