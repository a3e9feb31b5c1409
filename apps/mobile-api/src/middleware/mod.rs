pub mod auth;
pub mod cors;
pub mod guards;
pub mod request_trace;
pub mod security_headers;
pub mod structured_logger;

pub use auth::AuthMiddleware;
pub use cors::CorsGate;
pub use guards::{RequireCapability, RequireOwner, RequireRole};
pub use request_trace::RequestTrace;
pub use security_headers::SecurityHeaders;
pub use structured_logger::StructuredLogger;
