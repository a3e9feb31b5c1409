pub mod cors;
pub mod settings;

pub use cors::{AllowedOrigins, CorsPolicy};
pub use settings::Settings;
