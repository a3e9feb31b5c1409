pub mod app_state;
pub mod security_config;

pub use app_state::{build_state, AppState, StateBuilder};
pub use security_config::SecurityConfig;
