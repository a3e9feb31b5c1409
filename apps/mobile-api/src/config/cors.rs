//! CORS allow-list configuration.
//!
//! `CORS_ALLOWED_ORIGINS` is either `*` or a comma-separated list of
//! origins. Entries are lightly validated: empty values, `null` and
//! anything without an http(s) scheme are dropped.

/// Methods advertised on every CORS response.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Request headers a mobile/web client may send.
pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub enabled: bool,
    pub origins: AllowedOrigins,
}

impl CorsPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            origins: AllowedOrigins::List(Vec::new()),
        }
    }

    pub fn new(enabled: bool, raw_origins: &str) -> Self {
        Self {
            enabled,
            origins: parse_origins(raw_origins),
        }
    }

    /// Whether `origin` should be reflected back to the client.
    pub fn allows(&self, origin: &str) -> bool {
        if !self.enabled {
            return false;
        }
        match &self.origins {
            AllowedOrigins::Any => !origin.is_empty(),
            AllowedOrigins::List(list) => list
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(origin.trim_end_matches('/'))),
        }
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(true, "")
    }
}

fn parse_origins(raw: &str) -> AllowedOrigins {
    if raw.trim() == "*" {
        return AllowedOrigins::Any;
    }

    let origins = raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect();

    AllowedOrigins::List(origins)
}
