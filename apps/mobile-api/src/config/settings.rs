//! Process configuration read from environment variables.
//!
//! Environment variables must be set by the runtime environment
//! (container env files, systemd units, or a sourced `.env` locally).
//! Every value has a default except the signing secret, which the
//! secret store can generate, and the pinned webhook root, without
//! which the webhook endpoint answers with a configuration error.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::cors::CorsPolicy;
use crate::error::AppError;

pub const DEFAULT_NAMESPACE: &str = "api/v1";

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Namespace prefix stripped from every dispatched path, e.g. `api/v1`.
    pub namespace: String,
    pub jwt_secret: Option<Vec<u8>>,
    pub jwt_secret_file: Option<PathBuf>,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Blacklist the presented refresh token when a new pair is issued.
    pub rotation_revokes: bool,
    /// Requests per principal per minute; 0 disables limiting.
    pub rate_limit_per_minute: u32,
    pub cors: CorsPolicy,
    /// Surface raw fault messages in 500 responses.
    pub debug: bool,
    pub webhook_root_cert_path: Option<PathBuf>,
    pub webhook_strict_chain: bool,
    /// Store product id -> internal plan id.
    pub product_plans: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            namespace: DEFAULT_NAMESPACE.to_string(),
            jwt_secret: None,
            jwt_secret_file: None,
            issuer: "mobile-api".to_string(),
            audience: "mobile-app".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            rotation_revokes: true,
            rate_limit_per_minute: 60,
            cors: CorsPolicy::default(),
            debug: false,
            webhook_root_cert_path: None,
            webhook_strict_chain: false,
            product_plans: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("API_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| {
                    AppError::config(format!("API_PORT must be a valid port number, got {raw:?}"))
                })?,
            None => defaults.port,
        };

        let cors = CorsPolicy::new(
            parse_bool(&get, "CORS_ENABLED", true)?,
            &get("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
        );

        let access_ttl = parse_secs(&get, "ACCESS_TOKEN_TTL_SECS", defaults.access_ttl)?;
        let refresh_ttl = parse_secs(&get, "REFRESH_TOKEN_TTL_SECS", defaults.refresh_ttl)?;
        if access_ttl.is_zero() || refresh_ttl.is_zero() {
            return Err(AppError::config("token lifetimes must be positive"));
        }
        if access_ttl > MAX_TOKEN_TTL || refresh_ttl > MAX_TOKEN_TTL {
            return Err(AppError::config(format!(
                "token lifetimes must not exceed {} seconds",
                MAX_TOKEN_TTL.as_secs()
            )));
        }

        let rate_limit_per_minute = match get("RATE_LIMIT_PER_MINUTE") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                AppError::config(format!(
                    "RATE_LIMIT_PER_MINUTE must be a non-negative integer, got {raw:?}"
                ))
            })?,
            None => defaults.rate_limit_per_minute,
        };

        Ok(Self {
            host: get("API_HOST").unwrap_or(defaults.host),
            port,
            namespace: get("API_NAMESPACE")
                .map(|ns| ns.trim_matches('/').to_string())
                .unwrap_or(defaults.namespace),
            jwt_secret: get("JWT_SECRET").map(String::into_bytes),
            jwt_secret_file: get("JWT_SECRET_FILE").map(PathBuf::from),
            issuer: get("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: get("JWT_AUDIENCE").unwrap_or(defaults.audience),
            access_ttl,
            refresh_ttl,
            rotation_revokes: parse_bool(
                &get,
                "REFRESH_ROTATION_REVOKES",
                defaults.rotation_revokes,
            )?,
            rate_limit_per_minute,
            cors,
            debug: parse_bool(&get, "DEBUG_MODE", false)?,
            webhook_root_cert_path: get("WEBHOOK_ROOT_CERT_PATH").map(PathBuf::from),
            webhook_strict_chain: parse_bool(&get, "WEBHOOK_STRICT_CHAIN", false)?,
            product_plans: parse_product_plans(&get("PRODUCT_PLAN_MAP").unwrap_or_default())?,
        })
    }
}

/// Upper bound for either token lifetime: one year.
const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool, AppError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!("{key} must be a boolean, got {raw:?}"))),
        },
    }
}

fn parse_secs<G>(get: &G, key: &str, default: Duration) -> Result<Duration, AppError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| {
                AppError::config(format!("{key} must be a number of seconds, got {raw:?}"))
            }),
    }
}

/// `com.example.monthly=plan_monthly,com.example.yearly=plan_yearly`
fn parse_product_plans(raw: &str) -> Result<BTreeMap<String, String>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (product, plan) = pair
                .split_once('=')
                .ok_or_else(|| {
                    AppError::config(format!("PRODUCT_PLAN_MAP entry {pair:?} is not product=plan"))
                })?;
            let (product, plan) = (product.trim(), plan.trim());
            if product.is_empty() || plan.is_empty() {
                return Err(AppError::config(format!(
                    "PRODUCT_PLAN_MAP entry {pair:?} is incomplete"
                )));
            }
            Ok((product.to_string(), plan.to_string()))
        })
        .collect()
}
