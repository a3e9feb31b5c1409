//! Ordered route registrations, immutable once the dispatcher is built.
//!
//! Registration order is part of the contract: resolution scans entries
//! in the order they were registered and the first `(pattern, method)`
//! that fully matches wins. Registering the same pair twice leaves the
//! second entry unreachable.

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::http::Method;

use super::dispatcher::{Handler, Intercept};
use super::pattern::{PatternError, RoutePattern};

pub struct Route {
    pub pattern: RoutePattern,
    pub method: Method,
    pub handler: Arc<dyn Handler>,
    /// Run in order before the handler; the first to stop the flow wins.
    pub intercepts: Vec<Arc<dyn Intercept>>,
}

pub struct RouteTable {
    namespace: String,
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.trim_matches('/').to_string(),
            routes: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn register(
        &mut self,
        pattern: &str,
        method: Method,
        handler: impl Handler,
        intercepts: Vec<Arc<dyn Intercept>>,
    ) -> Result<(), PatternError> {
        let pattern = RoutePattern::parse(pattern)?;
        tracing::debug!(route = %pattern, method = %method, "route registered");
        self.routes.push(Route {
            pattern,
            method,
            handler: Arc::new(handler),
            intercepts,
        });
        Ok(())
    }

    /// Trim separators, then drop the namespace prefix when present.
    pub fn normalize(&self, path: &str) -> String {
        let trimmed = path.trim_matches('/');
        if self.namespace.is_empty() {
            return trimmed.to_string();
        }
        match trimmed.strip_prefix(self.namespace.as_str()) {
            Some("") => String::new(),
            Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
            _ => trimmed.to_string(),
        }
    }

    /// First registered route whose pattern and method both match.
    pub fn resolve(
        &self,
        path: &str,
        method: &Method,
    ) -> Option<(&Route, BTreeMap<String, String>)> {
        let path = self.normalize(path);
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| r.pattern.matches(&path).map(|params| (r, params)))
    }
}
