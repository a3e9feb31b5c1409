//! `{name}` path patterns compiled to anchored regexes.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unbalanced brace in pattern '{0}'")]
    UnbalancedBrace(String),
    #[error("invalid placeholder name '{name}' in pattern '{pattern}'")]
    InvalidName { pattern: String, name: String },
    #[error("placeholder '{name}' repeated in pattern '{pattern}'")]
    DuplicateName { pattern: String, name: String },
    #[error("pattern '{pattern}' failed to compile: {detail}")]
    Compile { pattern: String, detail: String },
}

/// Per-parameter constraint checked after the structural match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValidator {
    Any,
    Numeric,
}

impl ParamValidator {
    /// `id` and `*_id` placeholders only bind digit strings.
    fn for_name(name: &str) -> Self {
        if name == "id" || name.ends_with("_id") {
            ParamValidator::Numeric
        } else {
            ParamValidator::Any
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            ParamValidator::Any => true,
            ParamValidator::Numeric => value.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    matcher: Regex,
    params: Vec<(String, ParamValidator)>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let source = pattern.trim_matches('/').to_string();
        let mut expr = String::from("^");
        let mut params: Vec<(String, ParamValidator)> = Vec::new();
        let mut rest = source.as_str();

        while let Some(open) = rest.find(['{', '}']) {
            if rest.as_bytes()[open] == b'}' {
                return Err(PatternError::UnbalancedBrace(source.clone()));
            }
            expr.push_str(&regex::escape(&rest[..open]));
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| PatternError::UnbalancedBrace(source.clone()))?;
            let name = &after[..close];
            if !is_identifier(name) {
                return Err(PatternError::InvalidName {
                    pattern: source.clone(),
                    name: name.to_string(),
                });
            }
            if params.iter().any(|(existing, _)| existing == name) {
                return Err(PatternError::DuplicateName {
                    pattern: source.clone(),
                    name: name.to_string(),
                });
            }
            expr.push_str(&format!("(?P<{name}>[^/]+)"));
            params.push((name.to_string(), ParamValidator::for_name(name)));
            rest = &after[close + 1..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push('$');

        let matcher = Regex::new(&expr).map_err(|e| PatternError::Compile {
            pattern: source.clone(),
            detail: e.to_string(),
        })?;

        Ok(Self {
            source,
            matcher,
            params,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn validator(&self, name: &str) -> Option<ParamValidator> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Full-match a normalized path, returning bound parameters.
    ///
    /// A failed validator is treated as no match.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.matcher.captures(path)?;
        let mut bound = BTreeMap::new();
        for (name, validator) in &self.params {
            let value = caps.name(name)?.as_str();
            if !validator.accepts(value) {
                return None;
            }
            bound.insert(name.clone(), value.to_string());
        }
        Some(bound)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
