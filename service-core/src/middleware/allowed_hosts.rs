//! Host header validation.
//!
//! Rejects requests addressed to a host the service is not configured to
//! serve. Patterns are exact host names, `.domain` for a domain and all of
//! its subdomains, or `*` for anything.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Paths reachable regardless of the host header (orchestrator probes).
const EXEMPT_PATHS: &[&str] = &["/health", "/ready"];

#[derive(Debug, Clone, Default)]
pub struct AllowedHosts {
    patterns: Arc<Vec<String>>,
}

impl AllowedHosts {
    /// An empty pattern list disables the check.
    pub fn new(patterns: Vec<String>) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            patterns: Arc::new(patterns),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.patterns.is_empty()
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let host = strip_port(host).to_ascii_lowercase();
        let host = host.trim_end_matches('.');
        self.patterns.iter().any(|pattern| matches(pattern, host))
    }
}

fn matches(pattern: &str, host: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(domain) = pattern.strip_prefix('.') {
        return host == domain || host.ends_with(pattern);
    }
    pattern == host
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, optionally followed by a port.
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

pub async fn allowed_hosts_middleware(
    State(allowed): State<AllowedHosts>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !allowed.is_enabled() || EXEMPT_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string())
        .or_else(|| request.uri().host().map(|h| h.to_string()))
        .unwrap_or_default();

    if !allowed.is_allowed(&host) {
        return Err(AppError::DisallowedHost(host));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(patterns: &[&str]) -> AllowedHosts {
        AllowedHosts::new(patterns.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn empty_list_allows_everything() {
        assert!(hosts(&[]).is_allowed("anything.example"));
        assert!(hosts(&["", " "]).is_allowed("anything.example"));
    }

    #[test]
    fn exact_match_ignores_port_and_case() {
        let allowed = hosts(&["api.example.com"]);
        assert!(allowed.is_allowed("API.example.com:8443"));
        assert!(!allowed.is_allowed("evil.example.com"));
    }

    #[test]
    fn leading_dot_matches_domain_and_subdomains() {
        let allowed = hosts(&[".vercel.app"]);
        assert!(allowed.is_allowed("vercel.app"));
        assert!(allowed.is_allowed("my-project.vercel.app"));
        assert!(!allowed.is_allowed("notvercel.app"));
    }

    #[test]
    fn wildcard_matches_all() {
        assert!(hosts(&["*"]).is_allowed("whatever:1234"));
    }

    #[test]
    fn ipv6_hosts_keep_their_brackets() {
        let allowed = hosts(&["[::1]"]);
        assert!(allowed.is_allowed("[::1]:8080"));
    }
}
