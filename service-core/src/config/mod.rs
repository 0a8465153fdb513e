use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

/// Settings shared by every service: listener, debug mode and the HTTP
/// surface guards (allowed hosts, CORS origins, request timeout).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Request body cap in bytes. Unset means no cap.
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            debug: false,
            allowed_hosts: Vec::new(),
            cors_allowed_origins: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_environment(Environment::with_prefix("APP"))?;
        config.add_deployment_host(std::env::var("VERCEL_URL").ok().as_deref());
        Ok(config)
    }

    /// Outside debug mode, allow the platform-assigned deployment domain
    /// and its subdomains.
    pub fn add_deployment_host(&mut self, deployment_url: Option<&str>) {
        if self.debug {
            return;
        }
        let Some(host) = deployment_url.map(str::trim).filter(|h| !h.is_empty()) else {
            return;
        };
        let entry = format!(".{}", host.trim_start_matches('.'));
        if !self.allowed_hosts.contains(&entry) {
            self.allowed_hosts.push(entry);
        }
    }

    fn from_environment(environment: Environment) -> Result<Self, AppError> {
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                environment
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_hosts")
                    .with_list_parse_key("cors_allowed_origins"),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.allowed_hosts = clean_list(config.allowed_hosts);
        config.cors_allowed_origins = clean_list(config.cors_allowed_origins);
        Ok(config)
    }

    /// Default log filter for this configuration.
    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

// "APP__ALLOWED_HOSTS=" and "a, b," style values leave blanks behind.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Config {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_environment(Environment::with_prefix("APP").source(Some(source)))
            .expect("config should load")
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = load_with(&[]);
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert!(config.allowed_hosts.is_empty());
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.max_body_bytes, None);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn body_cap_is_read_from_environment() {
        let config = load_with(&[("APP__MAX_BODY_BYTES", "1048576")]);
        assert_eq!(config.max_body_bytes, Some(1_048_576));
    }

    #[test]
    fn deployment_host_is_added_outside_debug() {
        let mut config = load_with(&[("APP__ALLOWED_HOSTS", "api.example.com")]);
        config.add_deployment_host(Some("my-app.vercel.app"));
        config.add_deployment_host(Some("my-app.vercel.app"));
        assert_eq!(
            config.allowed_hosts,
            vec!["api.example.com", ".my-app.vercel.app"]
        );

        let mut debug = load_with(&[("APP__DEBUG", "true")]);
        debug.add_deployment_host(Some("my-app.vercel.app"));
        assert!(debug.allowed_hosts.is_empty());

        let mut unset = load_with(&[]);
        unset.add_deployment_host(Some("  "));
        assert!(unset.allowed_hosts.is_empty());
    }

    #[test]
    fn comma_separated_lists_are_split_and_cleaned() {
        let config = load_with(&[
            ("APP__ALLOWED_HOSTS", "example.com, .vercel.app,"),
            ("APP__CORS_ALLOWED_ORIGINS", "https://app.example.com"),
            ("APP__DEBUG", "true"),
            ("APP__PORT", "9000"),
        ]);
        assert_eq!(config.allowed_hosts, vec!["example.com", ".vercel.app"]);
        assert_eq!(config.cors_allowed_origins, vec!["https://app.example.com"]);
        assert!(config.debug);
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level(), "debug");
    }
}
