use anyhow::{Context, Result, anyhow};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub upstream_api_url: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_logout_per_min: u32,

    // Per-session board cache
    pub board_cache_ttl: Duration,
    pub board_cache_capacity: u64,

    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            upstream_api_url: or_default("UPSTREAM_API_URL", "http://localhost:3001/api"),
            api_prefix: or_default("API_PREFIX", "/api"),

            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            rate_logout_per_min: parse_or(&lookup, "RATE_LOGOUT_PER_MIN", 60)?,

            board_cache_ttl: Duration::from_secs(parse_or(&lookup, "BOARD_CACHE_TTL_SECS", 1800)?),
            board_cache_capacity: parse_or(&lookup, "BOARD_CACHE_CAPACITY", 10_000)?,

            log_dir: or_default("LOG_DIR", "logs"),
            log_level: or_default("LOG_LEVEL", "debug"),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_settings() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "shared"),
        ]))
        .expect("config loads");

        assert_eq!(config.upstream_api_url, "http://localhost:3001/api");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.rate_logout_per_min, 60);
        assert_eq!(config.board_cache_ttl, Duration::from_secs(1800));
        assert_eq!(config.board_cache_capacity, 10_000);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_required_and_malformed_values_are_errors() {
        let missing = Config::from_lookup(lookup(&[("SERVER_ADDR", "127.0.0.1:8080")]));
        assert!(missing.unwrap_err().to_string().contains("JWT_SECRET"));

        let malformed = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "shared"),
            ("RATE_PROTECTED_PER_MIN", "lots"),
        ]));
        assert!(
            malformed
                .unwrap_err()
                .to_string()
                .contains("RATE_PROTECTED_PER_MIN")
        );
    }
}
