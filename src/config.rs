// src/config.rs
//
// Runtime configuration, resolved from the environment with defaults.

use std::path::PathBuf;

use crate::db::get_default_database_path;
use crate::domain::{SpaceCredentials, DEFAULT_DOMAIN_HOST};
use crate::error::AppResult;

/// Two days.
pub const DEFAULT_EXPIRATION_WINDOW_SECS: i64 = 172_800;

const ENV_SPACE_ID: &str = "EDITORIAL_SPACE_ID";
const ENV_DELIVERY_TOKEN: &str = "EDITORIAL_DELIVERY_TOKEN";
const ENV_PREVIEW_TOKEN: &str = "EDITORIAL_PREVIEW_TOKEN";
const ENV_DOMAIN_HOST: &str = "EDITORIAL_DOMAIN_HOST";
const ENV_EXPIRATION_SECS: &str = "EDITORIAL_SESSION_EXPIRATION_SECS";
const ENV_DATABASE_PATH: &str = "EDITORIAL_DATABASE_PATH";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Persisted selections older than this are discarded on startup
    pub expiration_window_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_window_secs: DEFAULT_EXPIRATION_WINDOW_SECS,
        }
    }
}

impl SessionConfig {
    pub fn expiration_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expiration_window_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session: SessionConfig,
    /// Credentials used when no unexpired session credentials exist
    pub default_credentials: SpaceCredentials,
    /// Overrides the per-user data directory location
    pub database_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            default_credentials: SpaceCredentials::new("", "", ""),
            database_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Missing or unparsable values
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let expiration_window_secs = match lookup(ENV_EXPIRATION_SECS) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs >= 0 => secs,
                _ => {
                    log::warn!(
                        "ignoring invalid {}='{}', using {}",
                        ENV_EXPIRATION_SECS,
                        raw,
                        defaults.session.expiration_window_secs
                    );
                    defaults.session.expiration_window_secs
                }
            },
            None => defaults.session.expiration_window_secs,
        };

        let default_credentials = SpaceCredentials::new(
            lookup(ENV_SPACE_ID).unwrap_or_default(),
            lookup(ENV_DELIVERY_TOKEN).unwrap_or_default(),
            lookup(ENV_PREVIEW_TOKEN).unwrap_or_default(),
        )
        .with_domain_host(
            lookup(ENV_DOMAIN_HOST).unwrap_or_else(|| DEFAULT_DOMAIN_HOST.to_string()),
        );

        Self {
            session: SessionConfig {
                expiration_window_secs,
            },
            default_credentials,
            database_path: lookup(ENV_DATABASE_PATH).map(PathBuf::from),
        }
    }

    pub fn resolve_database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => get_default_database_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.session.expiration_window_secs, 172_800);
        assert_eq!(config.default_credentials.domain_host, DEFAULT_DOMAIN_HOST);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_reads_all_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("EDITORIAL_SPACE_ID", "space"),
            ("EDITORIAL_DELIVERY_TOKEN", "cda"),
            ("EDITORIAL_PREVIEW_TOKEN", "cpa"),
            ("EDITORIAL_DOMAIN_HOST", "eu.example.com"),
            ("EDITORIAL_SESSION_EXPIRATION_SECS", "60"),
            ("EDITORIAL_DATABASE_PATH", "/tmp/session.db"),
        ]));

        assert_eq!(config.default_credentials, SpaceCredentials::new("space", "cda", "cpa"));
        assert_eq!(config.default_credentials.domain_host, "eu.example.com");
        assert_eq!(config.session.expiration_window(), chrono::Duration::seconds(60));
        assert_eq!(
            config.resolve_database_path().unwrap(),
            PathBuf::from("/tmp/session.db")
        );
    }

    #[test]
    fn test_invalid_expiration_falls_back() {
        for raw in ["soon", "-5", ""] {
            let config =
                AppConfig::from_lookup(lookup_from(&[("EDITORIAL_SESSION_EXPIRATION_SECS", raw)]));
            assert_eq!(config.session.expiration_window_secs, DEFAULT_EXPIRATION_WINDOW_SECS);
        }
    }
}
