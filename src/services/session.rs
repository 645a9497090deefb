// src/services/session.rs
//
// Session
//
// Persists the user's client selections (credentials, locale, API mode,
// editorial toggle) and restores them on startup.
//
// CRITICAL RULES:
// - Every value carries the time it was persisted
// - Values older than the expiration window are discarded on open
// - Expired selections are reset to defaults AND re-persisted
// - Expired credentials fall back to the configured defaults

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::SessionConfig;
use crate::domain::{ApiMode, Locale, SpaceCredentials};
use crate::error::AppResult;
use crate::repositories::{SessionStore, StoredValue};

const CREDENTIALS_KEY: &str = "credentials";
const EDITORIAL_FEATURES_KEY: &str = "editorial_features_enabled";
const LOCALE_KEY: &str = "locale";
const API_KEY: &str = "api";

pub struct Session {
    store: Arc<dyn SessionStore>,
    credentials: Mutex<SpaceCredentials>,
}

impl Session {
    pub fn open(
        store: Arc<dyn SessionStore>,
        config: &SessionConfig,
        default_credentials: SpaceCredentials,
    ) -> AppResult<Self> {
        Self::open_at(store, config, default_credentials, Utc::now())
    }

    /// Opens the session as if the current time were `now`.
    pub fn open_at(
        store: Arc<dyn SessionStore>,
        config: &SessionConfig,
        default_credentials: SpaceCredentials,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let window = config.expiration_window();
        let is_fresh = |stored: &StoredValue| now - stored.persisted_at <= window;

        let credentials = match store.get(CREDENTIALS_KEY)? {
            Some(stored) if is_fresh(&stored) => {
                match serde_json::from_str::<SpaceCredentials>(&stored.value) {
                    Ok(credentials) => credentials,
                    Err(e) => {
                        log::warn!("discarding unreadable session credentials: {}", e);
                        default_credentials
                    }
                }
            }
            Some(_) => {
                log::info!("session credentials expired, using defaults");
                default_credentials
            }
            None => default_credentials,
        };

        let defaults = [
            (EDITORIAL_FEATURES_KEY, serde_json::to_string(&false)?),
            (LOCALE_KEY, Locale::american_english().code),
            (API_KEY, ApiMode::Delivery.as_str().to_string()),
        ];
        for (key, default_value) in defaults {
            if let Some(stored) = store.get(key)? {
                if !is_fresh(&stored) {
                    log::info!("session value '{}' expired, resetting to '{}'", key, default_value);
                    store.put(key, &default_value, now)?;
                }
            }
        }

        Ok(Self {
            store,
            credentials: Mutex::new(credentials),
        })
    }

    // ========================================================================
    // CREDENTIALS
    // ========================================================================

    pub fn credentials(&self) -> SpaceCredentials {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the in-memory credentials. Call `persist_credentials` to
    /// write them through.
    pub fn set_credentials(&self, credentials: SpaceCredentials) {
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    pub fn persist_credentials(&self) -> AppResult<()> {
        let json = serde_json::to_string(&self.credentials())?;
        self.store.put(CREDENTIALS_KEY, &json, Utc::now())
    }

    // ========================================================================
    // SELECTIONS
    // ========================================================================

    pub fn persist_locale(&self, locale: &Locale) -> AppResult<()> {
        self.store.put(LOCALE_KEY, &locale.code, Utc::now())
    }

    pub fn persisted_locale_code(&self) -> AppResult<Option<String>> {
        Ok(self.store.get(LOCALE_KEY)?.map(|stored| stored.value))
    }

    pub fn persist_api(&self, api: ApiMode) -> AppResult<()> {
        self.store.put(API_KEY, api.as_str(), Utc::now())
    }

    /// The persisted API mode, if any. Unknown raw values read as absent.
    pub fn persisted_api(&self) -> AppResult<Option<ApiMode>> {
        Ok(self
            .store
            .get(API_KEY)?
            .and_then(|stored| stored.value.parse::<ApiMode>().ok()))
    }

    pub fn persist_editorial_features(&self, enabled: bool) -> AppResult<()> {
        let json = serde_json::to_string(&enabled)?;
        self.store.put(EDITORIAL_FEATURES_KEY, &json, Utc::now())
    }

    pub fn editorial_features_enabled(&self) -> AppResult<bool> {
        Ok(match self.store.get(EDITORIAL_FEATURES_KEY)? {
            Some(stored) => serde_json::from_str(&stored.value).unwrap_or(false),
            None => false,
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("space_id", &self.credentials().space_id)
            .finish_non_exhaustive()
    }
}
