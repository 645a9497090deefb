// src/application/state.rs
//
// Application services: the shared client state every screen observes.
//
// CRITICAL RULES:
// - ApplicationServices is the only writer of its observable cells
// - Setters persist through the Session first, then publish
// - Observers subscribe through the accessors; they never call `set`

use std::sync::Arc;

use crate::domain::{validate_credentials, ApiMode, Locale, SpaceCredentials};
use crate::error::AppResult;
use crate::observable::ObservableState;
use crate::services::Session;

pub struct ApplicationServices {
    session: Arc<Session>,
    default_credentials: SpaceCredentials,
    available_locales: Vec<Locale>,
    api: ObservableState<ApiMode>,
    locale: ObservableState<Locale>,
    credentials: ObservableState<SpaceCredentials>,
    editorial_features: ObservableState<bool>,
}

impl ApplicationServices {
    /// Builds the services from whatever the session restored.
    ///
    /// `default_credentials` are what `reset_credentials_and_locale_if_necessary`
    /// falls back to.
    pub fn new(session: Arc<Session>, default_credentials: SpaceCredentials) -> AppResult<Self> {
        Self::with_available_locales(session, default_credentials, Locale::defaults())
    }

    pub fn with_available_locales(
        session: Arc<Session>,
        default_credentials: SpaceCredentials,
        available_locales: Vec<Locale>,
    ) -> AppResult<Self> {
        let api = session.persisted_api()?.unwrap_or_default();
        let editorial = session.editorial_features_enabled()?;
        let locale = session
            .persisted_locale_code()?
            .and_then(|code| Locale::find(&available_locales, &code))
            .unwrap_or_else(Locale::american_english);
        let credentials = session.credentials();

        log::info!(
            "application services ready: space='{}' api={} locale={} editorial={}",
            credentials.space_id,
            api,
            locale,
            editorial
        );

        Ok(Self {
            session,
            default_credentials,
            available_locales,
            api: ObservableState::new(api),
            locale: ObservableState::new(locale),
            credentials: ObservableState::new(credentials),
            editorial_features: ObservableState::new(editorial),
        })
    }

    // ========================================================================
    // OBSERVABLE CELLS
    // ========================================================================

    pub fn api(&self) -> &ObservableState<ApiMode> {
        &self.api
    }

    pub fn locale(&self) -> &ObservableState<Locale> {
        &self.locale
    }

    pub fn credentials(&self) -> &ObservableState<SpaceCredentials> {
        &self.credentials
    }

    pub fn editorial_features(&self) -> &ObservableState<bool> {
        &self.editorial_features
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn available_locales(&self) -> &[Locale] {
        &self.available_locales
    }

    // ========================================================================
    // WRITERS
    // ========================================================================

    pub fn set_api(&self, api: ApiMode) -> AppResult<()> {
        self.session.persist_api(api)?;
        self.api.set(api);
        Ok(())
    }

    pub fn toggle_api(&self) -> AppResult<ApiMode> {
        let next = self.api.get().toggled();
        self.set_api(next)?;
        Ok(next)
    }

    pub fn set_locale(&self, locale: Locale) -> AppResult<()> {
        self.session.persist_locale(&locale)?;
        self.locale.set(locale);
        Ok(())
    }

    /// Moves to the next available locale, wrapping around.
    pub fn toggle_locale(&self) -> AppResult<Locale> {
        let current = self.locale.get();
        let next = match self.available_locales.iter().position(|l| *l == current) {
            Some(index) => self.available_locales[(index + 1) % self.available_locales.len()].clone(),
            None => self
                .available_locales
                .first()
                .cloned()
                .unwrap_or_else(Locale::american_english),
        };
        self.set_locale(next.clone())?;
        Ok(next)
    }

    pub fn enable_editorial_features(&self, enabled: bool) -> AppResult<()> {
        self.session.persist_editorial_features(enabled)?;
        self.editorial_features.set(enabled);
        Ok(())
    }

    pub fn set_credentials(&self, credentials: SpaceCredentials) -> AppResult<()> {
        validate_credentials(&credentials)?;
        self.session.set_credentials(credentials.clone());
        self.session.persist_credentials()?;
        self.credentials.set(credentials);
        Ok(())
    }

    /// Restores the default credentials. The current locale is kept only when
    /// the default space offers it.
    pub fn reset_credentials_and_locale_if_necessary(&self) -> AppResult<()> {
        let current = self.locale.get();
        let locale = if Locale::defaults().contains(&current) {
            current
        } else {
            Locale::american_english()
        };

        self.session.set_credentials(self.default_credentials.clone());
        self.session.persist_credentials()?;
        self.session.persist_locale(&locale)?;

        log::info!(
            "credentials reset to default space '{}', locale {}",
            self.default_credentials.space_id,
            locale
        );

        self.credentials.set(self.default_credentials.clone());
        self.locale.set(locale);
        Ok(())
    }

    /// Editorial labels are shown only for draft-capable content with the
    /// feature switched on.
    pub fn should_show_state_labels(&self) -> bool {
        self.editorial_features.get() && self.api.get().is_draft_capable()
    }
}

impl std::fmt::Debug for ApplicationServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationServices")
            .field("api", &self.api.get())
            .field("locale", &self.locale.get())
            .field("editorial_features", &self.editorial_features.get())
            .finish_non_exhaustive()
    }
}
