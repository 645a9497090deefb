use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::DomainError;

/// Which content API the client pulls data from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiMode {
    /// Published content only
    #[default]
    Delivery,

    /// Latest drafts; the only mode in which editorial states are resolved
    Preview,
}

impl ApiMode {
    pub fn title(&self) -> &'static str {
        match self {
            ApiMode::Delivery => "API: Delivery",
            ApiMode::Preview => "API: Preview",
        }
    }

    /// Raw value used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Delivery => "delivery",
            ApiMode::Preview => "preview",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ApiMode::Delivery => ApiMode::Preview,
            ApiMode::Preview => ApiMode::Delivery,
        }
    }

    pub fn is_draft_capable(&self) -> bool {
        matches!(self, ApiMode::Preview)
    }
}

impl FromStr for ApiMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(ApiMode::Delivery),
            "preview" => Ok(ApiMode::Preview),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown API mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A content locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// BCP 47 code, e.g. "en-US"
    pub code: String,

    /// Human readable name
    pub name: String,
}

impl Locale {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn american_english() -> Self {
        Self::new("en-US", "English (United States)")
    }

    pub fn german() -> Self {
        Self::new("de-DE", "German (Germany)")
    }

    /// Locales available in the default space.
    pub fn defaults() -> Vec<Locale> {
        vec![Self::american_english(), Self::german()]
    }

    /// Looks up `code` among `available`.
    pub fn find(available: &[Locale], code: &str) -> Option<Locale> {
        available.iter().find(|locale| locale.code == code).cloned()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::american_english()
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_mode_raw_values_round_trip() {
        for mode in [ApiMode::Delivery, ApiMode::Preview] {
            assert_eq!(mode.as_str().parse::<ApiMode>().unwrap(), mode);
        }
        assert!("cma".parse::<ApiMode>().is_err());
    }

    #[test]
    fn test_api_mode_toggle_and_title() {
        assert_eq!(ApiMode::Delivery.toggled(), ApiMode::Preview);
        assert_eq!(ApiMode::Preview.toggled(), ApiMode::Delivery);
        assert_eq!(ApiMode::Preview.title(), "API: Preview");
        assert!(ApiMode::Preview.is_draft_capable());
        assert!(!ApiMode::Delivery.is_draft_capable());
    }

    #[test]
    fn test_default_locales() {
        let codes: Vec<String> = Locale::defaults().into_iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["en-US", "de-DE"]);
        let defaults = Locale::defaults();
        assert_eq!(Locale::find(&defaults, "de-DE"), Some(Locale::german()));
        assert_eq!(Locale::find(&defaults, "fr-FR"), None);
    }
}
