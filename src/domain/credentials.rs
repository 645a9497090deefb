use serde::{Deserialize, Serialize};

/// Host used when a space does not specify one.
pub const DEFAULT_DOMAIN_HOST: &str = "contentful.com";

/// Access credentials for a content space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceCredentials {
    pub space_id: String,
    pub delivery_access_token: String,
    pub preview_access_token: String,
    #[serde(default = "default_domain_host")]
    pub domain_host: String,
}

fn default_domain_host() -> String {
    DEFAULT_DOMAIN_HOST.to_string()
}

impl SpaceCredentials {
    pub fn new(
        space_id: impl Into<String>,
        delivery_access_token: impl Into<String>,
        preview_access_token: impl Into<String>,
    ) -> Self {
        Self {
            space_id: space_id.into(),
            delivery_access_token: delivery_access_token.into(),
            preview_access_token: preview_access_token.into(),
            domain_host: default_domain_host(),
        }
    }

    pub fn with_domain_host(mut self, domain_host: impl Into<String>) -> Self {
        self.domain_host = domain_host.into();
        self
    }
}

// The domain host is deliberately left out of identity.
impl PartialEq for SpaceCredentials {
    fn eq(&self, other: &Self) -> bool {
        self.space_id == other.space_id
            && self.delivery_access_token == other.delivery_access_token
            && self.preview_access_token == other.preview_access_token
    }
}

impl Eq for SpaceCredentials {}

/// Validates that no credential field is blank.
pub fn validate_credentials(credentials: &SpaceCredentials) -> crate::domain::DomainResult<()> {
    let fields = [
        ("space_id", &credentials.space_id),
        ("delivery_access_token", &credentials.delivery_access_token),
        ("preview_access_token", &credentials.preview_access_token),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(crate::domain::DomainError::InvariantViolation(format!(
                "credential field '{}' is empty",
                name
            )));
        }
    }
    Ok(())
}
