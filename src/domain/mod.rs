// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod client_state;
pub mod credentials;
pub mod editorial_state;
pub mod resource;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Editorial state
pub use editorial_state::{Badge, EditorialState};

// Resources
pub use resource::{
    truncate_to_second, validate_published_snapshot, validate_snapshot_pair, ContentNode,
    LinkedResource, ResolvableResource,
};

// Client configuration axes
pub use client_state::{ApiMode, Locale};
pub use credentials::{validate_credentials, SpaceCredentials, DEFAULT_DOMAIN_HOST};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Snapshot identity mismatch: latest '{latest}' vs published '{published}'")]
    IdentityMismatch { latest: String, published: String },
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
