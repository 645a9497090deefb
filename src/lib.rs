// src/lib.rs
// Editorial State - freshness labels for draft-capable content
//
// Architecture:
// - Domain-centric: resources, editorial states and client axes live in domain
// - Observable: client state changes fan out through ObservableState cells
// - Pure resolution: StateResolver diffs latest against published snapshots
// - Session-backed: user selections persist with an expiration window
// - Application Layer: ApplicationServices is the single writer of client state

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod observable;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    truncate_to_second,
    validate_credentials,
    validate_published_snapshot,
    validate_snapshot_pair,
    // Client axes
    ApiMode,
    // Rendering
    Badge,
    ContentNode,
    DomainError,
    // Editorial state
    EditorialState,
    LinkedResource,
    Locale,
    // Resources
    ResolvableResource,
    SpaceCredentials,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{AppConfig, SessionConfig};

// ============================================================================
// PUBLIC API - Observable State
// ============================================================================

pub use observable::{ObservableState, ObserverToken, Transition};

// ============================================================================
// PUBLIC API - Database & Repositories
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

pub use repositories::{InMemorySessionStore, SessionStore, SqliteSessionStore};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{EditorialStateService, ResolvedSnapshot, Session, StateResolver};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::ApplicationServices;

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{ContentSource, SnapshotContentSource};
