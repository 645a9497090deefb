// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod editorial_state_service;
pub mod session;
pub mod state_resolver;


pub use editorial_state_service::{EditorialStateService, ResolvedSnapshot};
pub use session::Session;
pub use state_resolver::StateResolver;
