// src/integrations/mod.rs
//
// External Integrations Module

pub mod content_source;

#[cfg(test)]
pub use content_source::MockContentSource;
pub use content_source::{ContentSource, SnapshotContentSource};
