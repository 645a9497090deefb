// src/integrations/content_source.rs
//
// Content Source
//
// ARCHITECTURE:
// - Abstracts the two content APIs (latest/preview and published/delivery)
// - Returns plain `ContentNode` trees, state fields left at their defaults
// - Used by EditorialStateService
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Never resolves editorial state itself
// - `Ok(None)` means "no such resource", errors mean the fetch failed

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::{ContentNode, Locale};
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Latest revision of a resource, drafts included.
    async fn fetch_latest(&self, id: &str, locale: &Locale) -> AppResult<Option<ContentNode>>;

    /// Published revision of a resource.
    async fn fetch_published(&self, id: &str, locale: &Locale) -> AppResult<Option<ContentNode>>;
}

/// Content source backed by snapshots held in memory.
///
/// Snapshots are keyed by locale code and id, so the same resource can be
/// registered once per locale.
#[derive(Debug, Default)]
pub struct SnapshotContentSource {
    latest: RwLock<HashMap<(String, String), ContentNode>>,
    published: RwLock<HashMap<(String, String), ContentNode>>,
}

impl SnapshotContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_latest(&self, locale: &Locale, node: ContentNode) {
        self.latest
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((locale.code.clone(), node.id.clone()), node);
    }

    pub fn insert_published(&self, locale: &Locale, node: ContentNode) {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((locale.code.clone(), node.id.clone()), node);
    }

    fn lookup(
        snapshots: &RwLock<HashMap<(String, String), ContentNode>>,
        id: &str,
        locale: &Locale,
    ) -> Option<ContentNode> {
        snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(locale.code.clone(), id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ContentSource for SnapshotContentSource {
    async fn fetch_latest(&self, id: &str, locale: &Locale) -> AppResult<Option<ContentNode>> {
        Ok(Self::lookup(&self.latest, id, locale))
    }

    async fn fetch_published(&self, id: &str, locale: &Locale) -> AppResult<Option<ContentNode>> {
        Ok(Self::lookup(&self.published, id, locale))
    }
}
