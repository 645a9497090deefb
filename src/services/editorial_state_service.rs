// src/services/editorial_state_service.rs
//
// Editorial State Service
//
// ARCHITECTURE:
// - Gates resolution on the current client state (preview + editorial toggle)
// - Fetches both revisions of a resource from the ContentSource
// - Delegates all state inference to StateResolver
//
// CRITICAL RULES:
// - Nothing is fetched when labels are not shown
// - Snapshots are validated before they are resolved
// - A missing latest revision is NotFound; a missing published one is a draft

use std::sync::Arc;

use serde::Serialize;

use crate::application::ApplicationServices;
use crate::domain::{validate_snapshot_pair, ContentNode, EditorialState};
use crate::error::{AppError, AppResult};
use crate::integrations::ContentSource;
use crate::services::StateResolver;

/// A resolved latest tree alongside the published snapshot it was diffed against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSnapshot {
    pub latest: ContentNode,
    pub published: Option<ContentNode>,
    pub state: EditorialState,
}

pub struct EditorialStateService {
    services: Arc<ApplicationServices>,
    source: Arc<dyn ContentSource>,
    resolver: StateResolver,
}

impl EditorialStateService {
    pub fn new(services: Arc<ApplicationServices>, source: Arc<dyn ContentSource>) -> Self {
        Self {
            services,
            source,
            resolver: StateResolver::new(),
        }
    }

    /// Resolves `id` when editorial labels are currently shown, otherwise
    /// returns `Ok(None)` without touching the content source.
    pub async fn resolve_if_necessary(&self, id: &str) -> AppResult<Option<ResolvedSnapshot>> {
        if !self.services.should_show_state_labels() {
            log::debug!("state labels hidden, skipping resolution of '{}'", id);
            return Ok(None);
        }
        self.resolve(id).await.map(Some)
    }

    /// Fetches both revisions of `id` concurrently and resolves them.
    pub async fn resolve(&self, id: &str) -> AppResult<ResolvedSnapshot> {
        let locale = self.services.locale().get();

        let (latest, published) = tokio::join!(
            self.source.fetch_latest(id, &locale),
            self.source.fetch_published(id, &locale),
        );

        let latest = latest?.ok_or(AppError::NotFound)?;
        let published = published?;

        self.resolve_snapshots(latest, published)
    }

    /// Runs one resolution pass over already fetched snapshots.
    pub fn resolve_snapshots(
        &self,
        mut latest: ContentNode,
        published: Option<ContentNode>,
    ) -> AppResult<ResolvedSnapshot> {
        validate_snapshot_pair(&latest, published.as_ref())?;

        let state = self.resolver.resolve_pass(&mut latest, published.as_ref());
        log::info!("'{}' resolved as {}", latest.id, state);

        Ok(ResolvedSnapshot {
            latest,
            published,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::domain::{ApiMode, DomainError, Locale, SpaceCredentials};
    use crate::integrations::MockContentSource;
    use crate::repositories::{InMemorySessionStore, SessionStore};
    use crate::services::Session;
    use chrono::{DateTime, Utc};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn application(show_labels: bool) -> Arc<ApplicationServices> {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::default());
        let credentials = SpaceCredentials::new("space", "cda", "cpa");
        let session =
            Arc::new(Session::open(store, &SessionConfig::default(), credentials.clone()).unwrap());
        let services = ApplicationServices::new(session, credentials).unwrap();
        if show_labels {
            services.set_api(ApiMode::Preview).unwrap();
            services.enable_editorial_features(true).unwrap();
        }
        Arc::new(services)
    }

    fn child_state(node: &ContentNode, id: &str) -> Option<EditorialState> {
        node.children
            .iter()
            .find(|child| child.id == id)
            .map(|child| child.state)
    }

    fn lesson(ts: &str, modules: &[(&str, &str)]) -> ContentNode {
        ContentNode::new("lesson", at(ts)).with_children(
            modules
                .iter()
                .map(|(id, ts)| ContentNode::new(*id, at(ts)))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_hidden_labels_skip_fetching() {
        let mut source = MockContentSource::new();
        source.expect_fetch_latest().never();
        source.expect_fetch_published().never();

        let service = EditorialStateService::new(application(false), Arc::new(source));

        assert_eq!(service.resolve_if_necessary("lesson").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delivery_mode_skips_even_with_toggle_on() {
        let app = application(false);
        app.enable_editorial_features(true).unwrap();

        let mut source = MockContentSource::new();
        source.expect_fetch_latest().never();
        source.expect_fetch_published().never();

        let service = EditorialStateService::new(app, Arc::new(source));

        assert_eq!(service.resolve_if_necessary("lesson").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolves_pending_child() {
        let mut source = MockContentSource::new();
        source.expect_fetch_latest().times(1).returning(|_, _| {
            Ok(Some(lesson(
                "2024-01-01T10:00:00Z",
                &[("m1", "2024-01-01T10:00:00Z"), ("m2", "2024-01-01T11:00:00Z")],
            )))
        });
        source.expect_fetch_published().times(1).returning(|_, _| {
            Ok(Some(lesson(
                "2024-01-01T10:00:00Z",
                &[("m1", "2024-01-01T10:00:00Z"), ("m2", "2024-01-01T10:00:00Z")],
            )))
        });

        let service = EditorialStateService::new(application(true), Arc::new(source));
        let resolved = service.resolve_if_necessary("lesson").await.unwrap().unwrap();

        assert_eq!(resolved.state, EditorialState::PendingChanges);
        assert_eq!(resolved.latest.state, EditorialState::PendingChanges);
        assert_eq!(
            child_state(&resolved.latest, "m2"),
            Some(EditorialState::PendingChanges)
        );
        assert_eq!(
            child_state(&resolved.latest, "m1"),
            Some(EditorialState::UpToDate)
        );
    }

    #[tokio::test]
    async fn test_unpublished_resource_is_draft() {
        let mut source = MockContentSource::new();
        source.expect_fetch_latest().returning(|_, _| {
            Ok(Some(lesson("2024-01-01T10:00:00Z", &[("m1", "2024-01-01T10:00:00Z")])))
        });
        source.expect_fetch_published().returning(|_, _| Ok(None));

        let service = EditorialStateService::new(application(true), Arc::new(source));
        let resolved = service.resolve("lesson").await.unwrap();

        assert_eq!(resolved.state, EditorialState::Draft);
        assert!(resolved.published.is_none());
        // Children of a draft are left as fetched
        assert_eq!(
            child_state(&resolved.latest, "m1"),
            Some(EditorialState::UpToDate)
        );
    }

    #[tokio::test]
    async fn test_missing_latest_is_not_found() {
        let mut source = MockContentSource::new();
        source.expect_fetch_latest().returning(|_, _| Ok(None));
        source.expect_fetch_published().returning(|_, _| Ok(None));

        let service = EditorialStateService::new(application(true), Arc::new(source));

        assert!(matches!(
            service.resolve("lesson").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let mut source = MockContentSource::new();
        source.expect_fetch_latest().returning(|_, _| {
            Ok(Some(lesson("2024-01-01T10:00:00Z", &[])))
        });
        source
            .expect_fetch_published()
            .returning(|_, _| Err(AppError::source_failure("delivery", "timed out")));

        let service = EditorialStateService::new(application(true), Arc::new(source));

        assert!(matches!(
            service.resolve("lesson").await,
            Err(AppError::Source { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetches_with_current_locale() {
        let app = application(true);
        app.set_locale(Locale::german()).unwrap();

        let mut source = MockContentSource::new();
        source
            .expect_fetch_latest()
            .withf(|id, locale| id == "lesson" && locale.code == "de-DE")
            .returning(|_, _| Ok(Some(lesson("2024-01-01T10:00:00Z", &[]))));
        source
            .expect_fetch_published()
            .withf(|_, locale| locale.code == "de-DE")
            .returning(|_, _| Ok(Some(lesson("2024-01-01T10:00:00Z", &[]))));

        let service = EditorialStateService::new(app, Arc::new(source));
        let resolved = service.resolve("lesson").await.unwrap();

        assert_eq!(resolved.state, EditorialState::UpToDate);
    }

    #[test]
    fn test_mismatched_snapshots_are_rejected() {
        let service =
            EditorialStateService::new(application(true), Arc::new(MockContentSource::new()));

        let result = service.resolve_snapshots(
            ContentNode::new("lesson", at("2024-01-01T10:00:00Z")),
            Some(ContentNode::new("other", at("2024-01-01T10:00:00Z"))),
        );

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::IdentityMismatch { .. }))
        ));
    }
}
