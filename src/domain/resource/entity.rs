use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::editorial_state::EditorialState;

/// Anything whose editorial state can be inferred by comparing its preview
/// and delivery snapshots.
///
/// Identity across the two sources is by `id`, never by reference.
pub trait ResolvableResource {
    fn id(&self) -> &str;
    fn last_modified(&self) -> DateTime<Utc>;
    fn state(&self) -> EditorialState;
    fn set_state(&mut self, state: EditorialState);
}

/// A resource whose ordered linked children are resources of the same type.
pub trait LinkedResource: ResolvableResource + Sized {
    fn linked(&self) -> &[Self];
    fn linked_mut(&mut self) -> &mut [Self];
}

/// Strips everything finer than a second.
///
/// `DateTime<Utc>` is already timezone-normalized, so two instants in the
/// same UTC second truncate to the same value.
pub fn truncate_to_second(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(0)
}

/// A node of a content document (layout, course, lesson, module...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Stable identifier shared by both sources
    pub id: String,

    /// Content type identifier, e.g. "lesson" or "lessonCopy"
    #[serde(default)]
    pub content_type: String,

    /// Last modification timestamp reported by the source
    pub last_modified: DateTime<Utc>,

    /// Inferred editorial state (only meaningful on the preview side)
    #[serde(default)]
    pub state: EditorialState,

    /// Ordered linked children
    #[serde(default)]
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    pub fn new(id: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content_type: String::new(),
            last_modified,
            state: EditorialState::UpToDate,
            children: Vec::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    /// Visits this node and all descendants, pre-order.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&ContentNode),
    {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

impl ResolvableResource for ContentNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    fn state(&self) -> EditorialState {
        self.state
    }

    fn set_state(&mut self, state: EditorialState) {
        self.state = state;
    }
}

impl LinkedResource for ContentNode {
    fn linked(&self) -> &[Self] {
        &self.children
    }

    fn linked_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }
}
