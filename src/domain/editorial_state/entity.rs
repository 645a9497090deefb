use serde::{Deserialize, Serialize};

/// Editorial freshness of a resource, inferred by diffing the draft-capable
/// (preview) snapshot against the published (delivery) snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorialState {
    /// Published, and identical on both sources (to the second).
    #[default]
    UpToDate,

    /// Present on the preview source only.
    Draft,

    /// Published, but the preview copy was modified later.
    PendingChanges,

    /// Composite of a parent over its linked children. Never assigned to a
    /// leaf by resolution.
    DraftAndPendingChanges,
}

/// A label the rendering layer shows next to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Draft,
    PendingChanges,
}

impl EditorialState {
    /// Badges to render, in display order.
    pub fn badges(&self) -> &'static [Badge] {
        match self {
            EditorialState::UpToDate => &[],
            EditorialState::Draft => &[Badge::Draft],
            EditorialState::PendingChanges => &[Badge::PendingChanges],
            EditorialState::DraftAndPendingChanges => &[Badge::Draft, Badge::PendingChanges],
        }
    }

    /// Whether this state contributes to a parent's draft count.
    /// The composite state contributes to both counts.
    pub fn counts_as_draft(&self) -> bool {
        matches!(
            self,
            EditorialState::Draft | EditorialState::DraftAndPendingChanges
        )
    }

    /// Whether this state contributes to a parent's pending-changes count.
    pub fn counts_as_pending(&self) -> bool {
        matches!(
            self,
            EditorialState::PendingChanges | EditorialState::DraftAndPendingChanges
        )
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, EditorialState::UpToDate)
    }
}

impl std::fmt::Display for EditorialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorialState::UpToDate => write!(f, "up_to_date"),
            EditorialState::Draft => write!(f, "draft"),
            EditorialState::PendingChanges => write!(f, "pending_changes"),
            EditorialState::DraftAndPendingChanges => write!(f, "draft_and_pending_changes"),
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Badge::Draft => write!(f, "Draft"),
            Badge::PendingChanges => write!(f, "Pending Changes"),
        }
    }
}
