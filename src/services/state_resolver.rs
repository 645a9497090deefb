// src/services/state_resolver.rs
//
// State Resolver
//
// Infers the editorial state of preview (draft-capable) resources by diffing
// them against their delivery (published) counterparts.
//
// CRITICAL RULES:
// - Only the latest (preview) side is ever mutated
// - Published snapshots are read-only reference data
// - Deterministic and idempotent: same snapshots -> same states
// - A node's state is written once per pass, after everything is computed
// - No I/O, no failure paths

use crate::domain::{truncate_to_second, EditorialState, LinkedResource, ResolvableResource};

/// Stateless resolver. Cheap to construct, safe to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateResolver;

impl StateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a single resource against its published counterpart and
    /// write the result into `latest`.
    ///
    /// - no counterpart -> `Draft`
    /// - timestamps differ at second precision -> `PendingChanges`
    /// - otherwise -> `UpToDate`
    pub fn resolve_leaf<L, P>(&self, latest: &mut L, published: Option<&P>) -> EditorialState
    where
        L: ResolvableResource + ?Sized,
        P: ResolvableResource + ?Sized,
    {
        let state = self.leaf_state(latest, published);
        latest.set_state(state);
        log::debug!("resolved '{}' -> {}", latest.id(), state);
        state
    }

    /// Resolve every linked child of a parent and fold their states into the
    /// parent's state, starting from whatever state the parent holds now.
    ///
    /// Children are resolved as leaves; their own links are not inspected.
    pub fn resolve_children_and_aggregate<P, C>(
        &self,
        latest_parent: &mut P,
        latest_children: &mut [C],
        published_children: &[C],
    ) -> EditorialState
    where
        P: ResolvableResource + ?Sized,
        C: ResolvableResource,
    {
        let state = self.aggregate(
            latest_parent.state(),
            latest_children,
            published_children,
            |child, counterpart| self.resolve_leaf(child, counterpart),
        );
        latest_parent.set_state(state);
        log::debug!("aggregated '{}' -> {}", latest_parent.id(), state);
        state
    }

    /// One resolution pass over a resource and its direct links.
    ///
    /// The node's own state comes first. Links are only aggregated when the
    /// node has a published counterpart: a draft stays a draft.
    pub fn resolve_pass<R>(&self, latest: &mut R, published: Option<&R>) -> EditorialState
    where
        R: LinkedResource,
    {
        let own = self.leaf_state(latest, published);
        let state = match published {
            Some(published) => self.aggregate(
                own,
                latest.linked_mut(),
                published.linked(),
                |child, counterpart| self.resolve_leaf(child, counterpart),
            ),
            None => own,
        };
        latest.set_state(state);
        log::debug!("resolution pass '{}' -> {}", latest.id(), state);
        state
    }

    /// Resolve an arbitrarily nested tree, children before parents.
    ///
    /// A child that aggregates to `DraftAndPendingChanges` counts toward both
    /// the draft and the pending-changes tally of its parent.
    pub fn resolve_tree<R>(&self, latest: &mut R, published: Option<&R>) -> EditorialState
    where
        R: LinkedResource,
    {
        let own = self.leaf_state(latest, published);
        let state = match published {
            Some(published) => self.aggregate(
                own,
                latest.linked_mut(),
                published.linked(),
                |child, counterpart| self.resolve_tree(child, counterpart),
            ),
            None => own,
        };
        latest.set_state(state);
        state
    }

    // ========================================================================
    // INTERNAL RESOLUTION LOGIC
    // ========================================================================

    fn leaf_state<L, P>(&self, latest: &L, published: Option<&P>) -> EditorialState
    where
        L: ResolvableResource + ?Sized,
        P: ResolvableResource + ?Sized,
    {
        match published {
            None => EditorialState::Draft,
            Some(published) => {
                let latest_ts = truncate_to_second(latest.last_modified());
                let published_ts = truncate_to_second(published.last_modified());
                if latest_ts == published_ts {
                    EditorialState::UpToDate
                } else {
                    EditorialState::PendingChanges
                }
            }
        }
    }

    fn aggregate<C, F>(
        &self,
        prior: EditorialState,
        latest_children: &mut [C],
        published_children: &[C],
        mut resolve_child: F,
    ) -> EditorialState
    where
        C: ResolvableResource,
        F: FnMut(&mut C, Option<&C>) -> EditorialState,
    {
        let mut state = prior;

        // Step 1: links added or removed
        if latest_children.len() != published_children.len() {
            state = EditorialState::PendingChanges;
        }

        // Step 2: links reordered (every index up to the shorter list)
        for (latest, published) in latest_children.iter().zip(published_children) {
            if latest.id() != published.id() {
                state = EditorialState::PendingChanges;
            }
        }

        // Step 3: resolve each child against the published child with its id
        let mut draft_count = 0usize;
        let mut pending_count = 0usize;
        for child in latest_children.iter_mut() {
            let counterpart = published_children
                .iter()
                .find(|published| published.id() == child.id());
            let child_state = resolve_child(child, counterpart);
            if child_state.counts_as_draft() {
                draft_count += 1;
            }
            if child_state.counts_as_pending() {
                pending_count += 1;
            }
        }

        // Step 4: fold child tallies into the parent
        match (draft_count > 0, pending_count > 0) {
            (true, true) => EditorialState::DraftAndPendingChanges,
            (true, false) if state.counts_as_pending() => EditorialState::DraftAndPendingChanges,
            (true, false) => EditorialState::Draft,
            (false, true) if state.counts_as_draft() => EditorialState::DraftAndPendingChanges,
            (false, true) => EditorialState::PendingChanges,
            (false, false) => state,
        }
    }
}
