use super::entity::ContentNode;
use crate::domain::editorial_state::EditorialState;
use crate::domain::{DomainError, DomainResult};

/// A snapshot pair must describe the same logical resource.
pub fn validate_snapshot_pair(
    latest: &ContentNode,
    published: Option<&ContentNode>,
) -> DomainResult<()> {
    if let Some(published) = published {
        if published.id != latest.id {
            return Err(DomainError::IdentityMismatch {
                latest: latest.id.clone(),
                published: published.id.clone(),
            });
        }
        validate_published_snapshot(published)?;
    }
    Ok(())
}

/// The composite state only ever appears on the preview side.
pub fn validate_published_snapshot(published: &ContentNode) -> DomainResult<()> {
    let mut offending: Option<String> = None;
    published.walk(&mut |node| {
        if offending.is_none() && node.state == EditorialState::DraftAndPendingChanges {
            offending = Some(node.id.clone());
        }
    });

    match offending {
        Some(id) => Err(DomainError::InvariantViolation(format!(
            "published node '{}' carries a composite editorial state",
            id
        ))),
        None => Ok(()),
    }
}
