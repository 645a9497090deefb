pub mod entity;
pub mod invariants;

pub use entity::{truncate_to_second, ContentNode, LinkedResource, ResolvableResource};
pub use invariants::{validate_published_snapshot, validate_snapshot_pair};
