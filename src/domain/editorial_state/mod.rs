pub mod entity;

pub use entity::{Badge, EditorialState};
