pub mod entity;

pub use entity::{ApiMode, Locale};
