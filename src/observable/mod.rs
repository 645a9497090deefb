// src/observable/mod.rs
//
// Observable state - the propagation mechanism for API mode, locale,
// credentials and editorial-feature changes.

pub mod observable_state;

pub use observable_state::{ObservableState, ObserverToken, Transition};
