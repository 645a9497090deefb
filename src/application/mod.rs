// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Sits above services and owns the shared, observable client state
// - Screens read and subscribe here; only this layer writes

pub mod state;

pub use state::ApplicationServices;
