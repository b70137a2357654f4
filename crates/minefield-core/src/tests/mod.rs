//! Crate-level scenario and determinism tests.
//!
//! - `helpers.rs`: store and mine factories shared with the unit tests
//! - `scenarios.rs`: whole battles with hand-placed mines
//! - `determinism.rs`: same seed, same battle

pub mod helpers;

pub use helpers::*;
