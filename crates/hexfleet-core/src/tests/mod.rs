//! Crate-level tests.
//!
//! - `determinism.rs`: same seed and inputs give the same history
//! - `integration.rs`: end-to-end flows through the manager
//! - `scenarios.rs`: the reference battle scenarios
//! - `helpers.rs`: ship, weapon and state factories shared by unit tests

pub(crate) mod helpers;
mod integration;
