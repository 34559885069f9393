//! End-to-end tests for the iXcommand EV charger bridge
//!
//! Exercises the full stack in one process: the mock vendor endpoint, the
//! API client, the polling coordinator and the control surfaces.
//!
//! # Test Structure
//!
//! - `charger_e2e_test.rs` - registration through control and reconciliation

// This crate only contains tests, no library code
