//! docguard emulator library entry.
//!
//! This crate wires the rule table, the evaluator, the rule-gated in-memory
//! store, the conformance harness and the HTTP surface into one emulator. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod harness;
pub mod obs;
pub mod ops;
pub mod router;
pub mod rules;
pub mod store;
pub mod transport;
