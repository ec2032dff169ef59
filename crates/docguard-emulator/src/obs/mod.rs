//! Lightweight in-process metrics.
//!
//! Counters are stored as atomics keyed by sorted label sets and rendered in
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;
