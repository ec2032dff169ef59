//! Transport layer (HTTP emulator surface).
//!
//! Resolves the auth context from request headers and maps store operations
//! and errors onto HTTP.

pub mod caller;
pub mod http;
