//! docguard core: identity, document and operation model plus the shared error type.
//!
//! This crate defines the vocabulary the rule evaluator, the emulated store and
//! the conformance harness speak. It carries no runtime or transport
//! dependencies so it can be reused by any backend implementation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed paths, documents and queries surface as `DocGuardError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared result type.
pub use error::{DocGuardError, ErrorCode, Result};
pub use model::{
    AuthContext, BypassContext, Caller, DocPath, Document, EqFilter, OpKind, Operation, Query,
    UserIdentity,
};
