//! Data model shared by the evaluator, the store and the harness.
//!
//! - identity: who is asking (caller or fixture bypass)
//! - document: paths and field maps, with the owner/flag accessors rules rely on
//! - operation: what is being asked (get/list/create/update/delete + query shape)

pub mod document;
pub mod identity;
pub mod operation;

pub use document::{DocPath, Document};
pub use identity::{AuthContext, BypassContext, Caller, UserIdentity};
pub use operation::{EqFilter, OpKind, Operation, Query};
