//! Backend collaborator: a document store that only executes operations the
//! rule evaluator allows.

pub mod memory;

use async_trait::async_trait;
use tokio::sync::Mutex;

use docguard_core::error::Result;
use docguard_core::{AuthContext, BypassContext, DocPath, Document, Query};

pub use memory::MemoryStore;

/// Document store gated by rules. Rejections surface as `PermissionDenied`;
/// request errors (`NotFound`, `AlreadyExists`, `MalformedRequest`) stay distinct.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. `Ok(None)` when allowed but absent.
    async fn get(&self, ctx: &AuthContext, path: &DocPath) -> Result<Option<Document>>;

    /// Run a collection query, ordered by document id.
    async fn list(&self, ctx: &AuthContext, query: &Query) -> Result<Vec<(DocPath, Document)>>;

    /// Create a new document; fails with `AlreadyExists` if present.
    async fn create(&self, ctx: &AuthContext, path: &DocPath, doc: Document) -> Result<()>;

    /// Create or overwrite. Evaluated as update when the document exists.
    async fn set(&self, ctx: &AuthContext, path: &DocPath, doc: Document) -> Result<()>;

    /// Merge top-level fields into an existing document.
    async fn update(&self, ctx: &AuthContext, path: &DocPath, patch: Document) -> Result<()>;

    async fn delete(&self, ctx: &AuthContext, path: &DocPath) -> Result<()>;

    /// Drop all state. Test-only; requires the bypass capability.
    async fn clear(&self, bypass: &BypassContext) -> Result<()>;

    /// Lock serializing harness scenarios over this store. Every harness built
    /// on the same store shares it.
    fn scenario_lock(&self) -> &Mutex<()>;
}
