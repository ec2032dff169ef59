//! Identity-scoped handles with a document/collection builder.

use std::sync::Arc;

use serde_json::Value;

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{AuthContext, DocPath, Document, Query};

use crate::store::DocumentStore;

/// Store handle bound to one auth context.
#[derive(Clone)]
pub struct ScopedDb {
    store: Arc<dyn DocumentStore>,
    ctx: AuthContext,
}

impl ScopedDb {
    pub fn new(store: Arc<dyn DocumentStore>, ctx: AuthContext) -> Self {
        Self { store, ctx }
    }

    pub fn doc(&self, collection: &str, id: &str) -> DocRef {
        DocRef {
            db: self.clone(),
            path: DocPath::new(collection, id).map_err(|e| e.to_string()),
        }
    }

    pub fn collection(&self, name: &str) -> CollectionRef {
        CollectionRef {
            db: self.clone(),
            query: Query::new(name).map_err(|e| e.to_string()),
        }
    }
}

/// Reference to one document. Path errors are reported when an operation runs.
pub struct DocRef {
    db: ScopedDb,
    path: std::result::Result<DocPath, String>,
}

impl DocRef {
    fn path(&self) -> Result<&DocPath> {
        self.path
            .as_ref()
            .map_err(|e| DocGuardError::MalformedRequest(e.clone()))
    }

    pub async fn get(&self) -> Result<Option<Document>> {
        self.db.store.get(&self.db.ctx, self.path()?).await
    }

    pub async fn set(&self, data: Value) -> Result<()> {
        let doc = Document::try_from(data)?;
        self.db.store.set(&self.db.ctx, self.path()?, doc).await
    }

    pub async fn create(&self, data: Value) -> Result<()> {
        let doc = Document::try_from(data)?;
        self.db.store.create(&self.db.ctx, self.path()?, doc).await
    }

    pub async fn update(&self, patch: Value) -> Result<()> {
        let patch = Document::try_from(patch)?;
        self.db.store.update(&self.db.ctx, self.path()?, patch).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.db.store.delete(&self.db.ctx, self.path()?).await
    }
}

/// Collection query builder.
pub struct CollectionRef {
    db: ScopedDb,
    query: std::result::Result<Query, String>,
}

impl CollectionRef {
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.query = self.query.map(|q| q.where_eq(field, value));
        self
    }

    pub async fn get(&self) -> Result<Vec<(DocPath, Document)>> {
        let q = self
            .query
            .as_ref()
            .map_err(|e| DocGuardError::MalformedRequest(e.clone()))?;
        self.db.store.list(&self.db.ctx, q).await
    }
}
