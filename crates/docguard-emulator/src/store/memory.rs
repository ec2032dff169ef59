//! In-memory store backed by a sharded map.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{AuthContext, BypassContext, DocPath, Document, Operation, Query};

use crate::obs::metrics::EmulatorMetrics;
use crate::rules::{Decision, DocumentLookup, Evaluator};

use super::DocumentStore;

/// Emulated backend: every operation is evaluated before it touches the map.
///
/// Mutations hold `writes` from the snapshot of `before` until the write lands,
/// so the document a rule saw is the document that gets replaced. Rules may
/// still read other documents through `lookup` while it is held.
pub struct MemoryStore {
    docs: DashMap<DocPath, Document>,
    evaluator: Evaluator,
    metrics: Arc<EmulatorMetrics>,
    writes: Mutex<()>,
    scenarios: Mutex<()>,
}

impl MemoryStore {
    pub fn new(evaluator: Evaluator) -> Self {
        Self::with_metrics(evaluator, Arc::new(EmulatorMetrics::default()))
    }

    pub fn with_metrics(evaluator: Evaluator, metrics: Arc<EmulatorMetrics>) -> Self {
        Self {
            docs: DashMap::new(),
            evaluator,
            metrics,
            writes: Mutex::new(()),
            scenarios: Mutex::new(()),
        }
    }

    pub fn with_default_rules() -> Self {
        Self::new(Evaluator::with_default_rules())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn snapshot(&self, path: &DocPath) -> Option<Document> {
        self.docs.get(path).map(|r| r.value().clone())
    }

    /// Evaluate `op`; map a deny to `PermissionDenied`.
    /// No map guard may be held here: rules read other documents via `lookup`.
    fn authorize(&self, ctx: &AuthContext, op: &Operation) -> Result<()> {
        let decision = self.evaluator.evaluate(ctx, op, self)?;
        self.metrics.rule_decisions.inc(&[
            ("collection", op.collection()),
            ("op", op.kind().as_str()),
            ("decision", if ctx.is_bypass() { "bypass" } else { decision.as_str() }),
        ]);

        match decision {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => {
                tracing::debug!(
                    caller = %ctx.label(),
                    op = %op.kind(),
                    target = %op.target(),
                    reason,
                    "rule denied operation"
                );
                Err(DocGuardError::PermissionDenied(format!(
                    "{} {} as {}: {reason}",
                    op.kind(),
                    op.target(),
                    ctx.label()
                )))
            }
        }
    }
}

impl DocumentLookup for MemoryStore {
    fn lookup(&self, path: &DocPath) -> Option<Document> {
        self.snapshot(path)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, ctx: &AuthContext, path: &DocPath) -> Result<Option<Document>> {
        let before = self.snapshot(path);
        self.authorize(
            ctx,
            &Operation::Get {
                path: path.clone(),
                before: before.clone(),
            },
        )?;
        Ok(before)
    }

    async fn list(&self, ctx: &AuthContext, query: &Query) -> Result<Vec<(DocPath, Document)>> {
        self.authorize(ctx, &Operation::List { query: query.clone() })?;

        let mut out: Vec<(DocPath, Document)> = self
            .docs
            .iter()
            .filter(|e| e.key().collection() == query.collection() && query.matches(e.value()))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    async fn create(&self, ctx: &AuthContext, path: &DocPath, doc: Document) -> Result<()> {
        let _w = self.writes.lock().await;
        self.authorize(
            ctx,
            &Operation::Create {
                path: path.clone(),
                after: doc.clone(),
            },
        )?;

        match self.docs.entry(path.clone()) {
            Entry::Occupied(_) => Err(DocGuardError::AlreadyExists(path.to_string())),
            Entry::Vacant(v) => {
                v.insert(doc);
                tracing::debug!(caller = %ctx.label(), %path, "document created");
                Ok(())
            }
        }
    }

    async fn set(&self, ctx: &AuthContext, path: &DocPath, doc: Document) -> Result<()> {
        let _w = self.writes.lock().await;
        let op = match self.snapshot(path) {
            Some(before) => Operation::Update {
                path: path.clone(),
                before,
                after: doc.clone(),
            },
            None => Operation::Create {
                path: path.clone(),
                after: doc.clone(),
            },
        };
        self.authorize(ctx, &op)?;

        self.docs.insert(path.clone(), doc);
        tracing::debug!(caller = %ctx.label(), %path, op = %op.kind(), "document set");
        Ok(())
    }

    async fn update(&self, ctx: &AuthContext, path: &DocPath, patch: Document) -> Result<()> {
        let _w = self.writes.lock().await;
        let before = self
            .snapshot(path)
            .ok_or_else(|| DocGuardError::NotFound(path.to_string()))?;
        let after = before.merged(&patch);

        self.authorize(
            ctx,
            &Operation::Update {
                path: path.clone(),
                before,
                after: after.clone(),
            },
        )?;

        self.docs.insert(path.clone(), after);
        tracing::debug!(caller = %ctx.label(), %path, "document updated");
        Ok(())
    }

    async fn delete(&self, ctx: &AuthContext, path: &DocPath) -> Result<()> {
        let _w = self.writes.lock().await;
        let before = self.snapshot(path);
        self.authorize(
            ctx,
            &Operation::Delete {
                path: path.clone(),
                before,
            },
        )?;

        if self.docs.remove(path).is_some() {
            tracing::debug!(caller = %ctx.label(), %path, "document deleted");
        }
        Ok(())
    }

    async fn clear(&self, _bypass: &BypassContext) -> Result<()> {
        let _w = self.writes.lock().await;
        let n = self.docs.len();
        self.docs.clear();
        tracing::debug!(removed = n, "store cleared");
        Ok(())
    }

    fn scenario_lock(&self) -> &Mutex<()> {
        &self.scenarios
    }
}
