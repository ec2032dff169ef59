use docguard_core::error::{DocGuardError, Result};
use docguard_core::{AuthContext, DocPath, Document, Operation};

use super::rule::RuleCx;
use super::table::RuleTable;

/// Outcome of rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: &'static str },
}

impl Decision {
    pub fn deny(reason: &'static str) -> Self {
        Decision::Deny { reason }
    }

    pub fn check(ok: bool, reason: &'static str) -> Self {
        if ok {
            Decision::Allow
        } else {
            Decision::Deny { reason }
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny { .. } => "deny",
        }
    }
}

/// Read-only view of stored documents, for rules that consult data other than
/// the target (the caller's own profile).
pub trait DocumentLookup: Send + Sync {
    fn lookup(&self, path: &DocPath) -> Option<Document>;
}

/// Lookup with nothing stored.
pub struct NoLookup;

impl DocumentLookup for NoLookup {
    fn lookup(&self, _path: &DocPath) -> Option<Document> {
        None
    }
}

/// Stateless evaluator over a compiled rule table.
/// Construct once at startup, then share via Arc.
#[derive(Debug, Clone)]
pub struct Evaluator {
    table: RuleTable,
}

impl Evaluator {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn with_default_rules() -> Self {
        Self::new(RuleTable::default_rules())
    }

    /// Decide whether `op` may run under `ctx`.
    ///
    /// A bypass context short-circuits to `Allow` before the table is consulted.
    /// A collection the table does not know is a malformed request; a known
    /// collection without a rule for the operation is a plain deny.
    pub fn evaluate(
        &self,
        ctx: &AuthContext,
        op: &Operation,
        lookup: &dyn DocumentLookup,
    ) -> Result<Decision> {
        let caller = match ctx {
            AuthContext::Bypass(_) => return Ok(Decision::Allow),
            AuthContext::Request(caller) => caller,
        };

        let collection = op.collection();
        let rules = self.table.collection(collection).ok_or_else(|| {
            DocGuardError::MalformedRequest(format!("unknown collection: {collection}"))
        })?;

        let Some(rule) = rules.get(op.kind()) else {
            return Ok(Decision::deny("no rule for operation"));
        };

        Ok(rule.eval(&RuleCx { caller, op, lookup }))
    }

    /// Boolean form of [`Evaluator::evaluate`].
    pub fn allow(
        &self,
        ctx: &AuthContext,
        op: &Operation,
        lookup: &dyn DocumentLookup,
    ) -> Result<bool> {
        self.evaluate(ctx, op, lookup).map(|d| d.is_allowed())
    }
}
