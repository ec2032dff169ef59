//! Operations submitted for evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{validate_segment, DocPath, Document};
use crate::error::Result;

/// Operation kind, the second half of a rule table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl OpKind {
    pub const ALL: [OpKind; 5] = [
        OpKind::Get,
        OpKind::List,
        OpKind::Create,
        OpKind::Update,
        OpKind::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Get => "get",
            OpKind::List => "list",
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality constraint `field == value` on a list query.
#[derive(Debug, Clone, PartialEq)]
pub struct EqFilter {
    pub field: String,
    pub value: Value,
}

/// Collection query. Only equality filters are supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    filters: Vec<EqFilter>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        validate_segment("collection", &collection)?;
        Ok(Self {
            collection,
            filters: Vec::new(),
        })
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(EqFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[EqFilter] {
        &self.filters
    }

    /// True if some filter pins `field` to exactly the string `expected`.
    pub fn pins(&self, field: &str, expected: &str) -> bool {
        self.filters
            .iter()
            .any(|f| f.field == field && f.value.as_str() == Some(expected))
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.matches_all(self.filters.iter().map(|f| (f.field.as_str(), &f.value)))
    }
}

/// A single operation with the resource states the rules may inspect.
///
/// `before` is the stored document (absent if it does not exist), `after` the
/// proposed one.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Get {
        path: DocPath,
        before: Option<Document>,
    },
    List {
        query: Query,
    },
    Create {
        path: DocPath,
        after: Document,
    },
    Update {
        path: DocPath,
        before: Document,
        after: Document,
    },
    Delete {
        path: DocPath,
        before: Option<Document>,
    },
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Get { .. } => OpKind::Get,
            Operation::List { .. } => OpKind::List,
            Operation::Create { .. } => OpKind::Create,
            Operation::Update { .. } => OpKind::Update,
            Operation::Delete { .. } => OpKind::Delete,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Operation::List { query } => query.collection(),
            Operation::Get { path, .. }
            | Operation::Create { path, .. }
            | Operation::Update { path, .. }
            | Operation::Delete { path, .. } => path.collection(),
        }
    }

    /// Target document path; `None` for collection queries.
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            Operation::List { .. } => None,
            Operation::Get { path, .. }
            | Operation::Create { path, .. }
            | Operation::Update { path, .. }
            | Operation::Delete { path, .. } => Some(path),
        }
    }

    pub fn before(&self) -> Option<&Document> {
        match self {
            Operation::Get { before, .. } | Operation::Delete { before, .. } => before.as_ref(),
            Operation::Update { before, .. } => Some(before),
            Operation::List { .. } | Operation::Create { .. } => None,
        }
    }

    pub fn after(&self) -> Option<&Document> {
        match self {
            Operation::Create { after, .. } | Operation::Update { after, .. } => Some(after),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&Query> {
        match self {
            Operation::List { query } => Some(query),
            _ => None,
        }
    }

    /// `collection/id` or `collection` for logs.
    pub fn target(&self) -> String {
        match self.path() {
            Some(p) => p.to_string(),
            None => self.collection().to_string(),
        }
    }
}
