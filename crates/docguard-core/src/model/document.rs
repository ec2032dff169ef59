//! Document paths and snapshots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocGuardError, Result};

/// `(collection, document id)` reference. Textual form is `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: String,
    id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        let id = id.into();
        validate_segment("collection", &collection)?;
        validate_segment("document id", &id)?;
        Ok(Self { collection, id })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn validate_segment(what: &str, s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(DocGuardError::MalformedRequest(format!("{what} must not be empty")));
    }
    if s.contains('/') {
        return Err(DocGuardError::MalformedRequest(format!(
            "{what} must not contain '/': {s}"
        )));
    }
    Ok(())
}

impl FromStr for DocPath {
    type Err = DocGuardError;

    fn from_str(s: &str) -> Result<Self> {
        let (collection, id) = s.split_once('/').ok_or_else(|| {
            DocGuardError::MalformedRequest(format!(
                "invalid document path: {s} (expected collection/id)"
            ))
        })?;
        DocPath::new(collection, id)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Field map of a stored or proposed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value of `field`. Non-string values read as absent, so a document
    /// whose owner field is missing or mistyped simply has no owner.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Boolean-like read: JSON `true` or the string `"true"` (any case).
    pub fn is_truthy(&self, field: &str) -> bool {
        match self.0.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Top-level merge: every field of `patch` replaces the same field here.
    pub fn merged(&self, patch: &Document) -> Document {
        let mut out = self.0.clone();
        for (k, v) in &patch.0 {
            out.insert(k.clone(), v.clone());
        }
        Document(out)
    }

    /// Whether every `(field, value)` pair is present with an equal value.
    pub fn matches_all<'a>(&self, mut pairs: impl Iterator<Item = (&'a str, &'a Value)>) -> bool {
        pairs.all(|(f, v)| self.0.get(f) == Some(v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Document {
    type Error = DocGuardError;

    fn try_from(v: Value) -> Result<Self> {
        match v {
            Value::Object(m) => Ok(Document(m)),
            other => Err(DocGuardError::MalformedRequest(format!(
                "document must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(m: Map<String, Value>) -> Self {
        Document(m)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
