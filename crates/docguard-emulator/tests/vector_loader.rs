//! JSON rule-decision vector loader.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::{BTreeMap, HashMap};
use std::fs;

use serde::Deserialize;
use serde_json::Value;

use docguard_core::{
    AuthContext, BypassContext, Caller, DocPath, Document, OpKind, Operation, Query, UserIdentity,
};
use docguard_emulator::rules::DocumentLookup;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestVector {
    pub description: String,
    #[serde(default)]
    pub caller: Option<UserIdentity>,
    #[serde(default)]
    pub bypass: bool,
    pub op: OpKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
    #[serde(default)]
    pub before: Option<Document>,
    #[serde(default)]
    pub after: Option<Document>,
    #[serde(default)]
    pub stored: HashMap<String, Document>,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

pub fn load(name: &str) -> Vec<TestVector> {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

impl TestVector {
    pub fn context(&self) -> AuthContext {
        if self.bypass {
            return AuthContext::Bypass(BypassContext::fixture_setup());
        }
        match &self.caller {
            Some(u) => AuthContext::Request(Caller::User(u.clone())),
            None => AuthContext::Request(Caller::Unauthenticated),
        }
    }

    pub fn operation(&self) -> Operation {
        let path = || -> DocPath {
            self.path.as_deref().expect("vector needs path").parse().unwrap()
        };
        match self.op {
            OpKind::Get => Operation::Get { path: path(), before: self.before.clone() },
            OpKind::Delete => Operation::Delete { path: path(), before: self.before.clone() },
            OpKind::Create => Operation::Create {
                path: path(),
                after: self.after.clone().expect("create vector needs after"),
            },
            OpKind::Update => Operation::Update {
                path: path(),
                before: self.before.clone().unwrap_or_default(),
                after: self.after.clone().expect("update vector needs after"),
            },
            OpKind::List => {
                let collection = self.collection.as_deref().expect("list vector needs collection");
                let query = self
                    .filters
                    .iter()
                    .fold(Query::new(collection).unwrap(), |q, (f, v)| {
                        q.where_eq(f.as_str(), v.clone())
                    });
                Operation::List { query }
            }
        }
    }

    pub fn lookup(&self) -> StoredDocs {
        StoredDocs(
            self.stored
                .iter()
                .map(|(p, d)| (p.parse().unwrap(), d.clone()))
                .collect(),
        )
    }
}

/// Fixed set of stored documents visible to rules.
pub struct StoredDocs(HashMap<DocPath, Document>);

impl DocumentLookup for StoredDocs {
    fn lookup(&self, path: &DocPath) -> Option<Document> {
        self.0.get(path).cloned()
    }
}
