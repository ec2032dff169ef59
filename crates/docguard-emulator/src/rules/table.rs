//! Rule table compilation.
//!
//! Turns the `rules.collections` section of the config (with its `read`/`write`
//! shorthands) into a flat `(collection, op) -> Rule` lookup, or provides the
//! built-in table when no rule file is configured.

use std::collections::{BTreeMap, HashMap};

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{DocPath, OpKind};

use super::rule::{Rule, ADMIN_FIELD, USERS_COLLECTION};
use crate::config::schema::{CollectionRulesSpec, RulesSection};

/// Rules for one collection. Operations without an entry are denied.
#[derive(Debug, Clone, Default)]
pub struct CollectionRules {
    by_op: BTreeMap<OpKind, Rule>,
}

impl CollectionRules {
    pub fn get(&self, op: OpKind) -> Option<&Rule> {
        self.by_op.get(&op)
    }

    pub fn set(mut self, op: OpKind, rule: Rule) -> Self {
        self.by_op.insert(op, rule);
        self
    }

    fn compile(spec: &CollectionRulesSpec) -> Result<Self> {
        let mut out = CollectionRules::default();

        // shorthands first, explicit entries override
        let shorthands = [
            (&spec.read, &[OpKind::Get, OpKind::List][..]),
            (&spec.write, &[OpKind::Create, OpKind::Update, OpKind::Delete][..]),
        ];
        for (rule, ops) in shorthands {
            if let Some(rule) = rule {
                for op in ops {
                    out.by_op.insert(*op, rule.clone());
                }
            }
        }

        let explicit = [
            (OpKind::Get, &spec.get),
            (OpKind::List, &spec.list),
            (OpKind::Create, &spec.create),
            (OpKind::Update, &spec.update),
            (OpKind::Delete, &spec.delete),
        ];
        for (op, rule) in explicit {
            if let Some(rule) = rule {
                out.by_op.insert(op, rule.clone());
            }
        }

        for rule in out.by_op.values() {
            rule.validate()?;
        }
        Ok(out)
    }
}

/// `(collection, op) -> Rule` table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    collections: HashMap<String, CollectionRules>,
}

impl RuleTable {
    pub fn collection(&self, name: &str) -> Option<&CollectionRules> {
        self.collections.get(name)
    }

    pub fn with_collection(mut self, name: impl Into<String>, rules: CollectionRules) -> Self {
        self.collections.insert(name.into(), rules);
        self
    }

    pub fn collection_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn from_config(section: &RulesSection) -> Result<Self> {
        if section.collections.is_empty() {
            return Err(DocGuardError::MalformedRequest(
                "rules.collections must not be empty".into(),
            ));
        }

        let mut table = RuleTable::default();
        for (name, spec) in &section.collections {
            // reuse path validation for the collection segment
            DocPath::new(name.as_str(), "_").map_err(|e| {
                DocGuardError::MalformedRequest(format!("invalid collection name {name:?}: {e}"))
            })?;
            let rules = CollectionRules::compile(spec).map_err(|e| {
                DocGuardError::MalformedRequest(format!("rules for collection {name} invalid: {e}"))
            })?;
            table.collections.insert(name.clone(), rules);
        }
        Ok(table)
    }

    /// Built-in table for `todos`, `users` and `test_documents`.
    pub fn default_rules() -> Self {
        let todos = CollectionRules::default()
            .set(OpKind::Get, Rule::caller_owns("uid"))
            .set(OpKind::List, Rule::caller_owns("uid"))
            .set(OpKind::Create, Rule::creates_owned("uid"))
            .set(
                OpKind::Update,
                Rule::AllOf {
                    rules: vec![Rule::caller_owns("uid"), Rule::keeps_field("uid")],
                },
            )
            .set(OpKind::Delete, Rule::caller_owns("uid"));

        let users = CollectionRules::default()
            .set(OpKind::Get, Rule::Authenticated)
            .set(OpKind::List, Rule::Authenticated)
            .set(
                OpKind::Create,
                Rule::AllOf {
                    rules: vec![Rule::Authenticated, Rule::admin_only_field(ADMIN_FIELD)],
                },
            )
            .set(
                OpKind::Update,
                Rule::AllOf {
                    rules: vec![
                        Rule::AnyOf {
                            rules: vec![Rule::CallerIsDocument, Rule::caller_is_admin()],
                        },
                        Rule::admin_only_field(ADMIN_FIELD),
                    ],
                },
            );

        let authored = CollectionRules::default()
            .set(OpKind::Get, Rule::caller_owns("authorId"))
            .set(OpKind::List, Rule::caller_owns("authorId"))
            .set(OpKind::Create, Rule::creates_owned("authorId"))
            .set(
                OpKind::Update,
                Rule::AllOf {
                    rules: vec![Rule::caller_owns("authorId"), Rule::keeps_field("authorId")],
                },
            )
            .set(OpKind::Delete, Rule::caller_owns("authorId"));

        RuleTable::default()
            .with_collection("todos", todos)
            .with_collection(USERS_COLLECTION, users)
            .with_collection("test_documents", authored)
    }
}
