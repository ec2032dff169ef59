//! Rule vocabulary and the single dispatch routine that evaluates it.

use serde::Deserialize;

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{Caller, DocPath, OpKind, Operation};

use super::evaluator::{Decision, DocumentLookup};

/// Collection holding user profiles consulted by admin checks.
pub const USERS_COLLECTION: &str = "users";
/// Profile field carrying the admin flag.
pub const ADMIN_FIELD: &str = "isAdmin";

/// One rule predicate. Rule files spell these as `{ rule: <name>, ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case", deny_unknown_fields)]
pub enum Rule {
    Allow,
    Deny,
    /// Any signed-in caller.
    Authenticated,
    /// Stored document's `field` equals the caller id. On `list`, the query must
    /// pin `field` to the caller id instead.
    CallerOwns { field: String },
    /// Signed-in caller and the proposed document's `field` equals the caller id.
    CreatesOwned { field: String },
    /// Proposed `field` equals the stored one. Vacuously true without a stored document.
    KeepsField { field: String },
    /// Caller id equals the target document id (`users/{uid}` self-edit).
    CallerIsDocument,
    /// Caller's own profile document has a truthy admin flag.
    CallerIsAdmin {
        #[serde(default = "default_users_collection")]
        collection: String,
        #[serde(default = "default_admin_field")]
        field: String,
    },
    /// Setting `field` truthy on create, or changing it on update, needs an admin caller.
    AdminOnlyField { field: String },
    /// Proposed `field` is a non-empty string.
    NonEmpty { field: String },
    AllOf { rules: Vec<Rule> },
    AnyOf { rules: Vec<Rule> },
}

fn default_users_collection() -> String {
    USERS_COLLECTION.into()
}
fn default_admin_field() -> String {
    ADMIN_FIELD.into()
}

/// Inputs a rule sees: the caller, the operation and read-only access to stored documents.
pub struct RuleCx<'a> {
    pub caller: &'a Caller,
    pub op: &'a Operation,
    pub lookup: &'a dyn DocumentLookup,
}

impl Rule {
    pub fn caller_owns(field: &str) -> Self {
        Rule::CallerOwns { field: field.into() }
    }
    pub fn creates_owned(field: &str) -> Self {
        Rule::CreatesOwned { field: field.into() }
    }
    pub fn keeps_field(field: &str) -> Self {
        Rule::KeepsField { field: field.into() }
    }
    pub fn admin_only_field(field: &str) -> Self {
        Rule::AdminOnlyField { field: field.into() }
    }
    pub fn caller_is_admin() -> Self {
        Rule::CallerIsAdmin {
            collection: default_users_collection(),
            field: default_admin_field(),
        }
    }

    /// Reject rules that can never be meaningful (empty field names, empty combinators).
    pub fn validate(&self) -> Result<()> {
        match self {
            Rule::CallerOwns { field }
            | Rule::CreatesOwned { field }
            | Rule::KeepsField { field }
            | Rule::AdminOnlyField { field }
            | Rule::NonEmpty { field } => require_name("field", field),
            Rule::CallerIsAdmin { collection, field } => {
                require_name("collection", collection)?;
                require_name("field", field)
            }
            Rule::AllOf { rules } | Rule::AnyOf { rules } => {
                if rules.is_empty() {
                    return Err(DocGuardError::MalformedRequest(
                        "all_of/any_of must list at least one rule".into(),
                    ));
                }
                rules.iter().try_for_each(Rule::validate)
            }
            Rule::Allow | Rule::Deny | Rule::Authenticated | Rule::CallerIsDocument => Ok(()),
        }
    }

    pub fn eval(&self, cx: &RuleCx<'_>) -> Decision {
        match self {
            Rule::Allow => Decision::Allow,
            Rule::Deny => Decision::deny("denied by rule"),
            Rule::Authenticated => {
                Decision::check(cx.caller.is_authenticated(), "caller is not signed in")
            }
            Rule::CallerOwns { field } => caller_owns(cx, field),
            Rule::CreatesOwned { field } => {
                let Some(uid) = cx.caller.id() else {
                    return Decision::deny("caller is not signed in");
                };
                let owner = cx.op.after().and_then(|d| d.str_field(field));
                Decision::check(owner == Some(uid), "new document is not owned by caller")
            }
            Rule::KeepsField { field } => match (cx.op.before(), cx.op.after()) {
                (Some(before), Some(after)) => Decision::check(
                    before.get(field) == after.get(field),
                    "protected field would change",
                ),
                _ => Decision::Allow,
            },
            Rule::CallerIsDocument => {
                let target = cx.op.path().map(DocPath::id);
                Decision::check(
                    cx.caller.id().is_some() && cx.caller.id() == target,
                    "caller is not the target document",
                )
            }
            Rule::CallerIsAdmin { collection, field } => Decision::check(
                stored_admin(cx, collection, field),
                "caller is not an admin",
            ),
            Rule::AdminOnlyField { field } => {
                let touched = match (cx.op.kind(), cx.op.before(), cx.op.after()) {
                    (OpKind::Create, _, Some(after)) => after.is_truthy(field),
                    (OpKind::Update, Some(before), Some(after)) => {
                        before.get(field) != after.get(field)
                    }
                    _ => false,
                };
                if !touched {
                    return Decision::Allow;
                }
                Decision::check(
                    stored_admin(cx, USERS_COLLECTION, ADMIN_FIELD),
                    "only admins may set this field",
                )
            }
            Rule::NonEmpty { field } => {
                let v = cx.op.after().and_then(|d| d.str_field(field));
                Decision::check(v.is_some_and(|s| !s.is_empty()), "required field is empty")
            }
            Rule::AllOf { rules } => rules
                .iter()
                .map(|r| r.eval(cx))
                .find(|d| !d.is_allowed())
                .unwrap_or(Decision::Allow),
            Rule::AnyOf { rules } => {
                let mut last = Decision::deny("no alternative allowed");
                for r in rules {
                    let d = r.eval(cx);
                    if d.is_allowed() {
                        return d;
                    }
                    last = d;
                }
                last
            }
        }
    }
}

fn require_name(what: &str, s: &str) -> Result<()> {
    if s.trim().is_empty() {
        return Err(DocGuardError::MalformedRequest(format!("rule {what} must not be empty")));
    }
    Ok(())
}

fn caller_owns(cx: &RuleCx<'_>, field: &str) -> Decision {
    let Some(uid) = cx.caller.id() else {
        return Decision::deny("caller is not signed in");
    };
    if let Some(q) = cx.op.query() {
        return Decision::check(q.pins(field, uid), "query is not restricted to caller");
    }
    // Missing document or missing owner field both mean "no owner".
    let owner = cx.op.before().and_then(|d| d.str_field(field));
    Decision::check(owner == Some(uid), "caller does not own document")
}

fn stored_admin(cx: &RuleCx<'_>, collection: &str, field: &str) -> bool {
    let Some(uid) = cx.caller.id() else {
        return false;
    };
    let Ok(path) = DocPath::new(collection, uid) else {
        return false;
    };
    cx.lookup
        .lookup(&path)
        .is_some_and(|profile| profile.is_truthy(field))
}
