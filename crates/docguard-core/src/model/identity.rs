//! Caller identities and the request context handed to the evaluator.

use serde::{Deserialize, Serialize};

/// An already-authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
}

/// Identity on the normal request path.
///
/// There is no bypass variant here: a `Caller` can never evaluate as anything
/// other than itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Caller {
    #[default]
    Unauthenticated,
    User(UserIdentity),
}

impl Caller {
    pub fn user(id: impl Into<String>, email: impl Into<String>) -> Self {
        Caller::User(UserIdentity {
            id: id.into(),
            email: email.into(),
        })
    }

    /// Caller id, `None` when unauthenticated.
    pub fn id(&self) -> Option<&str> {
        match self {
            Caller::User(u) => Some(u.id.as_str()),
            Caller::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Caller::User(_))
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &str {
        self.id().unwrap_or("anonymous")
    }
}

/// Capability to skip rule evaluation. Only fixture setup should mint one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassContext {
    _priv: (),
}

impl BypassContext {
    /// Mint a bypass capability for seeding fixtures or clearing state.
    pub fn fixture_setup() -> Self {
        Self { _priv: () }
    }
}

/// Context an operation is evaluated under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    Request(Caller),
    Bypass(BypassContext),
}

impl AuthContext {
    /// Normal caller, if this is not a bypass context.
    pub fn caller(&self) -> Option<&Caller> {
        match self {
            AuthContext::Request(c) => Some(c),
            AuthContext::Bypass(_) => None,
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, AuthContext::Bypass(_))
    }

    pub fn label(&self) -> &str {
        match self {
            AuthContext::Request(c) => c.label(),
            AuthContext::Bypass(_) => "bypass",
        }
    }
}

impl From<Caller> for AuthContext {
    fn from(c: Caller) -> Self {
        AuthContext::Request(c)
    }
}

impl From<BypassContext> for AuthContext {
    fn from(b: BypassContext) -> Self {
        AuthContext::Bypass(b)
    }
}
