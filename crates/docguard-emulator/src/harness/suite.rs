//! Built-in conformance suite for the default rule table.

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::json;

use docguard_core::error::{DocGuardError, Result};

use super::{expect_allowed, expect_denied, Harness};

pub const MY_ID: &str = "user_abc";
pub const MY_EMAIL: &str = "abc@gmail.com";
pub const THEIR_ID: &str = "user_xyz";
pub const THEIR_EMAIL: &str = "hi@test.com";

/// Named scenario; `run` receives a harness whose store was just reset.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub run: fn(Harness) -> BoxFuture<'static, Result<()>>,
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub passed: Vec<&'static str>,
    pub failed: Vec<(&'static str, DocGuardError)>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Scenarios covering every collection and operation of the default table.
pub fn builtin() -> &'static [Scenario] {
    BUILTIN
}

static BUILTIN: &[Scenario] = &[
    Scenario { name: "author edits own document", run: author_edits_own_document },
    Scenario {
        name: "author cannot edit foreign document",
        run: author_cannot_edit_foreign_document,
    },
    Scenario { name: "owner lists own todos", run: owner_lists_own_todos },
    Scenario { name: "unfiltered todo query denied", run: unfiltered_todo_query_denied },
    Scenario { name: "foreign todo not readable", run: foreign_todo_not_readable },
    Scenario { name: "owner updates own todo", run: owner_updates_own_todo },
    Scenario { name: "owner cannot reassign todo", run: owner_cannot_reassign_todo },
    Scenario { name: "foreign todo not updatable", run: foreign_todo_not_updatable },
    Scenario { name: "owner deletes own todo", run: owner_deletes_own_todo },
    Scenario { name: "foreign todo not deletable", run: foreign_todo_not_deletable },
    Scenario { name: "create todo for self", run: create_todo_for_self },
    Scenario { name: "create todo for someone else denied", run: create_todo_for_other_denied },
    Scenario { name: "signed-in caller reads users", run: signed_in_reads_users },
    Scenario { name: "anonymous caller cannot read users", run: anonymous_cannot_read_users },
    Scenario { name: "bypass updates any profile", run: bypass_updates_any_profile },
    Scenario { name: "signed-in caller creates another profile", run: creates_another_profile },
    Scenario { name: "bypass grants admin", run: bypass_grants_admin },
    Scenario { name: "non-admin cannot grant admin", run: non_admin_cannot_grant_admin },
    Scenario { name: "self escalation denied", run: self_escalation_denied },
    Scenario { name: "stored admin grants admin", run: stored_admin_grants_admin },
];

fn me(h: &Harness) -> super::ScopedDb {
    h.as_user(MY_ID, MY_EMAIL)
}

fn them(h: &Harness) -> super::ScopedDb {
    h.as_user(THEIR_ID, THEIR_EMAIL)
}

fn author_edits_own_document(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        h.as_admin()
            .doc("test_documents", "form123")
            .set(json!({ "content": "before", "authorId": MY_ID }))
            .await?;
        expect_allowed(
            me(&h)
                .doc("test_documents", "form123")
                .update(json!({ "content": "after" })),
        )
        .await
    }
    .boxed()
}

fn author_cannot_edit_foreign_document(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        h.as_admin()
            .doc("test_documents", "doc123")
            .set(json!({ "content": "before", "authorId": THEIR_ID }))
            .await?;
        expect_denied(
            me(&h)
                .doc("test_documents", "doc123")
                .update(json!({ "content": "after" })),
        )
        .await
    }
    .boxed()
}

fn owner_lists_own_todos(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        expect_allowed(me(&h).collection("todos").where_eq("uid", MY_ID).get())
            .await
            .map(|_| ())
    }
    .boxed()
}

fn unfiltered_todo_query_denied(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move { expect_denied(me(&h).collection("todos").get()).await }.boxed()
}

fn foreign_todo_not_readable(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        them(&h)
            .doc("todos", "hydrate")
            .set(json!({ "foo": "bar", "uid": THEIR_ID, "name": "hi" }))
            .await?;
        expect_denied(me(&h).doc("todos", "hydrate").get()).await
    }
    .boxed()
}

fn owner_updates_own_todo(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let db = me(&h);
        db.doc("todos", "test")
            .set(json!({ "foo": "bar", "uid": MY_ID, "name": "hi" }))
            .await?;
        expect_allowed(
            db.doc("todos", "test")
                .update(json!({ "foo": "baz", "uid": MY_ID, "name": "hi" })),
        )
        .await
    }
    .boxed()
}

fn owner_cannot_reassign_todo(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let db = me(&h);
        db.doc("todos", "chores")
            .set(json!({ "uid": MY_ID, "name": "chores" }))
            .await?;
        expect_denied(db.doc("todos", "chores").update(json!({ "uid": THEIR_ID }))).await
    }
    .boxed()
}

fn foreign_todo_not_updatable(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        h.as_admin()
            .doc("todos", "test1")
            .set(json!({ "foo": "bar", "uid": THEIR_ID }))
            .await?;
        expect_denied(
            me(&h)
                .doc("todos", "test1")
                .update(json!({ "foo": "baz", "uid": MY_ID })),
        )
        .await
    }
    .boxed()
}

fn owner_deletes_own_todo(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let db = me(&h);
        db.doc("todos", "delete")
            .set(json!({ "foo": "bar", "uid": MY_ID, "name": "hi" }))
            .await?;
        expect_allowed(db.doc("todos", "delete").delete()).await
    }
    .boxed()
}

fn foreign_todo_not_deletable(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        h.as_admin()
            .doc("todos", "NO")
            .set(json!({ "foo": "bar", "uid": THEIR_ID }))
            .await?;
        expect_denied(me(&h).doc("todos", "NO").delete()).await
    }
    .boxed()
}

fn create_todo_for_self(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        expect_allowed(
            me(&h)
                .doc("todos", "long_walk")
                .set(json!({ "foo": "bar", "uid": MY_ID, "name": "hi" })),
        )
        .await
    }
    .boxed()
}

fn create_todo_for_other_denied(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        expect_denied(
            me(&h)
                .doc("todos", "long_walk2")
                .set(json!({ "foo": "bar", "uid": THEIR_ID })),
        )
        .await
    }
    .boxed()
}

fn signed_in_reads_users(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        expect_allowed(me(&h).collection("users").get())
            .await
            .map(|_| ())
    }
    .boxed()
}

fn anonymous_cannot_read_users(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move { expect_denied(h.unauthenticated().collection("users").get()).await }.boxed()
}

fn bypass_updates_any_profile(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        me(&h)
            .doc("users", "new")
            .set(json!({ "foo": "bar", "no": "no" }))
            .await?;
        expect_allowed(
            h.as_admin()
                .doc("users", "new")
                .update(json!({ "foo": "baz", "no": "yes" })),
        )
        .await
    }
    .boxed()
}

fn creates_another_profile(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let db = me(&h);
        db.doc("users", "new").set(json!({ "foo": "new" })).await?;
        let doc = expect_allowed(db.doc("users", "new").get()).await?;
        match doc {
            Some(d) if d.str_field("foo") == Some("new") => Ok(()),
            other => Err(DocGuardError::ExpectationFailed(format!(
                "expected created profile, got {other:?}"
            ))),
        }
    }
    .boxed()
}

fn bypass_grants_admin(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        me(&h)
            .doc("users", "new")
            .set(json!({ "isAdmin": "false" }))
            .await?;
        expect_allowed(
            h.as_admin()
                .doc("users", "new")
                .update(json!({ "isAdmin": "true" })),
        )
        .await
    }
    .boxed()
}

fn non_admin_cannot_grant_admin(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let db = me(&h);
        db.doc("users", "new").set(json!({ "isAdmin": "false" })).await?;
        expect_denied(db.doc("users", "new").update(json!({ "isAdmin": "true" }))).await
    }
    .boxed()
}

fn self_escalation_denied(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let db = me(&h);
        db.doc("users", MY_ID)
            .set(json!({ "email": MY_EMAIL, "isAdmin": false }))
            .await?;
        expect_denied(db.doc("users", MY_ID).update(json!({ "isAdmin": true }))).await
    }
    .boxed()
}

fn stored_admin_grants_admin(h: Harness) -> BoxFuture<'static, Result<()>> {
    async move {
        let admin = h.as_admin();
        admin
            .doc("users", MY_ID)
            .set(json!({ "email": MY_EMAIL, "isAdmin": true }))
            .await?;
        admin
            .doc("users", THEIR_ID)
            .set(json!({ "email": THEIR_EMAIL }))
            .await?;
        expect_allowed(
            me(&h)
                .doc("users", THEIR_ID)
                .update(json!({ "isAdmin": true })),
        )
        .await
    }
    .boxed()
}
