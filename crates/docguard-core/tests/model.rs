//! Document/path/query model tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use docguard_core::{Caller, DocPath, Document, ErrorCode, Query};

fn doc(v: serde_json::Value) -> Document {
    Document::try_from(v).unwrap()
}

#[test]
fn path_parse_and_display() {
    let p: DocPath = "todos/long_walk".parse().unwrap();
    assert_eq!(p.collection(), "todos");
    assert_eq!(p.id(), "long_walk");
    assert_eq!(p.to_string(), "todos/long_walk");
}

#[test]
fn path_rejects_bad_shapes() {
    for bad in ["todos", "/x", "todos/", "a/b/c"] {
        let err = bad.parse::<DocPath>().expect_err(bad);
        assert_eq!(err.code(), ErrorCode::MalformedRequest, "path={bad}");
    }
}

#[test]
fn non_object_document_is_malformed() {
    let err = Document::try_from(json!(["uid"])).expect_err("array must fail");
    assert_eq!(err.code().as_str(), "MALFORMED_REQUEST");
}

#[test]
fn truthiness_is_boolean_like() {
    let d = doc(json!({ "a": true, "b": "TRUE", "c": "false", "d": 1, "e": false }));
    assert!(d.is_truthy("a"));
    assert!(d.is_truthy("b"));
    assert!(!d.is_truthy("c"));
    assert!(!d.is_truthy("d"));
    assert!(!d.is_truthy("e"));
    assert!(!d.is_truthy("missing"));
}

#[test]
fn owner_field_must_be_a_string() {
    let d = doc(json!({ "uid": 42 }));
    assert_eq!(d.str_field("uid"), None);
}

#[test]
fn merge_replaces_top_level_fields_only() {
    let before = doc(json!({ "content": "before", "authorId": "user_abc" }));
    let after = before.merged(&doc(json!({ "content": "after" })));
    assert_eq!(after.str_field("content"), Some("after"));
    assert_eq!(after.str_field("authorId"), Some("user_abc"));
}

#[test]
fn query_pins_and_matches() {
    let q = Query::new("todos").unwrap().where_eq("uid", "user_abc");
    assert!(q.pins("uid", "user_abc"));
    assert!(!q.pins("uid", "user_xyz"));
    assert!(!q.pins("authorId", "user_abc"));
    assert!(q.matches(&doc(json!({ "uid": "user_abc", "name": "hi" }))));
    assert!(!q.matches(&doc(json!({ "uid": "user_xyz" }))));
}

#[test]
fn caller_labels() {
    assert_eq!(Caller::Unauthenticated.id(), None);
    assert_eq!(Caller::Unauthenticated.label(), "anonymous");
    let c = Caller::user("user_abc", "abc@gmail.com");
    assert!(c.is_authenticated());
    assert_eq!(c.id(), Some("user_abc"));
}
