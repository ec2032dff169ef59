//! HTTP surface: handlers called directly with extracted inputs.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Path, Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Request, StatusCode,
    },
    response::Response,
    Json,
};
use serde_json::{json, Value};

use docguard_emulator::app_state::AppState;
use docguard_emulator::config::EmulatorConfig;
use docguard_emulator::transport::caller::{
    resolve_context, CALLER_EMAIL_HEADER, CALLER_ID_HEADER,
};
use docguard_emulator::transport::http;

const PROJECT: &str = "emulator-rules";
const OWNER: &str = "owner-secret";

fn state() -> AppState {
    let mut cfg = EmulatorConfig::default();
    cfg.emulator.owner_token = Some(OWNER.into());
    AppState::new(cfg).unwrap()
}

fn user(id: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(CALLER_ID_HEADER, HeaderValue::from_str(id).unwrap());
    h.insert(CALLER_EMAIL_HEADER, HeaderValue::from_static("someone@test.com"));
    h
}

fn bearer(token: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
    h
}

fn doc_path(collection: &str, id: &str) -> Path<(String, String, String)> {
    Path((PROJECT.into(), collection.into(), id.into()))
}

/// Run axum's JSON extractor over a raw request body, as the router would.
async fn extract_body(content_type: Option<&str>, raw: &str) -> Result<Json<Value>, JsonRejection> {
    let mut req = Request::builder().method("PUT").uri("/");
    if let Some(ct) = content_type {
        req = req.header(CONTENT_TYPE, ct);
    }
    let req = req.body(Body::from(raw.to_string())).unwrap();
    Json::<Value>::from_request(req, &()).await
}

async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn owner_create_then_read() {
    let st = state();
    let resp = http::create_doc(
        State(st.clone()),
        doc_path("todos", "t1"),
        user("alice"),
        Ok(Json(json!({ "uid": "alice", "name": "walk" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = http::get_doc(State(st.clone()), doc_path("todos", "t1"), user("alice")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["path"], "todos/t1");
    assert_eq!(body["data"]["name"], "walk");
}

#[tokio::test]
async fn denial_is_forbidden_with_code() {
    let st = state();
    let resp = http::create_doc(
        State(st.clone()),
        doc_path("todos", "t1"),
        user("alice"),
        Ok(Json(json!({ "uid": "bob" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "PERMISSION_DENIED");
    assert_eq!(st.metrics().request_errors.get(&[("code", "PERMISSION_DENIED")]), 1);
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let st = state();
    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let resp = http::create_doc(
            State(st.clone()),
            doc_path("todos", "dup"),
            user("alice"),
            Ok(Json(json!({ "uid": "alice" }))),
        )
        .await;
        assert_eq!(resp.status(), expected);
    }
}

#[tokio::test]
async fn request_errors_map_to_statuses() {
    let st = state();

    let resp = http::get_doc(
        State(st.clone()),
        Path(("other-project".into(), "todos".into(), "x".into())),
        user("alice"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = http::get_doc(State(st.clone()), doc_path("todos", "x"), bearer("wrong")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = http::set_doc(
        State(st.clone()),
        doc_path("todos", "x"),
        user("alice"),
        Ok(Json(json!([1, 2, 3]))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = http::update_doc(
        State(st.clone()),
        doc_path("todos", "missing"),
        user("alice"),
        Ok(Json(json!({ "name": "x" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = http::get_doc(State(st), doc_path("unknown", "x"), user("alice")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparsable_bodies_are_malformed_requests() {
    let st = state();

    let broken = extract_body(Some("application/json"), "{\"uid\": ").await;
    assert!(broken.is_err());
    let resp = http::set_doc(
        State(st.clone()),
        doc_path("todos", "x"),
        user("alice"),
        broken,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "MALFORMED_REQUEST");

    let untyped = extract_body(None, "{\"uid\": \"alice\"}").await;
    assert!(untyped.is_err());
    let resp = http::create_doc(
        State(st.clone()),
        doc_path("todos", "x"),
        user("alice"),
        untyped,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "MALFORMED_REQUEST");

    assert_eq!(st.metrics().request_errors.get(&[("code", "MALFORMED_REQUEST")]), 2);
    assert!(st.store().is_empty());
}

#[tokio::test]
async fn bypass_reads_missing_document_as_not_found() {
    let st = state();
    let resp = http::get_doc(State(st), doc_path("todos", "nope"), bearer(OWNER)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_query_parameters() {
    let st = state();
    for (id, uid) in [("a", "alice"), ("b", "bob"), ("c", "alice")] {
        let resp = http::set_doc(
            State(st.clone()),
            doc_path("todos", id),
            bearer(OWNER),
            Ok(Json(json!({ "uid": uid }))),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let params = BTreeMap::from([("uid".to_string(), "alice".to_string())]);
    let resp = http::list_docs(
        State(st.clone()),
        Path((PROJECT.into(), "todos".into())),
        Query(params),
        user("alice"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let paths: Vec<&str> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, ["todos/a", "todos/c"]);

    let resp = http::list_docs(
        State(st),
        Path((PROJECT.into(), "todos".into())),
        Query(BTreeMap::new()),
        user("alice"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn clear_requires_owner_token() {
    let st = state();
    http::set_doc(
        State(st.clone()),
        doc_path("todos", "a"),
        bearer(OWNER),
        Ok(Json(json!({ "uid": "alice" }))),
    )
    .await;
    assert_eq!(st.store().len(), 1);

    let resp = http::clear_all(State(st.clone()), Path(PROJECT.into()), user("alice")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(st.store().len(), 1);

    let resp = http::clear_all(State(st.clone()), Path(PROJECT.into()), bearer(OWNER)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(st.store().is_empty());
}

#[tokio::test]
async fn delete_own_document() {
    let st = state();
    http::set_doc(
        State(st.clone()),
        doc_path("todos", "a"),
        user("alice"),
        Ok(Json(json!({ "uid": "alice" }))),
    )
    .await;
    let resp = http::delete_doc(State(st.clone()), doc_path("todos", "a"), user("bob")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = http::delete_doc(State(st.clone()), doc_path("todos", "a"), user("alice")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(st.store().is_empty());
}

#[test]
fn bypass_needs_configured_token() {
    let headers = bearer("anything");
    let err = resolve_context(None, &headers).unwrap_err();
    assert_eq!(err.code().as_str(), "MALFORMED_REQUEST");

    assert!(resolve_context(Some("anything"), &headers).unwrap().is_bypass());
    let anon = resolve_context(None, &HeaderMap::new()).unwrap();
    assert!(!anon.caller().unwrap().is_authenticated());

    let mut empty = HeaderMap::new();
    empty.insert(CALLER_ID_HEADER, HeaderValue::from_static(""));
    assert!(resolve_context(None, &empty).is_err());
}
