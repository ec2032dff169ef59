//! Document REST handlers.
//!
//! Routes are scoped by project id, like the hosted emulator:
//! `/v1/projects/:project/documents/:collection[/:id]`. Every handler resolves
//! the auth context from headers and runs the operation through the store, so
//! rule evaluation is identical to the in-process harness path.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{AuthContext, DocPath, Document};

use crate::app_state::AppState;
use crate::store::DocumentStore;
use crate::transport::caller::resolve_context;

/// Map a store error to an HTTP status.
pub fn status_for(err: &DocGuardError) -> StatusCode {
    match err {
        DocGuardError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        DocGuardError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        DocGuardError::NotFound(_) => StatusCode::NOT_FOUND,
        DocGuardError::AlreadyExists(_) => StatusCode::CONFLICT,
        DocGuardError::HarnessTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        DocGuardError::ExpectationFailed(_) | DocGuardError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(state: &AppState, err: DocGuardError) -> Response {
    let code = err.code().as_str();
    state.metrics().request_errors.inc(&[("code", code)]);
    match &err {
        // expected outcome of a rule, not an application error
        DocGuardError::PermissionDenied(_) => tracing::debug!(error = %err, "request denied"),
        DocGuardError::Internal(_) => tracing::error!(error = %err, "request failed"),
        _ => tracing::warn!(error = %err, "request rejected"),
    }
    (status_for(&err), Json(json!({ "code": code, "msg": err.to_string() }))).into_response()
}

fn respond(state: &AppState, res: Result<Response>) -> Response {
    res.unwrap_or_else(|e| error_response(state, e))
}

/// Resolve auth context and reject foreign project ids.
fn prepare(state: &AppState, project: &str, headers: &HeaderMap) -> Result<AuthContext> {
    if project != state.cfg().emulator.project_id {
        return Err(DocGuardError::NotFound(format!("unknown project: {project}")));
    }
    resolve_context(state.cfg().emulator.owner_token.as_deref(), headers)
}

fn doc_json(path: &DocPath, doc: Document) -> Value {
    json!({ "path": path.to_string(), "data": doc.into_value() })
}

pub async fn get_doc(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let res = get_doc_inner(&state, &project, collection, id, &headers).await;
    respond(&state, res)
}

async fn get_doc_inner(
    state: &AppState,
    project: &str,
    collection: String,
    id: String,
    headers: &HeaderMap,
) -> Result<Response> {
    let ctx = prepare(state, project, headers)?;
    let path = DocPath::new(collection, id)?;
    match state.store().get(&ctx, &path).await? {
        Some(doc) => Ok(Json(doc_json(&path, doc)).into_response()),
        None => Err(DocGuardError::NotFound(path.to_string())),
    }
}

/// `GET .../documents/:collection?field=value&...`: each query parameter is an
/// equality filter on a string field.
pub async fn list_docs(
    State(state): State<AppState>,
    Path((project, collection)): Path<(String, String)>,
    Query(params): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let res = list_docs_inner(&state, &project, collection, params, &headers).await;
    respond(&state, res)
}

async fn list_docs_inner(
    state: &AppState,
    project: &str,
    collection: String,
    params: BTreeMap<String, String>,
    headers: &HeaderMap,
) -> Result<Response> {
    let ctx = prepare(state, project, headers)?;
    let query = params
        .into_iter()
        .fold(docguard_core::Query::new(collection)?, |q, (field, value)| {
            q.where_eq(field, value)
        });
    let docs: Vec<Value> = state
        .store()
        .list(&ctx, &query)
        .await?
        .into_iter()
        .map(|(path, doc)| doc_json(&path, doc))
        .collect();
    Ok(Json(json!({ "documents": docs })).into_response())
}

/// Which write a body-carrying route performs.
#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Create,
    Set,
    Update,
}

pub async fn create_doc(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let target = WriteTarget {
        project,
        collection,
        id,
    };
    let res = write_inner(&state, WriteKind::Create, target, &headers, body).await;
    respond(&state, res)
}

pub async fn set_doc(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let target = WriteTarget {
        project,
        collection,
        id,
    };
    let res = write_inner(&state, WriteKind::Set, target, &headers, body).await;
    respond(&state, res)
}

pub async fn update_doc(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let target = WriteTarget {
        project,
        collection,
        id,
    };
    let res = write_inner(&state, WriteKind::Update, target, &headers, body).await;
    respond(&state, res)
}

/// Path parameters of a document route.
struct WriteTarget {
    project: String,
    collection: String,
    id: String,
}

async fn write_inner(
    state: &AppState,
    write: WriteKind,
    target: WriteTarget,
    headers: &HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let ctx = prepare(state, &target.project, headers)?;
    let path = DocPath::new(target.collection, target.id)?;
    // body rejections surface as MALFORMED_REQUEST with the usual JSON error body
    let Json(body) = body.map_err(|e| DocGuardError::MalformedRequest(e.body_text()))?;
    let doc = Document::try_from(body)?;
    let store = state.store();
    let status = match write {
        WriteKind::Create => {
            store.create(&ctx, &path, doc).await?;
            StatusCode::CREATED
        }
        WriteKind::Set => {
            store.set(&ctx, &path, doc).await?;
            StatusCode::OK
        }
        WriteKind::Update => {
            store.update(&ctx, &path, doc).await?;
            StatusCode::OK
        }
    };
    Ok((status, Json(json!({ "path": path.to_string() }))).into_response())
}

pub async fn delete_doc(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let res = delete_doc_inner(&state, &project, collection, id, &headers).await;
    respond(&state, res)
}

async fn delete_doc_inner(
    state: &AppState,
    project: &str,
    collection: String,
    id: String,
    headers: &HeaderMap,
) -> Result<Response> {
    let ctx = prepare(state, project, headers)?;
    let path = DocPath::new(collection, id)?;
    state.store().delete(&ctx, &path).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `DELETE /emulator/v1/projects/:project/documents`, bypass only.
pub async fn clear_all(
    State(state): State<AppState>,
    Path(project): Path<String>,
    headers: HeaderMap,
) -> Response {
    let res = clear_all_inner(&state, &project, &headers).await;
    respond(&state, res)
}

async fn clear_all_inner(state: &AppState, project: &str, headers: &HeaderMap) -> Result<Response> {
    let AuthContext::Bypass(bypass) = prepare(state, project, headers)? else {
        return Err(DocGuardError::PermissionDenied(
            "clearing state requires the owner token".into(),
        ));
    };
    state.store().clear(&bypass).await?;
    tracing::info!(%project, "emulator state cleared");
    Ok(StatusCode::NO_CONTENT.into_response())
}
