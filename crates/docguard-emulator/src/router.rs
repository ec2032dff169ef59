//! Axum router wiring.

use axum::{
    routing::{delete, get},
    Router,
};

use crate::{app_state::AppState, ops, transport::http};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .route(
            "/v1/projects/:project/documents/:collection",
            get(http::list_docs),
        )
        .route(
            "/v1/projects/:project/documents/:collection/:id",
            get(http::get_doc)
                .post(http::create_doc)
                .put(http::set_doc)
                .patch(http::update_doc)
                .delete(http::delete_doc),
        )
        .route(
            "/emulator/v1/projects/:project/documents",
            delete(http::clear_all),
        )
        .with_state(state)
}
