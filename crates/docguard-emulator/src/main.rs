//! docguard emulator
//!
//! - Loads `docguard.yaml` (or `$DOCGUARD_CONFIG`)
//! - Optionally runs the built-in conformance suite against the live store
//! - Serves the document REST surface plus `/healthz` and `/metrics`

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use docguard_core::error::{DocGuardError, Result};
use docguard_emulator::{app_state, config, harness, router};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.emulator.listen.parse().map_err(|e| {
        DocGuardError::MalformedRequest(format!("emulator.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg)?;

    if state.cfg().harness.run_suite_on_boot {
        let report = state.harness().run_suite(harness::suite::builtin()).await;
        for (name, err) in &report.failed {
            tracing::warn!(
                scenario = name,
                code = err.code().as_str(),
                error = %err,
                "conformance scenario failed"
            );
        }
        tracing::info!(
            passed = report.passed.len(),
            failed = report.failed.len(),
            "conformance suite finished"
        );
    }

    let app = router::build_router(state.clone());

    tracing::info!(
        %listen,
        project = %state.cfg().emulator.project_id,
        config = %path,
        "docguard-emulator starting"
    );
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| DocGuardError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DocGuardError::Internal(format!("server failed: {e}")))
}
