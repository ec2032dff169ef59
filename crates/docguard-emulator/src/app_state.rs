//! Shared application state for the docguard emulator.

use std::sync::Arc;

use docguard_core::error::{DocGuardError, Result};

use crate::config::EmulatorConfig;
use crate::harness::Harness;
use crate::obs::metrics::EmulatorMetrics;
use crate::rules::{Evaluator, RuleTable};
use crate::store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    store: Arc<MemoryStore>,
    metrics: Arc<EmulatorMetrics>,
}

struct AppStateInner {
    cfg: EmulatorConfig,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can report a bad rule file instead of panicking.
    pub fn new(cfg: EmulatorConfig) -> Result<Self> {
        // 1) Compile rule table
        let table = match &cfg.rules {
            Some(section) => RuleTable::from_config(section).map_err(|e| {
                DocGuardError::MalformedRequest(format!("rule table compile failed: {e}"))
            })?,
            None => RuleTable::default_rules(),
        };
        tracing::info!(
            collections = ?table.collection_names(),
            custom = cfg.rules.is_some(),
            "rule table loaded"
        );

        // 2) Store gated by the evaluator
        let metrics = Arc::new(EmulatorMetrics::default());
        let store = Arc::new(MemoryStore::with_metrics(
            Evaluator::new(table),
            Arc::clone(&metrics),
        ));

        if cfg.emulator.owner_token.is_none() {
            tracing::info!("no owner_token configured; bypass is unreachable over http");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            store,
            metrics,
        })
    }

    pub fn cfg(&self) -> &EmulatorConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    pub fn metrics(&self) -> Arc<EmulatorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Harness over this state's store, sharing its metrics.
    pub fn harness(&self) -> Harness {
        Harness::new(self.store(), &self.inner.cfg.harness).with_metrics(self.metrics())
    }
}
