//! Conformance harness: drives a rule-gated store through scenarios and
//! asserts allow/deny outcomes.
//!
//! Every scenario runs `setup (bypass) -> act (scoped caller) -> assert` behind
//! a reset barrier. Scenarios sharing a store are serialized (whichever harness
//! runs them), bounded by a timeout, and the store is cleared afterwards
//! whatever the outcome, panics included.

pub mod scoped;
pub mod suite;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{AuthContext, BypassContext, Caller};

use crate::config::HarnessSection;
use crate::obs::metrics::EmulatorMetrics;
use crate::store::{DocumentStore, MemoryStore};

pub use scoped::{CollectionRef, DocRef, ScopedDb};
pub use suite::{Scenario, SuiteReport};

/// Cheap to clone. The scenario lock lives on the store, so separate harnesses
/// over one store still run scenarios one at a time.
#[derive(Clone)]
pub struct Harness {
    inner: Arc<HarnessInner>,
}

struct HarnessInner {
    store: Arc<dyn DocumentStore>,
    scenario_timeout: Duration,
    metrics: Option<Arc<EmulatorMetrics>>,
}

impl Harness {
    pub fn new(store: Arc<dyn DocumentStore>, cfg: &HarnessSection) -> Self {
        Self::build(store, Duration::from_millis(cfg.scenario_timeout_ms), None)
    }

    /// Fresh in-memory store with the built-in rule table.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::with_default_rules()),
            &HarnessSection::default(),
        )
    }

    pub fn with_timeout(self, scenario_timeout: Duration) -> Self {
        Self::build(
            Arc::clone(&self.inner.store),
            scenario_timeout,
            self.inner.metrics.clone(),
        )
    }

    pub fn with_metrics(self, metrics: Arc<EmulatorMetrics>) -> Self {
        Self::build(
            Arc::clone(&self.inner.store),
            self.inner.scenario_timeout,
            Some(metrics),
        )
    }

    fn build(
        store: Arc<dyn DocumentStore>,
        scenario_timeout: Duration,
        metrics: Option<Arc<EmulatorMetrics>>,
    ) -> Self {
        Self {
            inner: Arc::new(HarnessInner {
                store,
                scenario_timeout,
                metrics,
            }),
        }
    }

    pub fn scenario_timeout(&self) -> Duration {
        self.inner.scenario_timeout
    }

    /// Clear all backend state.
    pub async fn reset_state(&self) -> Result<()> {
        self.inner.store.clear(&BypassContext::fixture_setup()).await
    }

    /// Handle scoped to `caller`; every operation goes through the rules.
    pub fn as_caller(&self, caller: Caller) -> ScopedDb {
        ScopedDb::new(Arc::clone(&self.inner.store), AuthContext::Request(caller))
    }

    pub fn as_user(&self, id: &str, email: &str) -> ScopedDb {
        self.as_caller(Caller::user(id, email))
    }

    pub fn unauthenticated(&self) -> ScopedDb {
        self.as_caller(Caller::Unauthenticated)
    }

    /// Handle that skips rule evaluation, for fixture setup.
    pub fn as_admin(&self) -> ScopedDb {
        ScopedDb::new(
            Arc::clone(&self.inner.store),
            AuthContext::Bypass(BypassContext::fixture_setup()),
        )
    }

    /// Run one scenario: reset, run `body` under the timeout, reset again.
    ///
    /// A timeout is reported as `HarnessTimeout`; a panic in `body` is
    /// re-raised after teardown.
    pub async fn scenario<F, Fut>(&self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(Harness) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let _serial = self.inner.store.scenario_lock().lock().await;
        self.reset_state().await?;

        let limit = self.inner.scenario_timeout;
        let outcome = AssertUnwindSafe(tokio::time::timeout(limit, body(self.clone())))
            .catch_unwind()
            .await;

        let teardown = self.reset_state().await;

        let result = match outcome {
            Err(panic) => {
                tracing::warn!(scenario = name, "scenario panicked");
                self.record(false);
                std::panic::resume_unwind(panic);
            }
            Ok(Err(_elapsed)) => Err(DocGuardError::HarnessTimeout {
                scenario: name.to_string(),
                after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
            Ok(Ok(res)) => res.and(teardown),
        };

        match &result {
            Ok(()) => tracing::debug!(scenario = name, "scenario passed"),
            Err(e) => tracing::warn!(
                scenario = name,
                code = e.code().as_str(),
                error = %e,
                "scenario failed"
            ),
        }
        self.record(result.is_ok());
        result
    }

    /// Run scenarios in order, collecting outcomes instead of stopping at the first failure.
    pub async fn run_suite(&self, scenarios: &[Scenario]) -> SuiteReport {
        let mut report = SuiteReport::default();
        for s in scenarios {
            match self.scenario(s.name, s.run).await {
                Ok(()) => report.passed.push(s.name),
                Err(e) => report.failed.push((s.name, e)),
            }
        }
        report
    }

    fn record(&self, passed: bool) {
        if let Some(m) = &self.inner.metrics {
            m.scenarios
                .inc(&[("outcome", if passed { "passed" } else { "failed" })]);
        }
    }
}

/// Await `op` and require success. A denial becomes `ExpectationFailed`; any
/// other error is returned unchanged.
pub async fn expect_allowed<T, Fut>(op: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match op.await {
        Ok(v) => Ok(v),
        Err(DocGuardError::PermissionDenied(reason)) => Err(DocGuardError::ExpectationFailed(
            format!("expected operation to be allowed, but it was denied ({reason})"),
        )),
        Err(other) => Err(other),
    }
}

/// Await `op` and require a rule denial. Success becomes `ExpectationFailed`;
/// request errors are returned unchanged, never counted as denials.
pub async fn expect_denied<T, Fut>(op: Fut) -> Result<()>
where
    Fut: Future<Output = Result<T>>,
{
    match op.await {
        Ok(_) => Err(DocGuardError::ExpectationFailed(
            "expected operation to be denied, but it succeeded".into(),
        )),
        Err(DocGuardError::PermissionDenied(_)) => Ok(()),
        Err(other) => Err(other),
    }
}
