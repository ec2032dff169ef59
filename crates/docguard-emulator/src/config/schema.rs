use std::collections::BTreeMap;

use serde::Deserialize;
use docguard_core::error::{DocGuardError, Result};

use crate::rules::Rule;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmulatorConfig {
    pub version: u32,

    #[serde(default)]
    pub emulator: EmulatorSection,

    #[serde(default)]
    pub harness: HarnessSection,

    /// Absent => built-in rule table.
    #[serde(default)]
    pub rules: Option<RulesSection>,
}

impl EmulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(DocGuardError::MalformedRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.emulator.validate()?;
        self.harness.validate()?;

        Ok(())
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            emulator: EmulatorSection::default(),
            harness: HarnessSection::default(),
            rules: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmulatorSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Bearer token that selects the bypass context over HTTP. None => bypass unreachable.
    #[serde(default)]
    pub owner_token: Option<String>,
}

impl Default for EmulatorSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            project_id: default_project_id(),
            owner_token: None,
        }
    }
}

impl EmulatorSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            return Err(DocGuardError::MalformedRequest(
                "emulator.listen must not be empty".into(),
            ));
        }
        if self.project_id.is_empty() || self.project_id.contains('/') {
            return Err(DocGuardError::MalformedRequest(
                "emulator.project_id must be non-empty and contain no '/'".into(),
            ));
        }
        if matches!(&self.owner_token, Some(t) if t.trim().is_empty()) {
            return Err(DocGuardError::MalformedRequest(
                "emulator.owner_token must not be empty when set".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".into()
}
fn default_project_id() -> String {
    "emulator-rules".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessSection {
    #[serde(default = "default_scenario_timeout_ms")]
    pub scenario_timeout_ms: u64,

    /// Run the built-in conformance suite once at startup.
    #[serde(default)]
    pub run_suite_on_boot: bool,
}

impl Default for HarnessSection {
    fn default() -> Self {
        Self {
            scenario_timeout_ms: default_scenario_timeout_ms(),
            run_suite_on_boot: false,
        }
    }
}

impl HarnessSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.scenario_timeout_ms) {
            return Err(DocGuardError::MalformedRequest(
                "harness.scenario_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_scenario_timeout_ms() -> u64 {
    5000
}

/// Declarative rule file: `collections.<name>.<op>: { rule: ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesSection {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionRulesSpec>,
}

/// `read` covers get+list, `write` covers create+update+delete; per-op keys win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionRulesSpec {
    #[serde(default)]
    pub read: Option<Rule>,
    #[serde(default)]
    pub write: Option<Rule>,
    #[serde(default)]
    pub get: Option<Rule>,
    #[serde(default)]
    pub list: Option<Rule>,
    #[serde(default)]
    pub create: Option<Rule>,
    #[serde(default)]
    pub update: Option<Rule>,
    #[serde(default)]
    pub delete: Option<Rule>,
}
