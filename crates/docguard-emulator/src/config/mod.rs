//! Emulator config loader (strict parsing).

pub mod schema;

use std::fs;

use docguard_core::error::{DocGuardError, Result};

pub use schema::{
    CollectionRulesSpec, EmulatorConfig, EmulatorSection, HarnessSection, RulesSection,
};

/// Config path used when `DOCGUARD_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "docguard.yaml";

pub fn load_from_file(path: &str) -> Result<EmulatorConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| DocGuardError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<EmulatorConfig> {
    let cfg: EmulatorConfig = serde_yaml::from_str(s)
        .map_err(|e| DocGuardError::MalformedRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config path from the environment, falling back to the default.
pub fn config_path() -> String {
    std::env::var("DOCGUARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
