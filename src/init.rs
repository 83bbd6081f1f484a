//! Writes a fresh configuration directory.

use crate::locator::{DEFAULT_SETTINGS_CONF, DEFAULT_SETTINGS_OVERRIDE};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_YML: &str = r#"# Declarative settings. Changes are picked up while running.
debug: false
log_level: info

system:
  url_prefix: http://localhost:9000
  # secret_key: change-me
  admin_email: ""

web:
  host: 127.0.0.1
  port: 9000

services: {}

metrics:
  log_metrics: false
  log_aggregation_seconds: 60

slack:
  recipients: {}
"#;

const DEFAULT_OVERRIDE: &str = r#"# Overrides applied on top of config.yml.
# One `key = value` assignment per line, sections as [name].
#
# debug = true
#
# [web]
# port = 9001
"#;

/// What `init` did with each file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitResult {
    Created(PathBuf),
    Kept(PathBuf),
}

/// Creates `directory` and writes the default files that are missing.
///
/// Existing files are never overwritten.
pub fn init_config_dir(directory: &Path) -> Result<Vec<InitResult>> {
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    [
        (DEFAULT_SETTINGS_CONF, DEFAULT_CONFIG_YML),
        (DEFAULT_SETTINGS_OVERRIDE, DEFAULT_OVERRIDE),
    ]
    .into_iter()
    .map(|(name, contents)| -> Result<InitResult> {
        let path = directory.join(name);
        if path.exists() {
            return Ok(InitResult::Kept(path));
        }
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote default configuration");
        Ok(InitResult::Created(path))
    })
    .collect()
}
