//! Locates the configuration directory and the files inside it.

use std::path::{Path, PathBuf};

/// Environment variable naming the configuration directory (or, in the
/// legacy layout, the override file itself).
pub const CONFIG_DIR_ENV: &str = "SENTRY_CONF";
/// Used when neither an explicit directory nor `SENTRY_CONF` is given.
pub const DEFAULT_CONFIG_DIR: &str = "~/.sentry";
/// Name of the imperative override file inside the configuration directory.
pub const DEFAULT_SETTINGS_OVERRIDE: &str = "sentry.conf.py";
/// Name of the declarative settings file inside the configuration directory.
pub const DEFAULT_SETTINGS_CONF: &str = "config.yml";

const LEGACY_EXTENSIONS: [&str; 2] = ["py", "conf"];

/// Where the configuration lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    /// The configuration directory.
    pub directory: PathBuf,
    /// Path of the imperative override file.
    pub override_file: PathBuf,
    /// Path of the declarative file. `None` in the legacy layout, where
    /// `SENTRY_CONF` points straight at the override file.
    pub declarative_file: Option<PathBuf>,
}

impl ConfigLocation {
    /// Whether this location uses the legacy single-file layout.
    pub fn is_legacy(&self) -> bool {
        self.declarative_file.is_none()
    }
}

/// Discovers the configuration location, consulting `SENTRY_CONF` when no
/// directory is given.
pub fn discover(directory: Option<&Path>) -> ConfigLocation {
    discover_with(directory, std::env::var(CONFIG_DIR_ENV).ok())
}

/// Same as [`discover`], with the value of `SENTRY_CONF` passed in.
pub fn discover_with(directory: Option<&Path>, env_value: Option<String>) -> ConfigLocation {
    let raw = match directory {
        Some(dir) => dir.to_string_lossy().into_owned(),
        None => env_value.unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string()),
    };
    let expanded = shellexpand::tilde(&raw).into_owned();
    let config = PathBuf::from(&expanded);

    // Deprecated layout: the path names the override file directly.
    if has_legacy_extension(&expanded) || config.is_file() {
        let directory = config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        return ConfigLocation {
            directory,
            override_file: config,
            declarative_file: None,
        };
    }

    ConfigLocation {
        override_file: config.join(DEFAULT_SETTINGS_OVERRIDE),
        declarative_file: Some(config.join(DEFAULT_SETTINGS_CONF)),
        directory: config,
    }
}

/// Checks the raw path text, so a trailing separator disqualifies it.
fn has_legacy_extension(raw: &str) -> bool {
    LEGACY_EXTENSIONS
        .iter()
        .any(|ext| raw.ends_with(&format!(".{}", ext)))
}
