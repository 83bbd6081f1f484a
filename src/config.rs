//! Application settings.
//!
//! This module defines the `Settings` struct and its sub-structs, holding
//! everything the runner reads from its configuration directory. Settings
//! are layered with `figment`: built-in defaults, then the declarative
//! `config.yml`, then the `sentry.conf.py` override file, then environment
//! variables prefixed with `SENTRY_SETTINGS_`.
//!
//! The override file keeps its historical name but holds plain
//! `key = value` assignments (TOML syntax) using the same keys as
//! `config.yml`.

use crate::core::{ChannelId, Integration, Recipient};
use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables that override settings, e.g.
/// `SENTRY_SETTINGS_WEB__PORT=9001`.
pub const ENV_PREFIX: &str = "SENTRY_SETTINGS_";

/// The main settings struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Enables debug behavior across the application.
    pub debug: bool,
    /// The logging filter used when `RUST_LOG` is not set.
    pub log_level: String,
    pub system: SystemSettings,
    pub web: WebSettings,
    /// Backing services by name, each as a `host:port` endpoint.
    pub services: IndexMap<String, String>,
    pub metrics: MetricsSettings,
    pub slack: SlackSettings,
}

/// Core system options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SystemSettings {
    /// Public URL prefix of the web application.
    pub url_prefix: Option<String>,
    /// Secret used for signing. Required unless service validation is skipped.
    pub secret_key: Option<String>,
    pub admin_email: Option<String>,
}

/// Web server bind options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebSettings {
    pub host: String,
    pub port: u16,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

/// Options for the logging metrics recorder.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MetricsSettings {
    /// Log metrics to the console periodically.
    pub log_metrics: bool,
    /// Interval between metric dumps in seconds.
    pub log_aggregation_seconds: u64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            log_metrics: false,
            log_aggregation_seconds: 60,
        }
    }
}

/// Static Slack channel bindings, keyed by `user:<id>` / `team:<id>`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SlackSettings {
    pub recipients: IndexMap<Recipient, IndexMap<ChannelId, Integration>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            system: SystemSettings::default(),
            web: WebSettings::default(),
            services: IndexMap::new(),
            metrics: MetricsSettings::default(),
            slack: SlackSettings::default(),
        }
    }
}

impl Settings {
    /// Builds the layered figment for the given files.
    ///
    /// Files that do not exist contribute nothing.
    pub fn figment(override_file: &Path, declarative_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        if let Some(yaml) = declarative_file {
            figment = figment.merge(Yaml::file(yaml));
        }
        figment
            .merge(Toml::file(override_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads settings from the override file and the optional declarative file.
    pub fn load(
        override_file: &Path,
        declarative_file: Option<&Path>,
    ) -> Result<Self, figment::Error> {
        Self::figment(override_file, declarative_file).extract()
    }
}
