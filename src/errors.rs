//! Errors raised while bootstrapping the process.

use std::path::PathBuf;
use thiserror::Error;

/// The message shown to an interactive user when configuration is missing.
pub const MISSING_CONFIG_HINT: &str =
    "Configuration file does not exist. Use 'sentry-runner init' to initialize the file.";

#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The required configuration file(s) do not exist.
    ///
    /// `reportable` is set when the caller is an interactive surface that
    /// should show [`BootstrapError::user_message`] rather than the raw error.
    #[error("Configuration file does not exist at '{}'", path.display())]
    ConfigurationMissing { path: PathBuf, reportable: bool },

    #[error("Failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    #[error("Application initialization failed: {0:#}")]
    Initialization(#[source] anyhow::Error),
}

impl BootstrapError {
    /// Whether the error carries a user-facing presentation hint.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            BootstrapError::ConfigurationMissing {
                reportable: true,
                ..
            }
        )
    }

    /// Text to show the user. Reportable errors get the friendly hint,
    /// everything else its plain description.
    pub fn user_message(&self) -> String {
        if self.is_reportable() {
            MISSING_CONFIG_HINT.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<figment::Error> for BootstrapError {
    fn from(err: figment::Error) -> Self {
        BootstrapError::Settings(Box::new(err))
    }
}
