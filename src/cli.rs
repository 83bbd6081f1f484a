//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. The global `--config` option feeds configuration
//! discovery; when absent, `SENTRY_CONF` and then `~/.sentry` are used.

use crate::core::ExternalProvider;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Process runner: configuration discovery, bootstrap and notification dispatch.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration directory (or, legacy, the override file).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, value_name = "FILTER", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Bootstrap and keep running, reloading config.yml when it changes.
    Run {
        /// Skip validation of backing service settings.
        #[arg(long)]
        skip_service_validation: bool,
    },
    /// Print where configuration is looked up.
    Discover,
    /// Create the configuration directory with default files.
    Init {
        /// Target directory. Defaults to the discovered configuration directory.
        directory: Option<PathBuf>,
    },
    /// Dispatch a notification described by a JSON file.
    Notify {
        /// JSON file with `notification`, `recipients` and optional contexts.
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        /// Provider to send through.
        #[arg(long, value_enum, default_value_t = ProviderArg::Slack)]
        provider: ProviderArg,
        /// Skip validation of backing service settings.
        #[arg(long)]
        skip_service_validation: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderArg {
    Slack,
    Email,
    Msteams,
    Discord,
}

impl From<ProviderArg> for ExternalProvider {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::Slack => ExternalProvider::Slack,
            ProviderArg::Email => ExternalProvider::Email,
            ProviderArg::Msteams => ExternalProvider::MsTeams,
            ProviderArg::Discord => ExternalProvider::Discord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notify() {
        let cli = Cli::try_parse_from([
            "sentry-runner",
            "--config",
            "/etc/sentry",
            "notify",
            "--file",
            "n.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sentry")));
        match cli.command {
            Some(Command::Notify { file, provider, skip_service_validation }) => {
                assert_eq!(file, PathBuf::from("n.json"));
                assert_eq!(provider, ProviderArg::Slack);
                assert!(!skip_service_validation);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_after_subcommand() {
        let cli = Cli::try_parse_from(["sentry-runner", "run", "--config", "/tmp/x"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Some(Command::Run { skip_service_validation: false })
        ));
    }
}
