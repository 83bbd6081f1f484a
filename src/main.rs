//! sentry-runner - process bootstrap and notification fan-out
//!
//! Entry point: discovers configuration, bootstraps the process once, and
//! runs the requested command.

use anyhow::{Context, Result};
use clap::Parser;
use sentry_runner::{
    bootstrap::{
        api_schema_requested_from_env, BootstrapOutcome, BootstrapRequest, Bootstrapper,
        InvocationSurface,
    },
    cli::{Cli, Command},
    config::Settings,
    errors::BootstrapError,
    init::{init_config_dir, InitResult},
    initializer::DefaultInitializer,
    internal_metrics::{logging_recorder::LoggingRecorder, Metrics},
    locator::{discover, ConfigLocation},
    logging::{self, LogFilterHandle},
    notification::{
        LoggingNotificationService, NotificationProviders, NotifyRequest, SlackNotifier,
        StaticChannelResolver,
    },
    watcher::ConfigWatcher,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_handle = Arc::new(logging::init(&cli.log_level)?);
    let location = discover(cli.config.as_deref());

    // Installed before bootstrap so its counters are kept; the logging task
    // only starts once settings enable it.
    let recorder = LoggingRecorder::new();
    if metrics::set_global_recorder(recorder.clone()).is_err() {
        warn!("A metrics recorder is already installed, logging recorder not used");
    }

    match cli.command.clone().unwrap_or(Command::Run {
        skip_service_validation: false,
    }) {
        Command::Discover => {
            print_location(&location);
            Ok(())
        }
        Command::Init { directory } => {
            let directory = directory.unwrap_or_else(|| location.directory.clone());
            for result in init_config_dir(&directory)? {
                match result {
                    InitResult::Created(path) => println!("Created {}", path.display()),
                    InitResult::Kept(path) => println!("Kept existing {}", path.display()),
                }
            }
            Ok(())
        }
        Command::Run {
            skip_service_validation,
        } => {
            let (reload_tx, reload_rx) = mpsc::channel(8);
            let watcher = Arc::new(
                ConfigWatcher::new(location.override_file.clone()).with_notifier(reload_tx),
            );
            let bootstrapper = bootstrapper(log_handle, watcher.clone());
            let settings = bootstrap_or_exit(&bootstrapper, &location, skip_service_validation);
            run(&bootstrapper, settings, &recorder, watcher, reload_rx).await
        }
        Command::Notify {
            file,
            provider,
            skip_service_validation,
        } => {
            let watcher = Arc::new(ConfigWatcher::new(location.override_file.clone()));
            let bootstrapper = bootstrapper(log_handle, watcher);
            let settings = bootstrap_or_exit(&bootstrapper, &location, skip_service_validation);

            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let request: NotifyRequest = serde_json::from_str(&contents)
                .with_context(|| format!("invalid notification file {}", file.display()))?;

            let (shutdown_tx, shutdown_rx) = watch::channel(());
            let metrics_task = spawn_metrics_logger(&recorder, &settings, shutdown_rx);

            let mut providers = NotificationProviders::new();
            providers.register(Arc::new(SlackNotifier::new(
                Arc::new(StaticChannelResolver::from_settings(&settings.slack)),
                Arc::new(LoggingNotificationService::new()),
                Metrics::new(),
            )));

            let sent = providers
                .notify(
                    provider.into(),
                    &request.notification,
                    &request.recipients,
                    &request.shared_context,
                    request.extra_context.as_ref(),
                )
                .await;

            drop(shutdown_tx);
            if let Some(handle) = metrics_task {
                if let Err(e) = handle.await {
                    error!("Metrics task panicked: {:?}", e);
                }
            }

            if !sent? {
                warn!(provider = ?provider, "Notification was not sent");
            }
            Ok(())
        }
    }
}

/// Composes the bootstrapper from the process collaborators.
fn bootstrapper(log_handle: Arc<LogFilterHandle>, watcher: Arc<ConfigWatcher>) -> Bootstrapper {
    let settings = watcher.settings_handle();
    Bootstrapper::new(log_handle, watcher, Arc::new(DefaultInitializer::new()))
        .with_settings_handle(settings)
}

/// Bootstraps, printing the user-facing message and exiting on failure.
fn bootstrap_or_exit(
    bootstrapper: &Bootstrapper,
    location: &ConfigLocation,
    skip_service_validation: bool,
) -> Arc<Settings> {
    let request = BootstrapRequest {
        override_file: location.override_file.clone(),
        declarative_file: location.declarative_file.clone(),
        skip_service_validation,
        surface: InvocationSurface::Interactive,
        api_schema_requested: api_schema_requested_from_env(),
    };

    match bootstrapper.bootstrap(&request) {
        Ok(BootstrapOutcome::Initialized) => {}
        Ok(BootstrapOutcome::AlreadyInitialized) => warn!("Process was already bootstrapped"),
        Err(err) => exit_with(&err),
    }

    match bootstrapper.settings() {
        Some(settings) => settings,
        None => exit_with(&BootstrapError::Initialization(anyhow::anyhow!(
            "bootstrap finished without settings"
        ))),
    }
}

fn exit_with(err: &BootstrapError) -> ! {
    eprintln!("Error: {}", err.user_message());
    error!(error = %err, "Bootstrap failed");
    std::process::exit(1);
}

fn print_location(location: &ConfigLocation) {
    println!("Config directory: {}", location.directory.display());
    println!("Override file:    {}", location.override_file.display());
    match &location.declarative_file {
        Some(path) => println!("Config file:      {}", path.display()),
        None => println!("Config file:      (legacy layout, override file only)"),
    }
}

/// Starts logging the recorder's metrics when enabled in settings.
fn spawn_metrics_logger(
    recorder: &LoggingRecorder,
    settings: &Settings,
    shutdown_rx: watch::Receiver<()>,
) -> Option<JoinHandle<()>> {
    if !settings.metrics.log_metrics {
        return None;
    }
    info!(
        "Logging recorder enabled. Metrics will be printed every {} seconds.",
        settings.metrics.log_aggregation_seconds
    );
    Some(recorder.spawn_logger(
        Duration::from_secs(settings.metrics.log_aggregation_seconds.max(1)),
        shutdown_rx,
    ))
}

fn log_configuration(settings: &Settings, watcher: &ConfigWatcher) {
    info!("-------------------- Configuration --------------------");
    info!("Debug: {}", settings.debug);
    info!("Web: {}:{}", settings.web.host, settings.web.port);
    info!("Services: {}", settings.services.len());
    info!("Slack recipients: {}", settings.slack.recipients.len());
    info!("Watched config files: {}", watcher.watched());
    info!("-------------------------------------------------------");
}

/// Keeps the process alive until Ctrl-C, picking up reloaded settings.
async fn run(
    bootstrapper: &Bootstrapper,
    settings: Arc<Settings>,
    recorder: &LoggingRecorder,
    watcher: Arc<ConfigWatcher>,
    mut reload_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let metrics_task = spawn_metrics_logger(recorder, &settings, shutdown_rx);
    log_configuration(&settings, &watcher);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            Some(()) = reload_rx.recv() => {
                if let Some(current) = bootstrapper.settings() {
                    info!("Reloaded configuration is now in effect");
                    log_configuration(&current, &watcher);
                }
            }
        }
    }
    info!("Shutdown signal received. Shutting down gracefully...");

    if shutdown_tx.send(()).is_err() {
        warn!("No tasks were listening for shutdown");
    }
    if let Some(handle) = metrics_task {
        if let Err(e) = handle.await {
            error!("Metrics task panicked: {:?}", e);
        }
    }

    info!("Exiting.");
    Ok(())
}
