//! One-time process bootstrap.
//!
//! The `Bootstrapper` owns the process lifecycle latch. The entry point
//! constructs exactly one, calls [`Bootstrapper::bootstrap`] during startup
//! before any worker threads or tasks are spawned, and passes it by
//! reference to whatever needs the resulting settings. The latch is guarded
//! by a mutex, so a second concurrent caller blocks until the first finishes
//! and then sees the initialized state.

use crate::config::Settings;
use crate::errors::BootstrapError;
use crate::internal_metrics::Metrics;
use crate::mimetypes::MimeRegistry;
use anyhow::Result;
use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Process environment variable the override file path is published to.
pub const SETTINGS_PATH_ENV: &str = "SENTRY_CONF_PY";
/// Environment flag requesting API schema generation.
pub const API_SCHEMA_ENV: &str = "OPENAPIGENERATE";
/// Target whose warnings are always shown.
pub const WARNINGS_TARGET: &str = "sentry_runner";

/// Who triggered the bootstrap. Decides how a missing configuration is
/// presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationSurface {
    /// A command-line invocation with a user at the other end.
    Interactive,
    /// A plain library call.
    #[default]
    Library,
}

/// Lifecycle state of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Initialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// This call ran the bootstrap sequence.
    Initialized,
    /// A previous call already did; nothing happened.
    AlreadyInitialized,
}

/// Arguments of a bootstrap.
#[derive(Debug, Clone, Default)]
pub struct BootstrapRequest {
    pub override_file: PathBuf,
    pub declarative_file: Option<PathBuf>,
    pub skip_service_validation: bool,
    pub surface: InvocationSurface,
    pub api_schema_requested: bool,
}

/// Whether `OPENAPIGENERATE` is set to a non-empty value.
pub fn api_schema_requested_from_env() -> bool {
    std::env::var_os(API_SCHEMA_ENV).is_some_and(|v| !v.is_empty())
}

/// Everything the downstream initializer receives.
#[derive(Debug)]
pub struct InitContext<'a> {
    pub config_path: &'a Path,
    pub settings: &'a Settings,
    pub options: Option<&'a Path>,
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Raises the visibility of warnings for a log target.
pub trait WarningFilter: Send + Sync {
    fn enable_default_warnings(&self, target: &str) -> Result<()>;
}

/// Arranges for a file to be reloaded whenever it changes.
pub trait ReloadRegistrar: Send + Sync {
    fn reload_on_change(&self, path: &Path) -> Result<()>;
}

/// The downstream application initializer.
pub trait AppInitializer: Send + Sync {
    fn initialize(&self, ctx: &InitContext<'_>, skip_service_validation: bool) -> Result<()>;
}

/// Hook loaded when API schema generation is requested.
pub trait SchemaExtensions: Send + Sync {
    fn load(&self);
}

/// The lifecycle object holding the bootstrap latch and its results.
pub struct Bootstrapper {
    state: Mutex<BootstrapState>,
    settings: Arc<ArcSwap<Settings>>,
    settings_path: Mutex<Option<PathBuf>>,
    reload_registered: Mutex<bool>,
    mime_types: Arc<MimeRegistry>,
    warnings: Arc<dyn WarningFilter>,
    reloader: Arc<dyn ReloadRegistrar>,
    initializer: Arc<dyn AppInitializer>,
    schema_extensions: Option<Arc<dyn SchemaExtensions>>,
}

impl Bootstrapper {
    /// Creates a new, uninitialized `Bootstrapper`.
    pub fn new(
        warnings: Arc<dyn WarningFilter>,
        reloader: Arc<dyn ReloadRegistrar>,
        initializer: Arc<dyn AppInitializer>,
    ) -> Self {
        Self {
            state: Mutex::new(BootstrapState::Uninitialized),
            settings: Arc::new(ArcSwap::from_pointee(Settings::default())),
            settings_path: Mutex::new(None),
            reload_registered: Mutex::new(false),
            mime_types: Arc::new(MimeRegistry::new()),
            warnings,
            reloader,
            initializer,
            schema_extensions: None,
        }
    }

    /// Sets the hook loaded when API schema generation is requested.
    pub fn with_schema_extensions(mut self, extensions: Arc<dyn SchemaExtensions>) -> Self {
        self.schema_extensions = Some(extensions);
        self
    }

    /// Publishes settings through `handle`, so whoever else stores into it
    /// (such as a reload watcher) is seen by [`Bootstrapper::settings`].
    pub fn with_settings_handle(mut self, handle: Arc<ArcSwap<Settings>>) -> Self {
        self.settings = handle;
        self
    }

    pub fn state(&self) -> BootstrapState {
        *lock(&self.state)
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == BootstrapState::Initialized
    }

    /// The current settings, once bootstrapped. Reflects reloads made
    /// through a shared settings handle.
    pub fn settings(&self) -> Option<Arc<Settings>> {
        self.is_initialized().then(|| self.settings.load_full())
    }

    /// The override file path published by a successful bootstrap.
    pub fn settings_path(&self) -> Option<PathBuf> {
        lock(&self.settings_path).clone()
    }

    /// The static asset content types registered during bootstrap.
    pub fn mime_types(&self) -> Arc<MimeRegistry> {
        self.mime_types.clone()
    }

    /// Runs the bootstrap sequence once.
    ///
    /// Later calls after a success return `AlreadyInitialized` without
    /// touching anything. A failed call leaves the state uninitialized, so it
    /// can be retried.
    #[instrument(skip_all, fields(override_file = %request.override_file.display()))]
    pub fn bootstrap(&self, request: &BootstrapRequest) -> Result<BootstrapOutcome, BootstrapError> {
        let mut state = lock(&self.state);
        if *state == BootstrapState::Initialized {
            debug!("Already bootstrapped, skipping");
            return Ok(BootstrapOutcome::AlreadyInitialized);
        }

        if let Err(e) = self.warnings.enable_default_warnings(WARNINGS_TARGET) {
            warn!(error = %e, "Failed to enable default warnings");
        }

        let added = self.mime_types.register_static_asset_types();
        debug!(added, "Registered static asset content types");

        validate_files(request)?;

        if let Some(yaml) = request.declarative_file.as_deref().filter(|p| p.exists()) {
            // A retry after a later failure must not watch the file twice.
            let mut registered = lock(&self.reload_registered);
            if !*registered {
                match self.reloader.reload_on_change(yaml) {
                    Ok(()) => *registered = true,
                    Err(e) => {
                        warn!(path = %yaml.display(), error = %e, "Could not register config reload")
                    }
                }
            }
        }

        std::env::set_var(SETTINGS_PATH_ENV, &request.override_file);

        // Configuration errors surface here, not on first use.
        let settings = Settings::load(&request.override_file, request.declarative_file.as_deref())?;

        let ctx = InitContext {
            config_path: &request.override_file,
            settings: &settings,
            options: request.declarative_file.as_deref(),
        };
        self.initializer
            .initialize(&ctx, request.skip_service_validation)
            .map_err(BootstrapError::Initialization)?;

        if request.api_schema_requested {
            match &self.schema_extensions {
                Some(extensions) => extensions.load(),
                None => debug!("API schema generation requested but no extensions are configured"),
            }
        }

        *lock(&self.settings_path) = Some(request.override_file.clone());
        self.settings.store(Arc::new(settings));
        *state = BootstrapState::Initialized;
        Metrics::new().increment_bootstraps();
        info!("Bootstrap complete");
        Ok(BootstrapOutcome::Initialized)
    }
}

/// Checks that the configuration files the request needs exist.
fn validate_files(request: &BootstrapRequest) -> Result<(), BootstrapError> {
    let reportable = request.surface == InvocationSurface::Interactive;
    match &request.declarative_file {
        // Legacy layout: the override file is the only configuration.
        None if !request.override_file.exists() => Err(BootstrapError::ConfigurationMissing {
            path: request.override_file.clone(),
            reportable,
        }),
        Some(yaml) if !yaml.exists() && !request.override_file.exists() => {
            Err(BootstrapError::ConfigurationMissing {
                path: yaml.clone(),
                reportable,
            })
        }
        _ => Ok(()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
