//! Reloads settings when the declarative configuration file changes.

use crate::bootstrap::ReloadRegistrar;
use crate::config::Settings;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use notify::{event::EventKind, Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Watches configuration files and keeps a live copy of the settings.
///
/// The watcher callback runs on notify's own thread, so registration works
/// without a tokio runtime.
pub struct ConfigWatcher {
    override_file: PathBuf,
    settings: Arc<ArcSwap<Settings>>,
    reload_notifier: Option<mpsc::Sender<()>>,
    watchers: Mutex<Vec<RecommendedWatcher>>,
}

impl ConfigWatcher {
    /// Creates a watcher that reloads settings layered over `override_file`.
    pub fn new(override_file: PathBuf) -> Self {
        Self {
            override_file,
            settings: Arc::new(ArcSwap::from_pointee(Settings::default())),
            reload_notifier: None,
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Signals `notifier` after every successful reload.
    pub fn with_notifier(mut self, notifier: mpsc::Sender<()>) -> Self {
        self.reload_notifier = Some(notifier);
        self
    }

    /// The latest successfully loaded settings.
    pub fn current(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// The handle reloads are stored into. Share it with the
    /// [`Bootstrapper`](crate::bootstrap::Bootstrapper) so running code sees
    /// reloaded settings.
    pub fn settings_handle(&self) -> Arc<ArcSwap<Settings>> {
        self.settings.clone()
    }

    /// Number of files being watched.
    pub fn watched(&self) -> usize {
        self.watchers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn reload(
        settings: &ArcSwap<Settings>,
        override_file: &Path,
        declarative_file: &Path,
        notifier: Option<&mpsc::Sender<()>>,
    ) {
        match Settings::load(override_file, Some(declarative_file)) {
            Ok(new_settings) => {
                settings.store(Arc::new(new_settings));
                info!(path = %declarative_file.display(), "Configuration reloaded");
                if let Some(notifier) = notifier {
                    if notifier.try_send(()).is_err() {
                        warn!("Reload notifier channel full or closed");
                    }
                }
            }
            Err(e) => {
                error!(path = %declarative_file.display(), error = %e, "Failed to reload configuration, keeping previous settings");
            }
        }
    }

    /// Determines if a file event concerns the watched file.
    fn should_reload(event: &Event, watched: &Path) -> bool {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => event
                .paths
                .iter()
                .any(|path| path.file_name().is_some() && path.file_name() == watched.file_name()),
            _ => false,
        }
    }
}

impl ReloadRegistrar for ConfigWatcher {
    fn reload_on_change(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        if let Ok(initial) = Settings::load(&self.override_file, Some(path)) {
            self.settings.store(Arc::new(initial));
        }

        let settings = self.settings.clone();
        let override_file = self.override_file.clone();
        let watched = path.to_path_buf();
        let notifier = self.reload_notifier.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) if Self::should_reload(&event, &watched) => {
                    Self::reload(&settings, &override_file, &watched, notifier.as_ref());
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Config watcher error"),
            },
            Config::default(),
        )
        .context("failed to create config watcher")?;

        watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", parent.display()))?;
        info!(path = %path.display(), "Watching for changes to config file");

        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(watcher);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn test_should_reload_on_modify_and_create_only() {
        let watched = Path::new("/etc/sentry/config.yml");
        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/sentry/config.yml"));
        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/sentry/config.yml"));
        let remove = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/etc/sentry/config.yml"));
        let other = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/sentry/other.yml"));

        assert!(ConfigWatcher::should_reload(&modify, watched));
        assert!(ConfigWatcher::should_reload(&create, watched));
        assert!(!ConfigWatcher::should_reload(&remove, watched));
        assert!(!ConfigWatcher::should_reload(&other, watched));
    }
}
