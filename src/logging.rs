//! Log subscriber setup.
//!
//! The filter sits behind a `reload` layer so bootstrap can widen it after
//! the subscriber has been installed.

use crate::bootstrap::WarningFilter;
use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, reload, EnvFilter, Registry};

/// Handle to the installed filter.
pub struct LogFilterHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    directives: Mutex<String>,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init(default_level: &str) -> Result<LogFilterHandle> {
    let directives = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{}'", directives))?;
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(LogFilterHandle {
        handle,
        directives: Mutex::new(directives),
    })
}

impl LogFilterHandle {
    /// The directives currently in effect.
    pub fn directives(&self) -> String {
        self.directives
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Appends `<target>=warn` when `target` would otherwise log below warn.
///
/// Directives that already name `target`, or a global level of warn or more
/// verbose, leave the filter unchanged.
fn with_warnings(directives: &str, target: &str) -> Option<String> {
    let parts: Vec<&str> = directives
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    if parts.iter().any(|d| d.split('=').next() == Some(target)) {
        return None;
    }
    // EnvFilter falls back to ERROR without a global level.
    let global = parts
        .iter()
        .rev()
        .find_map(|d| d.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::ERROR);
    if global >= LevelFilter::WARN {
        return None;
    }
    Some(if parts.is_empty() {
        format!("{}=warn", target)
    } else {
        format!("{},{}=warn", parts.join(","), target)
    })
}

impl WarningFilter for LogFilterHandle {
    fn enable_default_warnings(&self, target: &str) -> Result<()> {
        let mut directives = self.directives.lock().unwrap_or_else(|e| e.into_inner());
        let Some(updated) = with_warnings(&directives, target) else {
            return Ok(());
        };
        let filter = EnvFilter::try_new(&updated)
            .with_context(|| format!("invalid log filter '{}'", updated))?;
        self.handle
            .reload(filter)
            .context("failed to reload log filter")?;
        *directives = updated;
        Ok(())
    }
}
