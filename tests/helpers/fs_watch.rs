//! File system watching test helpers
//!
//! Timeouts are tuned per platform since event delivery latency differs
//! between inotify, FSEvents and ReadDirectoryChangesW.

use std::time::Duration;
use tokio::sync::mpsc;

/// Platform-specific timeouts for file system operations
pub struct PlatformTimeouts {
    /// Time to let the watcher set up before touching files
    pub watcher_setup: Duration,
    /// Total timeout for receiving reload notifications
    pub reload_notification_timeout: Duration,
}

impl PlatformTimeouts {
    /// Get platform-appropriate timeouts based on the current OS
    pub fn for_current_platform() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self {
                watcher_setup: Duration::from_millis(50),
                reload_notification_timeout: Duration::from_secs(2),
            }
        }

        #[cfg(target_os = "macos")]
        {
            Self {
                watcher_setup: Duration::from_millis(200),
                reload_notification_timeout: Duration::from_secs(3),
            }
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            Self {
                watcher_setup: Duration::from_millis(200),
                reload_notification_timeout: Duration::from_secs(4),
            }
        }
    }
}

/// Waits for a reload notification, failing after the platform timeout.
pub async fn wait_for_reload_notification(
    receiver: &mut mpsc::Receiver<()>,
    timeouts: &PlatformTimeouts,
) -> Result<(), &'static str> {
    match tokio::time::timeout(timeouts.reload_notification_timeout, receiver.recv()).await {
        Ok(Some(())) => Ok(()),
        Ok(None) => Err("Notification channel was closed"),
        Err(_) => Err("Timeout waiting for reload notification"),
    }
}
