//! Dispatches notifications to external providers.
//!
//! `NotificationProviders` is the explicit registry the entry point fills at
//! startup. Each registered provider (currently only Slack) resolves the
//! channels of its recipients and hands rendering and delivery to a
//! `NotificationService`.
pub mod logging_service;
pub mod manager;
pub mod resolver;
pub mod slack;

pub use logging_service::LoggingNotificationService;
pub use manager::NotificationProviders;
pub use resolver::StaticChannelResolver;
pub use slack::SlackNotifier;

use crate::core::{ExtraContextByRecipient, Notification, Recipient, SharedContext};
use serde::Deserialize;

/// A notification together with who to send it to, as read by the
/// `notify` command.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyRequest {
    pub notification: Notification,
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub shared_context: SharedContext,
    #[serde(default)]
    pub extra_context: Option<ExtraContextByRecipient>,
}
