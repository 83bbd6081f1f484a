//! A delivery service that renders a minimal attachment and logs each
//! delivery instead of calling the Slack API.
//!
//! This serves as the in-process stand-in for the real Slack service and
//! can be used to validate the notification pipeline end to end.

use crate::core::{
    ChannelBinding, ExtraContextByRecipient, Notification, NotificationService, Recipient,
    RenderedAttachments, SharedContext,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Logs deliveries through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingNotificationService {
    delivered: AtomicU64,
}

impl LoggingNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deliveries logged so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

/// Merges the recipient's extra context over the shared context.
fn merged_context(
    recipient: &Recipient,
    shared_context: &SharedContext,
    extra_context: Option<&ExtraContextByRecipient>,
) -> SharedContext {
    let mut context = shared_context.clone();
    if let Some(extra) = extra_context.and_then(|by_recipient| by_recipient.get(recipient)) {
        for (key, value) in extra {
            context.insert(key.clone(), value.clone());
        }
    }
    context
}

#[async_trait]
impl NotificationService for LoggingNotificationService {
    async fn get_attachments(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<RenderedAttachments> {
        let context = merged_context(recipient, shared_context, extra_context);
        Ok(RenderedAttachments(vec![json!({
            "title": notification.title,
            "text": notification.message,
            "context": Value::Object(context),
        })]))
    }

    async fn notify_recipient(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        attachments: &RenderedAttachments,
        binding: &ChannelBinding,
        _shared_context: &SharedContext,
    ) -> Result<()> {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        info!(
            organization = %notification.organization.slug,
            metrics_key = %notification.metrics_key,
            %recipient,
            channel = %binding.channel,
            integration = binding.integration.id,
            attachments = attachments.len(),
            "Delivered Slack notification"
        );
        Ok(())
    }
}
