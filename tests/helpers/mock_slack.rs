//! Mock channel resolver and Slack service for notification tests.

use anyhow::Result;
use async_trait::async_trait;
use sentry_runner::core::{
    ChannelBinding, ChannelBindings, ChannelResolver, ExternalProvider, ExtraContextByRecipient,
    Notification, NotificationService, Organization, Recipient, RenderedAttachments,
    SharedContext,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Returns a fixed mapping and records each resolve call.
#[derive(Clone, Default)]
pub struct MockResolver {
    pub bindings: ChannelBindings,
    pub calls: Arc<Mutex<Vec<(u64, Vec<Recipient>, ExternalProvider)>>>,
}

impl MockResolver {
    pub fn new(bindings: ChannelBindings) -> Self {
        Self {
            bindings,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChannelResolver for MockResolver {
    async fn resolve(
        &self,
        organization: &Organization,
        recipients: &[Recipient],
        provider: ExternalProvider,
    ) -> Result<ChannelBindings> {
        self.calls
            .lock()
            .unwrap()
            .push((organization.id, recipients.to_vec(), provider));
        Ok(self.bindings.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipient: Recipient,
    pub channel: String,
    pub attachments: RenderedAttachments,
    pub shared_context: SharedContext,
}

/// Records renders and deliveries. Optionally fails rendering for one
/// recipient.
#[derive(Clone, Default)]
pub struct MockSlackService {
    pub renders: Arc<Mutex<Vec<(Recipient, Option<serde_json::Value>)>>>,
    pub deliveries: Arc<Mutex<Vec<Delivery>>>,
    pub fail_render_for: Option<Recipient>,
}

impl MockSlackService {
    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for MockSlackService {
    async fn get_attachments(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        _shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<RenderedAttachments> {
        if self.fail_render_for == Some(*recipient) {
            anyhow::bail!("render failed for {}", recipient);
        }
        let extra = extra_context
            .and_then(|by_recipient| by_recipient.get(recipient))
            .map(|ctx| serde_json::Value::Object(ctx.clone()));
        let mut renders = self.renders.lock().unwrap();
        renders.push((*recipient, extra));
        Ok(RenderedAttachments(vec![json!({
            "recipient": recipient.to_string(),
            "title": notification.title,
            "render": renders.len(),
        })]))
    }

    async fn notify_recipient(
        &self,
        _notification: &Notification,
        recipient: &Recipient,
        attachments: &RenderedAttachments,
        binding: &ChannelBinding,
        shared_context: &SharedContext,
    ) -> Result<()> {
        self.deliveries.lock().unwrap().push(Delivery {
            recipient: *recipient,
            channel: binding.channel.clone(),
            attachments: attachments.clone(),
            shared_context: shared_context.clone(),
        });
        Ok(())
    }
}
