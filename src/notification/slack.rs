//! Fans a notification out to the Slack channels of its recipients.
//!
//! This only sends to users and teams. Posting straight into a channel is
//! handled by the alert-rule actions, not here.

use crate::core::{
    ChannelBinding, ChannelResolver, ExternalProvider, ExtraContextByRecipient, Notification,
    NotificationProvider, NotificationService, Recipient, SharedContext,
};
use crate::internal_metrics::Metrics;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info_span, instrument, Instrument};

/// The Slack notification dispatcher.
pub struct SlackNotifier {
    resolver: Arc<dyn ChannelResolver>,
    service: Arc<dyn NotificationService>,
    metrics: Metrics,
}

impl SlackNotifier {
    /// Creates a new `SlackNotifier`.
    pub fn new(
        resolver: Arc<dyn ChannelResolver>,
        service: Arc<dyn NotificationService>,
        metrics: Metrics,
    ) -> Self {
        Self {
            resolver,
            service,
            metrics,
        }
    }

    /// Renders once per recipient and delivers to each of its channels.
    ///
    /// Errors from the resolver or the service are returned as-is. When that
    /// happens the completion counter is not incremented.
    #[instrument(skip_all, fields(metrics_key = %notification.metrics_key, recipients = recipients.len()))]
    pub async fn send_notification(
        &self,
        notification: &Notification,
        recipients: &[Recipient],
        shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<()> {
        let data = self
            .resolver
            .resolve(&notification.organization, recipients, ExternalProvider::Slack)
            .instrument(info_span!("notification.send_slack", step = "gen_channel_integration_map"))
            .await?;

        for (recipient, integrations_by_channel) in &data {
            if integrations_by_channel.is_empty() {
                debug!(%recipient, "No Slack channels bound, skipping recipient");
                continue;
            }

            async {
                let attachments = self
                    .service
                    .get_attachments(notification, recipient, shared_context, extra_context)
                    .instrument(info_span!("notification.send_slack", step = "gen_attachments"))
                    .await?;

                for (channel, integration) in integrations_by_channel {
                    let binding = ChannelBinding {
                        channel: channel.clone(),
                        integration: integration.clone(),
                    };
                    self.service
                        .notify_recipient(
                            notification,
                            recipient,
                            &attachments,
                            &binding,
                            shared_context,
                        )
                        .await?;
                }
                Ok::<_, anyhow::Error>(())
            }
            .instrument(info_span!("notification.send_slack", step = "send_one", %recipient))
            .await?;
        }

        self.metrics
            .increment_notifications_sent(ExternalProvider::Slack, &notification.metrics_key);
        Ok(())
    }
}

#[async_trait]
impl NotificationProvider for SlackNotifier {
    fn provider(&self) -> ExternalProvider {
        ExternalProvider::Slack
    }

    async fn send(
        &self,
        notification: &Notification,
        recipients: &[Recipient],
        shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<()> {
        self.send_notification(notification, recipients, shared_context, extra_context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelBindings, Integration, Organization, RenderedAttachments};
    use indexmap::IndexMap;
    use serde_json::json;
    use std::sync::Mutex;

    // Resolver returning a fixed mapping.
    struct FixedResolver(ChannelBindings);

    #[async_trait]
    impl ChannelResolver for FixedResolver {
        async fn resolve(
            &self,
            _organization: &Organization,
            _recipients: &[Recipient],
            _provider: ExternalProvider,
        ) -> Result<ChannelBindings> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingService {
        renders: Mutex<Vec<Recipient>>,
        deliveries: Mutex<Vec<(Recipient, String, RenderedAttachments)>>,
        fail_delivery: bool,
    }

    #[async_trait]
    impl NotificationService for RecordingService {
        async fn get_attachments(
            &self,
            _notification: &Notification,
            recipient: &Recipient,
            _shared_context: &SharedContext,
            _extra_context: Option<&ExtraContextByRecipient>,
        ) -> Result<RenderedAttachments> {
            let mut renders = self.renders.lock().unwrap();
            renders.push(*recipient);
            Ok(RenderedAttachments(vec![json!({ "render": renders.len() })]))
        }

        async fn notify_recipient(
            &self,
            _notification: &Notification,
            recipient: &Recipient,
            attachments: &RenderedAttachments,
            binding: &ChannelBinding,
            _shared_context: &SharedContext,
        ) -> Result<()> {
            if self.fail_delivery {
                anyhow::bail!("slack is down");
            }
            self.deliveries.lock().unwrap().push((
                *recipient,
                binding.channel.clone(),
                attachments.clone(),
            ));
            Ok(())
        }
    }

    fn integration() -> Integration {
        Integration {
            id: 1,
            name: "acme".to_string(),
        }
    }

    #[tokio::test]
    async fn test_renders_once_and_delivers_per_channel() {
        let mut bindings = ChannelBindings::new();
        let mut channels = IndexMap::new();
        channels.insert("C1".to_string(), integration());
        channels.insert("C2".to_string(), integration());
        channels.insert("C3".to_string(), integration());
        bindings.insert(Recipient::User(1), channels);

        let service = Arc::new(RecordingService::default());
        let notifier = SlackNotifier::new(
            Arc::new(FixedResolver(bindings)),
            service.clone(),
            Metrics::new(),
        );

        notifier
            .send_notification(
                &Notification::default(),
                &[Recipient::User(1)],
                &SharedContext::new(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(service.renders.lock().unwrap().len(), 1);
        let deliveries = service.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 3);
        let channels: Vec<_> = deliveries.iter().map(|(_, c, _)| c.as_str()).collect();
        assert_eq!(channels, vec!["C1", "C2", "C3"]);
        assert!(deliveries.iter().all(|(_, _, a)| a == &deliveries[0].2));
    }

    #[tokio::test]
    async fn test_recipient_without_channels_is_skipped() {
        let mut bindings = ChannelBindings::new();
        bindings.insert(Recipient::Team(9), IndexMap::new());

        let service = Arc::new(RecordingService::default());
        let notifier = SlackNotifier::new(
            Arc::new(FixedResolver(bindings)),
            service.clone(),
            Metrics::new(),
        );

        notifier
            .send_notification(
                &Notification::default(),
                &[Recipient::Team(9)],
                &SharedContext::new(),
                None,
            )
            .await
            .unwrap();

        assert!(service.renders.lock().unwrap().is_empty());
        assert!(service.deliveries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_error_propagates() {
        let mut bindings = ChannelBindings::new();
        let mut channels = IndexMap::new();
        channels.insert("C1".to_string(), integration());
        bindings.insert(Recipient::User(1), channels);

        let service = Arc::new(RecordingService {
            fail_delivery: true,
            ..Default::default()
        });
        let notifier =
            SlackNotifier::new(Arc::new(FixedResolver(bindings)), service, Metrics::new());

        let err = notifier
            .send_notification(
                &Notification::default(),
                &[Recipient::User(1)],
                &SharedContext::new(),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "slack is down");
    }
}
