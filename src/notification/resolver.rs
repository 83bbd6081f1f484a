//! Channel resolution backed by the `slack.recipients` settings table.

use crate::config::SlackSettings;
use crate::core::{ChannelBindings, ChannelResolver, ExternalProvider, Organization, Recipient};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Resolves Slack channels from a static table.
#[derive(Debug, Clone, Default)]
pub struct StaticChannelResolver {
    table: ChannelBindings,
}

impl StaticChannelResolver {
    pub fn new(table: ChannelBindings) -> Self {
        Self { table }
    }

    pub fn from_settings(settings: &SlackSettings) -> Self {
        Self::new(settings.recipients.clone())
    }
}

#[async_trait]
impl ChannelResolver for StaticChannelResolver {
    async fn resolve(
        &self,
        organization: &Organization,
        recipients: &[Recipient],
        provider: ExternalProvider,
    ) -> Result<ChannelBindings> {
        if provider != ExternalProvider::Slack {
            debug!(%provider, "Static table only holds Slack channels");
            return Ok(ChannelBindings::new());
        }

        let resolved: ChannelBindings = recipients
            .iter()
            .filter_map(|recipient| {
                self.table
                    .get(recipient)
                    .map(|channels| (*recipient, channels.clone()))
            })
            .collect();
        debug!(
            organization = %organization.slug,
            requested = recipients.len(),
            resolved = resolved.len(),
            "Resolved Slack channels"
        );
        Ok(resolved)
    }
}
