//! The provider registry routes a notification to the dispatcher registered
//! for an external provider.

use crate::core::{
    ExternalProvider, ExtraContextByRecipient, Notification, NotificationProvider, Recipient,
    SharedContext,
};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Explicit mapping from provider kind to its dispatcher.
///
/// Populated once by the entry point; a later registration for the same
/// provider replaces the earlier one.
#[derive(Default, Clone)]
pub struct NotificationProviders {
    providers: HashMap<ExternalProvider, Arc<dyn NotificationProvider>>,
}

impl NotificationProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dispatcher under the provider kind it reports.
    pub fn register(&mut self, provider: Arc<dyn NotificationProvider>) -> &mut Self {
        let kind = provider.provider();
        if self.providers.insert(kind, provider).is_some() {
            warn!(provider = %kind, "Replacing previously registered notification provider");
        } else {
            debug!(provider = %kind, "Registered notification provider");
        }
        self
    }

    pub fn get(&self, provider: ExternalProvider) -> Option<&Arc<dyn NotificationProvider>> {
        self.providers.get(&provider)
    }

    pub fn is_registered(&self, provider: ExternalProvider) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Sends through the dispatcher registered for `provider`.
    ///
    /// Returns `Ok(false)` without sending anything when no dispatcher is
    /// registered for the provider.
    pub async fn notify(
        &self,
        provider: ExternalProvider,
        notification: &Notification,
        recipients: &[Recipient],
        shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<bool> {
        let Some(dispatcher) = self.providers.get(&provider) else {
            warn!(provider = %provider, "No notification provider registered, dropping notification");
            return Ok(false);
        };
        dispatcher
            .send(notification, recipients, shared_context, extra_context)
            .await?;
        Ok(true)
    }
}
