//! Core domain types and service traits for notification delivery
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern how a notification travels from the dispatcher to the
//! external channels it is delivered on.

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The organization owning a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Organization {
    pub id: u64,
    pub slug: String,
}

/// An already-built notification, ready to be fanned out to recipients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Notification {
    /// Routing key used to name the completion metric (e.g. "resolved_activity").
    pub metrics_key: String,
    /// The organization the notification belongs to.
    pub organization: Organization,
    /// Short human-readable title.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
}

/// An individual or a team addressable for notification delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Recipient {
    User(u64),
    Team(u64),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::User(id) => write!(f, "user:{}", id),
            Recipient::Team(id) => write!(f, "team:{}", id),
        }
    }
}

impl FromStr for Recipient {
    type Err = anyhow::Error;

    /// Parses the `user:<id>` / `team:<id>` form used in settings files.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid recipient '{}': expected 'user:<id>' or 'team:<id>'", s))?;
        let id: u64 = id
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid recipient id in '{}': {}", s, e))?;
        match kind.trim() {
            "user" => Ok(Recipient::User(id)),
            "team" => Ok(Recipient::Team(id)),
            other => anyhow::bail!("unknown recipient kind '{}' in '{}'", other, s),
        }
    }
}

impl TryFrom<String> for Recipient {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Recipient> for String {
    fn from(value: Recipient) -> Self {
        value.to_string()
    }
}

/// The external providers a notification can be sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalProvider {
    Slack,
    Email,
    MsTeams,
    Discord,
}

impl fmt::Display for ExternalProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExternalProvider::Slack => "slack",
            ExternalProvider::Email => "email",
            ExternalProvider::MsTeams => "msteams",
            ExternalProvider::Discord => "discord",
        };
        f.write_str(name)
    }
}

/// Identifier of a delivery channel (e.g. a Slack channel or DM id).
pub type ChannelId = String;

/// Handle to the integration used to reach a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Integration {
    pub id: u64,
    /// External workspace name, used for logging only.
    #[serde(default)]
    pub name: String,
}

/// A resolved pairing of a channel with the integration used to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    pub channel: ChannelId,
    pub integration: Integration,
}

/// Per-recipient channel bindings, in resolution order.
pub type ChannelBindings = IndexMap<Recipient, IndexMap<ChannelId, Integration>>;

/// Rendering data shared by every recipient.
pub type SharedContext = Map<String, Value>;

/// Rendering data that overrides or extends the shared context for one recipient.
pub type ExtraContextByRecipient = HashMap<Recipient, Map<String, Value>>;

/// A channel-specific representation of a notification for one recipient.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RenderedAttachments(pub Vec<Value>);

impl RenderedAttachments {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Maps recipients to the channels they can be reached on for a provider.
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    /// Returns, for each recipient that has any, its channel bindings.
    ///
    /// Recipients without a binding may be absent from the result.
    async fn resolve(
        &self,
        organization: &Organization,
        recipients: &[Recipient],
        provider: ExternalProvider,
    ) -> Result<ChannelBindings>;
}

/// Renders and delivers notifications on one external channel type.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Renders the attachments for a single recipient.
    async fn get_attachments(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<RenderedAttachments>;

    /// Delivers rendered attachments to one channel of a recipient.
    async fn notify_recipient(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        attachments: &RenderedAttachments,
        binding: &ChannelBinding,
        shared_context: &SharedContext,
    ) -> Result<()>;
}

/// Sends a notification to a set of recipients through one provider.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// The provider kind this dispatcher handles.
    fn provider(&self) -> ExternalProvider;

    async fn send(
        &self,
        notification: &Notification,
        recipients: &[Recipient],
        shared_context: &SharedContext,
        extra_context: Option<&ExtraContextByRecipient>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_parse_and_display() {
        assert_eq!("user:42".parse::<Recipient>().unwrap(), Recipient::User(42));
        assert_eq!("team:7".parse::<Recipient>().unwrap(), Recipient::Team(7));
        assert_eq!(Recipient::Team(7).to_string(), "team:7");
    }

    #[test]
    fn test_recipient_parse_rejects_garbage() {
        assert!("42".parse::<Recipient>().is_err());
        assert!("org:1".parse::<Recipient>().is_err());
        assert!("user:abc".parse::<Recipient>().is_err());
    }

    #[test]
    fn test_recipient_serde_uses_string_form() {
        let json = serde_json::to_string(&Recipient::User(3)).unwrap();
        assert_eq!(json, "\"user:3\"");
        let back: Recipient = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Recipient::User(3));
    }
}
