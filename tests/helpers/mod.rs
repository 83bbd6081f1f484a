#![allow(dead_code)]
pub mod fs_watch;
pub mod mock_slack;
pub mod test_metrics;

use indexmap::IndexMap;
use sentry_runner::core::{ChannelBindings, Integration, Recipient};

/// Builds bindings where each recipient gets `channels` channels named
/// `<recipient>-C<n>`.
pub fn bindings(counts: &[(Recipient, usize)]) -> ChannelBindings {
    counts
        .iter()
        .map(|(recipient, channels)| {
            let by_channel: IndexMap<String, Integration> = (0..*channels)
                .map(|n| {
                    (
                        format!("{}-C{}", recipient, n),
                        Integration {
                            id: 1,
                            name: "acme".to_string(),
                        },
                    )
                })
                .collect();
            (*recipient, by_channel)
        })
        .collect()
}
