//! Slack Web API runtime for the nudge notifier.
//!
//! Implements channel resolution, direct-message history paging, and
//! message delivery on top of Slack's `users.lookupByEmail`,
//! `conversations.open`, `conversations.history`, and `chat.postMessage`
//! methods.

pub mod slack_client;

pub use slack_client::{SlackApiClient, SlackProxyConfig};
