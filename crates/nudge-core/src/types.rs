//! Domain types shared by the decision engine and its collaborators.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by notification decision and delivery flows.
///
/// All variants are caught at the dispatcher boundary; none of them ever
/// propagate to the component that triggered the notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("malformed message timestamp {raw:?}")]
    MalformedTimestamp { raw: String },
    #[error("channel resolution failed: {0}")]
    ChannelResolution(String),
    #[error("history fetch failed: {0}")]
    HistoryFetch(String),
    #[error("message delivery failed: {0}")]
    Delivery(String),
}

/// Message timestamp kept in its wire form and compared numerically.
///
/// Slack serializes timestamps as decimal seconds-since-epoch strings with
/// sub-second precision ("1716923456.000200"). Comparing the raw strings
/// lexicographically misorders them, so all ordering goes through the
/// parsed value. A timestamp that does not parse fails the whole decision
/// rather than being skipped, since skipping could invert recency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MessageTs(f64);

impl MessageTs {
    pub fn parse(raw: &str) -> Result<Self, NotifyError> {
        let malformed = || NotifyError::MalformedTimestamp {
            raw: raw.to_string(),
        };
        let value = raw.trim().parse::<f64>().map_err(|_| malformed())?;
        if !value.is_finite() {
            return Err(malformed());
        }
        Ok(Self(value))
    }
}

/// One historical direct-message entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: String,
    pub ts: String,
}

/// One page of channel history, fetched newest-first.
///
/// `messages` being absent means no history exists for the channel at all,
/// which is distinct from an empty page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// Enumerates supported `QueryEventKind` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryEventKind {
    Created,
    Completed,
}

impl QueryEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Completed => "completed",
        }
    }
}

/// Immutable per-attempt context identifying which scoped commands apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    pub event: QueryEventKind,
    pub principal: Option<String>,
    pub state: String,
}

/// Enumerates supported `CommandAction` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Resume,
    Stop,
}

/// The granularity a stop/resume command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Global,
    ByPrincipal,
    ByEvent,
    ByState,
}

/// A stop/resume command parsed from one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandIntent {
    pub action: CommandAction,
    pub scope: CommandScope,
}

/// The outcome of one notification-suppression evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Suppress,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Suppress => "suppress",
        }
    }
}
