//! Query lifecycle notification bot with recipient-controlled muting.
//!
//! Receives query created/completed events, renders per-event templates,
//! and delivers direct messages through Slack unless the recipient muted
//! them. The mute decision is recomputed from the recipient's channel
//! history by `nudge-core` on every attempt; delivery is fire-and-forget
//! and never blocks or fails the event source.

pub mod bot;
pub mod config;
pub mod dispatcher;
pub mod knowledge;
pub mod templates;

pub use bot::{
    NotificationBot, QueryCompletedEvent, QueryCreatedEvent, QueryErrorType, QueryEventHandler,
};
pub use config::{NotifierConfig, SlackCredentials};
pub use dispatcher::{NotificationDispatcher, NotificationTransport};
pub use knowledge::KnowledgeBase;
pub use templates::{
    format_wall_time, render_notification, render_recipient_email, NotificationTemplates,
    TemplateFields,
};
