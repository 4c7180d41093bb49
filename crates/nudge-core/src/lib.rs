//! Core decision engine for recipient-controlled notification muting.
//!
//! Recipients mute and unmute query notifications by typing `stop`/`resume`
//! commands back in their private channel. There is no subscription store:
//! the engine recomputes the mute decision from the paginated channel
//! history on every notification attempt, honoring whichever applicable
//! command is most recent.

pub mod commands;
pub mod decision;
pub mod types;

pub use commands::command_intent;
pub use decision::{decide, ChannelResolver, HistoryPageSource, MessageSender};
pub use types::{
    CommandAction, CommandIntent, CommandScope, Decision, EvaluationContext, HistoryPage, Message,
    MessageTs, NotifyError, QueryEventKind,
};
