//! Paginated recency-wins scan deciding whether a notification is delivered.

use async_trait::async_trait;

use crate::commands::command_intent;
use crate::types::{
    CommandAction, CommandIntent, Decision, EvaluationContext, HistoryPage, MessageTs, NotifyError,
};

/// Source of direct-message history pages, newest-first.
#[async_trait]
pub trait HistoryPageSource: Send + Sync {
    /// Fetches the page of messages strictly older than `older_than`, or
    /// the newest page when no cursor is given.
    async fn fetch_page(
        &self,
        channel_id: &str,
        older_than: Option<&str>,
    ) -> Result<HistoryPage, NotifyError>;
}

/// Maps a recipient identifier to their private channel id.
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    async fn open_private_channel(&self, recipient: &str) -> Result<String, NotifyError>;
}

/// Posts one rendered message to a channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Decides whether a notification to `channel_id` is delivered or muted.
///
/// Pages through the channel history newest-first, matching every message
/// against the command grammar. Within the pages fetched so far the
/// matching message with the largest timestamp wins, regardless of scan
/// order; the scan stops at the first page containing any match, because
/// pages arrive newest-first and no unfetched page can hold a more recent
/// command. No command anywhere, or no history at all, resolves to
/// [`Decision::Allow`].
pub async fn decide<S>(
    source: &S,
    channel_id: &str,
    context: &EvaluationContext,
) -> Result<Decision, NotifyError>
where
    S: HistoryPageSource + ?Sized,
{
    let mut best: Option<(CommandIntent, MessageTs)> = None;
    let mut cursor: Option<(String, MessageTs)> = None;

    loop {
        let page = source
            .fetch_page(channel_id, cursor.as_ref().map(|(raw, _)| raw.as_str()))
            .await?;
        let Some(messages) = page.messages else {
            // No history exists for this channel; nothing was ever muted.
            return Ok(Decision::Allow);
        };

        for message in &messages {
            let ts = MessageTs::parse(&message.ts)?;
            if let Some(found) = command_intent(&message.text, context) {
                if best.map_or(true, |(_, best_ts)| ts > best_ts) {
                    best = Some((found, ts));
                }
            }
            // The cursor tracks the oldest timestamp seen so far; the next
            // fetch pages further back from that boundary.
            if cursor.as_ref().map_or(true, |(_, oldest)| ts < *oldest) {
                cursor = Some((message.ts.clone(), ts));
            }
        }

        if let Some((intent, _)) = best {
            return Ok(match intent.action {
                CommandAction::Resume => Decision::Allow,
                CommandAction::Stop => Decision::Suppress,
            });
        }
        if !page.has_more.unwrap_or(false) {
            return Ok(Decision::Allow);
        }
    }
}
