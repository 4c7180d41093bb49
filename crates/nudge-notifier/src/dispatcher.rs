//! Fire-and-forget notification dispatch over the decision engine.

use std::sync::Arc;

use nudge_core::{
    decide, ChannelResolver, Decision, EvaluationContext, HistoryPageSource, MessageSender,
    NotifyError,
};

/// Everything needed to deliver one notification end to end.
pub trait NotificationTransport: ChannelResolver + HistoryPageSource + MessageSender {}

impl<T> NotificationTransport for T where T: ChannelResolver + HistoryPageSource + MessageSender {}

/// Dispatches notifications without blocking or failing the caller.
///
/// The event source firing lifecycle events holds no handle to the spawned
/// delivery chain and cannot observe or cancel it; every failure is logged
/// here and goes no further.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self { transport }
    }

    /// Spawns the delivery chain for one notification.
    pub fn dispatch(&self, recipient: &str, context: EvaluationContext, rendered_message: String) {
        let transport = Arc::clone(&self.transport);
        let recipient = recipient.to_string();
        tokio::spawn(async move {
            match deliver(transport.as_ref(), &recipient, &context, &rendered_message).await {
                Ok(Decision::Allow) => {
                    tracing::debug!(
                        recipient = %recipient,
                        event = context.event.as_str(),
                        "notification delivered"
                    );
                }
                Ok(Decision::Suppress) => {
                    tracing::debug!(
                        recipient = %recipient,
                        event = context.event.as_str(),
                        "notification suppressed by recipient command"
                    );
                }
                Err(error) => {
                    // A fetch or resolution failure means nothing is sent;
                    // never deliver on uncertain mute state.
                    tracing::warn!(
                        recipient = %recipient,
                        event = context.event.as_str(),
                        error = %error,
                        "failed to deliver notification"
                    );
                }
            }
        });
    }
}

/// Resolves the private channel, applies the mute decision, and sends the
/// rendered message on [`Decision::Allow`].
pub(crate) async fn deliver<T>(
    transport: &T,
    recipient: &str,
    context: &EvaluationContext,
    rendered_message: &str,
) -> Result<Decision, NotifyError>
where
    T: NotificationTransport + ?Sized,
{
    let channel_id = transport.open_private_channel(recipient).await?;
    let decision = decide(transport, &channel_id, context).await?;
    if decision == Decision::Allow {
        transport.send(&channel_id, rendered_message).await?;
    }
    Ok(decision)
}
