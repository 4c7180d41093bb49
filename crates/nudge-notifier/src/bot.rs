//! Query lifecycle event handling and notification assembly.

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;

use nudge_core::{EvaluationContext, QueryEventKind};
use nudge_slack_runtime::{SlackApiClient, SlackProxyConfig};

use crate::config::{NotifierConfig, SlackCredentials};
use crate::dispatcher::{NotificationDispatcher, NotificationTransport};
use crate::knowledge::KnowledgeBase;
use crate::templates::{
    format_wall_time, render_notification, render_recipient_email, NotificationTemplates,
    TemplateFields,
};

/// A query entering execution.
#[derive(Debug, Clone)]
pub struct QueryCreatedEvent {
    pub user: String,
    pub query_id: String,
    pub principal: Option<String>,
    pub state: String,
}

/// A query reaching a terminal state.
#[derive(Debug, Clone)]
pub struct QueryCompletedEvent {
    pub user: String,
    pub query_id: String,
    pub principal: Option<String>,
    pub state: String,
    pub failure_message: Option<String>,
    pub wall_time_ms: Option<u64>,
    pub error_type: Option<QueryErrorType>,
}

/// Enumerates supported `QueryErrorType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorType {
    User,
    Internal,
    InsufficientResources,
    External,
}

impl QueryErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::InsufficientResources => "INSUFFICIENT_RESOURCES",
            Self::External => "EXTERNAL",
        }
    }
}

/// Receives query lifecycle events from the engine embedding the notifier.
///
/// Handlers return immediately; delivery happens on detached tasks and a
/// failed notification never reaches the event source.
pub trait QueryEventHandler: Send + Sync {
    fn handle_query_created(&self, event: QueryCreatedEvent);
    fn handle_query_completed(&self, event: QueryCompletedEvent);
}

/// Slack notification bot for query lifecycle events.
pub struct NotificationBot {
    dispatcher: NotificationDispatcher,
    recipients: Regex,
    email_template: String,
    templates: NotificationTemplates,
    knowledge: Option<KnowledgeBase>,
}

impl NotificationBot {
    /// Builds the bot and its Slack client from on-disk configuration.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        let credentials = SlackCredentials::load(&config.credentials_path)?;
        let proxy = config.http_proxy.as_ref().map(|url| SlackProxyConfig {
            url: url.clone(),
            user: credentials.proxy_user.clone(),
            password: credentials.proxy_password.clone(),
        });
        let client = SlackApiClient::new(
            &config.api_base,
            &credentials.bot_token,
            config.request_timeout_ms,
            proxy.as_ref(),
        )?;
        let templates = NotificationTemplates::load(&config.templates_path)?;
        let knowledge = config
            .knowledge_base_path
            .as_deref()
            .map(KnowledgeBase::load)
            .transpose()?;
        let recipients = Regex::new(&config.recipients_pattern).with_context(|| {
            format!("invalid recipients pattern {:?}", config.recipients_pattern)
        })?;
        Ok(Self::with_transport(
            Arc::new(client),
            recipients,
            config.email_template.clone(),
            templates,
            knowledge,
        ))
    }

    /// Builds the bot over an explicit transport.
    pub fn with_transport(
        transport: Arc<dyn NotificationTransport>,
        recipients: Regex,
        email_template: String,
        templates: NotificationTemplates,
        knowledge: Option<KnowledgeBase>,
    ) -> Self {
        Self {
            dispatcher: NotificationDispatcher::new(transport),
            recipients,
            email_template,
            templates,
            knowledge,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        event: QueryEventKind,
        user: String,
        query_id: String,
        principal: Option<String>,
        state: String,
        failure_message: Option<String>,
        wall_time_ms: Option<u64>,
        error_type: Option<QueryErrorType>,
    ) {
        if !self.recipients.is_match(&user) {
            return;
        }
        let Some(template) = self.templates.select(&user, event, &state) else {
            return;
        };

        let failure_treatment = match (&failure_message, &self.knowledge) {
            (Some(message), Some(knowledge)) => {
                knowledge.treatment(message).map(ToOwned::to_owned)
            }
            _ => None,
        };
        let fields = TemplateFields {
            query_id,
            state: state.clone(),
            principal: principal.clone(),
            failure_message,
            failure_treatment,
            wall_time: wall_time_ms.map(format_wall_time),
            error_type: error_type.map(|error_type| error_type.as_str().to_string()),
        };
        let text = render_notification(template, &fields);
        let email = render_recipient_email(&self.email_template, &user);
        let context = EvaluationContext {
            event,
            principal,
            state,
        };
        self.dispatcher.dispatch(&email, context, text);
    }
}

impl QueryEventHandler for NotificationBot {
    fn handle_query_created(&self, event: QueryCreatedEvent) {
        self.notify(
            QueryEventKind::Created,
            event.user,
            event.query_id,
            event.principal,
            event.state,
            None,
            None,
            None,
        );
    }

    fn handle_query_completed(&self, event: QueryCompletedEvent) {
        self.notify(
            QueryEventKind::Completed,
            event.user,
            event.query_id,
            event.principal,
            event.state,
            event.failure_message,
            event.wall_time_ms,
            event.error_type,
        );
    }
}
