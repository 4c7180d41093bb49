//! Slack Web API client used to resolve, read, and post direct messages.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use nudge_core::{
    ChannelResolver, HistoryPage, HistoryPageSource, Message, MessageSender, NotifyError,
};

const ERROR_BODY_MAX_CHARS: usize = 320;

/// Optional outbound HTTP proxy with basic-auth credentials.
#[derive(Debug, Clone)]
pub struct SlackProxyConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackUserLookupResponse {
    ok: bool,
    #[serde(default)]
    user: Option<SlackUserRef>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackUserRef {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationOpenResponse {
    ok: bool,
    #[serde(default)]
    channel: Option<SlackChannelRef>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChannelRef {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Option<Vec<Message>>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackPostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client scoped to one bot token.
///
/// Every call is single-attempt: a notification is best-effort, so failed
/// requests surface immediately instead of being retried.
#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackApiClient {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        request_timeout_ms: u64,
        proxy: Option<&SlackProxyConfig>,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)));
        if let Some(proxy) = proxy {
            builder = builder.proxy(build_proxy(proxy)?);
        }
        let http = builder.build().context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    /// Resolves a recipient email to their Slack user id.
    pub async fn lookup_user_by_email(&self, email: &str) -> Result<String> {
        let response: SlackUserLookupResponse = self
            .post_form("users.lookupByEmail", &[("email", email)])
            .await?;
        if !response.ok {
            bail!(
                "slack users.lookupByEmail failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        response
            .user
            .map(|user| user.id)
            .ok_or_else(|| anyhow!("slack users.lookupByEmail did not return a user"))
    }

    /// Opens (or reopens) the direct-message channel with a user.
    pub async fn open_direct_channel(&self, user_id: &str) -> Result<String> {
        let response: SlackConversationOpenResponse = self
            .post_json("conversations.open", &json!({ "users": user_id }))
            .await?;
        if !response.ok {
            bail!(
                "slack conversations.open failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        response
            .channel
            .map(|channel| channel.id)
            .ok_or_else(|| anyhow!("slack conversations.open did not return a channel"))
    }

    /// Fetches one page of direct-message history, optionally bounded to
    /// messages older than `latest`.
    pub async fn fetch_history(
        &self,
        channel_id: &str,
        latest: Option<&str>,
    ) -> Result<HistoryPage> {
        let mut form: Vec<(&str, &str)> = vec![("channel", channel_id)];
        if let Some(latest) = latest {
            form.push(("latest", latest));
        }
        let response: SlackHistoryResponse =
            self.post_form("conversations.history", &form).await?;
        if !response.ok {
            bail!(
                "slack conversations.history failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(HistoryPage {
            messages: response.messages,
            has_more: response.has_more,
        })
    }

    /// Posts one message to a channel.
    pub async fn post_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let response: SlackPostMessageResponse = self
            .post_json(
                "chat.postMessage",
                &json!({ "channel": channel_id, "text": text }),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        tracing::debug!(channel = %channel_id, "posted slack message");
        Ok(())
    }

    async fn post_form<T>(&self, method: &str, form: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.bot_token)
            .form(form);
        self.execute(method, request).await
    }

    async fn post_json<T>(&self, method: &str, payload: &serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(payload);
        self.execute(method, request).await
    }

    async fn execute<T>(&self, method: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("slack api {method} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "slack api {method} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, ERROR_BODY_MAX_CHARS)
            );
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode slack {method} response"))
    }
}

#[async_trait]
impl HistoryPageSource for SlackApiClient {
    async fn fetch_page(
        &self,
        channel_id: &str,
        older_than: Option<&str>,
    ) -> Result<HistoryPage, NotifyError> {
        self.fetch_history(channel_id, older_than)
            .await
            .map_err(|error| NotifyError::HistoryFetch(format!("{error:#}")))
    }
}

#[async_trait]
impl ChannelResolver for SlackApiClient {
    async fn open_private_channel(&self, recipient: &str) -> Result<String, NotifyError> {
        let user_id = self
            .lookup_user_by_email(recipient)
            .await
            .map_err(|error| NotifyError::ChannelResolution(format!("{error:#}")))?;
        self.open_direct_channel(&user_id)
            .await
            .map_err(|error| NotifyError::ChannelResolution(format!("{error:#}")))
    }
}

#[async_trait]
impl MessageSender for SlackApiClient {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        self.post_message(channel_id, text)
            .await
            .map_err(|error| NotifyError::Delivery(format!("{error:#}")))
    }
}

fn build_proxy(config: &SlackProxyConfig) -> Result<reqwest::Proxy> {
    let mut proxy = reqwest::Proxy::all(&config.url)
        .with_context(|| format!("invalid slack http proxy {}", config.url))?;
    if let (Some(user), Some(password)) = (config.user.as_deref(), config.password.as_deref()) {
        if user.contains(':') {
            bail!("illegal character ':' in proxy user");
        }
        proxy = proxy.basic_auth(user, password);
    }
    Ok(proxy)
}

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests;
