//! Notification template selection and placeholder rendering.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use nudge_core::QueryEventKind;

const ABSENT_FIELD: &str = "-";

#[derive(Debug, Clone, Deserialize)]
struct TemplateFile {
    templates: Vec<TemplateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateEntry {
    event: QueryEventKind,
    #[serde(default)]
    states: Option<Vec<String>>,
    #[serde(default)]
    users: Option<String>,
    text: String,
}

#[derive(Debug)]
struct CompiledTemplate {
    event: QueryEventKind,
    states: Option<Vec<String>>,
    users: Option<Regex>,
    text: String,
}

/// Ordered notification templates; the first matching entry wins.
///
/// An entry applies when its event matches and its optional `states` list
/// (case-insensitive) and `users` regex both accept the notification. No
/// matching entry means the event produces no notification at all.
#[derive(Debug)]
pub struct NotificationTemplates {
    entries: Vec<CompiledTemplate>,
}

impl NotificationTemplates {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: TemplateFile =
            serde_json::from_str(raw).context("invalid notification template JSON")?;
        let mut entries = Vec::with_capacity(file.templates.len());
        for entry in file.templates {
            let users = entry
                .users
                .as_deref()
                .map(Regex::new)
                .transpose()
                .with_context(|| {
                    format!(
                        "invalid user pattern in {} template",
                        entry.event.as_str()
                    )
                })?;
            entries.push(CompiledTemplate {
                event: entry.event,
                states: entry.states,
                users,
                text: entry.text,
            });
        }
        Ok(Self { entries })
    }

    pub fn select(&self, user: &str, event: QueryEventKind, state: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| {
                entry.event == event
                    && entry.states.as_ref().map_or(true, |states| {
                        states.iter().any(|known| known.eq_ignore_ascii_case(state))
                    })
                    && entry.users.as_ref().map_or(true, |users| users.is_match(user))
            })
            .map(|entry| entry.text.as_str())
    }
}

/// Values substituted into a selected template.
#[derive(Debug, Clone, Default)]
pub struct TemplateFields {
    pub query_id: String,
    pub state: String,
    pub principal: Option<String>,
    pub failure_message: Option<String>,
    pub failure_treatment: Option<String>,
    pub wall_time: Option<String>,
    pub error_type: Option<String>,
}

/// Fills `${...}` placeholders in a selected template; absent values render
/// as `-`.
pub fn render_notification(template: &str, fields: &TemplateFields) -> String {
    template
        .replace("${QUERY_ID}", &fields.query_id)
        .replace("${STATE}", &fields.state)
        .replace(
            "${PRINCIPAL}",
            fields.principal.as_deref().unwrap_or(ABSENT_FIELD),
        )
        .replace(
            "${FAILURE_MESSAGE}",
            fields.failure_message.as_deref().unwrap_or(ABSENT_FIELD),
        )
        .replace(
            "${FAILURE_TREATMENT}",
            fields.failure_treatment.as_deref().unwrap_or(ABSENT_FIELD),
        )
        .replace(
            "${WALL_TIME}",
            fields.wall_time.as_deref().unwrap_or(ABSENT_FIELD),
        )
        .replace(
            "${ERROR_TYPE}",
            fields.error_type.as_deref().unwrap_or(ABSENT_FIELD),
        )
}

/// Expands the recipient email template for one user.
pub fn render_recipient_email(template: &str, user: &str) -> String {
    template.replace("${USER}", user)
}

/// Renders a wall-clock duration the way it reads in a chat message.
pub fn format_wall_time(millis: u64) -> String {
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.2}s", millis as f64 / 1_000.0)
    } else {
        format!("{:.2}m", millis as f64 / 60_000.0)
    }
}
