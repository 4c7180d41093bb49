//! End-to-end dispatch flow against a mock Slack Web API server.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use regex::Regex;
use serde_json::json;
use tokio::time::sleep;

use nudge_notifier::{
    NotificationBot, NotificationTemplates, QueryCompletedEvent, QueryEventHandler,
};
use nudge_slack_runtime::SlackApiClient;

fn test_bot(base_url: &str) -> NotificationBot {
    let client = SlackApiClient::new(base_url, "xoxb-test", 3_000, None).expect("slack client");
    let templates = NotificationTemplates::from_json(
        r#"{
            "templates": [
                {"event": "completed", "text": "query ${QUERY_ID} reached ${STATE}"}
            ]
        }"#,
    )
    .expect("templates");
    NotificationBot::with_transport(
        Arc::new(client),
        Regex::new("^analyst-.*$").expect("pattern"),
        "${USER}@example.com".to_string(),
        templates,
        None,
    )
}

fn completed_event() -> QueryCompletedEvent {
    QueryCompletedEvent {
        user: "analyst-1".to_string(),
        query_id: "20260806_0001".to_string(),
        principal: Some("alice".to_string()),
        state: "FINISHED".to_string(),
        failure_message: None,
        wall_time_ms: Some(2_000),
        error_type: None,
    }
}

async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}

#[tokio::test]
async fn dispatch_delivers_when_history_is_clean() {
    let server = MockServer::start();
    let lookup = server.mock(|when, then| {
        when.method(POST)
            .path("/users.lookupByEmail")
            .body_includes("email=analyst-1%40example.com");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U9"}}));
    });
    let open = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.open")
            .json_body_includes(json!({"users": "U9"}).to_string());
        then.status(200)
            .json_body(json!({"ok": true, "channel": {"id": "D9"}}));
    });
    let history = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.history")
            .body_includes("channel=D9");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [{"text": "thanks!", "ts": "100.0"}],
            "has_more": false
        }));
    });
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .json_body_includes(
                json!({"channel": "D9", "text": "query 20260806_0001 reached FINISHED"})
                    .to_string(),
            );
        then.status(200).json_body(json!({"ok": true}));
    });

    let bot = test_bot(&server.base_url());
    bot.handle_query_completed(completed_event());

    wait_for(|| post.calls() >= 1).await;
    lookup.assert();
    open.assert();
    history.assert();
    post.assert();
}

#[tokio::test]
async fn dispatch_suppresses_when_recipient_muted_the_event() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/users.lookupByEmail");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U9"}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/conversations.open");
        then.status(200)
            .json_body(json!({"ok": true, "channel": {"id": "D9"}}));
    });
    let history = server.mock(|when, then| {
        when.method(POST).path("/conversations.history");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [{"text": "stop event=completed", "ts": "100.0"}],
            "has_more": false
        }));
    });
    let post = server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200).json_body(json!({"ok": true}));
    });

    let bot = test_bot(&server.base_url());
    bot.handle_query_completed(completed_event());

    wait_for(|| history.calls() >= 1).await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(post.calls(), 0);
}

#[tokio::test]
async fn dispatch_survives_a_slack_outage_without_sending() {
    let server = MockServer::start();
    let lookup = server.mock(|when, then| {
        when.method(POST).path("/users.lookupByEmail");
        then.status(500).body("upstream exploded");
    });
    let post = server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200).json_body(json!({"ok": true}));
    });

    let bot = test_bot(&server.base_url());
    bot.handle_query_completed(completed_event());

    wait_for(|| lookup.calls() >= 1).await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(post.calls(), 0);
}
