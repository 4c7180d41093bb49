//! Tests for the Slack Web API client and its collaborator trait impls.

use httpmock::prelude::*;
use serde_json::json;

use super::{SlackApiClient, SlackProxyConfig};
use nudge_core::{ChannelResolver, HistoryPageSource, MessageSender, NotifyError};

fn test_client(base_url: &str) -> SlackApiClient {
    SlackApiClient::new(base_url, "xoxb-test", 3_000, None).expect("slack client")
}

#[tokio::test]
async fn functional_lookup_user_by_email_posts_form_and_returns_user_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/users.lookupByEmail")
            .header("authorization", "Bearer xoxb-test")
            .body_includes("email=alice%40example.com");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U123"}}));
    });

    let client = test_client(&server.base_url());
    let user_id = client
        .lookup_user_by_email("alice@example.com")
        .await
        .expect("lookup");

    mock.assert();
    assert_eq!(user_id, "U123");
}

#[tokio::test]
async fn functional_open_direct_channel_posts_json_and_returns_channel_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.open")
            .header("authorization", "Bearer xoxb-test")
            .json_body_includes(json!({"users": "U123"}).to_string());
        then.status(200)
            .json_body(json!({"ok": true, "channel": {"id": "D42"}}));
    });

    let client = test_client(&server.base_url());
    let channel_id = client.open_direct_channel("U123").await.expect("open");

    mock.assert();
    assert_eq!(channel_id, "D42");
}

#[tokio::test]
async fn functional_fetch_history_threads_the_latest_cursor() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.history")
            .body_includes("channel=D42")
            .body_includes("latest=100.0");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"text": "stop", "ts": "90.0"},
                {"text": "hello", "ts": "80.0"}
            ],
            "has_more": true
        }));
    });

    let client = test_client(&server.base_url());
    let page = client
        .fetch_history("D42", Some("100.0"))
        .await
        .expect("history");

    mock.assert();
    let messages = page.messages.expect("messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "stop");
    assert_eq!(messages[0].ts, "90.0");
    assert_eq!(page.has_more, Some(true));
}

#[tokio::test]
async fn regression_fetch_history_distinguishes_absent_and_empty_messages() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.history")
            .body_includes("channel=DNONE");
        then.status(200).json_body(json!({"ok": true}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.history")
            .body_includes("channel=DEMPTY");
        then.status(200)
            .json_body(json!({"ok": true, "messages": [], "has_more": false}));
    });

    let client = test_client(&server.base_url());
    let no_history = client.fetch_history("DNONE", None).await.expect("history");
    assert!(no_history.messages.is_none());
    assert!(no_history.has_more.is_none());

    let empty = client.fetch_history("DEMPTY", None).await.expect("history");
    assert_eq!(empty.messages.expect("messages").len(), 0);
    assert_eq!(empty.has_more, Some(false));
}

#[tokio::test]
async fn functional_post_message_sends_channel_and_text() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .header("authorization", "Bearer xoxb-test")
            .json_body_includes(json!({"channel": "D42", "text": "query finished"}).to_string());
        then.status(200).json_body(json!({"ok": true}));
    });

    let client = test_client(&server.base_url());
    client.send("D42", "query finished").await.expect("send");

    mock.assert();
}

#[tokio::test]
async fn functional_open_private_channel_chains_lookup_and_open() {
    let server = MockServer::start();
    let lookup = server.mock(|when, then| {
        when.method(POST).path("/users.lookupByEmail");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U7"}}));
    });
    let open = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.open")
            .json_body_includes(json!({"users": "U7"}).to_string());
        then.status(200)
            .json_body(json!({"ok": true, "channel": {"id": "D7"}}));
    });

    let client = test_client(&server.base_url());
    let channel_id = client
        .open_private_channel("bob@example.com")
        .await
        .expect("resolve");

    lookup.assert();
    open.assert();
    assert_eq!(channel_id, "D7");
}

#[tokio::test]
async fn unit_error_envelopes_map_to_typed_failures() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/users.lookupByEmail");
        then.status(200)
            .json_body(json!({"ok": false, "error": "users_not_found"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/conversations.history");
        then.status(200)
            .json_body(json!({"ok": false, "error": "channel_not_found"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200)
            .json_body(json!({"ok": false, "error": "not_in_channel"}));
    });

    let client = test_client(&server.base_url());

    match client.open_private_channel("gone@example.com").await {
        Err(NotifyError::ChannelResolution(message)) => {
            assert!(message.contains("users_not_found"), "message {message:?}")
        }
        other => panic!("expected channel resolution error, got {other:?}"),
    }
    match client.fetch_page("D42", None).await {
        Err(NotifyError::HistoryFetch(message)) => {
            assert!(message.contains("channel_not_found"), "message {message:?}")
        }
        other => panic!("expected history fetch error, got {other:?}"),
    }
    match client.send("D42", "text").await {
        Err(NotifyError::Delivery(message)) => {
            assert!(message.contains("not_in_channel"), "message {message:?}")
        }
        other => panic!("expected delivery error, got {other:?}"),
    }
}

#[tokio::test]
async fn regression_requests_are_single_attempt_on_server_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/conversations.history");
        then.status(500).body("upstream exploded");
    });

    let client = test_client(&server.base_url());
    let error = client
        .fetch_history("D42", None)
        .await
        .expect_err("server error should fail the fetch");
    assert!(error.to_string().contains("status 500"), "error {error}");
    assert_eq!(mock.calls(), 1);
}

#[test]
fn unit_proxy_config_rejects_colon_in_user() {
    let proxy = SlackProxyConfig {
        url: "http://proxy.internal:8080".to_string(),
        user: Some("bad:user".to_string()),
        password: Some("secret".to_string()),
    };
    let error = match SlackApiClient::new("https://slack.example/api", "xoxb-test", 1_000, Some(&proxy)) {
        Ok(_) => panic!("colon in proxy user must be rejected"),
        Err(error) => error,
    };
    assert!(error.to_string().contains("':'"), "error {error}");
}
