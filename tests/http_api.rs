//! HTTP API integration tests
//!
//! Serves a scripted controller on an ephemeral port and drives it with
//! `ApiClient`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use handsfree::client::ApiClient;
use handsfree::commands::{CommandAction, CommandRegistry};
use handsfree::controller::{ControllerConfig, LoopController};
use handsfree::error::{HandsfreeError, Result};
use handsfree::history::{EntrySource, Outcome};
use handsfree::recognition::{RecognitionKind, ScriptStep, ScriptedSource};
use handsfree::server::{self, ServerState};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct Counter(Arc<AtomicUsize>);

#[async_trait]
impl CommandAction for Counter {
    async fn run(&self) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl CommandAction for Failing {
    async fn run(&self) -> Result<()> {
        Err(HandsfreeError::Action("xdotool exited with status 1".to_string()))
    }
}

struct TestServer {
    client: ApiClient,
    controller: Arc<LoopController>,
    mute: Counter,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestServer {
    async fn start(voice_steps: Vec<ScriptStep>) -> Self {
        let mute = Counter::default();
        let registry = CommandRegistry::new()
            .with_command("open browser", Counter::default())
            .with_command("mute", mute.clone())
            .with_command("volume up", Failing);
        let controller = Arc::new(LoopController::new(
            registry,
            Arc::new(ScriptedSource::new(RecognitionKind::Voice, voice_steps)),
            Arc::new(ScriptedSource::new(RecognitionKind::Visual, vec![])),
            ControllerConfig {
                poll_timeout: Duration::from_millis(20),
                stop_grace: Duration::from_millis(500),
                history_capacity: 100,
            },
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let state = ServerState::new(controller.clone(), 50);
        let handle = tokio::spawn(server::serve(listener, state, async {
            let _ = rx.await;
        }));

        Self {
            client: ApiClient::new(format!("http://{}", addr)).unwrap(),
            controller,
            mute,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_health_reports_both_loops_off() {
    let server = TestServer::start(vec![]).await;
    let health = server.client.health().await.unwrap();
    assert!(health.serving);
    assert!(!health.voice_enabled);
    assert!(!health.visual_enabled);
    server.stop().await;
}

#[tokio::test]
async fn test_toggle_voice_and_visual() {
    let server = TestServer::start(vec![]).await;
    let client = &server.client;

    let on = client.toggle(RecognitionKind::Voice, true).await.unwrap();
    assert!(on.changed);
    assert!(on.enabled);

    let again = client.toggle(RecognitionKind::Voice, true).await.unwrap();
    assert!(!again.changed);
    assert!(again.enabled);

    let visual = client.toggle(RecognitionKind::Visual, true).await.unwrap();
    assert!(visual.changed);
    let health = client.health().await.unwrap();
    assert!(health.voice_enabled);
    assert!(health.visual_enabled);

    let off = client.toggle(RecognitionKind::Voice, false).await.unwrap();
    assert!(off.changed);
    assert!(!off.enabled);

    let off_again = client.toggle(RecognitionKind::Voice, false).await.unwrap();
    assert!(!off_again.changed);

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_loops() {
    let server = TestServer::start(vec![]).await;
    server.client.toggle(RecognitionKind::Visual, true).await.unwrap();
    let controller = server.controller.clone();
    assert!(controller.is_enabled(RecognitionKind::Visual));

    server.stop().await;
    assert!(!controller.is_enabled(RecognitionKind::Visual));
}

#[tokio::test]
async fn test_execute_command_status_codes() {
    let server = TestServer::start(vec![]).await;
    let client = &server.client;

    let reply = client.execute("  MUTE ").await.unwrap();
    assert!(reply.ok);
    assert_eq!(reply.message, "Executed: mute");
    assert_eq!(server.mute.0.load(Ordering::SeqCst), 1);

    match client.execute("dance").await {
        Err(HandsfreeError::Server { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Unknown command: dance");
        }
        other => panic!("expected 400, got {:?}", other),
    }

    match client.execute("volume up").await {
        Err(HandsfreeError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("xdotool exited with status 1"));
        }
        other => panic!("expected 500, got {:?}", other),
    }

    let history = client.history(None).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|e| e.source == EntrySource::Manual));
    assert_eq!(history[0].outcome, Outcome::Success);
    assert_eq!(history[1].outcome, Outcome::UnknownCommand);
    assert!(history[2].outcome.is_error());

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_and_empty_bodies() {
    let server = TestServer::start(vec![]).await;
    let raw = reqwest::Client::new();
    let base = server.client.base_url().to_string();

    let resp = raw
        .post(format!("{}/execute-command", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);

    // Missing command defaults to "", which is unknown
    let resp = raw.post(format!("{}/execute-command", base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Missing enabled defaults to false
    let resp = raw.post(format!("{}/toggle-visual", base)).json(&serde_json::json!({})).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["changed"], false);
    assert_eq!(body["visual_enabled"], false);

    server.stop().await;
}

#[tokio::test]
async fn test_history_from_voice_loop_with_limit() {
    let server = TestServer::start(vec![
        ScriptStep::phrase("mute"),
        ScriptStep::phrase("open browser"),
        ScriptStep::phrase("sing"),
    ])
    .await;
    let client = &server.client;

    client.toggle(RecognitionKind::Voice, true).await.unwrap();
    let mut history = Vec::new();
    for _ in 0..200 {
        history = client.history(None).await.unwrap();
        if history.len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    client.toggle(RecognitionKind::Voice, false).await.unwrap();

    let payloads: Vec<&str> = history.iter().map(|e| e.payload.as_str()).collect();
    assert_eq!(payloads, vec!["mute", "open browser", "sing"]);
    assert!(history.iter().all(|e| e.source == EntrySource::Voice));
    assert!(history.windows(2).all(|pair| pair[0].seq < pair[1].seq));

    let last_two = client.history(Some(2)).await.unwrap();
    assert_eq!(last_two.len(), 2);
    assert_eq!(last_two[0].payload, "open browser");
    assert_eq!(last_two[1].payload, "sing");

    server.stop().await;
}

#[tokio::test]
async fn test_unparseable_history_limit_uses_default() {
    let server = TestServer::start(vec![]).await;
    for _ in 0..3 {
        server.client.execute("mute").await.unwrap();
    }

    let raw = reqwest::Client::new();
    for limit in ["abc", "-1", "2.5"] {
        let resp = raw
            .get(format!("{}/command-history?limit={}", server.client.base_url(), limit))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "limit={}", limit);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["history"].as_array().unwrap().len(), 3, "limit={}", limit);
    }
    server.stop().await;
}

#[tokio::test]
async fn test_available_commands_in_registration_order() {
    let server = TestServer::start(vec![]).await;
    let commands = server.client.commands().await.unwrap();
    assert_eq!(commands, vec!["open browser", "mute", "volume up"]);
    server.stop().await;
}

#[tokio::test]
async fn test_cors_headers_present() {
    let server = TestServer::start(vec![]).await;
    let resp = reqwest::Client::new()
        .get(format!("{}/health", server.client.base_url()))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().contains_key("access-control-allow-origin"));
    server.stop().await;
}
