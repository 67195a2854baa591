//! Live server harness and SSE reader.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::api::http::routes;
use crate::app::{App, PresenceServices};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory_broker::InMemoryBroker;
use crate::infrastructure::memory_store::InMemoryWorldStore;
use crate::infrastructure::ports::{ClockPort, TopicSpec};

pub const TOPIC: &str = "presence.events";
pub const GROUP_ID: &str = "presence-broadcaster";

/// How long a test waits for any single frame or condition.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn topic() -> TopicSpec {
    TopicSpec {
        name: TOPIC.to_string(),
        partitions: 6,
        replication: 1,
    }
}

/// One engine instance serving on loopback.
pub struct TestServer {
    pub app: Arc<App>,
    pub broker: InMemoryBroker,
    base_url: String,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_on(InMemoryBroker::new()).await
    }

    /// Start an instance sharing `broker` with any other instance on it.
    pub async fn start_on(broker: InMemoryBroker) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let store = Arc::new(InMemoryWorldStore::new(clock.clone()));
        let presence = PresenceServices::new(Arc::new(broker.clone()), topic(), GROUP_ID);
        let app = Arc::new(App::new(presence, store.clone(), store, clock));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = routes().with_state(app.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            app,
            broker,
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// Create a user and return its id.
    pub async fn create_user(&self, name: &str) -> String {
        let (status, body) = self.post("/api/users", serde_json::json!({ "name": name })).await;
        assert_eq!(status, reqwest::StatusCode::CREATED);
        body["user"]["id"].as_str().unwrap().to_string()
    }

    /// Teleport a user to coordinates and return the target cell id.
    pub async fn teleport_to(&self, user_id: &str, x: i32, y: i32) -> String {
        let (status, body) = self
            .post(
                "/api/teleport",
                serde_json::json!({ "userId": user_id, "x": x, "y": y }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::OK, "teleport failed: {body}");
        body["cell"]["id"].as_str().unwrap().to_string()
    }

    pub async fn open_stream(&self, world_cell_id: &str) -> SseReader {
        let response = self
            .client
            .get(self.url(&format!("/api/presence/stream/{world_cell_id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(
            content_type.starts_with("text/event-stream"),
            "unexpected content type {content_type}"
        );

        SseReader {
            body: response.bytes_stream().boxed(),
            buffer: String::new(),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Client side of one presence stream.
pub struct SseReader {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: String,
}

impl SseReader {
    /// Next `data:` frame as JSON. Comment-only frames (keep-alives) are skipped.
    pub async fn next_frame(&mut self) -> Value {
        tokio::time::timeout(WAIT, self.read_frame())
            .await
            .expect("timed out waiting for a presence frame")
    }

    /// Assert that no data frame arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(frame) = tokio::time::timeout(window, self.read_frame()).await {
            panic!("unexpected presence frame: {frame}");
        }
    }

    async fn read_frame(&mut self) -> Value {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let raw: String = self.buffer.drain(..end + 2).collect();
                let data: Vec<&str> = raw
                    .lines()
                    .filter_map(|line| line.strip_prefix("data:"))
                    .map(|d| d.strip_prefix(' ').unwrap_or(d))
                    .collect();
                if data.is_empty() {
                    continue;
                }
                return serde_json::from_str(&data.join("\n")).unwrap();
            }

            let chunk = self
                .body
                .next()
                .await
                .expect("presence stream ended")
                .unwrap();
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

/// Poll `condition` until it holds or [`WAIT`] elapses.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
