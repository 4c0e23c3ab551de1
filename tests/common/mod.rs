//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use peerbus::application::{Adapter, AdapterOptions};
use peerbus::config::Settings;
use peerbus::infrastructure::transport::MulticastMode;
use peerbus::presentation::http::routes;
use peerbus::presentation::websocket::demo;
use peerbus::startup::{AppState, Application};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame before failing
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings bound to an ephemeral local port
pub fn test_settings(multicast: MulticastMode) -> Settings {
    let mut settings = Settings::defaults().expect("default settings");
    settings.server.host = "127.0.0.1".into();
    settings.server.port = 0;
    settings.websocket.multicast = multicast;
    settings
}

/// Live server on a background task
pub struct TestApp {
    pub addr: SocketAddr,
    pub adapter: Arc<Adapter>,
    pub ws_path: String,
}

impl TestApp {
    /// Spawn the demo server
    pub async fn spawn() -> Self {
        Self::spawn_with(MulticastMode::Manual).await
    }

    pub async fn spawn_with(multicast: MulticastMode) -> Self {
        let settings = test_settings(multicast);
        let options = AdapterOptions::new(demo::hooks()).multicast(multicast);
        Self::spawn_with_options(settings, options).await
    }

    pub async fn spawn_with_options(settings: Settings, options: AdapterOptions) -> Self {
        let ws_path = settings.websocket.path.clone();
        let app = Application::build_with_options(settings, options)
            .await
            .expect("failed to build application");
        let addr = app.local_addr().expect("no local address");
        let adapter = app.adapter().clone();

        tokio::spawn(app.run_until_stopped());

        Self {
            addr,
            adapter,
            ws_path,
        }
    }

    pub fn ws_url(&self, query: &str) -> String {
        format!("ws://{}{}{}", self.addr, self.ws_path, query)
    }

    /// Connect a client to the WebSocket endpoint
    pub async fn connect(&self) -> Client {
        let (client, _response) = connect_async(self.ws_url(""))
            .await
            .expect("failed to connect");
        client
    }

    /// Connect and consume the welcome frame
    pub async fn connect_welcomed(&self) -> (Client, String) {
        let mut client = self.connect().await;
        let welcome = next_text(&mut client).await;
        let id = welcome
            .strip_prefix("Welcome to the server ")
            .and_then(|rest| rest.split('!').next())
            .expect("unexpected welcome frame")
            .to_string();
        (client, id)
    }

    pub async fn connect_request(
        &self,
        query: &str,
        headers: &[(&'static str, &'static str)],
    ) -> Result<
        (Client, tokio_tungstenite::tungstenite::handshake::client::Response),
        tokio_tungstenite::tungstenite::Error,
    > {
        let mut request = self.ws_url(query).into_client_request()?;
        for (name, value) in headers {
            request
                .headers_mut()
                .insert(*name, value.parse().expect("invalid header value"));
        }
        connect_async(request).await
    }

    /// Plain HTTP/1.1 GET; returns status code and body
    pub async fn http_get(&self, path: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(self.addr).await.expect("connect");
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, self.addr
        );
        stream.write_all(request.as_bytes()).await.expect("write");

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.expect("read");

        let status = raw
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("malformed status line");
        let body = raw
            .split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
        (status, body)
    }

    /// Wait until the registry holds `count` peers
    pub async fn wait_for_peers(&self, count: usize) {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while self.adapter.peers().len() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {} peers, found {}",
                count,
                self.adapter.peers().len()
            )
        });
    }
}

/// Next data frame, skipping control frames
pub async fn next_message(client: &mut Client) -> Message {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(message)) => return message,
                other => panic!("connection ended: {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for frame")
}

pub async fn next_text(client: &mut Client) -> String {
    match next_message(client).await {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("expected text frame, got {:?}", other),
    }
}

/// Assert nothing arrives within a short window
pub async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::text(text.to_string()))
        .await
        .expect("failed to send");
}

/// Router without a listener, for request/response tests
pub struct TestRouter {
    pub router: Router,
    pub adapter: Arc<Adapter>,
}

impl TestRouter {
    pub fn new() -> Self {
        let settings = test_settings(MulticastMode::Manual);
        let adapter = Arc::new(Adapter::new(AdapterOptions::new(demo::hooks())));
        let state = AppState {
            adapter: adapter.clone(),
            settings: Arc::new(settings),
        };
        Self {
            router: routes::create_router(state),
            adapter,
        }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Collect a response body as a string
pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}
