//! Fake aria2 instance
//!
//! Serves the JSON-RPC interface (POST /jsonrpc) and the notification
//! WebSocket (GET /jsonrpc) on one ephemeral port, like aria2 does.
//! Frames queued with the `send_*` methods are delivered in order once the
//! client connects; pings received from the client are recorded.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Mutex};

#[derive(Clone)]
struct FakeState {
    secret: String,
    statuses: Arc<HashMap<String, Value>>,
    outgoing: Arc<Mutex<Option<mpsc::UnboundedReceiver<Message>>>>,
    pings: mpsc::UnboundedSender<Vec<u8>>,
}

#[derive(Default)]
pub struct FakeAria2Builder {
    secret: String,
    statuses: HashMap<String, Value>,
}

impl FakeAria2Builder {
    /// Require `token:<secret>` as the first RPC parameter.
    pub fn secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Answer `aria2.tellStatus` for `gid` with `dir` and `files`.
    pub fn status(mut self, gid: &str, dir: &Path, files: &[PathBuf]) -> Self {
        let files: Vec<Value> = files
            .iter()
            .enumerate()
            .map(|(i, path)| {
                json!({
                    "index": (i + 1).to_string(),
                    "path": path.to_string_lossy(),
                    "length": "4",
                    "completedLength": "4",
                    "selected": "true",
                    "uris": []
                })
            })
            .collect();
        self.statuses.insert(
            gid.to_string(),
            json!({ "dir": dir.to_string_lossy(), "files": files }),
        );
        self
    }

    pub async fn spawn(self) -> FakeAria2 {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (pings_tx, pings_rx) = mpsc::unbounded_channel();
        let state = FakeState {
            secret: self.secret,
            statuses: Arc::new(self.statuses),
            outgoing: Arc::new(Mutex::new(Some(frames_rx))),
            pings: pings_tx,
        };

        let app = Router::new()
            .route("/jsonrpc", get(ws_handler).post(rpc_handler))
            .route(
                "/broken",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "internal error") }),
            )
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        FakeAria2 {
            base_url: format!("http://127.0.0.1:{}", port),
            rpc_url: format!("http://127.0.0.1:{}/jsonrpc", port),
            port,
            frames: frames_tx,
            pings: Mutex::new(pings_rx),
            _shutdown_tx: Some(shutdown_tx),
        }
    }
}

/// Running fake aria2; shuts down when dropped.
pub struct FakeAria2 {
    /// e.g. "http://127.0.0.1:12345"
    pub base_url: String,
    /// RPC endpoint, e.g. "http://127.0.0.1:12345/jsonrpc"
    pub rpc_url: String,
    pub port: u16,

    frames: mpsc::UnboundedSender<Message>,
    pings: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    _shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FakeAria2 {
    pub fn builder() -> FakeAria2Builder {
        FakeAria2Builder::default()
    }

    /// Queue an `aria2.<event>` notification carrying `gids`.
    pub fn send_notification(&self, method: &str, gids: &[&str]) {
        let params: Vec<Value> = gids.iter().map(|gid| json!({ "gid": gid })).collect();
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        self.send_text(&notification.to_string());
    }

    pub fn send_text(&self, text: &str) {
        self.frames
            .send(Message::Text(text.to_string().into()))
            .expect("WebSocket handler gone");
    }

    pub fn send_close(&self, code: u16, reason: &str) {
        self.frames
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: reason.to_string().into(),
            })))
            .expect("WebSocket handler gone");
    }

    /// Payload of the next ping from the client, if one arrives in time.
    pub async fn next_ping(&self, within: Duration) -> Option<Vec<u8>> {
        let mut pings = self.pings.lock().await;
        tokio::time::timeout(within, pings.recv())
            .await
            .ok()
            .flatten()
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<FakeState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: FakeState) {
    let Some(mut outgoing) = state.outgoing.lock().await.take() else {
        return;
    };

    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    if socket.send(frame).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    let _ = state.pings.send(data.to_vec());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// aria2 answers RPC failures with HTTP 400 and a JSON-RPC error object.
fn rpc_error(id: &Value, code: i64, message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "id": id,
            "jsonrpc": "2.0",
            "error": { "code": code, "message": message }
        })),
    )
}

async fn rpc_handler(
    State(state): State<FakeState>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    if request.get("method").and_then(Value::as_str) != Some("aria2.tellStatus") {
        return rpc_error(&id, 1, "No such method");
    }

    let mut params: Vec<Value> = request
        .get("params")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if !state.secret.is_empty() {
        let expected = format!("token:{}", state.secret);
        if params.first().and_then(Value::as_str) != Some(expected.as_str()) {
            return rpc_error(&id, 1, "Unauthorized");
        }
        params.remove(0);
    }

    let gid = params.first().and_then(Value::as_str).unwrap_or_default();
    match state.statuses.get(gid) {
        Some(status) => (
            StatusCode::OK,
            Json(json!({ "id": id, "jsonrpc": "2.0", "result": status })),
        ),
        None => rpc_error(&id, 1, &format!("GID {} is not found", gid)),
    }
}
