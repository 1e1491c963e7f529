//! aria2 WebSocket notification channel.
//!
//! One long-lived connection per process. The read loop decodes each frame as a
//! JSON-RPC notification and awaits the dispatcher inline, so a notification is
//! fully handled before the next frame is read. A keepalive task runs next to it
//! and shares only the write half of the socket.

use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, Stream, StreamExt};
use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dispatcher::Dispatcher;
use super::keepalive::{run_keepalive, KeepaliveSettings};
use crate::aria2::{websocket_endpoint, EndpointError, Notification};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("WebSocket connection failed: {0}")]
    Connect(#[from] WsError),
}

/// Why a channel session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The process shutdown token was cancelled.
    Shutdown,
    /// aria2 sent a close frame.
    RemoteClosed { code: Option<u16>, reason: String },
    /// The stream ended without a close frame.
    StreamEnded,
    /// A keepalive probe failed and tore the session down.
    KeepaliveFailed,
    /// A frame could not be decoded as a notification.
    DecodeFailed(String),
    /// The connection failed while reading.
    ConnectionFailed(String),
}

impl SessionEnd {
    /// Whether the session ended the way a normal shutdown does.
    pub fn is_expected(&self) -> bool {
        match self {
            SessionEnd::Shutdown | SessionEnd::StreamEnded => true,
            SessionEnd::RemoteClosed { code, .. } => code.map_or(true, is_expected_close_code),
            _ => false,
        }
    }
}

fn is_expected_close_code(code: u16) -> bool {
    matches!(CloseCode::from(code), CloseCode::Normal | CloseCode::Away)
}

/// Closes the write half at most once, however many holders call it.
pub struct ChannelCloser<S> {
    sink: Arc<Mutex<S>>,
    closed: Arc<AtomicBool>,
    timeout: Duration,
}

impl<S> Clone for ChannelCloser<S> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            closed: self.closed.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S> ChannelCloser<S>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    pub fn new(sink: Arc<Mutex<S>>, timeout: Duration) -> Self {
        Self {
            sink,
            closed: Arc::new(AtomicBool::new(false)),
            timeout,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a close frame. Returns false when the channel was already closed.
    pub async fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let close = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };
        match tokio::time::timeout(self.timeout, close).await {
            Ok(Ok(())) => debug!("Channel closed"),
            Ok(Err(e)) => debug!("Error while closing channel: {}", e),
            Err(_) => warn!("Channel close not completed within {:?}", self.timeout),
        }
        true
    }
}

/// Persistent WebSocket connection to aria2's notification interface.
pub struct NotificationChannel {
    url: Url,
    sink: Arc<Mutex<WsSink>>,
    stream: SplitStream<WsStream>,
    closer: ChannelCloser<WsSink>,
    keepalive: KeepaliveSettings,
}

impl NotificationChannel {
    /// Connect to the notification channel of the aria2 instance behind
    /// `rpc_endpoint`. The endpoint scheme is rewritten to ws/wss.
    pub async fn connect(
        rpc_endpoint: &str,
        keepalive: KeepaliveSettings,
    ) -> Result<Self, ChannelError> {
        let url = websocket_endpoint(rpc_endpoint)?;
        info!("Connecting to aria2 WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url.as_str()).await?;
        info!("Connected to aria2 WebSocket");

        let (sink, stream) = ws_stream.split();
        let sink = Arc::new(Mutex::new(sink));
        let closer = ChannelCloser::new(sink.clone(), keepalive.write_timeout);

        Ok(Self {
            url,
            sink,
            stream,
            closer,
            keepalive,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run the session until it ends, then close the channel.
    ///
    /// The keepalive task is stopped before this returns. No reconnection is
    /// attempted.
    pub async fn run(self, dispatcher: &Dispatcher, shutdown: CancellationToken) -> SessionEnd {
        let teardown = CancellationToken::new();
        let keepalive = tokio::spawn(run_keepalive(
            self.sink.clone(),
            self.keepalive,
            shutdown.clone(),
            teardown.clone(),
        ));

        let end = read_loop(self.stream, dispatcher, &shutdown, &teardown).await;

        teardown.cancel();
        if let Err(e) = keepalive.await {
            error!("Keepalive task failed: {}", e);
        }
        self.closer.close().await;

        info!("Notification channel exited: {:?}", end);
        end
    }
}

/// Read frames until the session ends.
pub async fn read_loop<St>(
    mut stream: St,
    dispatcher: &Dispatcher,
    shutdown: &CancellationToken,
    teardown: &CancellationToken,
) -> SessionEnd
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        debug!("Waiting for notification...");
        let next = tokio::select! {
            next = stream.next() => next,
            _ = shutdown.cancelled() => return SessionEnd::Shutdown,
            _ = teardown.cancelled() => return SessionEnd::KeepaliveFailed,
        };

        let frame = match next {
            None => {
                info!("Notification stream ended");
                return SessionEnd::StreamEnded;
            }
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return connection_failed(e),
        };

        match frame {
            Message::Text(text) => {
                if let Err(end) = dispatch_frame(text.as_bytes(), dispatcher).await {
                    return end;
                }
            }
            Message::Binary(data) => {
                if let Err(end) = dispatch_frame(&data, dispatcher).await {
                    return end;
                }
            }
            Message::Ping(data) => debug!("Ping: {}", String::from_utf8_lossy(&data)),
            Message::Pong(data) => debug!("Pong: {}", String::from_utf8_lossy(&data)),
            Message::Close(frame) => return remote_closed(frame),
            Message::Frame(_) => {}
        }
    }
}

async fn dispatch_frame(payload: &[u8], dispatcher: &Dispatcher) -> Result<(), SessionEnd> {
    let notification: Notification = serde_json::from_slice(payload).map_err(|e| {
        error!(
            "Failed to decode notification: {} - {}",
            e,
            String::from_utf8_lossy(payload)
        );
        SessionEnd::DecodeFailed(e.to_string())
    })?;
    dispatcher.dispatch(&notification).await;
    Ok(())
}

fn remote_closed(frame: Option<CloseFrame>) -> SessionEnd {
    let (code, reason) = match frame {
        Some(frame) => (Some(u16::from(frame.code)), frame.reason.as_str().to_string()),
        None => (None, String::new()),
    };
    info!("Closing code = {:?}", code);
    info!("Closing text = {}", reason);
    SessionEnd::RemoteClosed { code, reason }
}

fn connection_failed(e: WsError) -> SessionEnd {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            info!("Notification connection closed");
            SessionEnd::StreamEnded
        }
        e => {
            error!("Notification connection error: {}", e);
            SessionEnd::ConnectionFailed(e.to_string())
        }
    }
}
