//! Liveness probing for the notification channel.

use futures::{Sink, SinkExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Payload carried by every keepalive ping.
pub const PROBE_PAYLOAD: &[u8] = b"ruok";

/// Default interval between keepalive probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default write deadline for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveSettings {
    pub interval: Duration,
    pub write_timeout: Duration,
}

impl Default for KeepaliveSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PROBE_INTERVAL,
            write_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Why the keepalive routine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveEnd {
    /// The process shutdown token was cancelled.
    Shutdown,
    /// The session was torn down by someone else.
    SessionClosed,
    /// A probe failed or missed its write deadline; the session was torn down.
    ProbeFailed,
}

/// Send a ping every `settings.interval` until shutdown, teardown, or a
/// failed probe. The first probe goes out one interval after start.
///
/// A probe that errors or does not complete within `settings.write_timeout`
/// cancels `teardown`, which ends the read loop of the same session.
pub async fn run_keepalive<S>(
    sink: Arc<Mutex<S>>,
    settings: KeepaliveSettings,
    shutdown: CancellationToken,
    teardown: CancellationToken,
) -> KeepaliveEnd
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    debug!(
        "Keepalive started (interval={:?}, write_timeout={:?})",
        settings.interval, settings.write_timeout
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!("Send ping");
                let probe = async {
                    let mut sink = sink.lock().await;
                    sink.send(Message::Ping(PROBE_PAYLOAD.into())).await
                };
                match timeout(settings.write_timeout, probe).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!("Keepalive ping failed: {}", e);
                        teardown.cancel();
                        return KeepaliveEnd::ProbeFailed;
                    }
                    Err(_) => {
                        error!(
                            "Keepalive ping not written within {:?}",
                            settings.write_timeout
                        );
                        teardown.cancel();
                        return KeepaliveEnd::ProbeFailed;
                    }
                }
            }
            _ = shutdown.cancelled() => {
                info!("Keepalive stopping on shutdown");
                return KeepaliveEnd::Shutdown;
            }
            _ = teardown.cancelled() => {
                debug!("Keepalive stopping, session closed");
                return KeepaliveEnd::SessionClosed;
            }
        }
    }
}
