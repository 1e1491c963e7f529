//! JSON-RPC notification dispatch.
//!
//! aria2 pushes one notification per download state change. Each method name
//! maps to one hook of the [`Notifier`] trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::aria2::{Event, Notification};

/// Notification methods sent by aria2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationMethod {
    DownloadStart,
    DownloadPause,
    DownloadStop,
    DownloadComplete,
    DownloadError,
    BtDownloadComplete,
}

/// Method name table, matched exactly.
const METHODS: [(&str, NotificationMethod); 6] = [
    ("aria2.onDownloadStart", NotificationMethod::DownloadStart),
    ("aria2.onDownloadPause", NotificationMethod::DownloadPause),
    ("aria2.onDownloadStop", NotificationMethod::DownloadStop),
    ("aria2.onDownloadComplete", NotificationMethod::DownloadComplete),
    ("aria2.onDownloadError", NotificationMethod::DownloadError),
    ("aria2.onBtDownloadComplete", NotificationMethod::BtDownloadComplete),
];

impl NotificationMethod {
    pub fn from_method(method: &str) -> Option<Self> {
        METHODS
            .iter()
            .find(|(name, _)| *name == method)
            .map(|(_, m)| *m)
    }

    pub fn as_str(&self) -> &'static str {
        METHODS
            .iter()
            .find(|(_, m)| m == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl std::fmt::Display for NotificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receives routed notifications.
///
/// Every hook gets the full ordered event list of one notification and
/// defaults to doing nothing. Implementations must handle each event
/// independently so that one failing event does not stop the others.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn on_start(&self, events: &[Event]) {
        log_ignored(NotificationMethod::DownloadStart, events);
    }

    async fn on_pause(&self, events: &[Event]) {
        log_ignored(NotificationMethod::DownloadPause, events);
    }

    async fn on_stop(&self, events: &[Event]) {
        log_ignored(NotificationMethod::DownloadStop, events);
    }

    async fn on_complete(&self, events: &[Event]) {
        log_ignored(NotificationMethod::DownloadComplete, events);
    }

    async fn on_error(&self, events: &[Event]) {
        log_ignored(NotificationMethod::DownloadError, events);
    }

    async fn on_bt_complete(&self, events: &[Event]) {
        log_ignored(NotificationMethod::BtDownloadComplete, events);
    }
}

fn log_ignored(method: NotificationMethod, events: &[Event]) {
    for event in events {
        debug!("{}: gid = {}", method, event.gid);
    }
}

/// Outcome of dispatching one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Handled(NotificationMethod),
    Unknown(String),
}

/// Routes notifications to a [`Notifier`].
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Route a notification to its hook and wait for the hook to finish.
    pub async fn dispatch(&self, notification: &Notification) -> Dispatched {
        let Some(method) = NotificationMethod::from_method(&notification.method) else {
            warn!("Unexpected notification: {}", notification.method);
            return Dispatched::Unknown(notification.method.clone());
        };

        let events = notification.params.as_slice();
        match method {
            NotificationMethod::DownloadStart => self.notifier.on_start(events).await,
            NotificationMethod::DownloadPause => self.notifier.on_pause(events).await,
            NotificationMethod::DownloadStop => self.notifier.on_stop(events).await,
            NotificationMethod::DownloadComplete => self.notifier.on_complete(events).await,
            NotificationMethod::DownloadError => self.notifier.on_error(events).await,
            NotificationMethod::BtDownloadComplete => self.notifier.on_bt_complete(events).await,
        }
        Dispatched::Handled(method)
    }
}
