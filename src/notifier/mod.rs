//! Notifier module
//!
//! Subscribes to aria2's WebSocket notifications and routes them by method
//! name to a [`Notifier`] implementation.

mod channel;
mod dispatcher;
mod keepalive;

pub use channel::{read_loop, ChannelCloser, ChannelError, NotificationChannel, SessionEnd};
pub use dispatcher::{Dispatched, Dispatcher, NotificationMethod, Notifier};
pub use keepalive::{
    run_keepalive, KeepaliveEnd, KeepaliveSettings, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT,
    PROBE_PAYLOAD,
};
