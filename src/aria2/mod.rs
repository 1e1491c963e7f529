//! aria2 module
//!
//! Types and clients for talking to aria2: the JSON-RPC query interface used to
//! resolve completed downloads, and the endpoint helpers shared with the
//! notification channel.

mod client;
mod endpoint;
mod types;

pub use client::{Aria2Client, Aria2Error, StatusResolver};
pub use endpoint::{http_endpoint, websocket_endpoint, EndpointError};
pub use types::*;
