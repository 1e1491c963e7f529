//! aria2 JSON-RPC types.
//!
//! Defines the notification payloads pushed over the WebSocket and the
//! request/response envelopes of the `aria2.tellStatus` query.

use serde::{Deserialize, Serialize};

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Method used to query a download's status.
pub const TELL_STATUS_METHOD: &str = "aria2.tellStatus";

/// Keys requested from `aria2.tellStatus`.
pub const STATUS_KEYS: [&str; 2] = ["dir", "files"];

// =============================================================================
// Notifications (pushed by aria2)
// =============================================================================

/// A single download event carried by a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// aria2 download identifier
    pub gid: String,
}

impl Event {
    pub fn new(gid: impl Into<String>) -> Self {
        Self { gid: gid.into() }
    }
}

/// A decoded JSON-RPC notification frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Vec<Event>,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Vec<Event>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

// =============================================================================
// tellStatus query
// =============================================================================

/// Request envelope sent to the aria2 RPC endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: &'static str,
    pub params: Vec<serde_json::Value>,
}

/// Response envelope returned by the aria2 RPC endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Directory and file listing of one download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl ItemStatus {
    /// The first file reported for the item, treated as the primary file.
    pub fn primary_file(&self) -> Option<&FileEntry> {
        self.files.first()
    }
}

/// One file entry of a download. aria2 sends more fields (index, length,
/// selected, uris) which are not needed here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub path: String,
}
