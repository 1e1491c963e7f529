//! Endpoint helpers for the aria2 RPC interface.
//!
//! aria2 serves JSON-RPC over HTTP and WebSocket on the same address and path,
//! so the notification channel and the query client derive their URLs from a
//! single configured endpoint by swapping the scheme.

use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Invalid RPC endpoint '{0}': {1}")]
    Invalid(String, String),

    #[error("Unsupported RPC endpoint scheme '{0}' (expected http, https, ws or wss)")]
    UnsupportedScheme(String),
}

/// WebSocket URL for the notification channel (`http` -> `ws`, `https` -> `wss`).
pub fn websocket_endpoint(rpc: &str) -> Result<Url, EndpointError> {
    rewrite_scheme(rpc, |scheme| match scheme {
        "http" | "ws" => Some("ws"),
        "https" | "wss" => Some("wss"),
        _ => None,
    })
}

/// HTTP URL for JSON-RPC queries (`ws` -> `http`, `wss` -> `https`).
pub fn http_endpoint(rpc: &str) -> Result<Url, EndpointError> {
    rewrite_scheme(rpc, |scheme| match scheme {
        "http" | "ws" => Some("http"),
        "https" | "wss" => Some("https"),
        _ => None,
    })
}

fn rewrite_scheme(
    rpc: &str,
    target: impl Fn(&str) -> Option<&'static str>,
) -> Result<Url, EndpointError> {
    let mut url =
        Url::parse(rpc).map_err(|e| EndpointError::Invalid(rpc.to_string(), e.to_string()))?;
    let scheme = target(url.scheme())
        .ok_or_else(|| EndpointError::UnsupportedScheme(url.scheme().to_string()))?;
    if url.scheme() != scheme {
        url.set_scheme(scheme).map_err(|_| {
            EndpointError::Invalid(rpc.to_string(), format!("cannot switch to {}", scheme))
        })?;
    }
    Ok(url)
}
