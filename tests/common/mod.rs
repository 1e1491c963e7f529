#![allow(dead_code)]

//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeAria2, DownloadDir, SECRET};
//!
//! #[tokio::test]
//! async fn test_status() {
//!     let downloads = DownloadDir::new();
//!     let album = downloads.album();
//!     let server = FakeAria2::builder()
//!         .secret(SECRET)
//!         .status(GID_ALBUM, downloads.path(), &[album])
//!         .spawn()
//!         .await;
//! }
//! ```

mod aria2_server;
mod constants;
mod fixtures;

pub use aria2_server::FakeAria2;
pub use constants::*;
pub use fixtures::DownloadDir;
