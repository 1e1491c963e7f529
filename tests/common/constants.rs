//! Shared constants for end-to-end tests

use std::time::Duration;

/// Queue name used by every test
pub const QUEUE: &str = "upload";

/// RPC secret configured on the fake aria2
pub const SECRET: &str = "s3cret";

/// Download with a nested file (album/cd1/01.flac)
pub const GID_ALBUM: &str = "2089b05ecca3d829";

/// Download with a single top-level file (movie.mkv)
pub const GID_MOVIE: &str = "d2cb5ef1e4f0b2a1";

/// gid unknown to the fake aria2
pub const GID_UNKNOWN: &str = "0000000000000000";

/// Upper bound for anything a test waits on
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);
