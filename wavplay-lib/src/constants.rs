//! Shared constants for playback defaults.

use std::time::Duration;

/// Delay between source state queries while waiting for playback to end.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Extra time allowed past a buffer's nominal duration before the
/// completion wait gives up.
pub const COMPLETION_GRACE: Duration = Duration::from_secs(2);

/// Completion wait limit when no header is available to size it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Attempts made to open an output stream before reporting failure.
pub const OUTPUT_STREAM_OPEN_RETRIES: usize = 3;

/// Delay between output stream open attempts.
pub const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;
