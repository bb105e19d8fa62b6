//! Shared protocol constants for the Filebox text/JSON transport

/// End-of-message marker for plain commands and for every response.
/// JSON upload requests may omit it; structural balance substitutes.
pub const TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// Default port, overridable on both client and server.
pub const DEFAULT_PORT: u16 = 7777;

/// Per-read chunk size on both ends. Uploads arrive base64-encoded text,
/// so a moderate chunk is enough; the frame buffer grows as needed.
pub const RECV_CHUNK: usize = 4096;

// Centralized timeout constants for consistent behavior across server and tests
pub mod timeouts {
    use std::time::Duration;

    /// Idle read timeout per connection. A worker whose client sends
    /// nothing for this long is treated as faulted and closed.
    pub const IDLE_READ: Duration = Duration::from_secs(60);
}
