//! Internal constants for diagram rendering.

use std::time::Duration;

/// Default timeout for a single `mmdc` invocation (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for the `mmdc -v` availability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between child process status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default `mmdc` background color.
pub const DEFAULT_BACKGROUND: &str = "transparent";

/// Environment variable that overrides `mmdc` discovery.
pub const MERMAID_CLI_ENV: &str = "MERMAID_CLI";

/// Number of fingerprint hex characters embedded in image file names.
pub const SHORT_HASH_LEN: usize = 10;

/// Maximum number of characters kept from a document stem in image names.
pub const MAX_STEM_LEN: usize = 64;

/// Prefix of the marker comment written after kept diagram blocks.
pub const MARKER_PREFIX: &str = "<!-- mdr-rendered:";

/// Suffix of the marker comment written after kept diagram blocks.
pub const MARKER_SUFFIX: &str = " -->";
