// src/constants.rs

use std::time::Duration;

/// Layout name used when none is given on the command line
pub const DEFAULT_LAYOUT: &str = "default";

/// Prefix for auto-generated layout names (`saved_1`, `saved_2`, ...)
pub const SAVED_LAYOUT_PREFIX: &str = "saved_";

/// Store file name, placed in the user's home directory
pub const LAYOUT_FILE_NAME: &str = ".windowlayout.json";

/// Environment variable injected into launched programs so their windows
/// can be recognised afterwards
pub const ENV_TAG: &str = "WINDOWLAYOUT_ID";

/// Delay between polls while waiting for a launched program's window
pub const WINDOW_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Number of polls before giving up on a launched program (about 1 second)
pub const WINDOW_POLL_ATTEMPTS: u32 = 100;
