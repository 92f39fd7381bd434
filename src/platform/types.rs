use crate::error::PlatformError;
use crate::models::Rect;
use std::fmt;
use std::path::PathBuf;

/// Opaque native window handle. Only valid while the window exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

pub type Pid = u32;

/// Window and process primitives of the host OS.
pub trait Desktop {
    /// Shown windows with a non-empty rectangle, in enumeration order.
    fn visible_windows(&self) -> Result<Vec<WindowId>, PlatformError>;
    fn title(&self, window: WindowId) -> Result<String, PlatformError>;
    fn class_name(&self, window: WindowId) -> Result<String, PlatformError>;
    fn rect(&self, window: WindowId) -> Result<Rect, PlatformError>;
    /// Restore the window from any maximised state, then move and resize it.
    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<(), PlatformError>;
    fn process_id(&self, window: WindowId) -> Result<Pid, PlatformError>;

    fn exe(&self, pid: Pid) -> Result<PathBuf, PlatformError>;
    fn command_line(&self, pid: Pid) -> Result<String, PlatformError>;
    fn environ_var(&self, pid: Pid, key: &str) -> Result<Option<String>, PlatformError>;
    /// Start `command` with `tag_key=tag_value` added to the inherited
    /// environment.
    fn spawn(&self, command: &str, tag_key: &str, tag_value: &str) -> Result<Pid, PlatformError>;
}
