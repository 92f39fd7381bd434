use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the OS window/process layer.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("access denied")]
    AccessDenied,

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("no display connection available")]
    NoDisplay,

    #[error("window {0:#x} no longer exists")]
    WindowGone(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(target_os = "linux")]
    #[error("X11 error: {0}")]
    X11(String),

    #[cfg(target_os = "windows")]
    #[error("Win32 call {call} failed")]
    Win32 { call: &'static str },
}

impl PlatformError {
    /// Whether the error is a per-process restriction callers should
    /// recover from by falling back to less precise data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlatformError::AccessDenied | PlatformError::Unsupported(_))
    }
}

#[cfg(target_os = "linux")]
impl From<x11rb::errors::ConnectionError> for PlatformError {
    fn from(e: x11rb::errors::ConnectionError) -> Self {
        PlatformError::X11(e.to_string())
    }
}

#[cfg(target_os = "linux")]
impl From<x11rb::errors::ReplyError> for PlatformError {
    fn from(e: x11rb::errors::ReplyError) -> Self {
        PlatformError::X11(e.to_string())
    }
}

/// Application error type
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout file not found: {}", path.display())]
    StoreNotFound { path: PathBuf },

    #[error("Specified layout not found: '{name}'")]
    LayoutNotFound { name: String },

    #[error("Layout '{layout}' references unknown program '{program}'")]
    UnknownProgram { layout: String, program: String },

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layout file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl LayoutError {
    /// Process exit code reported by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LayoutError::LayoutNotFound { .. } | LayoutError::UnknownProgram { .. } => 2,
            LayoutError::StoreNotFound { .. }
            | LayoutError::NoHomeDir
            | LayoutError::Io { .. }
            | LayoutError::Parse { .. }
            | LayoutError::Platform(_) => 1,
        }
    }
}
