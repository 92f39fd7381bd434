//! Handle wrappers over a [`Desktop`].
//!
//! A `Window` is only a reference to a native window: it owns nothing and
//! goes stale as soon as the real window closes, after which every accessor
//! returns an error.

use crate::error::PlatformError;
use crate::models::Rect;
use crate::platform::{Desktop, Pid, WindowId};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy)]
pub struct Window<'a> {
    id: WindowId,
    desktop: &'a dyn Desktop,
}

impl PartialEq for Window<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Window<'_> {}

impl std::fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Window").field(&self.id).finish()
    }
}

impl<'a> Window<'a> {
    pub fn new(id: WindowId, desktop: &'a dyn Desktop) -> Self {
        Self { id, desktop }
    }

    pub fn visible(desktop: &'a dyn Desktop) -> Result<Vec<Self>, PlatformError> {
        Ok(desktop
            .visible_windows()?
            .into_iter()
            .map(|id| Self::new(id, desktop))
            .collect())
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn title(&self) -> Result<String, PlatformError> {
        self.desktop.title(self.id)
    }

    pub fn class_name(&self) -> Result<String, PlatformError> {
        self.desktop.class_name(self.id)
    }

    pub fn rect(&self) -> Result<Rect, PlatformError> {
        self.desktop.rect(self.id)
    }

    pub fn set_rect(&self, rect: Rect) -> Result<(), PlatformError> {
        self.desktop.set_rect(self.id, rect)
    }

    pub fn process(&self) -> Result<Process<'a>, PlatformError> {
        Ok(Process {
            pid: self.desktop.process_id(self.id)?,
            desktop: self.desktop,
        })
    }
}

/// The process owning a window.
#[derive(Clone, Copy)]
pub struct Process<'a> {
    pid: Pid,
    desktop: &'a dyn Desktop,
}

impl Process<'_> {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn exe(&self) -> Result<PathBuf, PlatformError> {
        self.desktop.exe(self.pid)
    }

    pub fn command_line(&self) -> Result<String, PlatformError> {
        self.desktop.command_line(self.pid)
    }

    /// Command line, or the executable path when the command line cannot be
    /// read.
    pub fn command_or_exe(&self) -> Result<String, PlatformError> {
        match self.command_line() {
            Ok(cmd) => Ok(cmd),
            Err(e) if e.is_recoverable() => Ok(self.exe()?.display().to_string()),
            Err(e) => Err(e),
        }
    }

    pub fn environ_var(&self, key: &str) -> Result<Option<String>, PlatformError> {
        self.desktop.environ_var(self.pid, key)
    }

    /// Lower-cased executable file name without extension.
    pub fn program_name(&self) -> Result<String, PlatformError> {
        Ok(program_name_from_exe(&self.exe()?))
    }
}

pub fn program_name_from_exe(exe: &Path) -> String {
    exe.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
