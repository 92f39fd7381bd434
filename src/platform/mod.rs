pub mod types;

pub use types::{Desktop, Pid, WindowId};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub use linux::LinuxDesktop as NativeDesktop;

#[cfg(target_os = "windows")]
pub use windows::WindowsDesktop as NativeDesktop;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub use unsupported::UnsupportedDesktop as NativeDesktop;

// Stub for platforms without a backend
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod unsupported {
    use super::{Desktop, Pid, WindowId};
    use crate::error::PlatformError;
    use crate::models::Rect;
    use std::path::PathBuf;

    #[derive(Default)]
    pub struct UnsupportedDesktop;

    impl UnsupportedDesktop {
        pub fn new() -> Self {
            Self
        }
    }

    impl Desktop for UnsupportedDesktop {
        fn visible_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
            Err(PlatformError::Unsupported("window enumeration"))
        }

        fn title(&self, _window: WindowId) -> Result<String, PlatformError> {
            Err(PlatformError::Unsupported("window title"))
        }

        fn class_name(&self, _window: WindowId) -> Result<String, PlatformError> {
            Err(PlatformError::Unsupported("window class"))
        }

        fn rect(&self, _window: WindowId) -> Result<Rect, PlatformError> {
            Err(PlatformError::Unsupported("window geometry"))
        }

        fn set_rect(&self, _window: WindowId, _rect: Rect) -> Result<(), PlatformError> {
            Err(PlatformError::Unsupported("window geometry"))
        }

        fn process_id(&self, _window: WindowId) -> Result<Pid, PlatformError> {
            Err(PlatformError::Unsupported("window process"))
        }

        fn exe(&self, _pid: Pid) -> Result<PathBuf, PlatformError> {
            Err(PlatformError::Unsupported("executable path"))
        }

        fn command_line(&self, _pid: Pid) -> Result<String, PlatformError> {
            Err(PlatformError::Unsupported("command line"))
        }

        fn environ_var(&self, _pid: Pid, _key: &str) -> Result<Option<String>, PlatformError> {
            Err(PlatformError::Unsupported("process environment"))
        }

        fn spawn(
            &self,
            command: &str,
            tag_key: &str,
            tag_value: &str,
        ) -> Result<Pid, PlatformError> {
            let child = std::process::Command::new(command).env(tag_key, tag_value).spawn()?;
            Ok(child.id())
        }
    }
}
