use crate::constants::{
    DEFAULT_LAYOUT, ENV_TAG, LAYOUT_FILE_NAME, WINDOW_POLL_ATTEMPTS, WINDOW_POLL_INTERVAL,
};
use crate::error::LayoutError;
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by capture and apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitcherConfig {
    pub layout_file: PathBuf,
    /// Environment variable set on launched programs
    pub env_tag: String,
    pub default_layout: String,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
}

impl SwitcherConfig {
    pub fn new(layout_file: impl Into<PathBuf>) -> Self {
        Self {
            layout_file: layout_file.into(),
            env_tag: ENV_TAG.to_string(),
            default_layout: DEFAULT_LAYOUT.to_string(),
            poll_interval: WINDOW_POLL_INTERVAL,
            poll_attempts: WINDOW_POLL_ATTEMPTS,
        }
    }

    /// Config for the current user, storing layouts in the home directory
    /// unless `layout_file` overrides it.
    pub fn resolve(layout_file: Option<&Path>) -> Result<Self, LayoutError> {
        match layout_file {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(default_layout_file()?)),
        }
    }
}

pub fn default_layout_file() -> Result<PathBuf, LayoutError> {
    let dirs = BaseDirs::new().ok_or(LayoutError::NoHomeDir)?;
    Ok(dirs.home_dir().join(LAYOUT_FILE_NAME))
}
