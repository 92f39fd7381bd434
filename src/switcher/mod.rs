//! Capturing and re-applying window layouts.

mod apply;
mod capture;
pub mod matcher;

pub use apply::{ApplyEvent, ApplyReport, Placement, PlacementOutcome};
pub use capture::CaptureOutcome;
pub use matcher::{find_window, MatchKind, WindowMatch};

use crate::config::SwitcherConfig;
use crate::platform::Desktop;

pub struct Switcher<'a> {
    config: SwitcherConfig,
    desktop: &'a dyn Desktop,
}

impl<'a> Switcher<'a> {
    pub fn new(config: SwitcherConfig, desktop: &'a dyn Desktop) -> Self {
        Self { config, desktop }
    }
}
