use super::matcher::find_window;
use super::Switcher;
use crate::error::{LayoutError, PlatformError};
use crate::models::{ProgramSpec, Rect};
use crate::platform::WindowId;
use crate::store::LayoutStore;
use crate::window::Window;
use log::{debug, info, warn};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// An existing window was moved into place
    Moved,
    /// An existing window was already in place
    Unchanged,
    /// The program was started and its new window moved into place
    Launched { command: String },
    /// No window, and the program is marked `suppress_start`
    Suppressed,
    /// The program was started but no window showed up in time
    NotFound { command: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub program: String,
    pub outcome: PlacementOutcome,
}

/// Progress reported while a layout is applied, as it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyEvent<'e> {
    /// `command` is about to be started for `program`
    Starting { program: &'e str, command: &'e str },
    /// The started program showed no window within the polling budget
    NoWindow { program: &'e str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub layout_name: String,
    /// One entry per program, in layout order
    pub placements: Vec<Placement>,
}

impl ApplyReport {
    pub fn outcome(&self, program: &str) -> Option<&PlacementOutcome> {
        self.placements
            .iter()
            .find(|p| p.program == program)
            .map(|p| &p.outcome)
    }
}

impl<'a> Switcher<'a> {
    /// Move the windows of every program in `layout_name` into place,
    /// starting programs that have no window.
    ///
    /// Windows already moved stay moved when a later program fails.
    pub fn apply(&self, layout_name: &str) -> Result<ApplyReport, LayoutError> {
        self.apply_with(layout_name, &mut |_| {})
    }

    /// Like [`Switcher::apply`], calling `on_event` as programs are started.
    pub fn apply_with(
        &self,
        layout_name: &str,
        on_event: &mut dyn FnMut(ApplyEvent<'_>),
    ) -> Result<ApplyReport, LayoutError> {
        let store = LayoutStore::open(&self.config.layout_file)?;
        let layout = store.layout(layout_name)?;

        let targets = layout
            .iter()
            .map(|(program, rect)| {
                store
                    .program(program)
                    .map(|spec| (program, spec, *rect))
                    .ok_or_else(|| LayoutError::UnknownProgram {
                        layout: layout_name.to_string(),
                        program: program.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut windows = Window::visible(self.desktop)?;
        let mut used: Vec<WindowId> = Vec::new();
        let mut placements = Vec::with_capacity(targets.len());

        for (program, spec, rect) in targets {
            let outcome =
                self.place_program(program, spec, rect, &mut windows, &mut used, on_event);
            if let PlacementOutcome::Failed { reason } = &outcome {
                warn!("Could not place {program}: {reason}");
            }
            placements.push(Placement {
                program: program.to_string(),
                outcome,
            });
        }

        Ok(ApplyReport {
            layout_name: layout_name.to_string(),
            placements,
        })
    }

    fn place_program(
        &self,
        program: &str,
        spec: &ProgramSpec,
        rect: Rect,
        windows: &mut Vec<Window<'a>>,
        used: &mut Vec<WindowId>,
        on_event: &mut dyn FnMut(ApplyEvent<'_>),
    ) -> PlacementOutcome {
        let found = find_window(program, spec, None, windows, &self.config.env_tag);

        let (window, launched) = match found {
            Some(m) => (m.window, None),
            None if spec.suppress_start => {
                debug!("{program}: no window and start suppressed");
                return PlacementOutcome::Suppressed;
            }
            None => match self.launch_and_wait(program, spec, used, on_event) {
                Ok(Some(window)) => (window, Some(spec.command.clone())),
                Ok(None) => {
                    return PlacementOutcome::NotFound {
                        command: spec.command.clone(),
                    }
                }
                Err(e) => {
                    return PlacementOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            },
        };

        // Never hand the same window to two programs
        used.push(window.id());
        windows.retain(|w| *w != window);

        match move_window(&window, rect) {
            Ok(moved) => match launched {
                Some(command) => PlacementOutcome::Launched { command },
                None if moved => PlacementOutcome::Moved,
                None => PlacementOutcome::Unchanged,
            },
            Err(e) => PlacementOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Start the program tagged with its name, then poll for its window.
    fn launch_and_wait(
        &self,
        program: &str,
        spec: &ProgramSpec,
        used: &[WindowId],
        on_event: &mut dyn FnMut(ApplyEvent<'_>),
    ) -> Result<Option<Window<'a>>, PlatformError> {
        info!("Starting {}", spec.command);
        on_event(ApplyEvent::Starting {
            program,
            command: &spec.command,
        });
        let pid = self
            .desktop
            .spawn(&spec.command, &self.config.env_tag, program)?;

        for attempt in 0..self.config.poll_attempts {
            if attempt > 0 {
                thread::sleep(self.config.poll_interval);
            }

            let fresh: Vec<Window<'a>> = Window::visible(self.desktop)?
                .into_iter()
                .filter(|w| !used.contains(&w.id()))
                .collect();

            let found = find_window(program, spec, Some(pid), &fresh, &self.config.env_tag);
            if let Some(m) = found {
                let polls = attempt + 1;
                debug!("{program}: window {} appeared after {polls} polls", m.window.id());
                return Ok(Some(m.window));
            }
        }

        debug!("{program}: no window after {} polls", self.config.poll_attempts);
        on_event(ApplyEvent::NoWindow { program });
        Ok(None)
    }
}

/// Returns whether the window had to be moved.
fn move_window(window: &Window<'_>, rect: Rect) -> Result<bool, PlatformError> {
    if window.rect().ok() == Some(rect) {
        return Ok(false);
    }
    info!(
        "Moving window {} to {},{} {}x{}",
        window.id(),
        rect.left,
        rect.top,
        rect.width(),
        rect.height()
    );
    window.set_rect(rect)?;
    Ok(true)
}
