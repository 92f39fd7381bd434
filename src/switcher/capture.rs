use super::Switcher;
use crate::constants::SAVED_LAYOUT_PREFIX;
use crate::error::{LayoutError, PlatformError};
use crate::models::{Layout, ProgramSpec, Rect};
use crate::store::LayoutStore;
use crate::window::Window;
use log::{info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub layout_name: String,
    pub path: PathBuf,
    /// Program names recorded, in window enumeration order
    pub programs: Vec<String>,
}

/// What capture learns about one window.
struct DetectedWindow {
    base_name: String,
    spec: ProgramSpec,
    rect: Rect,
}

impl Switcher<'_> {
    /// Record the geometry of every visible window under `name` (or an
    /// auto-generated name) and write the store back to disk.
    pub fn capture(&self, name: Option<&str>) -> Result<CaptureOutcome, LayoutError> {
        let path = &self.config.layout_file;
        let mut store = LayoutStore::load(path)?;

        let layout_name = match name {
            Some(name) => name.to_string(),
            None => next_free_layout_name(&store, &self.config.default_layout),
        };

        let reusable = names_owned_by(&store, &layout_name);
        let mut assigned: HashSet<String> = HashSet::new();
        let mut layout = Layout::new();

        for window in Window::visible(self.desktop)? {
            let Some(detected) = detect(&window) else {
                continue;
            };

            let program = unique_program_name(&detected.base_name, |candidate| {
                assigned.contains(candidate)
                    || (store.programs.contains_key(candidate) && !reusable.contains(candidate))
            });

            store.programs.insert(program.clone(), detected.spec);
            layout.insert(program.clone(), detected.rect);
            assigned.insert(program);
        }

        let programs: Vec<String> = layout.keys().map(str::to_string).collect();
        info!("Captured {} windows into layout '{layout_name}'", programs.len());

        store.layouts.insert(layout_name.clone(), layout);
        store.save(path)?;

        Ok(CaptureOutcome {
            layout_name,
            path: path.clone(),
            programs,
        })
    }
}

fn detect(window: &Window<'_>) -> Option<DetectedWindow> {
    let (base_name, command, rect) = match identify(window) {
        Ok(found) => found,
        Err(e) => {
            warn!("Skipping window {}: {e}", window.id());
            return None;
        }
    };

    let title = window.title().unwrap_or_default();
    let class = window.class_name().unwrap_or_default();
    let base_name = if base_name.is_empty() { "window".to_string() } else { base_name };

    Some(DetectedWindow {
        base_name,
        spec: ProgramSpec::detected(&command, &title, &class),
        rect,
    })
}

/// Program name, command and geometry; without these a window is not worth
/// recording.
fn identify(window: &Window<'_>) -> Result<(String, String, Rect), PlatformError> {
    let process = window.process()?;
    Ok((process.program_name()?, process.command_or_exe()?, window.rect()?))
}

/// `default` if free, else the first free `saved_N`.
fn next_free_layout_name(store: &LayoutStore, default_name: &str) -> String {
    let mut name = default_name.to_string();
    let mut i = 0;
    while store.layouts.contains_key(&name) {
        i += 1;
        name = format!("{SAVED_LAYOUT_PREFIX}{i}");
    }
    name
}

/// Programs that only `layout_name` refers to. Recapturing that layout may
/// overwrite them without affecting any other layout.
fn names_owned_by(store: &LayoutStore, layout_name: &str) -> HashSet<String> {
    let Some(layout) = store.layouts.get(layout_name) else {
        return HashSet::new();
    };
    let used_elsewhere: HashSet<&str> = store
        .layouts
        .iter()
        .filter(|(name, _)| *name != layout_name)
        .flat_map(|(_, other)| other.keys())
        .collect();

    layout
        .keys()
        .filter(|program| !used_elsewhere.contains(program))
        .map(str::to_string)
        .collect()
}

fn unique_program_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut name = base.to_string();
    let mut i = 0;
    while taken(&name) {
        i += 1;
        name = format!("{base}{i}");
    }
    name
}
