//! Shared test utilities.
//!
//! `FakeDesktop` is a scripted in-memory `Desktop`: tests register processes
//! and windows, and may register commands whose window shows up a few polls
//! after being spawned.

#![cfg(test)]

use crate::error::PlatformError;
use crate::models::Rect;
use crate::platform::{Desktop, Pid, WindowId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub pid: Pid,
    pub title: String,
    pub class: String,
    pub rect: Rect,
}

impl FakeWindow {
    pub fn new(pid: Pid, title: &str, class: &str, rect: Rect) -> Self {
        Self {
            pid,
            title: title.to_string(),
            class: class.to_string(),
            rect,
        }
    }
}

#[derive(Debug, Clone)]
struct FakeProcess {
    exe: PathBuf,
    /// `None` means reading it is denied
    command_line: Option<String>,
    environ: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone)]
struct Launchable {
    exe: String,
    window: FakeWindow,
    appears_after_polls: u32,
}

#[derive(Debug, Clone)]
struct PendingWindow {
    window: FakeWindow,
    polls_left: u32,
}

#[derive(Default)]
pub struct FakeDesktop {
    windows: RefCell<Vec<(WindowId, FakeWindow)>>,
    processes: RefCell<HashMap<Pid, FakeProcess>>,
    launchable: RefCell<HashMap<String, Launchable>>,
    pending: RefCell<Vec<PendingWindow>>,
    next_window: Cell<u64>,
    next_pid: Cell<Pid>,
    /// `(command, tag value)` of every spawn
    pub spawned: RefCell<Vec<(String, String)>>,
    /// `(window, rect)` of every successful move
    pub moves: RefCell<Vec<(WindowId, Rect)>>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        let desktop = Self::default();
        desktop.next_window.set(0x100);
        desktop.next_pid.set(5000);
        desktop
    }

    pub fn add_process(
        &self,
        pid: Pid,
        exe: &str,
        command_line: Option<&str>,
        environ: Option<&[(&str, &str)]>,
    ) {
        self.processes.borrow_mut().insert(
            pid,
            FakeProcess {
                exe: PathBuf::from(exe),
                command_line: command_line.map(str::to_string),
                environ: environ.map(|vars| {
                    vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
                }),
            },
        );
    }

    pub fn add_window(&self, window: FakeWindow) -> WindowId {
        let id = WindowId(self.next_window.get());
        self.next_window.set(id.0 + 1);
        self.windows.borrow_mut().push((id, window));
        id
    }

    pub fn close_window(&self, id: WindowId) {
        self.windows.borrow_mut().retain(|(w, _)| *w != id);
    }

    /// Spawning `command` starts a process running `exe` whose window appears
    /// after `appears_after_polls` further calls to `visible_windows`.
    pub fn add_launchable(
        &self,
        command: &str,
        exe: &str,
        window: FakeWindow,
        appears_after_polls: u32,
    ) {
        self.launchable.borrow_mut().insert(
            command.to_string(),
            Launchable {
                exe: exe.to_string(),
                window,
                appears_after_polls,
            },
        );
    }

    pub fn rect_of(&self, id: WindowId) -> Option<Rect> {
        self.windows.borrow().iter().find(|(w, _)| *w == id).map(|(_, win)| win.rect)
    }

    fn with_window<T>(
        &self,
        id: WindowId,
        f: impl FnOnce(&mut FakeWindow) -> T,
    ) -> Result<T, PlatformError> {
        let mut windows = self.windows.borrow_mut();
        let (_, window) = windows
            .iter_mut()
            .find(|(w, _)| *w == id)
            .ok_or(PlatformError::WindowGone(id.0))?;
        Ok(f(window))
    }

    fn with_process<T>(
        &self,
        pid: Pid,
        f: impl FnOnce(&FakeProcess) -> Result<T, PlatformError>,
    ) -> Result<T, PlatformError> {
        let processes = self.processes.borrow();
        let process = processes
            .get(&pid)
            .ok_or_else(|| PlatformError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)))?;
        f(process)
    }

    fn tick_pending(&self) {
        let mut ready = Vec::new();
        self.pending.borrow_mut().retain_mut(|pending| {
            if pending.polls_left == 0 {
                ready.push(pending.window.clone());
                false
            } else {
                pending.polls_left -= 1;
                true
            }
        });
        for window in ready {
            self.add_window(window);
        }
    }
}

impl Desktop for FakeDesktop {
    fn visible_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
        self.tick_pending();
        Ok(self
            .windows
            .borrow()
            .iter()
            .filter(|(_, w)| !w.rect.is_empty())
            .map(|(id, _)| *id)
            .collect())
    }

    fn title(&self, window: WindowId) -> Result<String, PlatformError> {
        self.with_window(window, |w| w.title.clone())
    }

    fn class_name(&self, window: WindowId) -> Result<String, PlatformError> {
        self.with_window(window, |w| w.class.clone())
    }

    fn rect(&self, window: WindowId) -> Result<Rect, PlatformError> {
        self.with_window(window, |w| w.rect)
    }

    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<(), PlatformError> {
        self.with_window(window, |w| w.rect = rect)?;
        self.moves.borrow_mut().push((window, rect));
        Ok(())
    }

    fn process_id(&self, window: WindowId) -> Result<Pid, PlatformError> {
        self.with_window(window, |w| w.pid)
    }

    fn exe(&self, pid: Pid) -> Result<PathBuf, PlatformError> {
        self.with_process(pid, |p| Ok(p.exe.clone()))
    }

    fn command_line(&self, pid: Pid) -> Result<String, PlatformError> {
        self.with_process(pid, |p| p.command_line.clone().ok_or(PlatformError::AccessDenied))
    }

    fn environ_var(&self, pid: Pid, key: &str) -> Result<Option<String>, PlatformError> {
        self.with_process(pid, |p| {
            p.environ
                .as_ref()
                .map(|env| env.get(key).cloned())
                .ok_or(PlatformError::AccessDenied)
        })
    }

    fn spawn(&self, command: &str, tag_key: &str, tag_value: &str) -> Result<Pid, PlatformError> {
        self.spawned.borrow_mut().push((command.to_string(), tag_value.to_string()));

        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);

        let launchable = self.launchable.borrow().get(command).cloned();
        let exe = launchable.as_ref().map_or(command, |l| l.exe.as_str());
        let environ = [(tag_key, tag_value)];
        self.add_process(pid, exe, Some(command), Some(&environ[..]));

        if let Some(launchable) = launchable {
            let mut window = launchable.window;
            window.pid = pid;
            self.pending.borrow_mut().push(PendingWindow {
                window,
                polls_left: launchable.appears_after_polls,
            });
        }
        Ok(pid)
    }
}
