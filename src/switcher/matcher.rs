use crate::models::ProgramSpec;
use crate::platform::Pid;
use crate::window::{Process, Window};
use log::debug;

/// Why a window was picked for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The owning process carries the program's environment tag
    Tag,
    /// The owning process is the one just launched
    Pid,
    /// Command line, and recorded title/class, are equal
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMatch<'a> {
    pub window: Window<'a>,
    pub kind: MatchKind,
}

/// Best tag/pid match and first command match seen so far in one scan.
#[derive(Default)]
struct MatchScan<'a> {
    best: Option<WindowMatch<'a>>,
    fallback: Option<WindowMatch<'a>>,
}

impl<'a> MatchScan<'a> {
    fn finish(self) -> Option<WindowMatch<'a>> {
        self.best.or(self.fallback)
    }
}

/// Find the window belonging to program `name` among `windows`.
///
/// A tag or pid match anywhere in the list wins. Otherwise the first window,
/// in enumeration order, whose command line and recorded title/class equal
/// the descriptor's is returned.
pub fn find_window<'a>(
    name: &str,
    spec: &ProgramSpec,
    expected_pid: Option<Pid>,
    windows: &[Window<'a>],
    env_tag: &str,
) -> Option<WindowMatch<'a>> {
    let expected_cmd = spec.expected_command();
    let mut scan = MatchScan::default();

    for window in windows {
        let process = match window.process() {
            Ok(process) => process,
            Err(e) => {
                debug!("{name}: skipping window {}: {e}", window.id());
                continue;
            }
        };

        if let Some(kind) = priority_match(name, &process, expected_pid, env_tag) {
            scan.best = Some(WindowMatch { window: *window, kind });
            break;
        }

        if scan.fallback.is_some() {
            continue;
        }

        if command_matches(spec, expected_cmd, window, &process) {
            scan.fallback = Some(WindowMatch {
                window: *window,
                kind: MatchKind::Command,
            });
        }
    }

    let found = scan.finish();
    if let Some(m) = &found {
        debug!("{name}: matched window {} by {:?}", m.window.id(), m.kind);
    }
    found
}

fn priority_match(
    name: &str,
    process: &Process<'_>,
    expected_pid: Option<Pid>,
    env_tag: &str,
) -> Option<MatchKind> {
    match process.environ_var(env_tag) {
        Ok(Some(tag)) if tag == name => return Some(MatchKind::Tag),
        Ok(_) => {}
        // Environment of other users' processes is usually unreadable
        Err(e) => debug!("{name}: no environment for pid {}: {e}", process.pid()),
    }

    if expected_pid == Some(process.pid()) {
        return Some(MatchKind::Pid);
    }
    None
}

fn command_matches(
    spec: &ProgramSpec,
    expected_cmd: &str,
    window: &Window<'_>,
    process: &Process<'_>,
) -> bool {
    let Ok(cmd) = process.command_or_exe() else {
        return false;
    };
    if cmd != expected_cmd {
        return false;
    }

    if let Some(title) = &spec.detected_title {
        if window.title().ok().as_ref() != Some(title) {
            return false;
        }
    }

    if let Some(class) = &spec.detected_class {
        if window.class_name().ok().as_ref() != Some(class) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;
    use crate::test_utils::{FakeDesktop, FakeWindow};

    const TAG: &str = "WINDOWLAYOUT_ID";

    fn rect() -> Rect {
        Rect::new(0, 0, 800, 600)
    }

    fn spec(cmd: &str, title: Option<&str>, class: Option<&str>) -> ProgramSpec {
        ProgramSpec {
            command: cmd.to_string(),
            detected_command: Some(cmd.to_string()),
            detected_title: title.map(str::to_string),
            detected_class: class.map(str::to_string),
            suppress_start: false,
        }
    }

    #[test]
    fn test_tag_beats_earlier_command_match() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/foot", Some("foot"), Some(&[("HOME", "/home/me")][..]));
        desktop.add_process(2, "/usr/bin/other", Some("other"), Some(&[(TAG, "foot")][..]));
        let by_command = desktop.add_window(FakeWindow::new(1, "Terminal", "foot", rect()));
        let by_tag = desktop.add_window(FakeWindow::new(2, "Other", "other", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let found = find_window("foot", &spec("foot", None, None), None, &windows, TAG).unwrap();

        assert_eq!(found.window.id(), by_tag);
        assert_eq!(found.kind, MatchKind::Tag);
        assert_ne!(found.window.id(), by_command);
    }

    #[test]
    fn test_pid_match() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/foot", Some("foot"), None);
        desktop.add_process(7, "/usr/bin/foot", Some("foot --other"), None);
        desktop.add_window(FakeWindow::new(1, "Terminal", "foot", rect()));
        let launched = desktop.add_window(FakeWindow::new(7, "Terminal", "foot", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let found = find_window("foot", &spec("foot", None, None), Some(7), &windows, TAG).unwrap();

        assert_eq!(found.window.id(), launched);
        assert_eq!(found.kind, MatchKind::Pid);
    }

    #[test]
    fn test_first_command_match_wins() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/foot", Some("foot"), None);
        desktop.add_process(2, "/usr/bin/foot", Some("foot"), None);
        let first = desktop.add_window(FakeWindow::new(1, "Terminal", "foot", rect()));
        desktop.add_window(FakeWindow::new(2, "Terminal", "foot", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let wanted = spec("foot", Some("Terminal"), Some("foot"));
        let found = find_window("foot", &wanted, None, &windows, TAG).unwrap();

        assert_eq!(found.window.id(), first);
        assert_eq!(found.kind, MatchKind::Command);
    }

    #[test]
    fn test_title_and_class_narrow_command_match() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/code", Some("code"), None);
        desktop.add_window(FakeWindow::new(1, "notes - Code", "Code", rect()));
        desktop.add_window(FakeWindow::new(1, "project - Code", "Dialog", rect()));
        let wanted = desktop.add_window(FakeWindow::new(1, "project - Code", "Code", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let wanted_spec = spec("code", Some("project - Code"), Some("Code"));
        let found = find_window("code", &wanted_spec, None, &windows, TAG).unwrap();

        assert_eq!(found.window.id(), wanted);
    }

    #[test]
    fn test_missing_criteria_are_ignored() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/code", Some("code"), None);
        let only = desktop.add_window(FakeWindow::new(1, "anything", "Whatever", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let found = find_window("code", &spec("code", None, None), None, &windows, TAG).unwrap();
        assert_eq!(found.window.id(), only);
    }

    #[test]
    fn test_uses_launch_command_without_detected_command() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/code", Some("code --new-window"), None);
        let only = desktop.add_window(FakeWindow::new(1, "Code", "Code", rect()));

        let mut hand_written = spec("code --new-window", None, None);
        hand_written.detected_command = None;

        let windows = Window::visible(&desktop).unwrap();
        let found = find_window("code", &hand_written, None, &windows, TAG).unwrap();
        assert_eq!(found.window.id(), only);
    }

    #[test]
    fn test_denied_command_line_compares_exe() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/secret", None, None);
        let only = desktop.add_window(FakeWindow::new(1, "Secret", "secret", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let wanted = spec("/usr/bin/secret", None, None);
        let found = find_window("secret", &wanted, None, &windows, TAG).unwrap();
        assert_eq!(found.window.id(), only);
    }

    #[test]
    fn test_no_match() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/foot", Some("foot"), Some(&[(TAG, "other")][..]));
        desktop.add_window(FakeWindow::new(1, "Terminal", "foot", rect()));

        let windows = Window::visible(&desktop).unwrap();
        let other_title = spec("foot", Some("Other title"), None);
        assert!(find_window("foot", &other_title, None, &windows, TAG).is_none());
        assert!(find_window("foot", &spec("foot", None, None), None, &[], TAG).is_none());
    }

    #[test]
    fn test_closed_window_is_skipped() {
        let desktop = FakeDesktop::new();
        desktop.add_process(1, "/usr/bin/foot", Some("foot"), None);
        let closed = desktop.add_window(FakeWindow::new(1, "Terminal", "foot", rect()));
        let open = desktop.add_window(FakeWindow::new(1, "Terminal", "foot", rect()));

        let windows = Window::visible(&desktop).unwrap();
        desktop.close_window(closed);

        let found = find_window("foot", &spec("foot", None, None), None, &windows, TAG).unwrap();
        assert_eq!(found.window.id(), open);
    }
}
