use super::{Desktop, Pid, WindowId};
use crate::error::PlatformError;
use crate::models::Rect;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt, EventMask, GetPropertyReply,
    MapState, Window,
};
use x11rb::rust_connection::RustConnection;

/// `_NET_WM_STATE` action code for removing a state
const NET_WM_STATE_REMOVE: u32 = 0;

/// Source indication for client messages: 1 = normal application
const SOURCE_APPLICATION: u32 = 1;

/// Decorations a reparenting window manager draws around a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FrameExtents {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

impl FrameExtents {
    /// Outer frame rectangle around a client at `client`.
    fn outer(self, client: Rect) -> Rect {
        Rect::new(
            client.left - self.left,
            client.top - self.top,
            client.right + self.right,
            client.bottom + self.bottom,
        )
    }

    /// Client size whose frame fills `frame`.
    fn client_size(self, frame: Rect) -> (u32, u32) {
        let width = frame.width() - self.left - self.right;
        let height = frame.height() - self.top - self.bottom;
        (
            u32::try_from(width.max(1)).unwrap_or(1),
            u32::try_from(height.max(1)).unwrap_or(1),
        )
    }
}

/// X11 (EWMH) windows plus `/proc` process introspection.
///
/// Rectangles are outer frame rectangles, decorations included, both when
/// read and when applied.
pub struct LinuxDesktop {
    conn: Option<RustConnection>,
    root: Window,
}

impl Default for LinuxDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxDesktop {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let Some(screen) = conn.setup().roots.get(screen_num) else {
                    let screens = conn.setup().roots.len();
                    warn!("Invalid screen {screen_num} of {screens}. Window control disabled.");
                    return Self { conn: None, root: 0 };
                };
                let root = screen.root;
                Self {
                    conn: Some(conn),
                    root,
                }
            }
            Err(e) => {
                // Keep going so commands that never touch windows still work
                warn!("Failed to connect to X server: {e}. Window control disabled.");
                Self { conn: None, root: 0 }
            }
        }
    }

    fn conn(&self) -> Result<&RustConnection, PlatformError> {
        self.conn.as_ref().ok_or(PlatformError::NoDisplay)
    }

    fn xid(window: WindowId) -> Result<Window, PlatformError> {
        Window::try_from(window.0).map_err(|_| PlatformError::WindowGone(window.0))
    }

    fn atom(&self, name: &str) -> Result<u32, PlatformError> {
        Ok(self.conn()?.intern_atom(false, name.as_bytes())?.reply()?.atom)
    }

    fn property(
        &self,
        window: Window,
        atom: u32,
        kind: impl Into<u32>,
    ) -> Result<GetPropertyReply, PlatformError> {
        Ok(self
            .conn()?
            .get_property(false, window, atom, kind, 0, u32::MAX)?
            .reply()?)
    }

    fn text_property(&self, window: Window, atom: u32) -> Result<Option<String>, PlatformError> {
        let reply = self.property(window, atom, AtomEnum::ANY)?;
        if reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }

    fn client_list(&self) -> Result<Vec<Window>, PlatformError> {
        let atom = self.atom("_NET_CLIENT_LIST")?;
        let reply = self.property(self.root, atom, AtomEnum::WINDOW)?;
        Ok(reply.value32().map(|ids| ids.collect()).unwrap_or_default())
    }

    fn is_viewable(&self, window: Window) -> Result<bool, PlatformError> {
        let attrs = self.conn()?.get_window_attributes(window)?.reply()?;
        Ok(attrs.map_state == MapState::VIEWABLE)
    }

    fn window_rect(&self, window: Window) -> Result<Rect, PlatformError> {
        let conn = self.conn()?;
        let geometry = conn.get_geometry(window)?.reply()?;
        let origin = conn.translate_coordinates(window, self.root, 0, 0)?.reply()?;
        let client = Rect::from_origin_size(
            i32::from(origin.dst_x),
            i32::from(origin.dst_y),
            i32::from(geometry.width),
            i32::from(geometry.height),
        );
        Ok(self.frame_extents(window)?.outer(client))
    }

    /// `_NET_FRAME_EXTENTS`, or no decorations when the WM does not set it.
    fn frame_extents(&self, window: Window) -> Result<FrameExtents, PlatformError> {
        let atom = self.atom("_NET_FRAME_EXTENTS")?;
        let reply = self.property(window, atom, AtomEnum::CARDINAL)?;
        let values: Vec<i32> = reply
            .value32()
            .map(|values| values.map(|v| i32::try_from(v).unwrap_or(0)).collect())
            .unwrap_or_default();
        Ok(match values.as_slice() {
            [left, right, top, bottom, ..] => FrameExtents {
                left: *left,
                right: *right,
                top: *top,
                bottom: *bottom,
            },
            _ => FrameExtents::default(),
        })
    }

    /// Ask the window manager to drop maximised state so the new geometry
    /// sticks.
    fn unmaximize(&self, window: Window) -> Result<(), PlatformError> {
        let conn = self.conn()?;
        let wm_state = self.atom("_NET_WM_STATE")?;
        let max_vert = self.atom("_NET_WM_STATE_MAXIMIZED_VERT")?;
        let max_horz = self.atom("_NET_WM_STATE_MAXIMIZED_HORZ")?;
        let event = ClientMessageEvent::new(
            32,
            window,
            wm_state,
            [NET_WM_STATE_REMOVE, max_vert, max_horz, SOURCE_APPLICATION, 0],
        );
        conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }
}

impl Desktop for LinuxDesktop {
    fn visible_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
        let mut visible = Vec::new();
        for window in self.client_list()? {
            // Windows can disappear between listing and querying them
            let shown = self.is_viewable(window).unwrap_or(false)
                && self.window_rect(window).is_ok_and(|rect| !rect.is_empty());
            if shown {
                visible.push(WindowId(u64::from(window)));
            }
        }
        debug!("{} visible windows", visible.len());
        Ok(visible)
    }

    fn title(&self, window: WindowId) -> Result<String, PlatformError> {
        let window = Self::xid(window)?;
        let net_name = self.atom("_NET_WM_NAME")?;
        if let Some(title) = self.text_property(window, net_name)? {
            return Ok(title);
        }
        Ok(self
            .text_property(window, AtomEnum::WM_NAME.into())?
            .unwrap_or_default())
    }

    fn class_name(&self, window: WindowId) -> Result<String, PlatformError> {
        let window = Self::xid(window)?;
        let raw = self
            .text_property(window, AtomEnum::WM_CLASS.into())?
            .unwrap_or_default();
        Ok(parse_wm_class(&raw))
    }

    fn rect(&self, window: WindowId) -> Result<Rect, PlatformError> {
        self.window_rect(Self::xid(window)?)
    }

    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<(), PlatformError> {
        let xid = Self::xid(window)?;
        let conn = self.conn()?;

        self.unmaximize(xid)?;

        // With NorthWest gravity the WM places the frame's outer corner at x/y
        let (width, height) = self.frame_extents(xid)?.client_size(rect);
        let aux = ConfigureWindowAux::new()
            .x(rect.left)
            .y(rect.top)
            .width(width)
            .height(height);
        conn.configure_window(xid, &aux)?;
        conn.flush()?;
        Ok(())
    }

    fn process_id(&self, window: WindowId) -> Result<Pid, PlatformError> {
        let window = Self::xid(window)?;
        let atom = self.atom("_NET_WM_PID")?;
        let reply = self.property(window, atom, AtomEnum::CARDINAL)?;
        reply
            .value32()
            .and_then(|mut values| values.next())
            .ok_or(PlatformError::Unsupported("window without _NET_WM_PID"))
    }

    fn exe(&self, pid: Pid) -> Result<PathBuf, PlatformError> {
        fs::read_link(format!("/proc/{pid}/exe")).map_err(proc_error)
    }

    fn command_line(&self, pid: Pid) -> Result<String, PlatformError> {
        let raw = fs::read(format!("/proc/{pid}/cmdline")).map_err(proc_error)?;
        let args = split_nul(&raw);
        if args.is_empty() {
            // Kernel threads and zombies expose no arguments
            return Err(PlatformError::AccessDenied);
        }
        Ok(shell_join(&args))
    }

    fn environ_var(&self, pid: Pid, key: &str) -> Result<Option<String>, PlatformError> {
        let raw = fs::read(format!("/proc/{pid}/environ")).map_err(proc_error)?;
        Ok(split_nul(&raw).into_iter().find_map(|entry| {
            entry
                .split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }))
    }

    fn spawn(&self, command: &str, tag_key: &str, tag_value: &str) -> Result<Pid, PlatformError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env(tag_key, tag_value)
            .spawn()?;
        let pid = child.id();
        // Reap the shell when it exits so it never lingers as a zombie
        thread::spawn(move || {
            if let Err(e) = child.wait() {
                debug!("Could not reap pid {pid}: {e}");
            }
        });
        Ok(pid)
    }
}

fn proc_error(e: io::Error) -> PlatformError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        PlatformError::AccessDenied
    } else {
        PlatformError::Io(e)
    }
}

/// `WM_CLASS` holds "instance\0class\0"; prefer the class part.
fn parse_wm_class(raw: &str) -> String {
    let mut parts = raw.split('\0').filter(|p| !p.is_empty());
    let instance = parts.next().unwrap_or_default();
    parts.next().unwrap_or(instance).to_string()
}

fn split_nul(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

/// Render argv as a string `sh -c` turns back into the same argv.
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,@%+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
