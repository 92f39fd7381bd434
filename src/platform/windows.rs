#![allow(unsafe_code, reason = "Win32 window and process calls go through FFI")]
#![allow(
    clippy::as_conversions,
    reason = "HWND/LPARAM round-trips through EnumWindows and raw remote addresses"
)]

use super::{Desktop, Pid, WindowId};
use crate::error::PlatformError;
use crate::models::Rect;
use std::ffi::{c_void, OsString};
use std::mem::size_of;
use std::os::windows::ffi::OsStringExt;
use std::os::windows::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use windows_sys::Win32::Foundation::{CloseHandle, BOOL, HANDLE, HWND, LPARAM, RECT};
use windows_sys::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows_sys::Win32::System::Threading::{
    NtQueryInformationProcess, OpenProcess, ProcessBasicInformation, QueryFullProcessImageNameW,
    PROCESS_BASIC_INFORMATION, PROCESS_QUERY_INFORMATION, PROCESS_QUERY_LIMITED_INFORMATION,
    PROCESS_VM_READ,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsWindow, IsWindowVisible, SetWindowPos, ShowWindow,
    SWP_NOACTIVATE, SWP_NOZORDER, SW_SHOWNORMAL,
};

const PTR: usize = size_of::<usize>();

/// Offsets into the PEB and `RTL_USER_PROCESS_PARAMETERS`
#[cfg(target_pointer_width = "64")]
mod peb {
    pub const PROCESS_PARAMETERS: usize = 0x20;
    pub const COMMAND_LINE: usize = 0x70;
    pub const ENVIRONMENT: usize = 0x80;
    pub const ENVIRONMENT_SIZE: usize = 0x3F0;
}

#[cfg(target_pointer_width = "32")]
mod peb {
    pub const PROCESS_PARAMETERS: usize = 0x10;
    pub const COMMAND_LINE: usize = 0x40;
    pub const ENVIRONMENT: usize = 0x48;
    pub const ENVIRONMENT_SIZE: usize = 0x290;
}

/// Environment blocks larger than this are truncated
const MAX_ENVIRONMENT_BYTES: usize = 1 << 20;

/// Longest class name Win32 allows
const MAX_CLASS_NAME: usize = 256;

/// Win32 window manipulation. Command lines and environments come from the
/// target's PEB, which is only readable for processes of the same user.
#[derive(Default)]
pub struct WindowsDesktop;

impl WindowsDesktop {
    pub fn new() -> Self {
        Self
    }

    fn hwnd(window: WindowId) -> Result<HWND, PlatformError> {
        let hwnd = HWND::try_from(window.0).map_err(|_| PlatformError::WindowGone(window.0))?;
        if unsafe { IsWindow(hwnd) } == 0 {
            return Err(PlatformError::WindowGone(window.0));
        }
        Ok(hwnd)
    }

    fn window_rect(hwnd: HWND) -> Result<Rect, PlatformError> {
        let mut rect = RECT { left: 0, top: 0, right: 0, bottom: 0 };
        if unsafe { GetWindowRect(hwnd, &mut rect) } == 0 {
            return Err(PlatformError::Win32 { call: "GetWindowRect" });
        }
        Ok(Rect::new(rect.left, rect.top, rect.right, rect.bottom))
    }
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam as *mut Vec<HWND>);
    windows.push(hwnd);
    1
}

impl Desktop for WindowsDesktop {
    fn visible_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
        let mut all: Vec<HWND> = Vec::new();
        let ok = unsafe { EnumWindows(Some(collect_window), &mut all as *mut Vec<HWND> as LPARAM) };
        if ok == 0 {
            return Err(PlatformError::Win32 { call: "EnumWindows" });
        }

        Ok(all
            .into_iter()
            .filter(|hwnd| unsafe { IsWindowVisible(*hwnd) } != 0)
            .filter(|hwnd| Self::window_rect(*hwnd).is_ok_and(|rect| !rect.is_empty()))
            .filter_map(|hwnd| u64::try_from(hwnd).ok())
            .map(WindowId)
            .collect())
    }

    fn title(&self, window: WindowId) -> Result<String, PlatformError> {
        let hwnd = Self::hwnd(window)?;
        let len = unsafe { GetWindowTextLengthW(hwnd) };
        let capacity = usize::try_from(len).unwrap_or(0) + 1;
        let mut buf = vec![0u16; capacity];
        let copied = unsafe { GetWindowTextW(hwnd, buf.as_mut_ptr(), capacity as i32) };
        buf.truncate(usize::try_from(copied).unwrap_or(0));
        Ok(OsString::from_wide(&buf).to_string_lossy().into_owned())
    }

    fn class_name(&self, window: WindowId) -> Result<String, PlatformError> {
        let hwnd = Self::hwnd(window)?;
        let mut buf = vec![0u16; MAX_CLASS_NAME];
        let copied = unsafe { GetClassNameW(hwnd, buf.as_mut_ptr(), MAX_CLASS_NAME as i32) };
        if copied == 0 {
            return Err(PlatformError::Win32 { call: "GetClassNameW" });
        }
        buf.truncate(usize::try_from(copied).unwrap_or(0));
        Ok(OsString::from_wide(&buf).to_string_lossy().into_owned())
    }

    fn rect(&self, window: WindowId) -> Result<Rect, PlatformError> {
        Self::window_rect(Self::hwnd(window)?)
    }

    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<(), PlatformError> {
        let hwnd = Self::hwnd(window)?;
        let ok = unsafe {
            ShowWindow(hwnd, SW_SHOWNORMAL);
            SetWindowPos(
                hwnd,
                0,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
        if ok == 0 {
            return Err(PlatformError::Win32 { call: "SetWindowPos" });
        }
        Ok(())
    }

    fn process_id(&self, window: WindowId) -> Result<Pid, PlatformError> {
        let hwnd = Self::hwnd(window)?;
        let mut pid: u32 = 0;
        unsafe { GetWindowThreadProcessId(hwnd, &mut pid) };
        if pid == 0 {
            return Err(PlatformError::WindowGone(window.0));
        }
        Ok(pid)
    }

    fn exe(&self, pid: Pid) -> Result<PathBuf, PlatformError> {
        let process = ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION)?;
        let mut buf = vec![0u16; 2048];
        let mut size: u32 = buf.len() as u32;
        let ok = unsafe { QueryFullProcessImageNameW(process.0, 0, buf.as_mut_ptr(), &mut size) };
        if ok == 0 || size == 0 {
            return Err(PlatformError::AccessDenied);
        }
        buf.truncate(size as usize);
        Ok(PathBuf::from(OsString::from_wide(&buf)))
    }

    fn command_line(&self, pid: Pid) -> Result<String, PlatformError> {
        let process = ProcessHandle::open(pid, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ)?;
        let params = process.process_parameters()?;
        let cmd = process.read_unicode_string(params + peb::COMMAND_LINE)?;
        if cmd.is_empty() {
            return Err(PlatformError::AccessDenied);
        }
        Ok(cmd)
    }

    fn environ_var(&self, pid: Pid, key: &str) -> Result<Option<String>, PlatformError> {
        let process = ProcessHandle::open(pid, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ)?;
        let params = process.process_parameters()?;
        let block = process.read_usize(params + peb::ENVIRONMENT)?;
        let size = process
            .read_usize(params + peb::ENVIRONMENT_SIZE)?
            .min(MAX_ENVIRONMENT_BYTES);
        let wide = process.read_wide(block, size)?;
        Ok(lookup_environment(&parse_environment(&wide), key))
    }

    fn spawn(&self, command: &str, tag_key: &str, tag_value: &str) -> Result<Pid, PlatformError> {
        let (program, args) = split_command(command, Path::is_file);
        let mut cmd = Command::new(program);
        if !args.is_empty() {
            cmd.raw_arg(args);
        }
        let child = cmd.env(tag_key, tag_value).spawn()?;
        Ok(child.id())
    }
}

/// Open handle to another process, closed on drop.
struct ProcessHandle(HANDLE);

impl ProcessHandle {
    fn open(pid: Pid, access: u32) -> Result<Self, PlatformError> {
        let handle = unsafe { OpenProcess(access, 0, pid) };
        if handle == 0 {
            return Err(PlatformError::AccessDenied);
        }
        Ok(Self(handle))
    }

    fn read(&self, address: usize, len: usize) -> Result<Vec<u8>, PlatformError> {
        let mut buf = vec![0u8; len];
        let mut copied = 0usize;
        let ok = unsafe {
            ReadProcessMemory(
                self.0,
                address as *const c_void,
                buf.as_mut_ptr().cast(),
                len,
                &mut copied,
            )
        };
        if ok == 0 || copied != len {
            return Err(PlatformError::AccessDenied);
        }
        Ok(buf)
    }

    fn read_array<const N: usize>(&self, address: usize) -> Result<[u8; N], PlatformError> {
        <[u8; N]>::try_from(self.read(address, N)?).map_err(|_| PlatformError::AccessDenied)
    }

    fn read_usize(&self, address: usize) -> Result<usize, PlatformError> {
        Ok(usize::from_ne_bytes(self.read_array::<PTR>(address)?))
    }

    fn read_wide(&self, address: usize, bytes: usize) -> Result<Vec<u16>, PlatformError> {
        Ok(self
            .read(address, bytes)?
            .chunks_exact(2)
            .filter_map(|pair| <[u8; 2]>::try_from(pair).ok().map(u16::from_ne_bytes))
            .collect())
    }

    /// `UNICODE_STRING` at `address`: byte length, padding, buffer pointer.
    fn read_unicode_string(&self, address: usize) -> Result<String, PlatformError> {
        let len = usize::from(u16::from_ne_bytes(self.read_array::<2>(address)?));
        let buffer = self.read_usize(address + PTR)?;
        if len == 0 || buffer == 0 {
            return Ok(String::new());
        }
        Ok(String::from_utf16_lossy(&self.read_wide(buffer, len)?))
    }

    /// Address of the process's `RTL_USER_PROCESS_PARAMETERS`.
    fn process_parameters(&self) -> Result<usize, PlatformError> {
        let mut info: PROCESS_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
        let mut returned = 0u32;
        let status = unsafe {
            NtQueryInformationProcess(
                self.0,
                ProcessBasicInformation,
                (&mut info as *mut PROCESS_BASIC_INFORMATION).cast(),
                size_of::<PROCESS_BASIC_INFORMATION>() as u32,
                &mut returned,
            )
        };
        if status != 0 || info.PebBaseAddress.is_null() {
            return Err(PlatformError::AccessDenied);
        }
        self.read_usize(info.PebBaseAddress as usize + peb::PROCESS_PARAMETERS)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.0) };
    }
}

/// Entries of a `K=V\0K=V\0\0` environment block.
fn parse_environment(block: &[u16]) -> Vec<String> {
    block
        .split(|c| *c == 0)
        .take_while(|entry| !entry.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

/// Variable names are case-insensitive on Windows. Entries such as `=C:=C:\`
/// have an empty name and never match.
fn lookup_environment(entries: &[String], key: &str) -> Option<String> {
    entries.iter().find_map(|entry| {
        entry
            .split_once('=')
            .filter(|(k, _)| !k.is_empty() && k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.to_string())
    })
}

/// Split a command into program and arguments. A command that names an
/// existing file as a whole is an unquoted executable path, which may
/// contain spaces.
fn split_command(command: &str, is_file: impl Fn(&Path) -> bool) -> (&str, &str) {
    let trimmed = command.trim();
    if !trimmed.starts_with('"') && is_file(Path::new(trimmed)) {
        return (trimmed, "");
    }
    split_program(trimmed)
}

/// Split a Win32 command line into the program and the untouched remainder.
fn split_program(command: &str) -> (&str, &str) {
    let command = command.trim_start();
    if let Some(quoted) = command.strip_prefix('"') {
        if let Some((program, rest)) = quoted.split_once('"') {
            return (program, rest.trim_start());
        }
        return (quoted, "");
    }
    match command.split_once(char::is_whitespace) {
        Some((program, rest)) => (program, rest.trim_start()),
        None => (command, ""),
    }
}
