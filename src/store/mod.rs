use crate::error::LayoutError;
use crate::models::{Layout, NamedTable, ProgramSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The persisted document: program descriptors plus named layouts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutStore {
    #[serde(default)]
    pub programs: NamedTable<ProgramSpec>,
    #[serde(default)]
    pub layouts: NamedTable<Layout>,
}

impl LayoutStore {
    /// Load the store, treating a missing file as an empty store.
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::open(path)
    }

    /// Load the store, failing if the file does not exist.
    pub fn open(path: &Path) -> Result<Self, LayoutError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LayoutError::StoreNotFound { path: path.to_path_buf() });
            }
            Err(source) => return Err(LayoutError::Io { path: path.to_path_buf(), source }),
        };

        // Files edited with some Windows tools start with a byte-order mark
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        serde_json::from_slice(body).map_err(|source| LayoutError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the whole store, replacing the previous file contents.
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        self.write_atomically(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn layout(&self, name: &str) -> Result<&Layout, LayoutError> {
        self.layouts.get(name).ok_or_else(|| LayoutError::LayoutNotFound { name: name.to_string() })
    }

    pub fn program(&self, name: &str) -> Option<&ProgramSpec> {
        self.programs.get(name)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }

    fn write_atomically(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = self.to_json().map_err(io::Error::other)?;

        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, path)
    }
}
