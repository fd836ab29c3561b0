//! Open archive handles.
//!
//! An [`Archive`] keeps a zip/jar file open so repeated lookups do not pay
//! for re-reading the central directory. Handles are owned by the loader's
//! wrappers and never handed to callers.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Result, StevedoreError};

/// Suffix of the entry that holds a compiled unit.
const UNIT_SUFFIX: &str = ".class";

pub struct Archive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("entries", &self.zip.len())
            .finish()
    }
}

impl Archive {
    /// Opens the archive at `path` and reads its central directory.
    ///
    /// # Errors
    ///
    /// Returns [`StevedoreError::ArchiveOpen`] if the file is missing,
    /// unreadable, or not a zip archive.
    pub fn open(path: &Path) -> Result<Self> {
        let zip = File::open(path)
            .map_err(ZipError::from)
            .and_then(ZipArchive::new)
            .map_err(|source| StevedoreError::ArchiveOpen {
                location: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    /// Reads an entry.
    ///
    /// Returns `Ok(None)` when the archive has no file entry named `name`.
    pub fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let read_error = |source| StevedoreError::ResourceRead {
            name: name.to_string(),
            location: self.path.clone(),
            source,
        };

        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(read_error(err)),
        };
        if entry.is_dir() {
            return Ok(None);
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| read_error(ZipError::from(e)))?;
        Ok(Some(buf))
    }

    /// Names of all file entries, in central directory order.
    pub fn entry_names(&self) -> Vec<String> {
        self.zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }
}

/// Maps a logical unit name to the entry that holds it.
///
/// `org.example.Widget` becomes `org/example/Widget.class`. Names that already
/// end in `.class` are taken as entry paths.
pub fn unit_entry_name(name: &str) -> String {
    if name.ends_with(UNIT_SUFFIX) {
        return name.to_string();
    }
    format!("{}{UNIT_SUFFIX}", name.replace('.', "/"))
}
