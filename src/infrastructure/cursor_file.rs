//! File-backed cursor persistence.
//!
//! The position is stored as decimal ASCII. Every update writes a temporary
//! file, fsyncs it and renames it over the cursor file, so a crash leaves
//! either the previous or the new value on disk. Processes sharing the same
//! cursor serialize on an advisory lock held on a sibling `.lock` file; the
//! cursor file itself is replaced on every write and cannot carry the lock.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;

use crate::domain::{parse_position, AppError, CursorPersistence, Result};

/// Cursor position stored in a small text file.
#[derive(Debug)]
pub struct CursorFile {
    path: PathBuf,
    lock: File,
}

impl CursorFile {
    /// Opens the cursor file and its lock file, creating them (and their
    /// directory) if absent.
    ///
    /// # Errors
    /// Returns error if either file cannot be opened or created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create cursor directory", e))?;
        }

        OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| {
                AppError::io(format!("Cannot open cursor file: {}", path.display()), e)
            })?;

        let lock_path = sibling(path, ".lock");
        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                AppError::io(
                    format!("Cannot open cursor lock file: {}", lock_path.display()),
                    e,
                )
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            lock,
        })
    }

    /// Location of the cursor file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the cursor was last written, if the filesystem reports it.
    #[must_use]
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, &format!(".{}.tmp", std::process::id()))
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        File::open(parent)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> io::Result<()> {
        Ok(())
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Releases the advisory lock when dropped, including on unwind.
struct LockGuard<'a>(&'a File);

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.0) {
            tracing::warn!(error = %e, "Failed to release cursor lock");
        }
    }
}

impl CursorPersistence for CursorFile {
    fn recover(&self) -> Option<usize> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot read cursor file");
                return None;
            }
        };

        let position = parse_position(&content);
        if position.is_none() && !content.trim().is_empty() {
            tracing::warn!(
                path = %self.path.display(),
                content = content.trim(),
                "Cursor file is not a number"
            );
        }
        position
    }

    fn persist(&self, position: usize) -> io::Result<()> {
        let temp = self.temp_path();

        let mut file = File::create(&temp)?;
        file.write_all(position.to_string().as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &self.path)?;
        self.sync_parent()
    }

    fn exclusive<R>(&self, f: impl FnOnce() -> R) -> io::Result<R> {
        FileExt::lock_exclusive(&self.lock)?;
        let _guard = LockGuard(&self.lock);
        Ok(f())
    }
}
