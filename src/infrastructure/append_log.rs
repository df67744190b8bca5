//! Append-only measurement log.
//!
//! Each payload is written verbatim followed by `\n`. A payload that itself
//! contains a newline will read back as several records; this is not
//! enforced, only logged.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;

use crate::domain::{AppError, Result};

const DELIMITER: u8 = b'\n';

/// Byte destination the log appends records to.
pub trait LogSink: Write + Send {
    /// Current length in bytes.
    ///
    /// # Errors
    /// Returns the I/O error if the size cannot be determined.
    fn size(&self) -> io::Result<u64>;

    /// Cut the sink back to `len` bytes.
    ///
    /// # Errors
    /// Returns the I/O error if the sink cannot be shortened.
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Flush written bytes to stable storage.
    ///
    /// # Errors
    /// Returns the I/O error if syncing fails.
    fn sync(&mut self) -> io::Result<()>;

    /// Exclude other writers of the same sink, including other processes.
    ///
    /// # Errors
    /// Returns the I/O error if the lock cannot be taken.
    fn acquire(&self) -> io::Result<()> {
        Ok(())
    }

    /// Undo [`LogSink::acquire`].
    ///
    /// # Errors
    /// Returns the I/O error if the lock cannot be released.
    fn release(&self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for File {
    fn size(&self) -> io::Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn acquire(&self) -> io::Result<()> {
        FileExt::lock_exclusive(self)
    }

    fn release(&self) -> io::Result<()> {
        FileExt::unlock(self)
    }
}

/// Line-delimited, write-only log shared by all submitters.
#[derive(Debug)]
pub struct AppendLog<S = File> {
    path: PathBuf,
    sink: Mutex<S>,
    sync_on_append: bool,
}

impl AppendLog {
    /// Opens the log for appending, creating it if absent. Never truncates.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or created.
    pub fn open(path: &Path, sync_on_append: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create measurement directory", e))?;
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| {
                AppError::io(
                    format!("Cannot open measurement file: {}", path.display()),
                    e,
                )
            })?;

        Ok(Self::with_sink(path.to_path_buf(), file, sync_on_append))
    }
}

impl<S: LogSink> AppendLog<S> {
    /// Wrap an already-open sink. `path` is only reported, never opened.
    pub fn with_sink(path: PathBuf, sink: S, sync_on_append: bool) -> Self {
        Self {
            path,
            sink: Mutex::new(sink),
            sync_on_append,
        }
    }

    /// Appends one record.
    ///
    /// Payload and delimiter go out under the in-process lock and the sink's
    /// own lock, so concurrent appends never interleave. A write that fails
    /// part way is cut back off, leaving the log as it was.
    ///
    /// # Errors
    /// Returns error if the write (or the optional fsync) fails.
    pub fn append(&self, payload: &[u8]) -> Result<()> {
        if payload.contains(&DELIMITER) {
            tracing::warn!(
                bytes = payload.len(),
                "Measurement payload contains a newline and will span several lines"
            );
        }

        let mut record = Vec::with_capacity(payload.len() + 1);
        record.extend_from_slice(payload);
        record.push(DELIMITER);

        let mut sink = self.sink.lock();
        sink.acquire()
            .map_err(|e| AppError::io("Failed to lock measurement file", e))?;
        let written = self.write_record(&mut sink, &record);
        if let Err(e) = sink.release() {
            tracing::warn!(error = %e, "Failed to release measurement file lock");
        }
        drop(sink);
        written?;

        tracing::debug!(bytes = payload.len(), "Appended measurement");
        Ok(())
    }

    fn write_record(&self, sink: &mut S, record: &[u8]) -> Result<()> {
        let start = sink
            .size()
            .map_err(|e| AppError::io("Failed to read measurement file size", e))?;

        let written = sink.write_all(record).and_then(|()| {
            if self.sync_on_append {
                sink.sync()
            } else {
                Ok(())
            }
        });

        if let Err(e) = written {
            match sink.truncate(start) {
                Ok(()) => tracing::warn!(len = start, "Removed partial measurement record"),
                Err(cut) => tracing::error!(
                    len = start,
                    error = %cut,
                    "Failed to remove partial measurement record"
                ),
            }
            return Err(AppError::io("Failed to append measurement", e));
        }
        Ok(())
    }

    /// Current size of the log in bytes.
    ///
    /// # Errors
    /// Returns error if the file metadata cannot be read.
    pub fn len(&self) -> Result<u64> {
        self.sink
            .lock()
            .size()
            .map_err(|e| AppError::io("Failed to read measurement file size", e))
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
