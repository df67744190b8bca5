//! Persistence seam for the dispensing cursor.

use std::io;

/// Durable home of a cursor position.
///
/// `persist` must only return `Ok` once the value is on stable storage.
pub trait CursorPersistence: Send + Sync {
    /// Read back the last persisted position.
    ///
    /// Returns `None` when nothing usable is stored (absent, empty, or not a
    /// number).
    fn recover(&self) -> Option<usize>;

    /// Durably replace the stored position.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the value could not be written.
    fn persist(&self, position: usize) -> io::Result<()>;

    /// Run `f` while no other holder of the same storage (in any process)
    /// can read-modify-persist the position.
    ///
    /// The default only relies on the caller's in-process lock.
    ///
    /// # Errors
    /// Returns the I/O error if exclusive access cannot be obtained.
    fn exclusive<R>(&self, f: impl FnOnce() -> R) -> io::Result<R> {
        Ok(f())
    }
}

/// Parse the textual form of a persisted position.
#[must_use]
pub fn parse_position(content: &str) -> Option<usize> {
    content.trim().parse().ok()
}
