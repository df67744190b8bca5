//! Durable sequential dispensing.
//!
//! A `CursorStore` hands out items of a fixed list in order, exactly once
//! each, remembering progress through a [`CursorPersistence`]. The position is
//! always persisted before it changes in memory, so a failed or interrupted
//! write leaves the store where it was.
//!
//! Several stores may share one persistence (separate processes each opening
//! the same cursor file). Every advance re-reads the durable position while
//! holding the persistence's exclusive access, so no item is handed out twice.

use parking_lot::RwLock;

use crate::domain::{AppError, CursorPersistence, Result};

/// Position into an immutable item list, backed by durable storage.
pub struct CursorStore<T, P> {
    items: Vec<T>,
    position: RwLock<usize>,
    persistence: P,
}

impl<T, P: CursorPersistence> CursorStore<T, P> {
    /// Builds a store positioned at the persisted value, or 0 if none is usable.
    pub fn initialize(persistence: P, items: Vec<T>) -> Self {
        let position = persistence.recover().unwrap_or(0);

        if position > items.len() {
            tracing::warn!(
                position,
                total = items.len(),
                "Recovered cursor is past the end of the list"
            );
        }
        tracing::info!(position, total = items.len(), "Cursor initialized");

        Self {
            items,
            position: RwLock::new(position),
            persistence,
        }
    }

    /// Returns the item at the current position without advancing.
    ///
    /// # Errors
    /// Returns [`AppError::Exhausted`] once every item has been handed out.
    pub fn dispense_current(&self) -> Result<&T> {
        let position = self.current(*self.position.read());
        self.items.get(position).ok_or(AppError::Exhausted {
            total: self.items.len(),
        })
    }

    /// Persists `position + 1`, then moves the in-memory cursor there.
    ///
    /// # Errors
    /// Returns [`AppError::Exhausted`] if already at the end, or
    /// [`AppError::Io`] if persisting fails (the position is then unchanged).
    pub fn advance(&self) -> Result<()> {
        self.exclusive(|position| {
            if *position >= self.items.len() {
                return Err(AppError::Exhausted {
                    total: self.items.len(),
                });
            }
            self.step(position)
        })
    }

    /// Hands out the current item and advances past it in one critical section.
    ///
    /// Concurrent callers, in this process or any other sharing the same
    /// persistence, never receive the same item.
    ///
    /// # Errors
    /// Same as [`CursorStore::advance`]. No item is returned when the persist
    /// fails.
    pub fn dispense_next(&self) -> Result<&T> {
        self.exclusive(|position| {
            let item = self.items.get(*position).ok_or(AppError::Exhausted {
                total: self.items.len(),
            })?;
            self.step(position)?;
            Ok(item)
        })
    }

    /// Runs `f` holding the in-process write lock and the persistence's
    /// exclusive access, with the position refreshed from durable storage.
    fn exclusive<R>(&self, f: impl FnOnce(&mut usize) -> Result<R>) -> Result<R> {
        let mut position = self.position.write();
        self.persistence
            .exclusive(|| {
                let durable = self.current(*position);
                *position = durable;
                f(&mut *position)
            })
            .map_err(|e| AppError::io("Failed to lock cursor", e))?
    }

    /// Durable position, falling back to the cached one when storage has
    /// nothing usable.
    fn current(&self, cached: usize) -> usize {
        self.persistence.recover().unwrap_or(cached)
    }

    fn step(&self, position: &mut usize) -> Result<()> {
        let next = *position + 1;
        self.persistence
            .persist(next)
            .map_err(|e| AppError::io(format!("Failed to persist cursor position {next}"), e))?;
        *position = next;

        tracing::debug!(position = next, "Cursor advanced");
        Ok(())
    }

    /// Index of the next item to hand out.
    pub fn position(&self) -> usize {
        self.current(*self.position.read())
    }

    /// Number of items in the list.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no items at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items not yet handed out.
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.position())
    }

    /// The backing persistence.
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }
}
