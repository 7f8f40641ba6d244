//! Lifecycle gate: join window and terminal closure.
//!
//! Joining and checking out are guarded independently: the join window can
//! expire while checkouts stay legal until the table is explicitly closed.

use table_types::time::Timestamp;

use crate::errors::TableError;

#[derive(Debug, Clone)]
pub struct LifecycleGate {
    /// `None` means joins are never cut off by time
    open_until: Option<Timestamp>,
    closed: bool,
}

impl LifecycleGate {
    pub fn new(open_until: Option<Timestamp>) -> Self {
        Self {
            open_until,
            closed: false,
        }
    }

    pub fn open_until(&self) -> Option<Timestamp> {
        self.open_until
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Joins are accepted while not closed and before `open_until`.
    pub fn can_join(&self, now: Timestamp) -> Result<(), TableError> {
        if self.closed {
            return Err(TableError::GameNotOpen);
        }
        match self.open_until {
            Some(deadline) if now >= deadline => Err(TableError::GameNotOpen),
            _ => Ok(()),
        }
    }

    /// Checkouts only require the table not to be closed.
    pub fn can_checkout(&self) -> Result<(), TableError> {
        if self.closed {
            return Err(TableError::GameNotOpen);
        }
        Ok(())
    }

    /// Close the table. Returns `true` only for the call that performed the
    /// transition.
    pub fn close(&mut self) -> bool {
        let transitioned = !self.closed;
        self.closed = true;
        transitioned
    }
}
