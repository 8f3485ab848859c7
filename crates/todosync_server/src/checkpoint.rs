//! Checkpoint resolution.
//!
//! The checkpoint is never held in memory. It is read from the collection as
//! the greatest cursor position, so every process that opens the same store
//! agrees on it and it survives restarts together with the data.

use crate::documents::checkpoint_at;
use crate::error::ServerResult;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use todosync_protocol::Checkpoint;
use todosync_storage::Collection;

/// Computes the current checkpoint and allocates write stamps.
#[derive(Debug, Clone)]
pub struct CheckpointResolver {
    started_at: DateTime<Utc>,
}

impl CheckpointResolver {
    /// Creates a resolver whose empty-collection sentinel carries
    /// `started_at`.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at: started_at.trunc_subsecs(3),
        }
    }

    /// Returns the sentinel reported while the collection is empty.
    pub fn sentinel(&self) -> Checkpoint {
        Checkpoint::sentinel(self.started_at)
    }

    /// Returns the checkpoint of the most recent write, or the sentinel.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    pub fn current<C: Collection + ?Sized>(&self, collection: &C) -> ServerResult<Checkpoint> {
        Ok(collection
            .max_position()?
            .map(|position| checkpoint_at(&position))
            .unwrap_or_else(|| self.sentinel()))
    }

    /// Allocates the checkpoint the next write of `id` will carry.
    ///
    /// Once that write is stored, [`current`](Self::current) returns exactly
    /// the value returned here. Callers must hold the push lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    pub fn advance<C: Collection + ?Sized>(
        &self,
        collection: &C,
        id: &str,
    ) -> ServerResult<Checkpoint> {
        self.advance_at(collection, id, Utc::now())
    }

    pub(crate) fn advance_at<C: Collection + ?Sized>(
        &self,
        collection: &C,
        id: &str,
        now: DateTime<Utc>,
    ) -> ServerResult<Checkpoint> {
        let current = self.current(collection)?;
        let stamp = next_stamp(now, current.updated_at);
        Ok(Checkpoint::new(id, stamp))
    }
}

/// Millisecond stamp strictly after `previous`.
fn next_stamp(now: DateTime<Utc>, previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(3);
    let floor = previous.trunc_subsecs(3) + Duration::milliseconds(1);
    now.max(floor)
}
