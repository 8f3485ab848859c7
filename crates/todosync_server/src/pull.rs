//! Pull handling.

use crate::checkpoint::CheckpointResolver;
use crate::documents::{checkpoint_at, position_of, todo_from_record};
use crate::error::ServerResult;
use todosync_protocol::{Checkpoint, PullBulk};
use todosync_storage::Collection;
use tracing::debug;

/// Answers pulls relative to a client checkpoint.
///
/// Records are scanned in cursor order, starting strictly after the client
/// checkpoint, at most `limit` per call. Soft-deleted records advance the
/// scan but are not returned.
#[derive(Debug, Clone)]
pub struct PullHandler<'r> {
    resolver: &'r CheckpointResolver,
    limit: usize,
}

impl<'r> PullHandler<'r> {
    /// Creates a pull handler scanning at most `limit` records per call.
    ///
    /// A zero limit is raised to one so every pull makes progress.
    pub fn new(resolver: &'r CheckpointResolver, limit: usize) -> Self {
        Self {
            resolver,
            limit: limit.max(1),
        }
    }

    /// Returns the documents changed after `since` and the checkpoint to
    /// pull from next.
    ///
    /// When the page is full the returned checkpoint is the position of the
    /// last scanned record, so a follow-up pull continues from there.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint is unusable or the store fails.
    pub fn pull<C: Collection + ?Sized>(
        &self,
        collection: &C,
        since: Option<Checkpoint>,
    ) -> ServerResult<PullBulk> {
        let after = since.as_ref().map(position_of).transpose()?;
        let authoritative = self.resolver.current(collection)?;

        if let Some(client) = since {
            if !client.is_before(&authoritative) {
                debug!(checkpoint = %client.id, "client is up to date");
                return Ok(PullBulk::empty(client));
            }
        }

        let page = collection.find_since(after.as_ref(), self.limit)?;
        let checkpoint = match page.last() {
            Some(last) if page.len() >= self.limit => checkpoint_at(&last.position()),
            _ => authoritative,
        };

        let scanned = page.len();
        let documents: Vec<_> = page
            .iter()
            .filter(|record| !record.deleted)
            .map(todo_from_record)
            .collect();

        debug!(
            scanned,
            returned = documents.len(),
            checkpoint = %checkpoint.id,
            "pull answered"
        );
        Ok(PullBulk::new(documents, checkpoint))
    }
}
