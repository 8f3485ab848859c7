//! Push handling.

use crate::checkpoint::CheckpointResolver;
use crate::documents::{fields_of, key_of, record_of, todo_from_record};
use crate::error::{ServerError, ServerResult};
use todosync_protocol::{ChangeAction, PushResponse, PushRow};
use todosync_storage::{Collection, DocumentKey, StoreError, UpdateOutcome};
use tracing::{debug, info, warn};

/// Reconciles pushed rows against stored documents.
///
/// Rows are applied in order, each one reading the store afresh so that it
/// observes the writes of the rows before it. A row whose assumed state no
/// longer matches the stored document is reported as a conflict and not
/// written. Callers must hold the push lock for the whole call.
#[derive(Debug, Clone)]
pub struct PushHandler<'r> {
    resolver: &'r CheckpointResolver,
    max_batch: usize,
}

impl<'r> PushHandler<'r> {
    /// Creates a push handler accepting at most `max_batch` rows per call.
    pub fn new(resolver: &'r CheckpointResolver, max_batch: usize) -> Self {
        Self {
            resolver,
            max_batch,
        }
    }

    /// Applies `rows` to `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error, before anything is written, if the batch is too
    /// large or a row has an empty id. Store failures abort the remaining
    /// rows; rows already applied stay written.
    pub fn push<C: Collection + ?Sized>(
        &self,
        collection: &mut C,
        rows: Vec<PushRow>,
    ) -> ServerResult<PushResponse> {
        if rows.len() > self.max_batch {
            return Err(ServerError::BatchTooLarge {
                len: rows.len(),
                max: self.max_batch,
            });
        }
        let keys = rows
            .iter()
            .map(|row| key_of(&row.new_document_state.id))
            .collect::<ServerResult<Vec<DocumentKey>>>()?;

        let mut response = PushResponse::new();
        for (row, key) in rows.into_iter().zip(keys) {
            self.apply(collection, row, key, &mut response)?;
        }

        if response.has_conflicts() {
            warn!(conflicts = response.conflicts.len(), "push had conflicts");
        }
        if response.has_changes() {
            info!(changes = response.changes.len(), "push applied changes");
        }
        Ok(response)
    }

    fn apply<C: Collection + ?Sized>(
        &self,
        collection: &mut C,
        row: PushRow,
        key: DocumentKey,
        response: &mut PushResponse,
    ) -> ServerResult<()> {
        let existing = collection.find_one(&key)?.map(|record| todo_from_record(&record));

        if let (Some(assumed), Some(server)) = (&row.assumed_master_state, &existing) {
            if !server.matches(assumed) {
                warn!(id = %key, "assumed state does not match server document");
                response.record_conflict(server.clone());
                return Ok(());
            }
        }

        let candidate = row.new_document_state.to_todo();
        match existing {
            Some(server) if !server.differs_from(&candidate) => {
                debug!(id = %key, "document unchanged, skipping");
            }
            Some(_) => {
                let stamp = self.resolver.advance(&*collection, &candidate.id)?;
                let outcome =
                    collection.update_one(&key, fields_of(&candidate), stamp.updated_at, true)?;
                let action = match outcome {
                    UpdateOutcome::Matched => ChangeAction::for_update(&candidate),
                    UpdateOutcome::Upserted => {
                        warn!(id = %key, "document missing at update, written as new");
                        ChangeAction::Inserted
                    }
                    UpdateOutcome::NotFound => {
                        return Err(StoreError::Connection(format!(
                            "update of {key} matched no record"
                        ))
                        .into());
                    }
                };
                debug!(id = %key, action = action.as_str(), "document updated");
                response.record_change(candidate, action);
            }
            None => {
                let stamp = self.resolver.advance(&*collection, &candidate.id)?;
                collection.insert_one(record_of(key.clone(), &candidate, stamp.updated_at))?;
                debug!(id = %key, "document inserted");
                response.record_change(candidate, ChangeAction::Inserted);
            }
        }
        Ok(())
    }
}
