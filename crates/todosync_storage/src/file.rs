//! File-backed store for persistent collections.

use crate::backend::{Collection, Connector, UpdateOutcome};
use crate::error::{StoreError, StoreResult};
use crate::index::DocumentIndex;
use crate::record::{DocumentKey, Position, StoredTodo, TodoFields};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file-backed store.
///
/// Records are kept in a JSON-lines log: every write appends the full
/// record, and the last line for a key wins. Data survives process
/// restarts, and several processes may share one log.
///
/// # Connections
///
/// Each connection holds an exclusive OS lock on `<log>.lock` and first
/// reads whatever other processes appended since this store last looked.
/// Connections therefore serialize across processes as well as threads.
///
/// # Compaction
///
/// [`FileStore::compact`] rewrites the log with one line per key. The lock
/// file carries a generation number bumped by every compaction, so other
/// stores over the same log reload it on their next connect.
///
/// # Durability
///
/// Every write is followed by `File::sync_data()`. A final line left
/// without its newline by an interrupted write is truncated on the next
/// connect; a malformed complete line is reported as corruption.
///
/// # Example
///
/// ```no_run
/// use todosync_storage::{Collection, Connector, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data/todos.jsonl")).unwrap();
/// let conn = store.connect().unwrap();
/// println!("{} todos", conn.count().unwrap());
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    state: Mutex<LogState>,
}

/// What compacting a log reclaims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactStats {
    /// Lines in the log before compaction.
    pub input_records: usize,
    /// Lines after compaction, one per key.
    pub output_records: usize,
    /// Log size before compaction.
    pub bytes_before: u64,
    /// Log size after compaction.
    pub bytes_after: u64,
}

impl CompactStats {
    /// Lines superseded by a later write of the same key.
    #[must_use]
    pub fn obsolete_removed(&self) -> usize {
        self.input_records - self.output_records
    }

    /// Whether compacting would change the log.
    #[must_use]
    pub fn is_needed(&self) -> bool {
        self.bytes_after < self.bytes_before
    }
}

impl FileStore {
    /// Opens or creates a store at the given path, creating parent
    /// directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or its contents are
    /// corrupted.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
            lock_path: sibling(path, ".lock"),
            state: Mutex::new(LogState::default()),
        };
        drop(store.connect()?);
        Ok(store)
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the lock file.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Reports what [`compact`](Self::compact) would reclaim without
    /// changing the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    pub fn compaction_stats(&self) -> StoreResult<CompactStats> {
        self.connect()?.compacted().map(|(_, stats)| stats)
    }

    /// Rewrites the log keeping only the latest record of every key.
    ///
    /// The new log is written next to the old one and renamed over it, so
    /// an interrupted compaction leaves the old log intact. Must not be
    /// called while this thread holds a connection to the same store.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or replaced.
    pub fn compact(&self) -> StoreResult<CompactStats> {
        self.connect()?.compact()
    }

    fn open_lock(&self) -> StoreResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StoreError::Connection(format!("{}: {e}", self.lock_path.display())))
    }
}

impl Connector for FileStore {
    type Connection<'a> = FileConnection<'a>
    where
        Self: 'a;

    fn connect(&self) -> StoreResult<FileConnection<'_>> {
        let mut state = self.state.lock();
        let mut lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock)
            .map_err(|e| StoreError::Connection(format!("lock {}: {e}", self.lock_path.display())))?;

        let generation = read_generation(&mut lock)?;
        if generation != state.generation {
            debug!(generation, "store log was compacted, reloading");
            state.reset();
            state.generation = generation;
        }

        let mut file = open_log(&self.path)?;
        if let Err(e) = state.catch_up(&mut file) {
            state.reset();
            return Err(e);
        }

        Ok(FileConnection {
            path: &self.path,
            lock,
            file,
            state,
        })
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn open_log(path: &Path) -> StoreResult<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| StoreError::Connection(format!("{}: {e}", path.display())))
}

/// Reads the compaction generation stored in the lock file. An empty lock
/// file is generation zero.
fn read_generation(lock: &mut File) -> StoreResult<u64> {
    let mut raw = String::new();
    lock.seek(SeekFrom::Start(0))?;
    lock.read_to_string(&mut raw)?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| StoreError::Connection(format!("unreadable lock file generation {raw:?}")))
}

fn write_generation(lock: &mut File, generation: u64) -> StoreResult<()> {
    lock.set_len(0)?;
    lock.seek(SeekFrom::Start(0))?;
    writeln!(lock, "{generation}")?;
    lock.sync_data()?;
    Ok(())
}

/// What this process has read of the log so far.
#[derive(Debug, Default)]
struct LogState {
    index: DocumentIndex,
    /// Compaction generation the offsets below refer to.
    generation: u64,
    /// Bytes of the log already applied to `index`.
    offset: u64,
    /// Complete lines already applied.
    lines: usize,
}

impl LogState {
    fn reset(&mut self) {
        self.index.clear();
        self.offset = 0;
        self.lines = 0;
    }

    /// Applies records appended since `offset`.
    fn catch_up(&mut self, file: &mut File) -> StoreResult<()> {
        let size = file.metadata()?.len();
        if size < self.offset {
            warn!(size, offset = self.offset, "store log shrank, reloading");
            self.reset();
        }
        if size == self.offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut tail = Vec::new();
        file.read_to_end(&mut tail)?;

        let mut consumed = 0usize;
        for line in tail.split_inclusive(|b| *b == b'\n') {
            if line.last() != Some(&b'\n') {
                let keep = self.offset + consumed as u64;
                warn!(
                    dropped = line.len(),
                    at = keep,
                    "truncating unterminated record at end of store log"
                );
                file.set_len(keep)?;
                file.sync_all()?;
                break;
            }

            self.lines += 1;
            let body = &line[..line.len() - 1];
            if !body.iter().all(u8::is_ascii_whitespace) {
                let record: StoredTodo =
                    serde_json::from_slice(body).map_err(|e| StoreError::Corrupted {
                        line: self.lines,
                        reason: e.to_string(),
                    })?;
                self.index.put(record);
            }
            consumed += line.len();
        }

        self.offset += consumed as u64;
        debug!(offset = self.offset, records = self.index.len(), "caught up with store log");
        Ok(())
    }
}

/// A connection to a [`FileStore`].
///
/// Holds the store's exclusive lock until dropped.
pub struct FileConnection<'a> {
    path: &'a Path,
    lock: File,
    file: File,
    state: MutexGuard<'a, LogState>,
}

impl FileConnection<'_> {
    fn append(&mut self, record: StoredTodo) -> StoreResult<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        self.file.seek(SeekFrom::Start(self.state.offset))?;
        self.file.write_all(&line)?;
        self.file.sync_data()?;

        self.state.offset += line.len() as u64;
        self.state.lines += 1;
        self.state.index.put(record);
        Ok(())
    }

    /// Renders the compacted log: the latest record per key in cursor order.
    fn compacted(&self) -> StoreResult<(Vec<u8>, CompactStats)> {
        let records = self.state.index.since(None, usize::MAX);
        let mut contents = Vec::new();
        for record in &records {
            serde_json::to_writer(&mut contents, record)?;
            contents.push(b'\n');
        }

        let stats = CompactStats {
            input_records: self.state.lines,
            output_records: records.len(),
            bytes_before: self.state.offset,
            bytes_after: contents.len() as u64,
        };
        Ok((contents, stats))
    }

    fn compact(&mut self) -> StoreResult<CompactStats> {
        let (contents, stats) = self.compacted()?;
        if !stats.is_needed() {
            debug!(records = stats.output_records, "store log already compact");
            return Ok(stats);
        }

        let staged = sibling(self.path, ".compact");
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staged)?;
        file.write_all(&contents)?;
        file.sync_all()?;

        // Bump first: a crash before the rename only costs other stores a
        // full reload of the old log.
        let generation = self.state.generation + 1;
        write_generation(&mut self.lock, generation)?;
        drop(std::mem::replace(&mut self.file, file));
        fs::rename(&staged, self.path)?;

        self.state.generation = generation;
        self.state.offset = stats.bytes_after;
        self.state.lines = stats.output_records;
        info!(
            removed = stats.obsolete_removed(),
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            "compacted store log"
        );
        Ok(stats)
    }
}

impl Drop for FileConnection<'_> {
    fn drop(&mut self) {
        // Closing the handle releases the lock too.
        let _ = FileExt::unlock(&self.lock);
    }
}

impl Collection for FileConnection<'_> {
    fn find_all(&self, limit: usize) -> StoreResult<Vec<StoredTodo>> {
        Ok(self.state.index.all(limit))
    }

    fn find_since(&self, after: Option<&Position>, limit: usize) -> StoreResult<Vec<StoredTodo>> {
        Ok(self.state.index.since(after, limit))
    }

    fn find_one(&self, key: &DocumentKey) -> StoreResult<Option<StoredTodo>> {
        Ok(self.state.index.get(key).cloned())
    }

    fn insert_one(&mut self, record: StoredTodo) -> StoreResult<()> {
        if self.state.index.contains(&record.key) {
            return Err(StoreError::DuplicateKey(record.key.to_string()));
        }
        self.append(record)
    }

    fn update_one(
        &mut self,
        key: &DocumentKey,
        fields: TodoFields,
        updated_at: DateTime<Utc>,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let outcome = match (self.state.index.contains(key), upsert) {
            (true, _) => UpdateOutcome::Matched,
            (false, true) => UpdateOutcome::Upserted,
            (false, false) => return Ok(UpdateOutcome::NotFound),
        };
        self.append(StoredTodo::from_fields(key.clone(), fields, updated_at))?;
        Ok(outcome)
    }

    fn max_position(&self) -> StoreResult<Option<Position>> {
        Ok(self.state.index.max_position())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.state.index.len())
    }
}
