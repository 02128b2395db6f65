//! Program persistence with a primary and a lagging replica read path.

use crate::consistency::{ConsistencyCoordinator, ReadRoute};
use crate::error::StorageError;
use crate::program::ProgramArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const TREE_PRIMARY: &str = "programs_primary";
const TREE_REPLICA: &str = "programs_replica";
const TREE_REPLICATION_QUEUE: &str = "programs_replication_queue";

/// A persisted program. Values are bincode encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProgram {
    pub record_id: String,
    pub owner_id: String,
    pub program: ProgramArtifact,
    /// Hex blake3 digest of the program content
    pub revision: String,
    pub written_at: DateTime<Utc>,
}

impl StoredProgram {
    pub fn new(
        record_id: impl Into<String>,
        owner_id: impl Into<String>,
        program: ProgramArtifact,
        written_at: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        let revision = revision_of(&program)?;
        Ok(Self {
            record_id: record_id.into(),
            owner_id: owner_id.into(),
            program,
            revision,
            written_at,
        })
    }
}

pub fn revision_of(program: &ProgramArtifact) -> Result<String, StorageError> {
    let bytes = serde_json::to_vec(program)?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}

/// Store with a current write path and a possibly stale replica path.
pub trait RecordStore: Send + Sync {
    fn write_primary(&self, record: &StoredProgram) -> Result<(), StorageError>;
    fn read_primary(&self, record_id: &str) -> Result<Option<StoredProgram>, StorageError>;
    fn read_replica(&self, record_id: &str) -> Result<Option<StoredProgram>, StorageError>;
}

/// Sled-backed store simulating replication lag: writes land in the primary tree and
/// reach the replica tree only when [`replicate`](Self::replicate) runs.
#[derive(Clone)]
pub struct SledReplicatedStore {
    db: Db,
    primary: Tree,
    replica: Tree,
    queue: Tree,
}

impl SledReplicatedStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::new(db)
    }

    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self, StorageError> {
        let primary = db.open_tree(TREE_PRIMARY)?;
        let replica = db.open_tree(TREE_REPLICA)?;
        let queue = db.open_tree(TREE_REPLICATION_QUEUE)?;
        Ok(Self {
            db,
            primary,
            replica,
            queue,
        })
    }

    /// Copy every pending write to the replica. Returns the number copied.
    pub fn replicate(&self) -> Result<usize, StorageError> {
        let mut copied = 0;
        for item in self.queue.iter() {
            let (key, _) = item?;
            if let Some(value) = self.primary.get(&key)? {
                self.replica.insert(&key, value)?;
                copied += 1;
            }
            self.queue.remove(&key)?;
        }
        if copied > 0 {
            debug!(copied, "Replicated pending program writes");
        }
        Ok(copied)
    }

    pub fn replication_backlog(&self) -> usize {
        self.queue.len()
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn decode(raw: &[u8]) -> Result<StoredProgram, StorageError> {
        Ok(bincode::deserialize(raw)?)
    }
}

impl RecordStore for SledReplicatedStore {
    fn write_primary(&self, record: &StoredProgram) -> Result<(), StorageError> {
        let value = bincode::serialize(record)?;
        let key = record.record_id.as_bytes();
        self.primary.insert(key, value)?;
        self.queue.insert(key, Vec::<u8>::new())?;
        Ok(())
    }

    fn read_primary(&self, record_id: &str) -> Result<Option<StoredProgram>, StorageError> {
        self.primary
            .get(record_id.as_bytes())?
            .map(|raw| Self::decode(&raw))
            .transpose()
    }

    fn read_replica(&self, record_id: &str) -> Result<Option<StoredProgram>, StorageError> {
        self.replica
            .get(record_id.as_bytes())?
            .map(|raw| Self::decode(&raw))
            .transpose()
    }
}

/// Write-then-read facade that keeps a writer's read-back off a stale replica.
pub struct ConsistentStore {
    store: Arc<dyn RecordStore>,
    coordinator: Arc<ConsistencyCoordinator>,
}

impl ConsistentStore {
    pub fn new(store: Arc<dyn RecordStore>, coordinator: Arc<ConsistencyCoordinator>) -> Self {
        Self { store, coordinator }
    }

    pub fn coordinator(&self) -> &Arc<ConsistencyCoordinator> {
        &self.coordinator
    }

    pub fn write(
        &self,
        record_id: &str,
        owner_id: &str,
        program: ProgramArtifact,
    ) -> Result<StoredProgram, StorageError> {
        let record = StoredProgram::new(record_id, owner_id, program, self.coordinator.now())?;
        self.store.write_primary(&record)?;
        self.coordinator.record_write(record_id, owner_id);
        Ok(record)
    }

    pub fn read(&self, record_id: &str) -> Result<Option<StoredProgram>, StorageError> {
        let tracked = self.coordinator.record(record_id);
        match self.coordinator.route_read(record_id) {
            ReadRoute::Replica => self.store.read_replica(record_id),
            ReadRoute::Primary => {
                let current = self.store.read_primary(record_id)?;
                if let (Some(current), Some(tracked)) = (&current, tracked) {
                    self.probe_replica(current, tracked.written_at);
                }
                Ok(current)
            }
        }
    }

    /// Release the primary pin once the replica serves the same revision.
    fn probe_replica(&self, current: &StoredProgram, written_at: DateTime<Utc>) {
        match self.store.read_replica(&current.record_id) {
            Ok(Some(replica)) if replica.revision == current.revision => {
                if self
                    .coordinator
                    .mark_replicated_as_of(&current.record_id, written_at)
                {
                    debug!(record_id = %current.record_id, "Replica caught up");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(record_id = %current.record_id, error = %e, "Replica probe failed"),
        }
    }
}
