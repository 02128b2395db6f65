//! Consistency Coordinator
//!
//! Tracks recent writes so a writer's own read-back is served by the primary until
//! the replica has caught up or the replication window has passed. This bounds
//! staleness for the writer. It is not a linearizability guarantee.

pub mod store;

pub use store::{ConsistentStore, RecordStore, SledReplicatedStore, StoredProgram};

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Consistency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    /// Upper bound on replica lag; after this a write record no longer pins reads (milliseconds)
    #[serde(default = "default_replication_window_ms")]
    pub replication_window_ms: u64,
}

fn default_replication_window_ms() -> u64 {
    5_000
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            replication_window_ms: default_replication_window_ms(),
        }
    }
}

impl ConsistencyConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.replication_window_ms == 0 {
            return Err("replication_window_ms must be positive".to_string());
        }
        if self.replication_window_ms > i64::MAX as u64 {
            return Err("replication_window_ms is too large".to_string());
        }
        Ok(())
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.replication_window_ms.min(i64::MAX as u64) as i64)
    }
}

/// A write that may not have reached the replica yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub record_id: String,
    pub owner_id: String,
    pub written_at: DateTime<Utc>,
    pub replicated: bool,
}

/// Which read path to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadRoute {
    Primary,
    Replica,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    /// Recent unreplicated write
    PendingReplication,
    /// The window passed without confirmation
    WindowExpired,
    Replicated,
    /// No write known for this id
    Untracked,
    /// Write stamped after the current time; the primary is always safe
    Ambiguous,
}

/// Writes between sweeps of released records
const SWEEP_INTERVAL: u64 = 256;

pub struct ConsistencyCoordinator {
    records: RwLock<HashMap<String, WriteRecord>>,
    window: chrono::Duration,
    clock: Arc<dyn Clock>,
    writes: AtomicU64,
}

impl ConsistencyCoordinator {
    pub fn new(config: &ConsistencyConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            window: config.window(),
            clock,
            writes: AtomicU64::new(0),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Call right after a write commits to the primary. A rewrite restarts tracking.
    pub fn record_write(&self, record_id: &str, owner_id: &str) -> WriteRecord {
        let record = WriteRecord {
            record_id: record_id.to_string(),
            owner_id: owner_id.to_string(),
            written_at: self.clock.now(),
            replicated: false,
        };
        let swept = {
            let mut records = self.records.write();
            records.insert(record_id.to_string(), record.clone());
            if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
                let before = records.len();
                records.retain(|_, r| self.still_pins(r, record.written_at));
                before - records.len()
            } else {
                0
            }
        };
        debug!(record_id, owner_id, swept, "Write recorded");
        record
    }

    pub fn route_read(&self, record_id: &str) -> ReadRoute {
        self.decide(record_id).0
    }

    /// Released records are dropped here, so a released id reads as untracked afterwards.
    pub fn decide(&self, record_id: &str) -> (ReadRoute, RouteReason) {
        let now = self.clock.now();
        let decision = match self.records.read().get(record_id) {
            None => (ReadRoute::Replica, RouteReason::Untracked),
            Some(record) if record.replicated => (ReadRoute::Replica, RouteReason::Replicated),
            Some(record) if record.written_at > now => (ReadRoute::Primary, RouteReason::Ambiguous),
            Some(record) if now - record.written_at >= self.window => {
                (ReadRoute::Replica, RouteReason::WindowExpired)
            }
            Some(_) => (ReadRoute::Primary, RouteReason::PendingReplication),
        };
        if matches!(decision.1, RouteReason::Replicated | RouteReason::WindowExpired) {
            let mut records = self.records.write();
            // A rewrite may have landed between the two locks.
            if records.get(record_id).is_some_and(|r| !self.still_pins(r, now)) {
                records.remove(record_id);
            }
        }
        debug!(record_id, route = ?decision.0, reason = ?decision.1, "Read routed");
        decision
    }

    fn still_pins(&self, record: &WriteRecord, now: DateTime<Utc>) -> bool {
        !record.replicated && (record.written_at > now || now - record.written_at < self.window)
    }

    /// Idempotent. Unknown ids are ignored.
    pub fn mark_replicated(&self, record_id: &str) {
        if let Some(record) = self.records.write().get_mut(record_id) {
            if !record.replicated {
                record.replicated = true;
                debug!(record_id, "Write marked replicated");
            }
        }
    }

    /// Mark replicated only if no newer write replaced the one observed at `written_at`.
    pub fn mark_replicated_as_of(&self, record_id: &str, written_at: DateTime<Utc>) -> bool {
        match self.records.write().get_mut(record_id) {
            Some(record) if record.written_at <= written_at => {
                record.replicated = true;
                true
            }
            _ => false,
        }
    }

    pub fn record(&self, record_id: &str) -> Option<WriteRecord> {
        self.records.read().get(record_id).cloned()
    }

    /// Unreplicated records still inside the window, oldest first
    pub fn pending(&self) -> Vec<WriteRecord> {
        let now = self.clock.now();
        let mut pending: Vec<WriteRecord> = self
            .records
            .read()
            .values()
            .filter(|r| !r.replicated && now - r.written_at < self.window)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.written_at.cmp(&b.written_at).then_with(|| a.record_id.cmp(&b.record_id)));
        pending
    }

    /// Drop records that no longer affect routing. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, r| self.still_pins(r, now));
        before - records.len()
    }

    pub fn tracked(&self) -> usize {
        self.records.read().len()
    }
}
