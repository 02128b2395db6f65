//! Read-after-write routing over the sled primary/replica store.

use super::test_utils::valid_program;
use chrono::Duration;
use std::sync::Arc;
use stride::clock::ManualClock;
use stride::consistency::{
    ConsistencyConfig, ConsistencyCoordinator, ConsistentStore, ReadRoute, RecordStore,
    RouteReason, SledReplicatedStore,
};
use stride::program::ProgramArtifact;
use stride::validation::Guardian;
use tempfile::TempDir;

fn program(name: &str) -> ProgramArtifact {
    let (mut program, _) = Guardian::default().accept(&valid_program()).unwrap();
    program.name = name.to_string();
    program
}

struct Fixture {
    _temp: TempDir,
    clock: Arc<ManualClock>,
    backend: SledReplicatedStore,
    store: ConsistentStore,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::default());
    let backend = SledReplicatedStore::open(temp.path().join("programs")).unwrap();
    let coordinator = Arc::new(ConsistencyCoordinator::new(
        &ConsistencyConfig::default(),
        clock.clone(),
    ));
    let store = ConsistentStore::new(Arc::new(backend.clone()), coordinator);
    Fixture {
        _temp: temp,
        clock,
        backend,
        store,
    }
}

#[test]
fn writer_reads_own_program_before_replication() {
    let f = fixture();
    f.store.write("prg_1", "alice", program("Week One")).unwrap();

    assert!(f.backend.read_replica("prg_1").unwrap().is_none());
    let read = f.store.read("prg_1").unwrap().expect("program should be visible");
    assert_eq!(read.program.name, "Week One");
}

#[test]
fn reads_move_to_the_replica_after_the_window() {
    let f = fixture();
    f.store.write("prg_1", "alice", program("Week One")).unwrap();
    assert_eq!(f.store.coordinator().route_read("prg_1"), ReadRoute::Primary);

    f.clock.advance(Duration::milliseconds(5_001));
    let (route, reason) = f.store.coordinator().decide("prg_1");
    assert_eq!(route, ReadRoute::Replica);
    assert_eq!(reason, RouteReason::WindowExpired);

    f.backend.replicate().unwrap();
    assert_eq!(f.store.read("prg_1").unwrap().unwrap().program.name, "Week One");
}

#[test]
fn rewrite_inside_window_is_never_served_stale() {
    let f = fixture();
    f.store.write("prg_1", "alice", program("Draft")).unwrap();
    f.backend.replicate().unwrap();
    f.store.read("prg_1").unwrap();
    assert_eq!(f.store.coordinator().decide("prg_1").1, RouteReason::Replicated);

    f.clock.advance(Duration::milliseconds(100));
    f.store.write("prg_1", "alice", program("Final")).unwrap();
    for _ in 0..3 {
        assert_eq!(f.store.read("prg_1").unwrap().unwrap().program.name, "Final");
    }
}

#[test]
fn untracked_records_read_from_the_replica() {
    let f = fixture();
    assert_eq!(f.store.coordinator().decide("prg_other").1, RouteReason::Untracked);
    assert!(f.store.read("prg_other").unwrap().is_none());
}

#[test]
fn purge_forgets_expired_writes() {
    let f = fixture();
    f.store.write("prg_1", "alice", program("A")).unwrap();
    f.store.write("prg_2", "bob", program("B")).unwrap();
    assert_eq!(f.store.coordinator().pending().len(), 2);

    f.clock.advance(Duration::seconds(6));
    assert_eq!(f.store.coordinator().purge(), 2);
    assert_eq!(f.store.coordinator().tracked(), 0);
}
