//! Rollout resolution against the sled flag store.

use chrono::Duration;
use std::sync::Arc;
use stride::clock::ManualClock;
use stride::rollout::{
    EvaluationReason, FeatureFlag, FlagStore, RolloutConfig, RolloutResolver, SledFlagStore,
    UserOverride,
};
use tempfile::TempDir;

fn resolver(store: Arc<SledFlagStore>, clock: Arc<ManualClock>) -> RolloutResolver {
    RolloutResolver::new(store, clock, &RolloutConfig::default())
}

#[test]
fn half_rollout_enrols_about_half_of_users() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(SledFlagStore::open(temp.path().join("flags")).unwrap());
    store.put_flag(&FeatureFlag::new("beta_v2", 50)).unwrap();
    let resolver = resolver(store, Arc::new(ManualClock::default()));

    let enrolled = (0..2000)
        .filter(|i| resolver.is_enabled(&format!("user-{}", i), "beta_v2"))
        .count();
    assert!(
        (900..=1100).contains(&enrolled),
        "expected 45%-55% enrolment, got {} of 2000",
        enrolled
    );
}

#[test]
fn raising_the_percentage_never_drops_enrolled_users() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(SledFlagStore::open(temp.path().join("flags")).unwrap());
    let resolver = resolver(store.clone(), Arc::new(ManualClock::default()));
    let users: Vec<String> = (0..500).map(|i| format!("user-{}", i)).collect();

    store.put_flag(&FeatureFlag::new("beta_v2", 20)).unwrap();
    let before: Vec<bool> = users.iter().map(|u| resolver.is_enabled(u, "beta_v2")).collect();

    store.put_flag(&FeatureFlag::new("beta_v2", 60)).unwrap();
    resolver.invalidate("beta_v2");
    for (user, was_enabled) in users.iter().zip(before) {
        if was_enabled {
            assert!(resolver.is_enabled(user, "beta_v2"), "{} left the rollout", user);
        }
    }
}

#[test]
fn override_beats_force_disable_until_it_expires() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(SledFlagStore::open(temp.path().join("flags")).unwrap());
    let clock = Arc::new(ManualClock::default());
    let resolver = resolver(store.clone(), clock.clone());

    let mut flag = FeatureFlag::new("beta_v2", 100);
    flag.admin_force_disabled = Some(true);
    store.put_flag(&flag).unwrap();
    store
        .put_override(
            &UserOverride::new("qa-user", "beta_v2", true, "exploratory testing")
                .expiring_at(chrono::Utc::now() + Duration::hours(1)),
        )
        .unwrap();

    let evaluation = resolver.evaluate("qa-user", "beta_v2");
    assert!(evaluation.enabled);
    assert_eq!(evaluation.reason, EvaluationReason::UserOverride);
    assert!(!resolver.is_enabled("someone-else", "beta_v2"));

    clock.advance(Duration::hours(2));
    let evaluation = resolver.evaluate("qa-user", "beta_v2");
    assert!(!evaluation.enabled);
    assert_eq!(evaluation.reason, EvaluationReason::AdminForceDisabled);
}

#[test]
fn flag_changes_appear_once_the_cache_expires() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(SledFlagStore::open(temp.path().join("flags")).unwrap());
    let clock = Arc::new(ManualClock::default());
    let resolver = resolver(store.clone(), clock.clone());

    store.put_flag(&FeatureFlag::new("beta_v2", 0)).unwrap();
    assert!(!resolver.is_enabled("user-1", "beta_v2"));

    store.put_flag(&FeatureFlag::new("beta_v2", 100)).unwrap();
    assert!(!resolver.is_enabled("user-1", "beta_v2"));

    clock.advance(Duration::seconds(31));
    assert!(resolver.is_enabled("user-1", "beta_v2"));
}

#[test]
fn unknown_flag_is_disabled() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(SledFlagStore::open(temp.path().join("flags")).unwrap());
    let resolver = resolver(store, Arc::new(ManualClock::default()));
    let evaluation = resolver.evaluate("user-1", "never_created");
    assert!(!evaluation.enabled);
    assert_eq!(evaluation.reason, EvaluationReason::FlagNotFound);
}

#[test]
fn persisted_flags_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flags");
    {
        let store = SledFlagStore::open(&path).unwrap();
        store.put_flag(&FeatureFlag::new("beta_v2", 100)).unwrap();
        store.flush().unwrap();
    }
    let store = Arc::new(SledFlagStore::open(&path).unwrap());
    let resolver = resolver(store, Arc::new(ManualClock::default()));
    assert!(resolver.is_enabled("user-1", "beta_v2"));
    assert_eq!(resolver.enabled_flags("user-1"), vec!["beta_v2".to_string()]);
}
