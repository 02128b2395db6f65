//! Property-based tests for determinism and monotonicity guarantees

use proptest::prelude::*;
use std::time::Duration;
use stride::error::ProviderError;
use stride::generation::{
    parse_candidate, AttemptOutcome, GenerationAttempt, GenerationConfig, GenerationOrchestrator, Step,
};
use stride::rollout::bucket::{compute_bucket, in_rollout};

proptest! {
    /// Same inputs always land in the same bucket, and buckets stay in range
    #[test]
    fn bucket_is_stable_and_bounded(user in ".{0,40}", flag in "[a-z_]{1,20}", salt in ".{0,16}") {
        let first = compute_bucket(&user, &flag, &salt);
        let second = compute_bucket(&user, &flag, &salt);
        prop_assert_eq!(first, second);
        prop_assert!(first < 100);
    }

    /// Enrolment at a lower percentage implies enrolment at every higher one
    #[test]
    fn rollout_is_monotonic(user in "[a-z0-9-]{1,24}", low in 0u8..=100, high in 0u8..=100) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        if in_rollout(&user, "beta_v2", "salt", low) {
            prop_assert!(in_rollout(&user, "beta_v2", "salt", high));
        }
        prop_assert!(!in_rollout(&user, "beta_v2", "salt", 0));
        prop_assert!(in_rollout(&user, "beta_v2", "salt", 100));
    }

    /// Complexity never rises from one attempt to the next
    #[test]
    fn complexity_is_non_increasing(attempt in 1u32..50) {
        let orchestrator = GenerationOrchestrator::new(GenerationConfig::default());
        prop_assert!(orchestrator.complexity_for(attempt + 1) >= orchestrator.complexity_for(attempt));
    }

    /// Backoff grows but stays under the cap unless the provider asked for longer
    #[test]
    fn backoff_is_capped(attempt in 1u32..40, hint_ms in proptest::option::of(0u64..120_000)) {
        let config = GenerationConfig::default();
        let cap = Duration::from_millis(config.max_retry_delay_ms);
        let orchestrator = GenerationOrchestrator::new(config);
        let error = ProviderError::RateLimited {
            message: "slow down".to_string(),
            retry_after: hint_ms.map(Duration::from_millis),
        };
        let delay = orchestrator.backoff_delay(attempt, &error);
        let hint = hint_ms.map(Duration::from_millis).unwrap_or_default();
        prop_assert!(delay <= cap.max(hint));
        prop_assert!(delay >= hint);
        prop_assert!(orchestrator.backoff_delay(attempt + 1, &error) >= delay);
    }

    /// Retryable failures before the last attempt always retry
    #[test]
    fn retryable_failures_retry_until_the_budget_is_spent(attempt in 1u32..=3, timed_out in any::<bool>()) {
        let orchestrator = GenerationOrchestrator::new(GenerationConfig::default());
        let error = if timed_out {
            ProviderError::TimedOut("deadline".to_string())
        } else {
            ProviderError::Malformed("bad json".to_string())
        };
        let step = orchestrator.next_step(&GenerationAttempt {
            number: attempt,
            complexity: orchestrator.complexity_for(attempt),
            outcome: AttemptOutcome::Failed(error),
            elapsed: Duration::ZERO,
        });
        if attempt < 3 {
            let is_retry = matches!(step, Step::Retry { .. });
            prop_assert!(is_retry);
        } else {
            let is_fail = matches!(step, Step::Fail(_));
            prop_assert!(is_fail);
        }
    }

    /// Any JSON object survives fencing and surrounding prose
    #[test]
    fn fenced_objects_parse(key in "[a-z]{1,10}", value in any::<i64>(), prose in "[A-Za-z ,.]{0,30}") {
        let mut map = serde_json::Map::new();
        map.insert(key, serde_json::Value::from(value));
        let object = serde_json::Value::Object(map);
        let fenced = format!("{}\n```json\n{}\n```", prose, object);
        let parsed = parse_candidate(&fenced).unwrap();
        prop_assert_eq!(parsed, object);
    }
}
