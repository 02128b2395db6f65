//! Generation runs against scripted providers, on paused tokio time.

use super::test_utils::{onboarding, valid_program};
use std::time::Duration;
use stride::error::ProviderError;
use stride::generation::{
    CancellationToken, ComplexityLevel, GenerationConfig, GenerationErrorKind, GenerationOrchestrator,
};
use stride::provider::ScriptedGenerator;

fn orchestrator() -> GenerationOrchestrator {
    GenerationOrchestrator::new(GenerationConfig::default())
}

fn rate_limited() -> ProviderError {
    ProviderError::RateLimited {
        message: "429 Too Many Requests".to_string(),
        retry_after: None,
    }
}

#[tokio::test(start_paused = true)]
async fn downgrades_full_then_reduced_then_succeeds_at_minimal() {
    let generator = ScriptedGenerator::new("scripted")
        .fail(rate_limited())
        .respond("I'm sorry, here is a program: {not json")
        .respond(format!("```json\n{}\n```", valid_program()));

    let generated = orchestrator()
        .generate(&generator, "user-1", &onboarding(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(generated.attempts_made, 3);
    assert_eq!(generated.final_complexity, ComplexityLevel::Minimal);
    assert_eq!(generated.candidate["name"], "Foundations");
    let levels: Vec<ComplexityLevel> = generator.calls().iter().map(|shape| shape.complexity).collect();
    assert_eq!(
        levels,
        vec![ComplexityLevel::Full, ComplexityLevel::Reduced, ComplexityLevel::Minimal]
    );
}

#[tokio::test(start_paused = true)]
async fn fatal_error_stops_after_one_attempt() {
    let generator = ScriptedGenerator::new("scripted")
        .fail(ProviderError::Fatal("401 invalid api key".to_string()))
        .respond(valid_program().to_string());

    let failure = orchestrator()
        .generate(&generator, "user-1", &onboarding(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind, GenerationErrorKind::Fatal);
    assert_eq!(failure.attempts_made, 1);
    assert!(!failure.caller_may_retry());
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_provider_times_out_on_every_attempt() {
    let generator = ScriptedGenerator::new("scripted").hang().hang().hang();

    let started = tokio::time::Instant::now();
    let failure = orchestrator()
        .generate(&generator, "user-1", &onboarding(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind, GenerationErrorKind::TimedOut);
    assert_eq!(failure.attempts_made, 3);
    assert_eq!(failure.final_complexity, ComplexityLevel::Minimal);
    assert!(failure.caller_may_retry());
    // Three 90 s attempts plus 500 ms and 1 s of backoff
    let expected = Duration::from_millis(3 * 90_000 + 1_500);
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "elapsed {:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_malformed_output_reports_every_attempt() {
    let generator = ScriptedGenerator::new("scripted")
        .respond("[]")
        .respond("plain prose")
        .respond("\"still not an object\"");

    let failure = orchestrator()
        .generate(&generator, "user-1", &onboarding(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind, GenerationErrorKind::AttemptsExhausted);
    assert_eq!(failure.attempts.len(), 3);
    assert!(matches!(failure.last_error(), Some(ProviderError::Malformed(_))));
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_ends_the_run() {
    let generator = ScriptedGenerator::new("scripted")
        .fail(ProviderError::RateLimited {
            message: "slow down".to_string(),
            retry_after: Some(Duration::from_secs(60)),
        })
        .respond(valid_program().to_string());
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });

    let failure = orchestrator()
        .generate(&generator, "user-1", &onboarding(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(failure.kind, GenerationErrorKind::Cancelled);
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_attempt_counts_the_call_in_flight() {
    let generator = ScriptedGenerator::new("scripted").hang();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });

    let failure = orchestrator()
        .generate(&generator, "user-1", &onboarding(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(failure.kind, GenerationErrorKind::Cancelled);
    assert_eq!(generator.call_count(), 1);
    assert_eq!(failure.attempts_made, 1);
    assert_eq!(failure.attempts.len(), 1);
    assert!(matches!(
        failure.last_error(),
        Some(ProviderError::TimedOut(message)) if message.contains("cancelled")
    ));
}

#[tokio::test(start_paused = true)]
async fn concurrent_runs_for_different_users_are_independent() {
    let orchestrator = orchestrator();
    let ok = ScriptedGenerator::new("ok").respond(valid_program().to_string());
    let flaky = ScriptedGenerator::new("flaky")
        .fail(ProviderError::TimedOut("gateway".to_string()))
        .respond(valid_program().to_string());
    let cancel = CancellationToken::new();
    let profile = onboarding();

    let (first, second) = futures::join!(
        orchestrator.generate(&ok, "user-1", &profile, &cancel),
        orchestrator.generate(&flaky, "user-2", &profile, &cancel),
    );
    assert_eq!(first.unwrap().attempts_made, 1);
    let second = second.unwrap();
    assert_eq!(second.attempts_made, 2);
    assert_eq!(second.final_complexity, ComplexityLevel::Reduced);
}
