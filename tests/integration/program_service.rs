//! The service facade over real sled storage.

use super::test_utils::{onboarding, program_with_phases, valid_program};
use std::sync::Arc;
use stride::config::StrideConfig;
use stride::error::{ApiError, ProviderError};
use stride::generation::{CancellationToken, GenerationErrorKind};
use stride::provider::ScriptedGenerator;
use stride::rollout::FeatureFlag;
use stride::{Pipeline, ProgramService};
use tempfile::TempDir;

fn config_in(temp: &TempDir) -> StrideConfig {
    let mut config = StrideConfig::default();
    config.storage.store_path = temp.path().join("store");
    config
}

#[tokio::test]
async fn generated_program_round_trips_through_sled() {
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new("stable").respond(valid_program().to_string()));
    let service = ProgramService::from_config(&config_in(&temp), temp.path())
        .unwrap()
        .with_generator(generator);

    let accepted = service
        .generate_program("alice", &onboarding(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(accepted.record.record_id.starts_with("prg_"));
    assert_eq!(accepted.record.owner_id, "alice");
    assert_eq!(accepted.pipeline, Pipeline::Stable);
    assert_eq!(service.replication_backlog(), 1);

    let fetched = service.fetch_program(&accepted.record.record_id).unwrap().unwrap();
    assert_eq!(fetched, accepted.record);

    assert_eq!(service.replicate().unwrap(), 1);
    assert_eq!(service.replication_backlog(), 0);
}

#[tokio::test]
async fn experimental_rollout_switches_the_pipeline() {
    let temp = TempDir::new().unwrap();
    let stable = Arc::new(ScriptedGenerator::new("stable").respond(valid_program().to_string()));
    let experimental = Arc::new(ScriptedGenerator::new("v2").respond(valid_program().to_string()));
    let service = ProgramService::from_config(&config_in(&temp), temp.path())
        .unwrap()
        .with_generator(stable.clone())
        .with_experimental_generator(experimental.clone());

    service
        .set_flag(&FeatureFlag::new("program_generation_v2", 100))
        .unwrap();
    let accepted = service
        .generate_program("alice", &onboarding(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(accepted.pipeline, Pipeline::Experimental);
    assert_eq!(experimental.call_count(), 1);
    assert_eq!(stable.call_count(), 0);
}

#[tokio::test]
async fn rejected_candidates_are_never_persisted() {
    let temp = TempDir::new().unwrap();
    let broken = program_with_phases(12, &[4, 6], 3).to_string();
    let generator = Arc::new(
        ScriptedGenerator::new("stable")
            .respond(broken.clone())
            .respond(broken),
    );
    let service = ProgramService::from_config(&config_in(&temp), temp.path())
        .unwrap()
        .with_generator(generator.clone());

    let err = service
        .generate_program("alice", &onboarding(), &CancellationToken::new())
        .await
        .unwrap_err();
    let result = match err {
        ApiError::ProgramRejected(result) => result,
        other => panic!("expected a rejection, got {other}"),
    };
    assert!(result.errors.iter().any(|issue| issue.message.contains("Duration mismatch")));
    assert_eq!(generator.call_count(), 2);
    assert_eq!(service.replication_backlog(), 0);
}

#[tokio::test]
async fn generation_failures_keep_their_diagnostics() {
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(
        ScriptedGenerator::new("stable").fail(ProviderError::Fatal("403 model access denied".to_string())),
    );
    let service = ProgramService::from_config(&config_in(&temp), temp.path())
        .unwrap()
        .with_generator(generator);

    let err = service
        .generate_program("alice", &onboarding(), &CancellationToken::new())
        .await
        .unwrap_err();
    let failure = match err {
        ApiError::GenerationFailed(failure) => failure,
        other => panic!("expected a generation failure, got {other}"),
    };
    assert_eq!(failure.kind, GenerationErrorKind::Fatal);
    assert_eq!(failure.attempts_made, 1);
    assert!(failure.message.contains("403"));
}

#[test]
fn configured_openai_provider_needs_a_key() {
    let temp = TempDir::new().unwrap();
    let mut config = config_in(&temp);
    let mut provider = stride::provider::ProviderConfig::new(stride::provider::ProviderType::OpenAI, "gpt-4o");
    provider.api_key_env = Some("STRIDE_TEST_KEY_THAT_IS_NEVER_SET".to_string());
    config.provider = Some(provider);

    let result = ProgramService::from_config(&config, temp.path());
    assert!(matches!(result, Err(ApiError::ProviderNotConfigured(_)) | Err(ApiError::ConfigError(_))));
}
