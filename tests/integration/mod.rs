//! Integration tests for the Stride program-generation reliability layer

mod cli_commands;
mod config_integration;
mod generation_orchestrator;
mod program_service;
mod read_after_write;
mod rollout_resolution;
mod test_utils;
mod validation_pipeline;
