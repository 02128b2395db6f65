//! Stride: Reliable AI Training-Program Generation
//!
//! Four components keep AI-built training programs safe to ship: a rollout resolver
//! that stages new generation pipelines per user, a generation orchestrator that
//! retries with a simpler request each time, a validation pipeline that gates every
//! candidate, and a consistency coordinator that lets a writer read its own program
//! back before replicas catch up.

pub mod cli;
pub mod clock;
pub mod config;
pub mod consistency;
pub mod error;
pub mod generation;
pub mod logging;
pub mod program;
pub mod provider;
pub mod rollout;
pub mod service;
pub mod validation;

pub use service::{AcceptedProgram, Pipeline, ProgramService};
