//! Deterministic generator that replays a canned sequence of outcomes.

use crate::error::ProviderError;
use crate::provider::{ProgramGenerator, RequestShape};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ScriptStep {
    Respond(String),
    Fail(ProviderError),
    /// Respond after a delay on the tokio clock
    RespondAfter(Duration, String),
    /// Never complete
    Hang,
}

/// Scripted [`ProgramGenerator`]. Once the script runs out every call fails fatally,
/// unless a repeating step was set with [`ScriptedGenerator::otherwise`].
pub struct ScriptedGenerator {
    name: String,
    script: Mutex<VecDeque<ScriptStep>>,
    otherwise: Option<ScriptStep>,
    calls: Mutex<Vec<RequestShape>>,
}

impl ScriptedGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            otherwise: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, step: ScriptStep) -> Self {
        self.script.lock().push_back(step);
        self
    }

    pub fn respond(self, text: impl Into<String>) -> Self {
        self.then(ScriptStep::Respond(text.into()))
    }

    pub fn fail(self, error: ProviderError) -> Self {
        self.then(ScriptStep::Fail(error))
    }

    pub fn respond_after(self, delay: Duration, text: impl Into<String>) -> Self {
        self.then(ScriptStep::RespondAfter(delay, text.into()))
    }

    pub fn hang(self) -> Self {
        self.then(ScriptStep::Hang)
    }

    /// Step replayed after the script is exhausted
    pub fn otherwise(mut self, step: ScriptStep) -> Self {
        self.otherwise = Some(step);
        self
    }

    /// Requests received so far, in order
    pub fn calls(&self) -> Vec<RequestShape> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl ProgramGenerator for ScriptedGenerator {
    async fn generate(&self, shape: &RequestShape) -> Result<String, ProviderError> {
        self.calls.lock().push(shape.clone());
        let step = self.script.lock().pop_front().or_else(|| self.otherwise.clone());
        match step {
            Some(ScriptStep::Respond(text)) => Ok(text),
            Some(ScriptStep::Fail(error)) => Err(error),
            Some(ScriptStep::RespondAfter(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(ScriptStep::Hang) => std::future::pending::<Result<String, ProviderError>>().await,
            None => Err(ProviderError::Fatal("script exhausted".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
