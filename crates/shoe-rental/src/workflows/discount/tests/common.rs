use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::workflows::discount::model::{GenerationParams, ModelError, TextGenerator};
use crate::workflows::discount::DiscountQuery;

pub(super) fn query(age: u32, is_disabled: bool, conditions: &[&str]) -> DiscountQuery {
    DiscountQuery::new(age, is_disabled, conditions.iter().copied())
}

/// What the fake model does on every call.
#[derive(Debug, Clone)]
pub(super) enum Script {
    Reply(String),
    HttpStatus(u16),
    Stall(Duration),
}

/// Text generator that follows a fixed script and records what it was asked.
#[derive(Clone)]
pub(super) struct ScriptedGenerator {
    script: Script,
    calls: Arc<Mutex<Vec<(String, GenerationParams)>>>,
}

impl ScriptedGenerator {
    pub(super) fn replying(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }

    pub(super) fn failing(status: u16) -> Self {
        Self::new(Script::HttpStatus(status))
    }

    pub(super) fn stalling(delay: Duration) -> Self {
        Self::new(Script::Stall(delay))
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn calls(&self) -> Vec<(String, GenerationParams)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, ModelError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((prompt.to_string(), params));

        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::HttpStatus(status) => Err(ModelError::Api {
                status: *status,
                body: "upstream unavailable".to_string(),
            }),
            Script::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("{\"discount_percentage\": 0.5, \"reason\": \"too late\"}".to_string())
            }
        }
    }
}

pub(super) fn model_reply(fraction: f64, reason: &str) -> String {
    format!("{{\"discount_percentage\": {fraction}, \"reason\": \"{reason}\"}}")
}
