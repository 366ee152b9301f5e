use std::time::Duration;

use tracing::{debug, info, warn};

use super::domain::{DiscountDecision, DiscountQuery};
use super::model::{GeminiClient, GenerationParams, ModelError, TextGenerator};
use super::prompt::render_prompt;
use super::reply::{parse_reply, ReplyError};
use super::rules::RuleEngine;
use crate::config::ModelConfig;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why the model path produced no usable decision.
#[derive(Debug, thiserror::Error)]
pub enum DecisionFailure {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// Asks the text model first and answers from the rule catalog whenever the model cannot.
pub struct ModelBackedDecider<G> {
    generator: G,
    rules: RuleEngine,
    params: GenerationParams,
    timeout: Duration,
}

impl ModelBackedDecider<GeminiClient> {
    pub fn gemini(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = GeminiClient::new(config)?;
        Ok(Self::new(client)
            .with_params(GenerationParams::from(config))
            .with_timeout(config.timeout))
    }
}

impl<G> ModelBackedDecider<G>
where
    G: TextGenerator,
{
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            rules: RuleEngine,
            params: GenerationParams::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Never fails: any model-path error yields the rule catalog's decision instead.
    pub async fn decide(&self, query: &DiscountQuery) -> DiscountDecision {
        match self.propose(query).await {
            Ok(decision) => {
                info!(
                    discount = decision.discount_percentage(),
                    "model discount accepted"
                );
                decision
            }
            Err(failure) => {
                warn!(error = %failure, "model discount unavailable; applying rule catalog");
                self.rules.decide(query)
            }
        }
    }

    /// The model path alone, without fallback.
    pub async fn propose(&self, query: &DiscountQuery) -> Result<DiscountDecision, DecisionFailure> {
        let prompt = render_prompt(query);
        debug!(prompt_chars = prompt.len(), "requesting model discount");

        let raw = tokio::time::timeout(self.timeout, self.generator.generate(&prompt, self.params))
            .await
            .map_err(|_| ModelError::Timeout(self.timeout))??;

        let proposal = parse_reply(&raw).map_err(|err| {
            debug!(raw = %raw, "unusable model reply");
            err
        })?;

        Ok(DiscountDecision::from_model(
            proposal.discount_percentage,
            proposal.reason,
        ))
    }
}
