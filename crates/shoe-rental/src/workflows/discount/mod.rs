//! Discount decisions for shoe rentals.
//!
//! Two strategies answer the same question. [`ModelBackedDecider`] asks the hosted text
//! model and falls back to [`RuleEngine`] on any failure; [`ConsistencyChecker`] runs both
//! side by side so drift between the model and the codified policy can be audited.

pub mod consistency;
pub mod decider;
pub mod domain;
pub mod model;
pub mod pricing;
pub mod prompt;
pub mod reply;
pub mod router;
pub mod rules;

#[cfg(test)]
mod tests;

pub use consistency::{ConsistencyChecker, ConsistencyReport, AGREEMENT_TOLERANCE};
pub use decider::{DecisionFailure, ModelBackedDecider};
pub use domain::{
    DecisionSource, DiscountDecision, DiscountQuery, DiscountRequest, DiscountRequestError,
    DiscountResponse, MedicalCondition,
};
pub use model::{GeminiClient, GenerationParams, ModelError, TextGenerator};
pub use pricing::{FeeQuote, RentalFee};
pub use reply::{ModelProposal, ReplyError};
pub use router::{discount_router, ApiKey};
pub use rules::{Rule, RuleEngine, RuleMatch, RulePredicate};

use async_trait::async_trait;

/// Capability shared by every discount path.
#[async_trait]
pub trait DiscountStrategy: Send + Sync {
    async fn decide(&self, query: &DiscountQuery) -> DiscountDecision;
}

#[async_trait]
impl DiscountStrategy for RuleEngine {
    async fn decide(&self, query: &DiscountQuery) -> DiscountDecision {
        RuleEngine::decide(self, query)
    }
}

#[async_trait]
impl<G> DiscountStrategy for ModelBackedDecider<G>
where
    G: TextGenerator,
{
    async fn decide(&self, query: &DiscountQuery) -> DiscountDecision {
        ModelBackedDecider::decide(self, query).await
    }
}
