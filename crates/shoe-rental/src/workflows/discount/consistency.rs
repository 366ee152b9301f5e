use serde::Serialize;
use tracing::{info, warn};

use super::domain::{DiscountDecision, DiscountQuery};
use super::rules::RuleEngine;
use super::DiscountStrategy;

/// Largest fraction difference still counted as agreement.
pub const AGREEMENT_TOLERANCE: f64 = 0.01;

/// Side-by-side outcome of the primary strategy and the rule catalog for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    model_decision: DiscountDecision,
    rule_decision: DiscountDecision,
    #[serde(rename = "match")]
    agree: bool,
}

impl ConsistencyReport {
    pub fn new(model_decision: DiscountDecision, rule_decision: DiscountDecision) -> Self {
        let agree = (model_decision.discount_percentage() - rule_decision.discount_percentage())
            .abs()
            < AGREEMENT_TOLERANCE;
        Self {
            model_decision,
            rule_decision,
            agree,
        }
    }

    pub fn model_decision(&self) -> &DiscountDecision {
        &self.model_decision
    }

    pub fn rule_decision(&self) -> &DiscountDecision {
        &self.rule_decision
    }

    pub fn agree(&self) -> bool {
        self.agree
    }
}

/// Diagnostic hook comparing a strategy against an independent rule evaluation.
pub struct ConsistencyChecker<S> {
    primary: S,
    rules: RuleEngine,
}

impl<S> ConsistencyChecker<S>
where
    S: DiscountStrategy,
{
    pub fn new(primary: S) -> Self {
        Self {
            primary,
            rules: RuleEngine,
        }
    }

    /// The strategy serving ordinary calculation requests.
    pub fn primary(&self) -> &S {
        &self.primary
    }

    pub async fn check(&self, query: &DiscountQuery) -> ConsistencyReport {
        let model_decision = self.primary.decide(query).await;
        let rule_decision = self.rules.decide(query);
        let report = ConsistencyReport::new(model_decision, rule_decision);

        if report.agree() {
            info!(
                discount = report.rule_decision().discount_percentage(),
                source = ?report.model_decision().source(),
                "discount paths agree"
            );
        } else {
            warn!(
                model = report.model_decision().discount_percentage(),
                rules = report.rule_decision().discount_percentage(),
                "model discount drifted from rule catalog"
            );
        }

        report
    }
}
