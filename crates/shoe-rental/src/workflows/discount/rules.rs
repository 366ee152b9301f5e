use super::domain::{DiscountDecision, DiscountQuery, MedicalCondition};

pub(crate) const NO_DISCOUNT_REASON: &str = "No discount applicable";

/// Condition a catalog entry tests against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePredicate {
    /// Inclusive age band; `max: None` leaves the band open-ended.
    AgeBand { min: u32, max: Option<u32> },
    Disabled,
    /// Matches once per supplied condition found in the vocabulary.
    RecognizedCondition,
}

/// Plain-data discount rule: predicate, fraction and the label used in reasons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub predicate: RulePredicate,
    pub percentage: f64,
    pub label: &'static str,
}

impl Rule {
    pub fn whole_percent(&self) -> u32 {
        (self.percentage * 100.0).round() as u32
    }

    fn collect_matches(&self, query: &DiscountQuery, matches: &mut Vec<RuleMatch>) {
        match self.predicate {
            RulePredicate::AgeBand { min, max } => {
                if query.age >= min && max.map_or(true, |max| query.age <= max) {
                    matches.push(self.matched(format!(
                        "{} discount ({}%)",
                        self.label,
                        self.whole_percent()
                    )));
                }
            }
            RulePredicate::Disabled => {
                if query.is_disabled {
                    matches.push(self.matched(format!(
                        "{} discount ({}%)",
                        self.label,
                        self.whole_percent()
                    )));
                }
            }
            RulePredicate::RecognizedCondition => {
                for condition in &query.medical_conditions {
                    if MedicalCondition::parse(condition).is_some() {
                        matches.push(self.matched(format!(
                            "{} discount - {} ({}%)",
                            self.label,
                            condition,
                            self.whole_percent()
                        )));
                    }
                }
            }
        }
    }

    fn matched(&self, reason: String) -> RuleMatch {
        RuleMatch {
            percentage: self.percentage,
            reason,
        }
    }
}

/// Ordered discount policy shared by the rule engine and the model prompt.
pub static CATALOG: [Rule; 5] = [
    Rule {
        predicate: RulePredicate::AgeBand {
            min: 0,
            max: Some(12),
        },
        percentage: 0.20,
        label: "Age 0-12",
    },
    Rule {
        predicate: RulePredicate::AgeBand {
            min: 13,
            max: Some(18),
        },
        percentage: 0.10,
        label: "Age 13-18",
    },
    Rule {
        predicate: RulePredicate::AgeBand { min: 65, max: None },
        percentage: 0.15,
        label: "Age 65+",
    },
    Rule {
        predicate: RulePredicate::Disabled,
        percentage: 0.25,
        label: "Disability",
    },
    Rule {
        predicate: RulePredicate::RecognizedCondition,
        percentage: 0.10,
        label: "Medical condition",
    },
];

/// A rule that applied to a query, with its rendered reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub percentage: f64,
    pub reason: String,
}

/// Deterministic discount policy. Total: every query yields a decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn catalog(&self) -> &'static [Rule] {
        &CATALOG
    }

    /// Every match in catalog order, medical conditions in the order supplied.
    pub fn matches(&self, query: &DiscountQuery) -> Vec<RuleMatch> {
        let mut matches = Vec::new();
        for rule in self.catalog() {
            rule.collect_matches(query, &mut matches);
        }
        matches
    }

    /// Applies exactly one discount: the highest matched percentage, first match on ties.
    pub fn decide(&self, query: &DiscountQuery) -> DiscountDecision {
        let best = self
            .matches(query)
            .into_iter()
            .fold(None::<RuleMatch>, |best, candidate| match best {
                Some(current) if current.percentage >= candidate.percentage => Some(current),
                _ => Some(candidate),
            });

        match best {
            Some(RuleMatch { percentage, reason }) => DiscountDecision::from_rule(percentage, reason),
            None => DiscountDecision::from_rule(0.0, NO_DISCOUNT_REASON),
        }
    }
}
