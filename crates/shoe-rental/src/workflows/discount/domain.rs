use std::fmt;

use serde::{Deserialize, Serialize};

/// Oldest age the intake schema accepts.
pub const MAX_AGE: i64 = 120;

/// Medical conditions the discount policy recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalCondition {
    Diabetes,
    Hypertension,
    ChronicCondition,
}

impl MedicalCondition {
    pub const ALL: [MedicalCondition; 3] = [
        MedicalCondition::Diabetes,
        MedicalCondition::Hypertension,
        MedicalCondition::ChronicCondition,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MedicalCondition::Diabetes => "diabetes",
            MedicalCondition::Hypertension => "hypertension",
            MedicalCondition::ChronicCondition => "chronic condition",
        }
    }

    /// Case-insensitive match against the canonical label.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|condition| condition.label().eq_ignore_ascii_case(raw))
    }

    pub fn vocabulary() -> String {
        Self::ALL
            .iter()
            .map(|condition| condition.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for MedicalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Customer attributes a discount is decided from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountQuery {
    pub age: u32,
    pub is_disabled: bool,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
}

impl DiscountQuery {
    pub fn new<I, C>(age: u32, is_disabled: bool, medical_conditions: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            age,
            is_disabled,
            medical_conditions: medical_conditions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which decision path produced a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Model,
    Rule,
}

impl DecisionSource {
    pub fn label(self) -> &'static str {
        match self {
            DecisionSource::Model => "model",
            DecisionSource::Rule => "rule catalog",
        }
    }
}

/// A single applied discount. The fraction always lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountDecision {
    discount_percentage: f64,
    reason: String,
    source: DecisionSource,
}

impl DiscountDecision {
    pub(crate) fn from_rule(discount_percentage: f64, reason: impl Into<String>) -> Self {
        Self {
            discount_percentage,
            reason: reason.into(),
            source: DecisionSource::Rule,
        }
    }

    /// Callers must have range-checked the fraction already.
    pub(crate) fn from_model(discount_percentage: f64, reason: String) -> Self {
        debug_assert!((0.0..=1.0).contains(&discount_percentage));
        Self {
            discount_percentage,
            reason,
            source: DecisionSource::Model,
        }
    }

    pub fn discount_percentage(&self) -> f64 {
        self.discount_percentage
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn source(&self) -> DecisionSource {
        self.source
    }
}

/// Wire shape returned by the calculation endpoint; the source stays internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountResponse {
    pub discount_percentage: f64,
    pub reason: String,
}

impl From<&DiscountDecision> for DiscountResponse {
    fn from(decision: &DiscountDecision) -> Self {
        Self {
            discount_percentage: decision.discount_percentage,
            reason: decision.reason.clone(),
        }
    }
}

/// Unvalidated request body accepted by the HTTP layer and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRequest {
    pub age: i64,
    pub is_disabled: bool,
    #[serde(default)]
    pub medical_conditions: Option<Vec<String>>,
}

impl TryFrom<DiscountRequest> for DiscountQuery {
    type Error = DiscountRequestError;

    fn try_from(request: DiscountRequest) -> Result<Self, Self::Error> {
        if !(0..=MAX_AGE).contains(&request.age) {
            return Err(DiscountRequestError::AgeOutOfRange(request.age));
        }

        let medical_conditions = request.medical_conditions.unwrap_or_default();
        if let Some(unknown) = medical_conditions
            .iter()
            .find(|condition| MedicalCondition::parse(condition).is_none())
        {
            return Err(DiscountRequestError::UnknownMedicalCondition(
                unknown.clone(),
            ));
        }

        Ok(Self {
            age: request.age as u32,
            is_disabled: request.is_disabled,
            medical_conditions,
        })
    }
}

/// Input rejected before any discount path runs.
#[derive(Debug, thiserror::Error)]
pub enum DiscountRequestError {
    #[error("age {0} is outside the accepted range 0-{max}", max = MAX_AGE)]
    AgeOutOfRange(i64),
    #[error("Invalid medical condition: {0}. Valid conditions are: {vocabulary}", vocabulary = MedicalCondition::vocabulary())]
    UnknownMedicalCondition(String),
    #[error("rental fee must be a positive amount, got {0}")]
    InvalidRentalFee(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(age: i64, conditions: Option<Vec<&str>>) -> DiscountRequest {
        DiscountRequest {
            age,
            is_disabled: false,
            medical_conditions: conditions
                .map(|items| items.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn parses_conditions_case_insensitively() {
        assert_eq!(
            MedicalCondition::parse("Chronic Condition"),
            Some(MedicalCondition::ChronicCondition)
        );
        assert_eq!(
            MedicalCondition::parse("DIABETES"),
            Some(MedicalCondition::Diabetes)
        );
        assert_eq!(MedicalCondition::parse("asthma"), None);
    }

    #[test]
    fn request_without_conditions_yields_empty_list() {
        let query = DiscountQuery::try_from(request(44, None)).expect("valid request");
        assert_eq!(query.age, 44);
        assert!(query.medical_conditions.is_empty());
    }

    #[test]
    fn request_rejects_ages_outside_schema() {
        for age in [-1, 121] {
            match DiscountQuery::try_from(request(age, None)) {
                Err(DiscountRequestError::AgeOutOfRange(value)) => assert_eq!(value, age),
                other => panic!("expected age rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn request_rejects_unknown_condition_and_names_vocabulary() {
        let error = DiscountQuery::try_from(request(30, Some(vec!["diabetes", "asthma"])))
            .expect_err("asthma is not in the vocabulary");

        assert_eq!(
            error.to_string(),
            "Invalid medical condition: asthma. Valid conditions are: diabetes, hypertension, chronic condition"
        );
    }

    #[test]
    fn request_keeps_conditions_as_supplied() {
        let query = DiscountQuery::try_from(request(30, Some(vec!["Hypertension"])))
            .expect("valid request");
        assert_eq!(query.medical_conditions, vec!["Hypertension".to_string()]);
    }
}
