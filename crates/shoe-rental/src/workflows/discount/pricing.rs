use serde::Serialize;

use super::domain::{DiscountDecision, DiscountRequestError};

/// Base shoe rental fee, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalFee(f64);

impl RentalFee {
    pub fn new(amount: f64) -> Result<Self, DiscountRequestError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DiscountRequestError::InvalidRentalFee(amount));
        }
        Ok(Self(round_cents(amount)))
    }

    pub fn amount(self) -> f64 {
        self.0
    }

    pub fn apply(self, decision: &DiscountDecision) -> FeeQuote {
        FeeQuote {
            base_fee: self.0,
            discount_percentage: decision.discount_percentage(),
            total_fee: round_cents(self.0 * (1.0 - decision.discount_percentage())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeQuote {
    pub base_fee: f64,
    pub discount_percentage: f64,
    pub total_fee: f64,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::discount::{DiscountQuery, RuleEngine};

    #[test]
    fn rejects_non_positive_fees() {
        for amount in [0.0, -4.5, f64::NAN] {
            assert!(matches!(
                RentalFee::new(amount),
                Err(DiscountRequestError::InvalidRentalFee(_))
            ));
        }
    }

    #[test]
    fn rounds_base_fee_to_cents() {
        let fee = RentalFee::new(5.499).expect("positive fee");
        assert_eq!(fee.amount(), 5.5);
    }

    #[test]
    fn applies_single_discount_to_fee() {
        let decision = RuleEngine.decide(&DiscountQuery::new(70, true, ["diabetes"]));
        let quote = RentalFee::new(8.0).expect("positive fee").apply(&decision);

        assert_eq!(quote.base_fee, 8.0);
        assert_eq!(quote.discount_percentage, 0.25);
        assert_eq!(quote.total_fee, 6.0);
    }

    #[test]
    fn no_discount_keeps_fee() {
        let decision = RuleEngine.decide(&DiscountQuery::new(30, false, Vec::<String>::new()));
        let quote = RentalFee::new(4.75).expect("positive fee").apply(&decision);
        assert_eq!(quote.total_fee, 4.75);
    }
}
