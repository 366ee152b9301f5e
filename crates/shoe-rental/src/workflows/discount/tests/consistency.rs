use super::common::{model_reply, query, ScriptedGenerator};
use crate::workflows::discount::{
    ConsistencyChecker, ConsistencyReport, DecisionSource, DiscountDecision, ModelBackedDecider,
    RuleEngine, AGREEMENT_TOLERANCE,
};

#[tokio::test]
async fn agreeing_model_is_reported_as_match() {
    let decider = ModelBackedDecider::new(ScriptedGenerator::replying(&model_reply(
        0.25,
        "Disability discount",
    )));
    let checker = ConsistencyChecker::new(decider);

    let report = checker.check(&query(70, true, &["diabetes"])).await;

    assert!(report.agree());
    assert_eq!(report.model_decision().source(), DecisionSource::Model);
    assert_eq!(report.rule_decision().source(), DecisionSource::Rule);
    assert_eq!(report.rule_decision().discount_percentage(), 0.25);
}

#[tokio::test]
async fn drifting_model_is_reported_as_mismatch() {
    let decider = ModelBackedDecider::new(ScriptedGenerator::replying(&model_reply(
        0.35,
        "Stacked disability and age",
    )));
    let checker = ConsistencyChecker::new(decider);

    let report = checker.check(&query(70, true, &[])).await;

    assert!(!report.agree());
    assert_eq!(report.model_decision().discount_percentage(), 0.35);
    assert_eq!(report.rule_decision().discount_percentage(), 0.25);
}

#[tokio::test]
async fn failed_model_path_still_gets_independent_rule_evaluation() {
    let generator = ScriptedGenerator::replying("not json");
    let checker = ConsistencyChecker::new(ModelBackedDecider::new(generator.clone()));
    let query = query(10, false, &[]);

    let report = checker.check(&query).await;

    assert_eq!(report.model_decision().source(), DecisionSource::Rule);
    assert_eq!(report.rule_decision(), &RuleEngine.decide(&query));
    assert!(report.agree());
    assert_eq!(generator.calls().len(), 1);
}

#[test]
fn agreement_uses_strict_tolerance() {
    let rule = RuleEngine.decide(&query(10, false, &[]));

    let within = DiscountDecision::from_model(0.205, "near".to_string());
    assert!(ConsistencyReport::new(within, rule.clone()).agree());

    let outside = DiscountDecision::from_model(0.20 + AGREEMENT_TOLERANCE * 2.0, "far".to_string());
    assert!(!ConsistencyReport::new(outside, rule.clone()).agree());

    let identical = RuleEngine.decide(&query(10, false, &[]));
    assert!(ConsistencyReport::new(identical, rule).agree());
}

#[tokio::test]
async fn report_serializes_with_match_field() {
    let checker = ConsistencyChecker::new(RuleEngine);

    let report = checker.check(&query(30, false, &["hypertension"])).await;
    let value = serde_json::to_value(&report).expect("serializes");

    assert_eq!(value["match"], true);
    assert_eq!(value["model_decision"]["source"], "rule");
    assert_eq!(value["rule_decision"]["discount_percentage"], 0.1);
    assert_eq!(
        value["rule_decision"]["reason"],
        "Medical condition discount - hypertension (10%)"
    );
}
