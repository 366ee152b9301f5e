use clap::Args;
use shoe_rental::config::AppConfig;
use shoe_rental::error::AppError;
use shoe_rental::workflows::discount::{
    ConsistencyChecker, ConsistencyReport, DiscountDecision, DiscountQuery, DiscountRequest,
    DiscountRequestError, DiscountStrategy, FeeQuote, ModelBackedDecider, RentalFee, RuleEngine,
};

#[derive(Args, Debug)]
pub(crate) struct CustomerArgs {
    /// Customer age in whole years (0-120)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) age: i64,
    /// Customer has a disability
    #[arg(long)]
    pub(crate) disabled: bool,
    /// Reported medical condition; repeat the flag for several
    #[arg(long = "condition")]
    pub(crate) conditions: Vec<String>,
}

impl CustomerArgs {
    fn query(&self) -> Result<DiscountQuery, DiscountRequestError> {
        DiscountQuery::try_from(DiscountRequest {
            age: self.age,
            is_disabled: self.disabled,
            medical_conditions: Some(self.conditions.clone()),
        })
    }
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    #[command(flatten)]
    pub(crate) customer: CustomerArgs,
    /// Base rental fee to discount
    #[arg(long)]
    pub(crate) rental_fee: Option<f64>,
    /// Skip the hosted model and answer from the rule catalog
    #[arg(long)]
    pub(crate) rules_only: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) customer: CustomerArgs,
}

pub(crate) async fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let query = args.customer.query()?;
    let fee = args.rental_fee.map(RentalFee::new).transpose()?;
    let config = AppConfig::load()?;

    let strategy: Box<dyn DiscountStrategy> = if args.rules_only || config.model.api_key.is_none()
    {
        Box::new(RuleEngine)
    } else {
        Box::new(ModelBackedDecider::gemini(&config.model)?)
    };

    let decision = strategy.decide(&query).await;
    let quote = fee.map(|fee| fee.apply(&decision));
    for line in quote_lines(&query, &decision, quote.as_ref()) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) async fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let query = args.customer.query()?;
    let config = AppConfig::load()?;
    config.model.require_api_key()?;

    let checker = ConsistencyChecker::new(ModelBackedDecider::gemini(&config.model)?);
    let report = checker.check(&query).await;
    for line in check_lines(&query, &report) {
        println!("{line}");
    }
    Ok(())
}

fn customer_line(query: &DiscountQuery) -> String {
    let conditions = if query.medical_conditions.is_empty() {
        "none".to_string()
    } else {
        query.medical_conditions.join(", ")
    };
    format!(
        "- Customer: age {} | disabled {} | conditions {}",
        query.age,
        yes_no(query.is_disabled),
        conditions
    )
}

fn decision_summary(decision: &DiscountDecision) -> String {
    format!(
        "{:.0}% ({}) via {}",
        decision.discount_percentage() * 100.0,
        decision.reason(),
        decision.source().label()
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn quote_lines(
    query: &DiscountQuery,
    decision: &DiscountDecision,
    quote: Option<&FeeQuote>,
) -> Vec<String> {
    let mut lines = vec![
        "Shoe rental discount quote".to_string(),
        customer_line(query),
        format!("- Decision: {}", decision_summary(decision)),
    ];
    if let Some(quote) = quote {
        lines.push(format!(
            "- Rental fee: ${:.2} -> ${:.2}",
            quote.base_fee, quote.total_fee
        ));
    }
    lines
}

pub(crate) fn check_lines(query: &DiscountQuery, report: &ConsistencyReport) -> Vec<String> {
    vec![
        "Discount consistency check".to_string(),
        customer_line(query),
        format!("- Model path: {}", decision_summary(report.model_decision())),
        format!("- Rule catalog: {}", decision_summary(report.rule_decision())),
        format!("- Match: {}", yes_no(report.agree())),
    ]
}
