use super::domain::{DiscountQuery, MedicalCondition};
use super::rules::{Rule, RulePredicate, CATALOG};

/// Renders the instruction sent to the text model. Output depends only on the query and
/// the rule catalog, so identical queries always produce identical prompts.
pub fn render_prompt(query: &DiscountQuery) -> String {
    let mut prompt = String::from(
        "You are a discount calculation expert for a bowling shoe rental service.\n\
         Your task is to determine the appropriate discount percentage based on customer information.\n",
    );

    prompt.push_str("\nDISCOUNT RULES:\n");
    push_section(&mut prompt, 1, "Age-based discounts", |rule| {
        matches!(rule.predicate, RulePredicate::AgeBand { .. })
    });
    push_section(&mut prompt, 2, "Disability status", |rule| {
        rule.predicate == RulePredicate::Disabled
    });
    push_section(&mut prompt, 3, "Medical conditions", |rule| {
        rule.predicate == RulePredicate::RecognizedCondition
    });

    prompt.push_str("\nIMPORTANT RULES:\n");
    prompt.push_str("- If multiple discounts apply, choose the HIGHEST discount percentage\n");
    prompt.push_str("- Only apply ONE discount (the highest one); never add discounts together\n");
    prompt.push_str(&format!(
        "- Valid medical conditions are: {}\n",
        MedicalCondition::vocabulary()
    ));
    prompt.push_str("- Discount percentages must be returned as a decimal (e.g., 0.25 for 25%)\n");

    prompt.push_str("\nCUSTOMER INFORMATION:\n");
    prompt.push_str(&format!("- Age: {}\n", query.age));
    prompt.push_str(&format!("- Disabled: {}\n", query.is_disabled));
    let conditions = if query.medical_conditions.is_empty() {
        "None".to_string()
    } else {
        query.medical_conditions.join(", ")
    };
    prompt.push_str(&format!("- Medical conditions: {conditions}\n"));

    prompt.push_str(
        "\nRespond ONLY with a single JSON object containing exactly these two fields and nothing else:\n\
         {\"discount_percentage\": <decimal between 0 and 1>, \"reason\": \"<why this discount applies>\"}\n",
    );

    prompt
}

fn push_section(prompt: &mut String, index: usize, title: &str, include: impl Fn(&Rule) -> bool) {
    prompt.push_str(&format!("{index}. {title}:\n"));
    for rule in CATALOG.iter().filter(|rule| include(*rule)) {
        for line in policy_lines(rule) {
            prompt.push_str(&format!("   - {line}\n"));
        }
    }
}

fn policy_lines(rule: &Rule) -> Vec<String> {
    let percent = rule.whole_percent();
    match rule.predicate {
        RulePredicate::AgeBand { min, max: Some(max) } => {
            vec![format!("Age {min}-{max}: {percent}% discount")]
        }
        RulePredicate::AgeBand { min, max: None } => {
            vec![format!("Age {min} and above: {percent}% discount")]
        }
        RulePredicate::Disabled => vec![format!("Disabled customers: {percent}% discount")],
        RulePredicate::RecognizedCondition => MedicalCondition::ALL
            .iter()
            .map(|condition| format!("{}: {percent}% discount", capitalized(condition.label())))
            .collect(),
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
