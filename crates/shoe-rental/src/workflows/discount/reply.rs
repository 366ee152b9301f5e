use serde_json::Value;

/// Discount proposed by the model after parsing and range validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProposal {
    pub discount_percentage: f64,
    pub reason: String,
}

/// Reply text that cannot be accepted as a discount.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("reply is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("reply is missing `{0}`")]
    MissingField(&'static str),
    #[error("discount_percentage {0} is not a number")]
    InvalidFraction(String),
    #[error("reason must be a non-empty string")]
    InvalidReason,
    #[error("discount_percentage {0} is outside [0, 1]")]
    OutOfRange(f64),
}

/// Removes a surrounding ```` ```json ```` or bare ```` ``` ```` fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    inner.trim().strip_suffix("```").unwrap_or(inner).trim()
}

pub fn parse_reply(raw: &str) -> Result<ModelProposal, ReplyError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let object = value.as_object().ok_or(ReplyError::NotAnObject)?;

    let fraction = object
        .get("discount_percentage")
        .ok_or(ReplyError::MissingField("discount_percentage"))?;
    let discount_percentage = coerce_fraction(fraction)?;
    if !(0.0..=1.0).contains(&discount_percentage) {
        return Err(ReplyError::OutOfRange(discount_percentage));
    }

    let reason = match object.get("reason") {
        Some(Value::String(reason)) if !reason.trim().is_empty() => reason.clone(),
        Some(_) => return Err(ReplyError::InvalidReason),
        None => return Err(ReplyError::MissingField("reason")),
    };

    Ok(ModelProposal {
        discount_percentage,
        reason,
    })
}

fn coerce_fraction(value: &Value) -> Result<f64, ReplyError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|fraction| fraction.is_finite())
        .ok_or_else(|| ReplyError::InvalidFraction(value.to_string()))
}
