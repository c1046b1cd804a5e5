use rocket::serde::json::{serde_json, Value};

/// Largest POST body read before a submission is refused.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// The loosely typed `{name, score}` pair a client posted.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSubmission {
    pub name: String,
    pub score: f64,
}

impl RawSubmission {
    /// Decodes a request body. Anything that is not a JSON object, including
    /// bytes that are not UTF-8, is treated as `{}`.
    pub fn from_body(body: &[u8]) -> Self {
        let value = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            name: coerce_name(value.get("name")),
            score: coerce_score(value.get("score")),
        }
    }
}

fn coerce_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Non-numeric input maps to NaN, which score normalization turns into zero.
fn coerce_score(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                0.0
            } else {
                text.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        _ => f64::NAN,
    }
}
