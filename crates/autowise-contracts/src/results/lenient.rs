//! Field decoders that accept the loose shapes models tend to emit.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Strings, numbers and booleans become text; `null` becomes `None`.
/// Arrays of those (step lists) are joined with `"; "`.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Value::Array(items)) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                if let Value::Array(_) | Value::Object(_) = item {
                    return Err(D::Error::custom(format!(
                        "expected text, found array of {}",
                        kind_name(item)
                    )));
                }
                if let Some(part) = scalar_text(item).filter(|part| !part.trim().is_empty()) {
                    parts.push(part.trim().to_string());
                }
            }
            Ok((!parts.is_empty()).then(|| parts.join("; ")))
        }
        Some(Value::Object(_)) => Err(D::Error::custom("expected text, found object")),
        Some(scalar) => Ok(scalar_text(&scalar)),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Likelihood percentage, clamped to 0..=100. Strings use their first number,
/// so `"80%"`, `"~60"` and `"70-80%"` all decode. Anything unreadable is `None`.
pub(crate) fn percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => first_number(&text),
        _ => None,
    };
    Ok(raw
        .filter(|value| value.is_finite())
        .map(|value| value.round().clamp(0.0, 100.0) as u8))
}

fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|ch: char| ch.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || matches!(ch, '.' | ','))
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

/// A list where `null` (or a missing key) means empty.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A list of short texts; `null` entries are dropped.
pub(crate) fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            Value::Null => {}
            Value::String(text) => out.push(text),
            Value::Number(number) => out.push(number.to_string()),
            other => {
                return Err(D::Error::custom(format!(
                    "expected text list entry, found {}",
                    kind_name(&other)
                )))
            }
        }
    }
    Ok(out)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
