use autowise_contracts::request::Mode;
use autowise_contracts::results::StructuredResult;
use serde_json::{Map, Value};

use crate::error::{truncate_text, AssistError};

const FENCE: &str = "```";
const RAW_PREVIEW_CHARS: usize = 400;

/// Drops a leading fence (with its optional language tag) and a trailing
/// fence. Each side is handled on its own.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(FENCE) {
        let tag_len = rest
            .char_indices()
            .take_while(|(_, ch)| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+'))
            .map(|(idx, ch)| idx + ch.len_utf8())
            .last()
            .unwrap_or(0);
        body = &rest[tag_len..];
    }
    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }
    body.trim()
}

/// Parses a model reply into a JSON object. Anything else is a hard failure.
pub fn parse_reply(text: &str) -> Result<Map<String, Value>, AssistError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(malformed("reply is empty", text));
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(malformed(
            &format!("expected a JSON object, found {}", value_kind(&other)),
            text,
        )),
        Err(err) => Err(malformed(&err.to_string(), text)),
    }
}

pub fn sanitize(mode: Mode, text: &str) -> Result<StructuredResult, AssistError> {
    let object = parse_reply(text)?;
    StructuredResult::from_reply(mode, object).map_err(|err| malformed(&err.to_string(), text))
}

fn malformed(reason: &str, raw: &str) -> AssistError {
    AssistError::MalformedReply {
        reason: reason.to_string(),
        raw: truncate_text(raw.trim(), RAW_PREVIEW_CHARS),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
