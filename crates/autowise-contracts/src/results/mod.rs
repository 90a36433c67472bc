mod diagnosis;
mod lenient;
mod tuning;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::request::Mode;

pub use diagnosis::{Cause, DiagnosisResult};
pub use tuning::{PartRecommendation, TuningResult};

pub const CAUSES_KEY: &str = "potentialCauses";
pub const PARTS_KEY: &str = "partsRecommendation";

/// Parsed model reply for one structured-mode call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StructuredResult {
    Diagnosis(DiagnosisResult),
    Tuning(TuningResult),
    /// The model judged the input non-automotive and returned its sentinel summary.
    OffTopic { summary: String },
}

impl StructuredResult {
    /// Decodes a reply object for `mode`.
    ///
    /// A reply carrying neither causes nor parts is treated as the off-topic
    /// sentinel, whatever mode was requested.
    pub fn from_reply(mode: Mode, object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        if is_blank_collection(object.get(CAUSES_KEY)) && is_blank_collection(object.get(PARTS_KEY))
        {
            let summary = match object.get("summary") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            return Ok(StructuredResult::OffTopic { summary });
        }

        let value = Value::Object(object);
        match mode {
            Mode::Diagnosis => serde_json::from_value(value).map(StructuredResult::Diagnosis),
            Mode::Tuning => serde_json::from_value(value).map(StructuredResult::Tuning),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StructuredResult::Diagnosis(_) => "diagnosis",
            StructuredResult::Tuning(_) => "tuning",
            StructuredResult::OffTopic { .. } => "off_topic",
        }
    }

    pub fn is_off_topic(&self) -> bool {
        matches!(self, StructuredResult::OffTopic { .. })
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            StructuredResult::Diagnosis(result) => result.summary.as_deref(),
            StructuredResult::Tuning(result) => result.summary.as_deref(),
            StructuredResult::OffTopic { summary } => Some(summary.as_str()),
        }
    }

    pub fn cause_count(&self) -> usize {
        match self {
            StructuredResult::Diagnosis(result) => result.potential_causes.len(),
            _ => 0,
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            StructuredResult::Tuning(result) => result.parts_recommendation.len(),
            _ => 0,
        }
    }
}

fn is_blank_collection(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
