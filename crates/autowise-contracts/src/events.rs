use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::bail;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::i18n::Language;
use crate::request::{EngineType, Mode, VehicleType};

/// Everything an assistant session records. Each variant is one JSONL line,
/// tagged with its snake_case name under `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        provider: String,
        model: String,
        mode: Mode,
        language: Language,
    },
    QueryStarted {
        mode: Mode,
        vehicle: VehicleType,
        engine: EngineType,
        language: Language,
        description_chars: usize,
        /// File name of the attached photo.
        image: Option<String>,
    },
    RefinementAppended {
        history_chars: usize,
        refinements: usize,
    },
    RequestFailed {
        error: String,
        model_failure: bool,
    },
    ReplyRejected {
        error: String,
    },
    ResultStored {
        kind: String,
        causes: usize,
        parts: usize,
        model: String,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    },
    ChatTurn {
        language: Language,
        turns: usize,
        reply_chars: usize,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::QueryStarted { .. } => "query_started",
            SessionEvent::RefinementAppended { .. } => "refinement_appended",
            SessionEvent::RequestFailed { .. } => "request_failed",
            SessionEvent::ReplyRejected { .. } => "reply_rejected",
            SessionEvent::ResultStored { .. } => "result_stored",
            SessionEvent::ChatTurn { .. } => "chat_turn",
        }
    }
}

/// Append-only session log (`events.jsonl`). Every line is the event's own
/// fields plus `session_id` and an RFC3339 `ts`.
#[derive(Debug)]
pub struct EventWriter {
    path: PathBuf,
    session_id: String,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn emit(&self, event: &SessionEvent) -> anyhow::Result<Value> {
        let Value::Object(mut row) = serde_json::to_value(event)? else {
            bail!("event {} did not serialize to an object", event.name());
        };
        row.insert(
            "session_id".to_string(),
            Value::String(self.session_id.clone()),
        );
        row.insert(
            "ts".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())?;

        Ok(Value::Object(row))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;
    use serde_json::{json, Value};

    use crate::i18n::Language;
    use crate::request::{EngineType, Mode, VehicleType};

    use super::{EventWriter, SessionEvent};

    fn read_rows(path: &std::path::Path) -> anyhow::Result<Vec<Value>> {
        let raw = fs::read_to_string(path)?;
        raw.lines()
            .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
            .collect()
    }

    #[test]
    fn query_started_line_carries_typed_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        let emitted = writer.emit(&SessionEvent::QueryStarted {
            mode: Mode::Tuning,
            vehicle: VehicleType::Motorcycle,
            engine: EngineType::Lpg,
            language: Language::De,
            description_chars: 18,
            image: Some("bay.jpg".to_string()),
        })?;

        let rows = read_rows(&path)?;
        assert_eq!(rows, vec![emitted]);
        let row = &rows[0];
        assert_eq!(row["type"], json!("query_started"));
        assert_eq!(row["session_id"], json!("session-123"));
        assert_eq!(row["mode"], json!("tuning"));
        assert_eq!(row["vehicle"], json!("Motorcycle"));
        assert_eq!(row["engine"], json!("LPG"));
        assert_eq!(row["language"], json!("de"));
        assert_eq!(row["image"], json!("bay.jpg"));
        DateTime::parse_from_rfc3339(row["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn emit_appends_lines_and_creates_parent_dir() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        writer.emit(&SessionEvent::RefinementAppended {
            history_chars: 40,
            refinements: 1,
        })?;
        writer.emit(&SessionEvent::ReplyRejected {
            error: "not json".to_string(),
        })?;

        let rows = read_rows(&path)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["refinements"], json!(1));
        assert_eq!(rows[1]["type"], json!("reply_rejected"));
        Ok(())
    }

    #[test]
    fn name_matches_serialized_tag() -> anyhow::Result<()> {
        let events = [
            SessionEvent::SessionStarted {
                provider: "scripted".to_string(),
                model: "m".to_string(),
                mode: Mode::Diagnosis,
                language: Language::Pl,
            },
            SessionEvent::RequestFailed {
                error: "503".to_string(),
                model_failure: true,
            },
            SessionEvent::ResultStored {
                kind: "diagnosis".to_string(),
                causes: 2,
                parts: 0,
                model: "m".to_string(),
                input_tokens: None,
                output_tokens: Some(12),
            },
            SessionEvent::ChatTurn {
                language: Language::En,
                turns: 2,
                reply_chars: 10,
                input_tokens: None,
                output_tokens: None,
            },
        ];
        for event in &events {
            let value = serde_json::to_value(event)?;
            assert_eq!(value["type"], json!(event.name()));
        }
        Ok(())
    }

    #[test]
    fn unwritable_path_is_an_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path(), "session-123");
        assert!(writer
            .emit(&SessionEvent::ReplyRejected {
                error: "x".to_string()
            })
            .is_err());
        Ok(())
    }
}
