pub mod client;
pub mod config;
pub mod error;
pub mod photo;
pub mod prompt;
pub mod sanitize;
pub mod session;

use std::sync::Arc;

use autowise_contracts::chat::{ChatRole, ChatTurn};
use autowise_contracts::events::{EventWriter, SessionEvent};
use autowise_contracts::i18n::Language;
use autowise_contracts::request::{AnalysisRequest, ImageAttachment};
use autowise_contracts::results::StructuredResult;

pub use client::{
    Completion, CompletionClient, CompletionRequest, ContentTurn, GeminiClient, ResponseFormat,
    ScriptedClient,
};
pub use config::Settings;
pub use error::AssistError;
pub use session::{QueryForm, Session};

/// Runs the prompt → client → sanitizer → session pipeline for one user.
pub struct AssistantEngine {
    client: Arc<dyn CompletionClient>,
    session: Session,
    events: Option<EventWriter>,
    event_error: Option<AssistError>,
}

impl AssistantEngine {
    /// Fails if the event log cannot be written, so a bad `--events` path
    /// shows up before any model call.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        form: QueryForm,
        events: Option<EventWriter>,
    ) -> Result<Self, AssistError> {
        let mut engine = Self {
            client,
            session: Session::new(form),
            events,
            event_error: None,
        };
        let started = SessionEvent::SessionStarted {
            provider: engine.client.name().to_string(),
            model: engine.client.model().to_string(),
            mode: engine.session.form().mode,
            language: engine.session.form().language,
        };
        engine.record(started);
        match engine.event_error.take() {
            Some(err) => Err(err),
            None => Ok(engine),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn form_mut(&mut self) -> &mut QueryForm {
        self.session.form_mut()
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// First event log failure since the last call. Logging problems never
    /// abort a call; the caller decides how loudly to report them.
    pub fn take_event_error(&mut self) -> Option<AssistError> {
        self.event_error.take()
    }

    /// Starts a new top-level query, resetting the context history.
    pub fn analyze(
        &mut self,
        form: QueryForm,
        description: &str,
    ) -> Result<&StructuredResult, AssistError> {
        let description = description.trim();
        if description.is_empty() && form.image.is_none() {
            return Err(AssistError::EmptyInput);
        }
        let request = self.session.begin_query(form, description);
        self.record(SessionEvent::QueryStarted {
            mode: request.mode,
            vehicle: request.vehicle,
            engine: request.engine,
            language: request.language,
            description_chars: request.description.chars().count(),
            image: request.image.as_ref().map(|image| image.label.clone()),
        });
        self.run_analysis(request)
    }

    /// Sends a follow-up carrying the accumulated context history.
    pub fn refine(&mut self, text: &str) -> Result<&StructuredResult, AssistError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AssistError::EmptyInput);
        }
        let request = self.session.append_refinement(text)?;
        let history = self.session.history();
        let appended = SessionEvent::RefinementAppended {
            history_chars: history.chars().count(),
            refinements: history.matches(session::REFINEMENT_PREFIX).count(),
        };
        self.record(appended);
        self.run_analysis(request)
    }

    /// Sends one chat turn. The transcript only grows when the model answers.
    pub fn chat(
        &mut self,
        text: &str,
        image: Option<&ImageAttachment>,
        language: Language,
    ) -> Result<&ChatTurn, AssistError> {
        let text = text.trim();
        if text.is_empty() && image.is_none() {
            return Err(AssistError::EmptyInput);
        }
        let request = prompt::chat_request(self.session.transcript(), language, text, image);
        let completion = match self.client.generate(&request) {
            Ok(completion) => completion,
            Err(err) => {
                self.record_failure(&err);
                return Err(err);
            }
        };

        let user_text = match image {
            Some(image) if text.is_empty() => format!("[image: {}]", image.label),
            Some(image) => format!("{text}\n[image: {}]", image.label),
            None => text.to_string(),
        };
        let reply = completion.text.trim().to_string();
        self.record(SessionEvent::ChatTurn {
            language,
            turns: self.session.transcript().len() + 2,
            reply_chars: reply.chars().count(),
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
        });

        let transcript = self.session.transcript_mut();
        transcript.push(ChatRole::User, user_text);
        Ok(transcript.push(ChatRole::Model, reply))
    }

    fn run_analysis(&mut self, request: AnalysisRequest) -> Result<&StructuredResult, AssistError> {
        let completion_request = prompt::analysis_request(&request);
        let completion = match self.client.generate(&completion_request) {
            Ok(completion) => completion,
            Err(err) => {
                self.record_failure(&err);
                self.session.store_outcome(None);
                return Err(err);
            }
        };
        let result = match sanitize::sanitize(request.mode, &completion.text) {
            Ok(result) => result,
            Err(err) => {
                self.record(SessionEvent::ReplyRejected {
                    error: err.to_string(),
                });
                self.session.store_outcome(None);
                return Err(err);
            }
        };

        self.record(SessionEvent::ResultStored {
            kind: result.kind().to_string(),
            causes: result.cause_count(),
            parts: result.part_count(),
            model: completion.model,
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
        });
        Ok(self.session.store_result(result))
    }

    fn record_failure(&mut self, err: &AssistError) {
        self.record(SessionEvent::RequestFailed {
            error: err.to_string(),
            model_failure: err.is_model_failure(),
        });
    }

    fn record(&mut self, event: SessionEvent) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.emit(&event) {
            self.event_error.get_or_insert(AssistError::Event(format!(
                "{} not logged to {}: {err:#}",
                event.name(),
                events.path().display()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use autowise_contracts::chat::ChatRole;
    use autowise_contracts::events::EventWriter;
    use autowise_contracts::i18n::Language;
    use autowise_contracts::request::{ImageAttachment, Mode};
    use autowise_contracts::results::StructuredResult;
    use serde_json::Value;

    use super::{AssistError, AssistantEngine, QueryForm, ScriptedClient};

    const DIAGNOSIS: &str = r#"{"summary": "Vacuum leak", "severity": "Medium",
        "safetyWarning": "Safe to drive short distances",
        "potentialCauses": [{"name": "Intake hose", "likelihood": 60}],
        "maintenanceTip": "Inspect hoses yearly"}"#;

    fn engine_with(client: &Arc<ScriptedClient>) -> AssistantEngine {
        AssistantEngine::new(client.clone(), QueryForm::default(), None).unwrap()
    }

    #[test]
    fn analyze_stores_fenced_result() {
        let client = Arc::new(ScriptedClient::with_replies([format!("```json\n{DIAGNOSIS}\n```")]));
        let mut engine = engine_with(&client);

        let result = engine.analyze(QueryForm::default(), "Rough idle").unwrap();
        assert_eq!(result.kind(), "diagnosis");
        assert_eq!(result.cause_count(), 1);
        assert!(engine.session().result().is_some());
        assert_eq!(engine.session().history(), "Rough idle");
    }

    #[test]
    fn empty_input_makes_no_call() {
        let client = Arc::new(ScriptedClient::with_replies([DIAGNOSIS]));
        let mut engine = engine_with(&client);
        assert!(matches!(
            engine.analyze(QueryForm::default(), "   "),
            Err(AssistError::EmptyInput)
        ));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn image_alone_is_enough_to_analyze() {
        let client = Arc::new(ScriptedClient::with_replies([DIAGNOSIS]));
        let mut engine = engine_with(&client);
        let form = QueryForm {
            image: Some(ImageAttachment {
                mime_type: "image/jpeg".to_string(),
                bytes: vec![1, 2],
                label: "leak.jpg".to_string(),
            }),
            ..QueryForm::default()
        };
        engine.analyze(form, "").unwrap();
        assert!(client.requests()[0].contents[0].image.is_some());
    }

    #[test]
    fn malformed_reply_leaves_no_result() {
        let client = Arc::new(ScriptedClient::with_replies([
            DIAGNOSIS,
            "I think it is the spark plugs.",
        ]));
        let mut engine = engine_with(&client);
        engine.analyze(QueryForm::default(), "Misfire").unwrap();

        let err = engine.refine("worse under load").unwrap_err();
        assert!(matches!(err, AssistError::MalformedReply { .. }));
        assert!(!err.is_fatal());
        assert!(engine.session().result().is_none());
    }

    #[test]
    fn network_failure_leaves_no_result() {
        let client = Arc::new(ScriptedClient::new());
        client.push_failure(500, "internal");
        let mut engine = engine_with(&client);
        let err = engine.analyze(QueryForm::default(), "Noise").unwrap_err();
        assert!(err.is_model_failure());
        assert!(engine.session().result().is_none());
    }

    #[test]
    fn refine_sends_accumulated_history() {
        let client = Arc::new(ScriptedClient::with_replies([DIAGNOSIS, DIAGNOSIS, DIAGNOSIS]));
        let mut engine = engine_with(&client);
        engine.analyze(QueryForm::default(), "Stalls").unwrap();
        engine.refine("only when cold").unwrap();
        engine.refine("after rain").unwrap();

        let requests = client.requests();
        assert!(requests[0].contents[0]
            .text
            .starts_with("Context/Previous Info: \n"));
        assert!(requests[2].contents[0].text.contains(
            "Context/Previous Info: Stalls\nUser update: only when cold\nUser update: after rain"
        ));
        assert!(requests[2].contents[0].text.contains("User Input: after rain"));
    }

    #[test]
    fn refine_without_result_is_rejected() {
        let client = Arc::new(ScriptedClient::new());
        let mut engine = engine_with(&client);
        assert!(matches!(
            engine.refine("more"),
            Err(AssistError::NothingToRefine)
        ));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn off_topic_reply_is_stored_as_sentinel() {
        let sentinel = Language::En.labels().off_topic;
        let reply = format!(
            "{{\"summary\": \"{sentinel}\", \"partsRecommendation\": [], \"pros\": [], \"cons\": []}}"
        );
        let client = Arc::new(ScriptedClient::with_replies([reply]));
        let mut engine = engine_with(&client);
        let form = QueryForm {
            mode: Mode::Tuning,
            language: Language::En,
            ..QueryForm::default()
        };
        let result = engine.analyze(form, "Best lasagne recipe?").unwrap();
        assert_eq!(
            result,
            &StructuredResult::OffTopic {
                summary: sentinel.to_string()
            }
        );
    }

    #[test]
    fn chat_appends_both_turns_on_success_only() {
        let client = Arc::new(ScriptedClient::with_replies(["Check the thermostat."]));
        client.push_failure(503, "overloaded");
        let mut engine = engine_with(&client);

        let reply = engine
            .chat("Why is my heater cold?", None, Language::En)
            .unwrap();
        assert_eq!(reply.role, ChatRole::Model);
        assert_eq!(engine.session().transcript().len(), 2);

        assert!(engine.chat("Anything else?", None, Language::En).is_err());
        assert_eq!(engine.session().transcript().len(), 2);

        let requests = client.requests();
        let second_request = &requests[1];
        assert_eq!(second_request.contents.len(), 3);
        assert_eq!(second_request.contents[1].text, "Check the thermostat.");
    }

    fn engine_logging_to(
        client: &Arc<ScriptedClient>,
        path: &std::path::Path,
    ) -> Result<AssistantEngine, AssistError> {
        AssistantEngine::new(
            client.clone(),
            QueryForm::default(),
            Some(EventWriter::new(path, "session-1")),
        )
    }

    #[test]
    fn log_write_failure_still_stores_the_new_result() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let second = DIAGNOSIS.replace("Vacuum leak", "Worn belt");
        let client = Arc::new(ScriptedClient::with_replies([DIAGNOSIS.to_string(), second]));
        let mut engine = engine_logging_to(&client, &path)?;
        engine.analyze(QueryForm::default(), "Squeak")?;
        assert!(engine.take_event_error().is_none());

        std::fs::remove_file(&path)?;
        std::fs::create_dir(&path)?;

        let result = engine.analyze(QueryForm::default(), "Squeal on start")?;
        match result {
            StructuredResult::Diagnosis(diagnosis) => {
                assert_eq!(diagnosis.summary.as_deref(), Some("Worn belt"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(engine.session().history(), "Squeal on start");
        assert!(matches!(
            engine.take_event_error(),
            Some(AssistError::Event(_))
        ));
        assert!(engine.take_event_error().is_none());
        Ok(())
    }

    #[test]
    fn log_write_failure_still_appends_chat_turns() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let client = Arc::new(ScriptedClient::with_replies(["Check the thermostat."]));
        let mut engine = engine_logging_to(&client, &path)?;

        std::fs::remove_file(&path)?;
        std::fs::create_dir(&path)?;

        let reply = engine.chat("Why is my heater cold?", None, Language::En)?;
        assert_eq!(reply.text, "Check the thermostat.");
        assert_eq!(engine.session().transcript().len(), 2);
        assert!(engine.take_event_error().is_some());
        Ok(())
    }

    #[test]
    fn unwritable_log_fails_at_startup() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = Arc::new(ScriptedClient::new());
        assert!(matches!(
            engine_logging_to(&client, temp.path()),
            Err(AssistError::Event(_))
        ));
        Ok(())
    }

    #[test]
    fn events_trace_the_session() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let client = Arc::new(ScriptedClient::with_replies([DIAGNOSIS, "not json"]));
        let mut engine = engine_logging_to(&client, &path)?;
        engine.analyze(QueryForm::default(), "Squeak")?;
        let _ = engine.refine("at low speed");

        let raw = std::fs::read_to_string(&path)?;
        let types: Vec<String> = raw
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|row| row.get("type").and_then(Value::as_str).map(str::to_string))
            .collect();
        assert_eq!(
            types,
            vec![
                "session_started",
                "query_started",
                "result_stored",
                "refinement_appended",
                "reply_rejected"
            ]
        );
        Ok(())
    }
}
