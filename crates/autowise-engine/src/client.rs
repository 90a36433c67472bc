use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use autowise_contracts::chat::ChatRole;
use autowise_contracts::request::ImageAttachment;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

use crate::config::Settings;
use crate::error::{truncate_text, AssistError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

impl ResponseFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTurn {
    pub role: ChatRole,
    pub text: String,
    pub image: Option<ImageAttachment>,
}

/// Everything one "generate content" call needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub contents: Vec<ContentTurn>,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

pub trait CompletionClient: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    fn generate(&self, request: &CompletionRequest) -> Result<Completion, AssistError>;
}

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    api_base: String,
    api_key: String,
    model: String,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self, AssistError> {
        let http = HttpClient::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl CompletionClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, request: &CompletionRequest) -> Result<Completion, AssistError> {
        let payload = build_payload(request);
        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&payload)
            .send()?;
        let parsed = response_json_or_error(response)?;
        let text = extract_candidate_text(&parsed)?;
        let (input_tokens, output_tokens) = extract_usage(&parsed);
        Ok(Completion {
            text,
            model: self.model.clone(),
            input_tokens,
            output_tokens,
        })
    }
}

pub(crate) fn build_payload(request: &CompletionRequest) -> Value {
    let contents: Vec<Value> = request
        .contents
        .iter()
        .map(|turn| {
            let mut parts = Vec::new();
            if !turn.text.is_empty() || turn.image.is_none() {
                parts.push(json!({ "text": turn.text }));
            }
            if let Some(image) = turn.image.as_ref() {
                parts.push(image_part(image));
            }
            json!({
                "role": turn.role.as_str(),
                "parts": parts,
            })
        })
        .collect();

    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }],
        },
        "contents": contents,
        "generationConfig": {
            "responseMimeType": request.response_format.mime_type(),
        },
    })
}

fn image_part(image: &ImageAttachment) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": BASE64.encode(&image.bytes),
        }
    })
}

fn response_json_or_error(response: HttpResponse) -> Result<Value, AssistError> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(AssistError::Http {
            status: status.as_u16(),
            body: truncate_text(&body, 512),
        });
    }
    serde_json::from_str(&body).map_err(|err| {
        AssistError::EmptyCompletion(format!(
            "response envelope is not JSON ({err}): {}",
            truncate_text(&body, 256)
        ))
    })
}

pub(crate) fn extract_candidate_text(payload: &Value) -> Result<String, AssistError> {
    let parts = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<&str>>()
        .join("");
    if !text.trim().is_empty() {
        return Ok(text);
    }

    let block_reason = payload
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str);
    let finish_reason = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("finishReason"))
        .and_then(Value::as_str);
    let detail = match (block_reason, finish_reason) {
        (Some(block), _) => format!("prompt blocked ({block})"),
        (None, Some(finish)) => format!("no text in candidate (finish reason {finish})"),
        (None, None) => "no candidates in response".to_string(),
    };
    Err(AssistError::EmptyCompletion(detail))
}

fn extract_usage(payload: &Value) -> (Option<u64>, Option<u64>) {
    let usage = payload.get("usageMetadata");
    let read = |key: &str| {
        usage
            .and_then(|value| value.get(key))
            .and_then(Value::as_u64)
    };
    (read("promptTokenCount"), read("candidatesTokenCount"))
}

/// Offline client that replays queued replies and records what it was asked.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, (u16, String)>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

pub const REPLAY_SEPARATOR: &str = "---";

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    /// Reply bodies separated by lines containing only `---`.
    pub fn from_replay_file(path: &Path) -> Result<Self, AssistError> {
        let raw = fs::read_to_string(path)?;
        let mut replies = Vec::new();
        let mut current = Vec::new();
        for line in raw.lines() {
            if line.trim() == REPLAY_SEPARATOR {
                replies.push(current.join("\n"));
                current.clear();
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            replies.push(current.join("\n"));
        }
        Ok(Self::with_replies(
            replies
                .into_iter()
                .filter(|reply| !reply.trim().is_empty()),
        ))
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(reply.into()));
        }
    }

    pub fn push_failure(&self, status: u16, body: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err((status, body.into())));
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|replies| replies.len()).unwrap_or(0)
    }
}

impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-replay"
    }

    fn generate(&self, request: &CompletionRequest) -> Result<Completion, AssistError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self
            .replies
            .lock()
            .map_err(|_| AssistError::EmptyCompletion("scripted client lock poisoned".to_string()))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(Completion {
                text,
                model: self.model().to_string(),
                input_tokens: None,
                output_tokens: None,
            }),
            Some(Err((status, body))) => Err(AssistError::Http { status, body }),
            None => Err(AssistError::EmptyCompletion(
                "no scripted replies left".to_string(),
            )),
        }
    }
}
