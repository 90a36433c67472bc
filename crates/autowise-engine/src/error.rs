use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error(
        "missing Google Gemini API key: set GOOGLE_API_KEY (or GEMINI_API_KEY) in the environment, a .env file, or the secrets file"
    )]
    MissingApiKey,

    /// Built through `From`, which drops the request URL.
    #[error("model request failed: {0}")]
    Transport(reqwest::Error),

    #[error("model request failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("model returned no content: {0}")]
    EmptyCompletion(String),

    #[error("failed to parse model reply: {reason} (raw reply: {raw})")]
    MalformedReply { reason: String, raw: String },

    #[error("nothing to analyze: provide a description or a photo")]
    EmptyInput,

    #[error("no result to refine yet; start a new query first")]
    NothingToRefine,

    #[error("unsupported image type '{0}' (expected jpg, jpeg, png or webp)")]
    UnsupportedImage(String),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("event log write failed: {0}")]
    Event(String),
}

impl AssistError {
    /// Only a missing key stops the program; everything else is shown and the session goes on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AssistError::MissingApiKey)
    }

    /// Network or model-side failure, as opposed to a bad reply or local input problem.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            AssistError::Transport(_) | AssistError::Http { .. } | AssistError::EmptyCompletion(_)
        )
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(err: reqwest::Error) -> Self {
        AssistError::Transport(err.without_url())
    }
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::{truncate_text, AssistError};

    #[test]
    fn only_missing_key_is_fatal() {
        assert!(AssistError::MissingApiKey.is_fatal());
        assert!(!AssistError::EmptyInput.is_fatal());
        assert!(!AssistError::MalformedReply {
            reason: "eof".to_string(),
            raw: String::new()
        }
        .is_fatal());
    }

    #[test]
    fn model_failures_are_classified() {
        assert!(AssistError::Http {
            status: 503,
            body: "overloaded".to_string()
        }
        .is_model_failure());
        assert!(!AssistError::NothingToRefine.is_model_failure());
    }

    #[test]
    fn truncate_text_marks_cut() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc…");
    }
}
