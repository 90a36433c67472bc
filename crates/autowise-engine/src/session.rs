use autowise_contracts::chat::ChatTranscript;
use autowise_contracts::i18n::Language;
use autowise_contracts::request::{AnalysisRequest, EngineType, ImageAttachment, Mode, VehicleType};
use autowise_contracts::results::StructuredResult;

use crate::error::AssistError;

pub const REFINEMENT_PREFIX: &str = "User update: ";

/// Form settings carried between turns; the interactive loop may edit them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryForm {
    pub mode: Mode,
    pub vehicle: VehicleType,
    pub engine: EngineType,
    pub language: Language,
    pub image: Option<ImageAttachment>,
}

impl QueryForm {
    fn request(&self, description: &str, context_history: &str) -> AnalysisRequest {
        AnalysisRequest {
            mode: self.mode,
            vehicle: self.vehicle,
            engine: self.engine,
            description: description.to_string(),
            language: self.language,
            image: self.image.clone(),
            context_history: context_history.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    form: QueryForm,
    result: Option<StructuredResult>,
    history: String,
    transcript: ChatTranscript,
}

impl Session {
    pub fn new(form: QueryForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut QueryForm {
        &mut self.form
    }

    pub fn result(&self) -> Option<&StructuredResult> {
        self.result.as_ref()
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut ChatTranscript {
        &mut self.transcript
    }

    /// Starts a new top-level query: the previous result is dropped, the
    /// history restarts from `description` and the first call goes out
    /// without prior context.
    pub fn begin_query(&mut self, form: QueryForm, description: &str) -> AnalysisRequest {
        self.form = form;
        self.result = None;
        self.history = description.to_string();
        self.form.request(description, "")
    }

    /// Appends `text` to the history and builds the follow-up request.
    pub fn append_refinement(&mut self, text: &str) -> Result<AnalysisRequest, AssistError> {
        if self.result.is_none() {
            return Err(AssistError::NothingToRefine);
        }
        self.history = format!("{}\n{REFINEMENT_PREFIX}{text}", self.history);
        Ok(self.form.request(text, &self.history))
    }

    /// Each call's outcome replaces the previous result; failures leave none.
    pub fn store_outcome(&mut self, result: Option<StructuredResult>) {
        self.result = result;
    }

    pub(crate) fn store_result(&mut self, result: StructuredResult) -> &StructuredResult {
        self.result.insert(result)
    }
}
