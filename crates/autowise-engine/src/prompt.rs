use autowise_contracts::chat::{ChatRole, ChatTranscript};
use autowise_contracts::i18n::Language;
use autowise_contracts::request::{AnalysisRequest, EngineType, ImageAttachment, Mode, VehicleType};

use crate::client::{CompletionRequest, ContentTurn, ResponseFormat};

const DIAGNOSIS_SCHEMA: &str = r#"{
    "summary": "Technical summary",
    "severity": "Low/Medium/High/Critical (translated)",
    "safetyWarning": "Safety advice",
    "potentialCauses": [
        {
            "name": "Part name",
            "description": "Technical description",
            "solution": "How to fix",
            "likelihood": 80,
            "estimatedCost": "Cost estimate",
            "difficulty": "Easy/Medium/Hard (translated)"
        }
    ],
    "maintenanceTip": "Tip"
}"#;

const TUNING_SCHEMA: &str = r#"{
    "summary": "Tuning plan summary",
    "expectedPowerIncrease": "e.g. +30HP",
    "drivingCharacteristics": "Handling changes",
    "estimatedTotalCost": "Total cost",
    "reliabilityImpact": "Impact description",
    "partsRecommendation": [
        {
            "name": "Part Name",
            "type": "Type",
            "description": "Why this part",
            "estimatedPrice": "Price",
            "powerGain": "Gain"
        }
    ],
    "pros": ["Pro 1", "Pro 2"],
    "cons": ["Con 1", "Con 2"]
}"#;

fn base_instruction(language: Language) -> String {
    format!(
        "You are a WORLD-CLASS AUTOMOTIVE ENGINEER.\n\
Output Language: {lang}.\n\
IMPORTANT: Respond ONLY with valid JSON. Do not include markdown formatting like ```json ... ```.\n\n\
CRITICAL RULE: If the user asks about NON-AUTOMOTIVE topics (cooking, weather, politics),\n\
return a JSON with 'summary': '{off_topic}' and empty lists/nulls for other fields.\n",
        lang = language.prompt_name(),
        off_topic = language.labels().off_topic,
    )
}

pub fn system_instruction(
    mode: Mode,
    vehicle: VehicleType,
    engine: EngineType,
    language: Language,
) -> String {
    let (focus, schema) = match mode {
        Mode::Diagnosis => ("mechanical diagnosis", DIAGNOSIS_SCHEMA),
        Mode::Tuning => ("tuning/modification", TUNING_SCHEMA),
    };
    format!(
        "{}\nFocus on {focus} for a {vehicle} with {engine} engine.\nReturn JSON structure:\n{schema}\n",
        base_instruction(language),
    )
}

pub fn user_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Context/Previous Info: {}\nVehicle: {}\nEngine: {}\nUser Input: {}\n",
        request.context_history, request.vehicle, request.engine, request.description
    )
}

pub fn analysis_request(request: &AnalysisRequest) -> CompletionRequest {
    CompletionRequest {
        system_instruction: system_instruction(
            request.mode,
            request.vehicle,
            request.engine,
            request.language,
        ),
        contents: vec![ContentTurn {
            role: ChatRole::User,
            text: user_prompt(request),
            image: request.image.clone(),
        }],
        response_format: ResponseFormat::Json,
    }
}

pub fn chat_instruction(language: Language) -> String {
    format!(
        "You are a WORLD-CLASS AUTOMOTIVE ENGINEER chatting with a driver.\n\
Output Language: {lang}.\n\
Answer in concise plain text. Do not wrap the answer in markdown code fences.\n\n\
CRITICAL RULE: If the user asks about NON-AUTOMOTIVE topics (cooking, weather, politics),\n\
reply with exactly: {off_topic}\n",
        lang = language.prompt_name(),
        off_topic = language.labels().off_topic,
    )
}

pub fn chat_request(
    transcript: &ChatTranscript,
    language: Language,
    text: &str,
    image: Option<&ImageAttachment>,
) -> CompletionRequest {
    let mut contents: Vec<ContentTurn> = transcript
        .turns()
        .iter()
        .map(|turn| ContentTurn {
            role: turn.role,
            text: turn.text.clone(),
            image: None,
        })
        .collect();
    contents.push(ContentTurn {
        role: ChatRole::User,
        text: text.to_string(),
        image: image.cloned(),
    });
    CompletionRequest {
        system_instruction: chat_instruction(language),
        contents,
        response_format: ResponseFormat::Text,
    }
}
