use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pl,
    En,
    De,
}

/// Headings and fixed messages shown by the terminal presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub subtitle_diagnosis: &'static str,
    pub subtitle_tuning: &'static str,
    pub severity: &'static str,
    pub safety: &'static str,
    pub causes: &'static str,
    pub tip: &'static str,
    pub description: &'static str,
    pub solution: &'static str,
    pub cost: &'static str,
    pub difficulty: &'static str,
    pub power_gain: &'static str,
    pub estimated_cost: &'static str,
    pub durability_impact: &'static str,
    pub driving_feel: &'static str,
    pub parts: &'static str,
    pub pros: &'static str,
    pub cons: &'static str,
    pub analyzing: &'static str,
    pub refine_prompt: &'static str,
    pub empty_input: &'static str,
    /// Summary the model is told to return for non-automotive questions.
    pub off_topic: &'static str,
}

const PL_LABELS: Labels = Labels {
    subtitle_diagnosis: "Zaawansowana Diagnostyka Pojazdowa",
    subtitle_tuning: "Inżynieria Motorsportu & Tuning",
    severity: "Powaga",
    safety: "Bezpieczeństwo",
    causes: "Potencjalne Przyczyny",
    tip: "Porada Eksperta",
    description: "Opis",
    solution: "Rozwiązanie",
    cost: "Koszt",
    difficulty: "Trudność",
    power_gain: "Przyrost Mocy",
    estimated_cost: "Szacowany Koszt",
    durability_impact: "Wpływ na Trwałość",
    driving_feel: "Wrażenia",
    parts: "Rekomendowane Części",
    pros: "Zalety",
    cons: "Wady i Ryzyka",
    analyzing: "Analiza techniczna...",
    refine_prompt: "Doprecyzuj / Dodaj szczegóły",
    empty_input: "Opisz problem lub dodaj zdjęcie.",
    off_topic: "Pytanie nie jest związane z motoryzacją. Proszę zapytać ponownie.",
};

const EN_LABELS: Labels = Labels {
    subtitle_diagnosis: "Advanced Vehicle Diagnostics",
    subtitle_tuning: "Motorsport Engineering & Tuning",
    severity: "Severity",
    safety: "Safety",
    causes: "Potential Causes",
    tip: "Expert Tip",
    description: "Description",
    solution: "Solution",
    cost: "Cost",
    difficulty: "Difficulty",
    power_gain: "Power Gain",
    estimated_cost: "Est. Cost",
    durability_impact: "Durability Impact",
    driving_feel: "Driving feel",
    parts: "Recommended Parts",
    pros: "Pros",
    cons: "Cons",
    analyzing: "Technical Analysis...",
    refine_prompt: "Refine / Add Details",
    empty_input: "Describe the problem or add a photo.",
    off_topic: "The question is not related to automotive topics. Please ask again.",
};

const DE_LABELS: Labels = Labels {
    subtitle_diagnosis: "Erweiterte Fahrzeugdiagnose",
    subtitle_tuning: "Motorsporttechnik & Tuning",
    severity: "Schweregrad",
    safety: "Sicherheit",
    causes: "Mögliche Ursachen",
    tip: "Experten-Tipp",
    description: "Beschreibung",
    solution: "Lösung",
    cost: "Kosten",
    difficulty: "Schwierigkeit",
    power_gain: "Leistungssteigerung",
    estimated_cost: "Geschätzte Kosten",
    durability_impact: "Einfluss auf Haltbarkeit",
    driving_feel: "Fahrgefühl",
    parts: "Empfohlene Teile",
    pros: "Vorteile",
    cons: "Nachteile",
    analyzing: "Technische Analyse...",
    refine_prompt: "Präzisieren / Details hinzufügen",
    empty_input: "Beschreiben Sie das Problem oder fügen Sie ein Foto hinzu.",
    off_topic: "Die Frage bezieht sich nicht auf Kraftfahrzeuge. Bitte fragen Sie erneut.",
};

const CRITICAL_SEVERITY_WORDS: &[&str] = &["critical", "krytyczny", "kritisch"];

impl Language {
    pub const ALL: [Language; 3] = [Language::Pl, Language::En, Language::De];

    pub fn code(self) -> &'static str {
        match self {
            Language::Pl => "pl",
            Language::En => "en",
            Language::De => "de",
        }
    }

    /// Language name as written into the system instruction.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::Pl => "POLISH",
            Language::En => "ENGLISH",
            Language::De => "GERMAN",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Language::Pl => &PL_LABELS,
            Language::En => &EN_LABELS,
            Language::De => &DE_LABELS,
        }
    }

    /// The model translates severities, so "critical" is matched in every
    /// supported language regardless of the active one.
    pub fn is_critical_severity(severity: &str) -> bool {
        let normalized = severity.trim().to_lowercase();
        CRITICAL_SEVERITY_WORDS
            .iter()
            .any(|word| normalized == *word)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|language| language.code() == normalized)
            .ok_or_else(|| format!("unsupported language '{raw}' (expected pl, en or de)"))
    }
}
