use std::fmt::Write as _;

use autowise_contracts::chat::{ChatRole, ChatTranscript};
use autowise_contracts::i18n::{Labels, Language};
use autowise_contracts::results::{Cause, DiagnosisResult, PartRecommendation, StructuredResult, TuningResult};

const RULE: &str = "----------------------------------------";
const CRITICAL_MARKER: &str = "[!!]";

pub fn render_result(result: &StructuredResult, language: Language) -> String {
    let labels = language.labels();
    match result {
        StructuredResult::Diagnosis(diagnosis) => render_diagnosis(diagnosis, labels),
        StructuredResult::Tuning(tuning) => render_tuning(tuning, labels),
        // Off-topic replies never get cause or part sections.
        StructuredResult::OffTopic { summary } => format!("{summary}\n"),
    }
}

fn render_diagnosis(result: &DiagnosisResult, labels: &Labels) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", labels.subtitle_diagnosis);
    let _ = writeln!(out, "{RULE}");
    push_paragraph(&mut out, result.summary.as_deref());

    if let Some(severity) = non_empty(result.severity.as_deref()) {
        if Language::is_critical_severity(severity) {
            let _ = writeln!(
                out,
                "{CRITICAL_MARKER} {}: {} {CRITICAL_MARKER}",
                labels.severity,
                severity.to_uppercase()
            );
        } else {
            let _ = writeln!(out, "{}: {severity}", labels.severity);
        }
    }
    push_field(&mut out, labels.safety, result.safety_warning.as_deref());

    if !result.potential_causes.is_empty() {
        let _ = writeln!(out, "\n{}", labels.causes);
        for (idx, cause) in result.potential_causes.iter().enumerate() {
            push_cause(&mut out, idx + 1, cause, labels);
        }
    }

    if let Some(tip) = non_empty(result.maintenance_tip.as_deref()) {
        let _ = writeln!(out, "\n{}: {tip}", labels.tip);
    }
    out
}

fn push_cause(out: &mut String, number: usize, cause: &Cause, labels: &Labels) {
    let name = non_empty(cause.name.as_deref()).unwrap_or("?");
    match cause.likelihood {
        Some(likelihood) => {
            let _ = writeln!(out, "{number}. {name} ({likelihood}%)");
        }
        None => {
            let _ = writeln!(out, "{number}. {name}");
        }
    }
    push_indented(out, labels.description, cause.description.as_deref());
    push_indented(out, labels.solution, cause.solution.as_deref());
    push_indented(out, labels.cost, cause.estimated_cost.as_deref());
    push_indented(out, labels.difficulty, cause.difficulty.as_deref());
}

fn render_tuning(result: &TuningResult, labels: &Labels) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", labels.subtitle_tuning);
    let _ = writeln!(out, "{RULE}");
    push_paragraph(&mut out, result.summary.as_deref());

    push_field(&mut out, labels.power_gain, result.expected_power_increase.as_deref());
    push_field(&mut out, labels.estimated_cost, result.estimated_total_cost.as_deref());
    push_field(&mut out, labels.durability_impact, result.reliability_impact.as_deref());
    push_field(&mut out, labels.driving_feel, result.driving_characteristics.as_deref());

    if !result.parts_recommendation.is_empty() {
        let _ = writeln!(out, "\n{}", labels.parts);
        for (idx, part) in result.parts_recommendation.iter().enumerate() {
            push_part(&mut out, idx + 1, part, labels);
        }
    }

    push_list(&mut out, labels.pros, "+", &result.pros);
    push_list(&mut out, labels.cons, "-", &result.cons);
    out
}

fn push_part(out: &mut String, number: usize, part: &PartRecommendation, labels: &Labels) {
    let name = non_empty(part.name.as_deref()).unwrap_or("?");
    match non_empty(part.part_type.as_deref()) {
        Some(part_type) => {
            let _ = writeln!(out, "{number}. {name} [{part_type}]");
        }
        None => {
            let _ = writeln!(out, "{number}. {name}");
        }
    }
    push_indented(out, labels.description, part.description.as_deref());
    push_indented(out, labels.cost, part.estimated_price.as_deref());
    push_indented(out, labels.power_gain, part.power_gain.as_deref());
}

fn push_list(out: &mut String, heading: &str, bullet: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    for item in items {
        let _ = writeln!(out, "  {bullet} {item}");
    }
}

fn push_paragraph(out: &mut String, text: Option<&str>) {
    if let Some(text) = non_empty(text) {
        let _ = writeln!(out, "{text}\n");
    }
}

fn push_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = non_empty(value) {
        let _ = writeln!(out, "{label}: {value}");
    }
}

fn push_indented(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = non_empty(value) {
        let _ = writeln!(out, "   {label}: {value}");
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn render_transcript(transcript: &ChatTranscript) -> String {
    let mut out = String::new();
    for turn in transcript.turns() {
        let speaker = match turn.role {
            ChatRole::User => "you",
            ChatRole::Model => "autowise",
        };
        let _ = writeln!(out, "{speaker}> {}", turn.text);
    }
    out
}

/// One line per entry of the accumulated query history.
pub fn render_history(history: &str) -> String {
    let mut out = String::new();
    for (idx, line) in history.lines().filter(|line| !line.trim().is_empty()).enumerate() {
        let _ = writeln!(out, "{:>2}. {line}", idx + 1);
    }
    out
}
