use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub safety_warning: Option<String>,
    /// Most likely cause first, in the order the model returned them.
    #[serde(default, deserialize_with = "lenient::list")]
    pub potential_causes: Vec<Cause>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub maintenance_tip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cause {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub solution: Option<String>,
    #[serde(default, deserialize_with = "lenient::percent")]
    pub likelihood: Option<u8>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub estimated_cost: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub difficulty: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::DiagnosisResult;

    #[test]
    fn decodes_camel_case_fields() {
        let parsed: DiagnosisResult = serde_json::from_value(json!({
            "summary": "Injector leak",
            "severity": "High",
            "safetyWarning": "Do not drive",
            "potentialCauses": [{
                "name": "Injector seal",
                "description": "Worn copper washer",
                "solution": "Replace washer",
                "likelihood": 80,
                "estimatedCost": "200 PLN",
                "difficulty": "Medium"
            }],
            "maintenanceTip": "Check torque"
        }))
        .unwrap();

        assert_eq!(parsed.safety_warning.as_deref(), Some("Do not drive"));
        assert_eq!(parsed.potential_causes.len(), 1);
        let cause = &parsed.potential_causes[0];
        assert_eq!(cause.likelihood, Some(80));
        assert_eq!(cause.estimated_cost.as_deref(), Some("200 PLN"));
    }

    #[test]
    fn likelihood_accepts_strings_and_clamps() {
        let parsed: DiagnosisResult = serde_json::from_value(json!({
            "potentialCauses": [
                {"name": "a", "likelihood": "65%"},
                {"name": "b", "likelihood": 140.2},
                {"name": "c", "likelihood": null},
                {"name": "d", "likelihood": 33.6}
            ]
        }))
        .unwrap();
        let values: Vec<Option<u8>> = parsed
            .potential_causes
            .iter()
            .map(|cause| cause.likelihood)
            .collect();
        assert_eq!(values, vec![Some(65), Some(100), None, Some(34)]);
    }

    #[test]
    fn loose_likelihoods_use_first_number_or_none() {
        let parsed: DiagnosisResult = serde_json::from_value(json!({
            "potentialCauses": [
                {"name": "a", "likelihood": "70-80%"},
                {"name": "b", "likelihood": "~60"},
                {"name": "c", "likelihood": "high"},
                {"name": "d", "likelihood": [50]},
                {"name": "e", "likelihood": "12,5 %"}
            ]
        }))
        .unwrap();
        let values: Vec<Option<u8>> = parsed
            .potential_causes
            .iter()
            .map(|cause| cause.likelihood)
            .collect();
        assert_eq!(values, vec![Some(70), Some(60), None, None, Some(13)]);
    }

    #[test]
    fn step_lists_are_joined_into_text() {
        let parsed: DiagnosisResult = serde_json::from_value(json!({
            "potentialCauses": [{
                "name": "Coil",
                "solution": ["Replace coil", " ", "Check plugs"],
                "estimatedCost": []
            }]
        }))
        .unwrap();
        let cause = &parsed.potential_causes[0];
        assert_eq!(cause.solution.as_deref(), Some("Replace coil; Check plugs"));
        assert_eq!(cause.estimated_cost, None);
    }

    #[test]
    fn nulls_and_numbers_are_tolerated() {
        let parsed: DiagnosisResult = serde_json::from_value(json!({
            "summary": null,
            "potentialCauses": [{"name": "Pump", "estimatedCost": 450}],
            "maintenanceTip": null
        }))
        .unwrap();
        assert_eq!(parsed.summary, None);
        assert_eq!(
            parsed.potential_causes[0].estimated_cost.as_deref(),
            Some("450")
        );
    }

    #[test]
    fn nested_objects_in_text_fields_are_rejected() {
        let err = serde_json::from_value::<DiagnosisResult>(json!({
            "summary": {"text": "nested"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("expected text"));
    }
}
