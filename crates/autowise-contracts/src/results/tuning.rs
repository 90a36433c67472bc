use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningResult {
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub expected_power_increase: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub driving_characteristics: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub estimated_total_cost: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reliability_impact: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub parts_recommendation: Vec<PartRecommendation>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecommendation {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub part_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub estimated_price: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub power_gain: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TuningResult;

    #[test]
    fn decodes_parts_and_lists() {
        let parsed: TuningResult = serde_json::from_value(json!({
            "summary": "Stage 1",
            "expectedPowerIncrease": "+30HP",
            "drivingCharacteristics": "More low-end torque",
            "estimatedTotalCost": "2500 PLN",
            "reliabilityImpact": "Minor",
            "partsRecommendation": [{
                "name": "ECU remap",
                "type": "Software",
                "description": "Fuel and boost maps",
                "estimatedPrice": "1500 PLN",
                "powerGain": "+25HP"
            }],
            "pros": ["Cheap", null, "Reversible"],
            "cons": ["Clutch wear"]
        }))
        .unwrap();

        assert_eq!(parsed.parts_recommendation[0].part_type.as_deref(), Some("Software"));
        assert_eq!(parsed.pros, vec!["Cheap", "Reversible"]);
        assert_eq!(parsed.cons, vec!["Clutch wear"]);
    }

    #[test]
    fn serializes_part_type_as_type() {
        let parsed: TuningResult = serde_json::from_value(json!({
            "partsRecommendation": [{"name": "Intake", "type": "Air"}],
            "pros": null
        }))
        .unwrap();
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["partsRecommendation"][0]["type"], json!("Air"));
        assert_eq!(value["pros"], json!([]));
    }
}
