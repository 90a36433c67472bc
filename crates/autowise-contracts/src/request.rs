use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Diagnosis,
    Tuning,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Diagnosis => "diagnosis",
            Mode::Tuning => "tuning",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "diagnosis" | "diagnose" | "diag" => Ok(Mode::Diagnosis),
            "tuning" | "tune" => Ok(Mode::Tuning),
            _ => Err(format!(
                "unknown mode '{raw}' (expected diagnosis or tuning)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    #[default]
    Car,
    Motorcycle,
    Truck,
    Other,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Car,
        VehicleType::Motorcycle,
        VehicleType::Truck,
        VehicleType::Other,
    ];

    /// Canonical English name, written verbatim into prompts.
    pub fn name(self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Motorcycle => "Motorcycle",
            VehicleType::Truck => "Truck",
            VehicleType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineType {
    #[default]
    Petrol,
    Diesel,
    #[serde(rename = "LPG")]
    Lpg,
    Hybrid,
    Electric,
}

impl EngineType {
    pub const ALL: [EngineType; 5] = [
        EngineType::Petrol,
        EngineType::Diesel,
        EngineType::Lpg,
        EngineType::Hybrid,
        EngineType::Electric,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EngineType::Petrol => "Petrol",
            EngineType::Diesel => "Diesel",
            EngineType::Lpg => "LPG",
            EngineType::Hybrid => "Hybrid",
            EngineType::Electric => "Electric",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        VehicleType::ALL
            .into_iter()
            .find(|value| value.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| {
                format!("unknown vehicle '{raw}' (expected car, motorcycle, truck or other)")
            })
    }
}

impl FromStr for EngineType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        EngineType::ALL
            .into_iter()
            .find(|value| value.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown engine '{raw}' (expected petrol, diesel, lpg, hybrid or electric)"
                )
            })
    }
}

/// Photo sent inline with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub label: String,
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .field("label", &self.label)
            .finish()
    }
}

/// One structured-mode call. Built fresh for every call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub mode: Mode,
    pub vehicle: VehicleType,
    pub engine: EngineType,
    pub description: String,
    pub language: Language,
    pub image: Option<ImageAttachment>,
    pub context_history: String,
}

#[cfg(test)]
mod tests {
    use super::{EngineType, ImageAttachment, Mode, VehicleType};

    #[test]
    fn mode_accepts_short_aliases() {
        assert_eq!("diag".parse::<Mode>(), Ok(Mode::Diagnosis));
        assert_eq!("Tune".parse::<Mode>(), Ok(Mode::Tuning));
        assert!("chat".parse::<Mode>().is_err());
    }

    #[test]
    fn vehicle_and_engine_parse_display_names() {
        assert_eq!("motorcycle".parse::<VehicleType>(), Ok(VehicleType::Motorcycle));
        assert_eq!("LPG".parse::<EngineType>(), Ok(EngineType::Lpg));
        assert_eq!(EngineType::Lpg.to_string(), "LPG");
        assert!("boat".parse::<VehicleType>().is_err());
    }

    #[test]
    fn attachment_debug_hides_payload() {
        let image = ImageAttachment {
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xff; 4096],
            label: "engine.jpg".to_string(),
        };
        let rendered = format!("{image:?}");
        assert!(rendered.contains("4096"));
        assert!(rendered.len() < 200);
    }
}
