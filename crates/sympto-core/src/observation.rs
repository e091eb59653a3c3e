//! Raw daily observations and the typed vocabularies derived from them.
//!
//! A `RawObservation` is what the input and storage collaborators hand over:
//! loosely typed, one per user per calendar date. The typed values
//! (`MucusType`, `MenstruationFlow`, `CervixPosition`, `Symptoms`) are what
//! the normalizer produces for every `CycleDay`.

use std::fmt;
use std::num::ParseFloatError;

use serde::{Deserialize, Serialize};

/// Temperature as it arrives from a collaborator: a number, or text such as
/// `"36.6"` / `"36,6"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTemperature {
    Number(f64),
    Text(String),
}

impl RawTemperature {
    /// Coerce to °C. `Ok(None)` for empty text or non-finite numbers.
    pub fn coerce(&self) -> Result<Option<f64>, ParseFloatError> {
        match self {
            RawTemperature::Number(v) => Ok(v.is_finite().then_some(*v)),
            RawTemperature::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                let value: f64 = trimmed.replace(',', ".").parse()?;
                Ok(value.is_finite().then_some(value))
            }
        }
    }
}

impl From<f64> for RawTemperature {
    fn from(v: f64) -> Self {
        RawTemperature::Number(v)
    }
}

impl fmt::Display for RawTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTemperature::Number(v) => write!(f, "{v}"),
            RawTemperature::Text(s) => f.write_str(s),
        }
    }
}

/// One user's observations for one calendar date, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<RawTemperature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mucus_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menstruation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cervical_position: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abdominal_pain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breast_tenderness: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intercourse: Option<bool>,
}

impl RawObservation {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(RawTemperature::Number(celsius));
        self
    }

    pub fn with_mucus(mut self, mucus: &str) -> Self {
        self.mucus_type = Some(mucus.to_string());
        self
    }

    pub fn with_menstruation(mut self, flow: &str) -> Self {
        self.menstruation_type = Some(flow.to_string());
        self
    }

    pub fn with_cervix(mut self, code: u8) -> Self {
        self.cervical_position = Some(code);
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Symptom flags as recorded; unset flags read as false.
    pub fn symptoms(&self) -> Symptoms {
        Symptoms {
            abdominal_pain: self.abdominal_pain.unwrap_or(false),
            breast_tenderness: self.breast_tenderness.unwrap_or(false),
            intercourse: self.intercourse.unwrap_or(false),
        }
    }
}

/// Cervical mucus observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MucusType {
    Dry,
    Moist,
    Wet,
    Other(String),
}

impl MucusType {
    pub const KNOWN: [&'static str; 3] = ["dry", "moist", "wet"];

    /// `None` for empty text; unrecognized text is kept verbatim.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_lowercase().as_str() {
            "dry" => MucusType::Dry,
            "moist" => MucusType::Moist,
            "wet" => MucusType::Wet,
            _ => MucusType::Other(trimmed.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            MucusType::Dry => "dry",
            MucusType::Moist => "moist",
            MucusType::Wet => "wet",
            MucusType::Other(s) => s,
        }
    }
}

impl From<String> for MucusType {
    fn from(s: String) -> Self {
        MucusType::parse(&s).unwrap_or(MucusType::Other(s))
    }
}

impl From<MucusType> for String {
    fn from(m: MucusType) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for MucusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Menstrual bleeding intensity. Only recorded bleeding is represented;
/// "none" means no flow and never becomes a value of this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MenstruationFlow {
    Light,
    Medium,
    Heavy,
    Spotting,
    Other(String),
}

impl MenstruationFlow {
    pub const KNOWN: [&'static str; 5] = ["none", "light", "medium", "heavy", "spotting"];

    /// `None` for empty text and for `"none"`; unrecognized text is kept
    /// verbatim and still counts as bleeding.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_lowercase().as_str() {
            "none" => return None,
            "light" => MenstruationFlow::Light,
            "medium" => MenstruationFlow::Medium,
            "heavy" => MenstruationFlow::Heavy,
            "spotting" => MenstruationFlow::Spotting,
            _ => MenstruationFlow::Other(trimmed.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            MenstruationFlow::Light => "light",
            MenstruationFlow::Medium => "medium",
            MenstruationFlow::Heavy => "heavy",
            MenstruationFlow::Spotting => "spotting",
            MenstruationFlow::Other(s) => s,
        }
    }
}

impl TryFrom<String> for MenstruationFlow {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        MenstruationFlow::parse(&s).ok_or_else(|| format!("'{s}' is not a menstrual flow"))
    }
}

/// Reads an optional flow where `"none"` and empty text mean no bleeding.
pub(crate) fn deserialize_optional_flow<'de, D>(
    deserializer: D,
) -> Result<Option<MenstruationFlow>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    Ok(text.as_deref().and_then(MenstruationFlow::parse))
}

impl From<MenstruationFlow> for String {
    fn from(m: MenstruationFlow) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for MenstruationFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cervix height and opening, stored as a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum CervixPosition {
    HighOpen,
    HighClosed,
    LowOpen,
    LowClosed,
    Unknown(u8),
}

impl CervixPosition {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => CervixPosition::HighOpen,
            2 => CervixPosition::HighClosed,
            3 => CervixPosition::LowOpen,
            4 => CervixPosition::LowClosed,
            other => CervixPosition::Unknown(other),
        }
    }

    /// Code for a height (`high`/`low`) and state (`open`/`closed`) pair.
    pub fn from_parts(height: &str, state: &str) -> Option<Self> {
        match (
            height.trim().to_lowercase().as_str(),
            state.trim().to_lowercase().as_str(),
        ) {
            ("high", "open") => Some(CervixPosition::HighOpen),
            ("high", "closed") => Some(CervixPosition::HighClosed),
            ("low", "open") => Some(CervixPosition::LowOpen),
            ("low", "closed") => Some(CervixPosition::LowClosed),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            CervixPosition::HighOpen => 1,
            CervixPosition::HighClosed => 2,
            CervixPosition::LowOpen => 3,
            CervixPosition::LowClosed => 4,
            CervixPosition::Unknown(code) => code,
        }
    }

    pub fn description(self) -> String {
        match self {
            CervixPosition::HighOpen => "high, open".to_string(),
            CervixPosition::HighClosed => "high, closed".to_string(),
            CervixPosition::LowOpen => "low, open".to_string(),
            CervixPosition::LowClosed => "low, closed".to_string(),
            CervixPosition::Unknown(code) => format!("code {code}"),
        }
    }
}

impl From<u8> for CervixPosition {
    fn from(code: u8) -> Self {
        CervixPosition::from_code(code)
    }
}

impl From<CervixPosition> for u8 {
    fn from(c: CervixPosition) -> Self {
        c.code()
    }
}

/// Boolean symptom flags for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Symptoms {
    pub abdominal_pain: bool,
    pub breast_tenderness: bool,
    pub intercourse: bool,
}

impl Symptoms {
    pub fn any(&self) -> bool {
        self.abdominal_pain || self.breast_tenderness || self.intercourse
    }

    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.abdominal_pain {
            labels.push("abdominal pain/bloating");
        }
        if self.breast_tenderness {
            labels.push("breast tenderness");
        }
        if self.intercourse {
            labels.push("intercourse");
        }
        labels
    }
}
