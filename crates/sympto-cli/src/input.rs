//! Validation of user-entered observations before they reach the store.
//!
//! The analysis accepts anything the store holds; this is where a typo such
//! as `3.66` or `wett` gets caught and explained.

use schemars::JsonSchema;
use serde::Deserialize;
use sympto_core::{CervixPosition, MenstruationFlow, MucusType, RawObservation, parse_date};
use sympto_store::config::InputConfig;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("'{0}' is not a temperature (use e.g. 36.6 or 36,6)")]
    Temperature(String),

    #[error("temperature {value} is outside {min}-{max}°C")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    Date(String),

    #[error("unknown mucus type '{0}' (expected one of: {known})", known = MucusType::KNOWN.join(", "))]
    Mucus(String),

    #[error("unknown menstruation type '{0}' (expected one of: {known})", known = MenstruationFlow::KNOWN.join(", "))]
    Menstruation(String),

    #[error("unknown cervix position '{0}' (use 1-4 or e.g. high-open, low-closed)")]
    Cervix(String),

    #[error("nothing to record for {0}")]
    Empty(String),
}

/// One observation as typed by a person: every field optional and textual.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ObservationInput {
    /// Date of the observation, YYYY-MM-DD (defaults to today)
    #[serde(default)]
    pub date: Option<String>,
    /// Basal body temperature in °C, '.' or ',' as decimal separator
    #[serde(default)]
    pub temperature: Option<String>,
    /// Cervical mucus: dry, moist or wet
    #[serde(default)]
    pub mucus: Option<String>,
    /// Menstruation: none, light, medium, heavy or spotting
    #[serde(default)]
    pub menstruation: Option<String>,
    /// Cervix position: 1-4 or high-open, high-closed, low-open, low-closed
    #[serde(default)]
    pub cervix: Option<String>,
    /// Free-text note
    #[serde(default)]
    pub note: Option<String>,
    /// Abdominal pain or bloating
    #[serde(default)]
    pub abdominal_pain: Option<bool>,
    /// Breast tenderness
    #[serde(default)]
    pub breast_tenderness: Option<bool>,
    /// Intercourse
    #[serde(default)]
    pub intercourse: Option<bool>,
}

pub fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}

pub fn resolve_date(date: Option<&str>) -> Result<String, InputError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => parse_date(d)
            .map(|parsed| parsed.to_string())
            .ok_or_else(|| InputError::Date(d.to_string())),
        None => Ok(today()),
    }
}

pub fn parse_temperature(text: &str, limits: &InputConfig) -> Result<f64, InputError> {
    let value: f64 = text
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| InputError::Temperature(text.to_string()))?;
    if !value.is_finite() {
        return Err(InputError::Temperature(text.to_string()));
    }
    if value < limits.min_temperature || value > limits.max_temperature {
        return Err(InputError::OutOfRange {
            value,
            min: limits.min_temperature,
            max: limits.max_temperature,
        });
    }
    Ok(value)
}

pub fn parse_mucus(text: &str) -> Result<String, InputError> {
    let value = text.trim().to_lowercase();
    if MucusType::KNOWN.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(InputError::Mucus(text.to_string()))
    }
}

pub fn parse_menstruation(text: &str) -> Result<String, InputError> {
    let value = text.trim().to_lowercase();
    if MenstruationFlow::KNOWN.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(InputError::Menstruation(text.to_string()))
    }
}

pub fn parse_cervix(text: &str) -> Result<u8, InputError> {
    let trimmed = text.trim();
    if let Ok(code) = trimmed.parse::<u8>() {
        return match CervixPosition::from_code(code) {
            CervixPosition::Unknown(_) => Err(InputError::Cervix(text.to_string())),
            known => Ok(known.code()),
        };
    }
    let mut parts = trimmed.split(|c: char| c == '-' || c == ',' || c.is_whitespace());
    let height = parts.next().unwrap_or_default();
    let state = parts.find(|p| !p.is_empty()).unwrap_or_default();
    CervixPosition::from_parts(height, state)
        .map(CervixPosition::code)
        .ok_or_else(|| InputError::Cervix(text.to_string()))
}

impl ObservationInput {
    /// Validate every field and build the observation to store.
    ///
    /// Blank text fields count as not given. An input with nothing besides
    /// the date is rejected.
    pub fn into_observation(self, limits: &InputConfig) -> Result<RawObservation, InputError> {
        let date = resolve_date(self.date.as_deref())?;
        let given = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let mut obs = RawObservation::new(date.clone());
        if let Some(t) = given(self.temperature) {
            obs = obs.with_temperature(parse_temperature(&t, limits)?);
        }
        if let Some(m) = given(self.mucus) {
            obs.mucus_type = Some(parse_mucus(&m)?);
        }
        if let Some(f) = given(self.menstruation) {
            obs.menstruation_type = Some(parse_menstruation(&f)?);
        }
        if let Some(c) = given(self.cervix) {
            obs.cervical_position = Some(parse_cervix(&c)?);
        }
        obs.note = given(self.note).map(|n| n.trim().to_string());
        obs.abdominal_pain = self.abdominal_pain;
        obs.breast_tenderness = self.breast_tenderness;
        obs.intercourse = self.intercourse;

        if obs == RawObservation::new(date.clone()) {
            return Err(InputError::Empty(date));
        }
        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sympto_core::RawTemperature;

    fn limits() -> InputConfig {
        InputConfig::default()
    }

    #[test]
    fn test_temperature_accepts_comma() {
        assert_eq!(parse_temperature("36,6", &limits()), Ok(36.6));
        assert_eq!(parse_temperature(" 36.65 ", &limits()), Ok(36.65));
    }

    #[test]
    fn test_temperature_range() {
        assert_eq!(parse_temperature("35.0", &limits()), Ok(35.0));
        assert_eq!(parse_temperature("40.0", &limits()), Ok(40.0));
        assert!(matches!(
            parse_temperature("3.66", &limits()),
            Err(InputError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_temperature("41", &limits()),
            Err(InputError::OutOfRange { .. })
        ));
        assert_eq!(
            parse_temperature("warm", &limits()),
            Err(InputError::Temperature("warm".to_string()))
        );
        assert!(parse_temperature("NaN", &limits()).is_err());
    }

    #[test]
    fn test_vocabularies() {
        assert_eq!(parse_mucus("Wet"), Ok("wet".to_string()));
        assert!(parse_mucus("sticky").is_err());
        assert_eq!(parse_menstruation("none"), Ok("none".to_string()));
        assert_eq!(parse_menstruation(" HEAVY"), Ok("heavy".to_string()));
        assert!(parse_menstruation("lots").is_err());
    }

    #[test]
    fn test_cervix_codes_and_words() {
        assert_eq!(parse_cervix("2"), Ok(2));
        assert_eq!(parse_cervix("low-open"), Ok(3));
        assert_eq!(parse_cervix("high closed"), Ok(2));
        assert_eq!(parse_cervix("low, closed"), Ok(4));
        assert!(parse_cervix("5").is_err());
        assert!(parse_cervix("sideways").is_err());
    }

    #[test]
    fn test_resolve_date() {
        assert_eq!(resolve_date(Some("2024-02-29")), Ok("2024-02-29".to_string()));
        assert!(resolve_date(Some("2023-02-29")).is_err());
        assert_eq!(resolve_date(None), Ok(today()));
        assert_eq!(resolve_date(Some("  ")), Ok(today()));
    }

    #[test]
    fn test_into_observation() {
        let input = ObservationInput {
            date: Some("2024-05-01".to_string()),
            temperature: Some("36,7".to_string()),
            mucus: Some("moist".to_string()),
            cervix: Some("high-open".to_string()),
            note: Some("  tired ".to_string()),
            intercourse: Some(true),
            ..Default::default()
        };
        let obs = input.into_observation(&limits()).unwrap();
        assert_eq!(obs.date, "2024-05-01");
        assert_eq!(obs.temperature, Some(RawTemperature::Number(36.7)));
        assert_eq!(obs.mucus_type.as_deref(), Some("moist"));
        assert_eq!(obs.cervical_position, Some(1));
        assert_eq!(obs.note.as_deref(), Some("tired"));
        assert_eq!(obs.intercourse, Some(true));
        assert_eq!(obs.menstruation_type, None);
    }

    #[test]
    fn test_empty_input_rejected() {
        let input = ObservationInput {
            date: Some("2024-05-01".to_string()),
            note: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            input.into_observation(&limits()),
            Err(InputError::Empty("2024-05-01".to_string()))
        );
    }

    #[test]
    fn test_first_invalid_field_reported() {
        let input = ObservationInput {
            temperature: Some("36.5".to_string()),
            mucus: Some("gooey".to_string()),
            ..Default::default()
        };
        assert_eq!(
            input.into_observation(&limits()),
            Err(InputError::Mucus("gooey".to_string()))
        );
    }
}
