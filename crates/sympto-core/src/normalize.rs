//! RecordNormalizer: raw, unordered observations → dense, date-sorted days.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::constants::DATE_FORMAT;
use crate::day::CycleDay;
use crate::error::{CoreError, Result};
use crate::observation::{CervixPosition, MenstruationFlow, MucusType, RawObservation};

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Build the ordered `CycleDay` sequence for one user's observations.
///
/// Days are sorted ascending by date and numbered by rank. With
/// `window = Some(n)` only the `n` most recent dates are kept. When the same
/// date appears twice, the later observation in `observations` wins.
///
/// Every observation is checked before any is kept, so a malformed record
/// anywhere in the batch fails the whole call.
pub fn normalize(observations: &[RawObservation], window: Option<usize>) -> Result<Vec<CycleDay>> {
    let mut by_date: BTreeMap<NaiveDate, (Option<f64>, &RawObservation)> = BTreeMap::new();

    for (index, obs) in observations.iter().enumerate() {
        let date = parse_date(&obs.date).ok_or_else(|| CoreError::InvalidDate {
            index,
            value: obs.date.clone(),
        })?;

        let temperature = match &obs.temperature {
            Some(raw) => raw
                .coerce()
                .map_err(|_| CoreError::InvalidTemperature {
                    index,
                    value: raw.to_string(),
                })?,
            None => None,
        };

        by_date.insert(date, (temperature, obs));
    }

    let skip = match window {
        Some(n) => by_date.len().saturating_sub(n),
        None => 0,
    };

    let days = by_date
        .into_iter()
        .skip(skip)
        .enumerate()
        .map(|(i, (date, (temperature, obs)))| {
            let mut day = CycleDay::new(date, i + 1);
            day.temperature = temperature;
            day.mucus_type = obs.mucus_type.as_deref().and_then(MucusType::parse);
            day.menstruation_type = obs
                .menstruation_type
                .as_deref()
                .and_then(MenstruationFlow::parse);
            day.cervix = obs.cervical_position.map(CervixPosition::from_code);
            day.symptoms = obs.symptoms();
            day.note = obs
                .note
                .as_ref()
                .filter(|n| !n.trim().is_empty())
                .cloned();
            day
        })
        .collect();

    Ok(days)
}
