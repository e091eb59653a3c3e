use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::observation::{CervixPosition, MenstruationFlow, MucusType, Symptoms};
use crate::phase::Phase;

/// One observed day inside an analyzed window.
///
/// `day_number` is the 1-based rank of the day after sorting, not a
/// calendar offset: days without a record are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDay {
    pub date: NaiveDate,
    pub day_number: usize,
    pub temperature: Option<f64>,
    pub mucus_type: Option<MucusType>,
    #[serde(default, deserialize_with = "crate::observation::deserialize_optional_flow")]
    pub menstruation_type: Option<MenstruationFlow>,
    pub cervix: Option<CervixPosition>,
    pub symptoms: Symptoms,
    pub note: Option<String>,
    pub phase: Phase,
    pub is_fertile: bool,
}

impl CycleDay {
    /// An unclassified day: phase `Unknown`, not fertile.
    pub fn new(date: NaiveDate, day_number: usize) -> Self {
        Self {
            date,
            day_number,
            temperature: None,
            mucus_type: None,
            menstruation_type: None,
            cervix: None,
            symptoms: Symptoms::default(),
            note: None,
            phase: Phase::Unknown,
            is_fertile: false,
        }
    }

    pub fn is_menstrual(&self) -> bool {
        self.menstruation_type.is_some()
    }

    /// Whether the day carries a signal the engine reasons about.
    pub fn has_signal(&self) -> bool {
        self.temperature.is_some() || self.is_menstrual()
    }
}
