use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::NEXT_OVULATION_OFFSET_DAYS;
use crate::day::CycleDay;
use crate::engine::current_phase;
use crate::phase::Phase;

/// Summary of a classified window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CyclePrediction {
    pub current_phase: Phase,
    /// Number of analyzed (observed) days.
    pub cycle_length: usize,
    /// Day number of the day classified as Ovulation.
    pub ovulation_day: Option<usize>,
    pub fertile_days: Vec<NaiveDate>,
    pub fertile_days_count: usize,
    /// Last observed date plus a fixed offset; not derived from history.
    pub next_ovulation_estimate: Option<NaiveDate>,
}

/// Build the summary from classified days.
pub fn predict(days: &[CycleDay]) -> CyclePrediction {
    let ovulation_day = days
        .iter()
        .rev()
        .find(|d| d.phase == Phase::Ovulation)
        .map(|d| d.day_number);

    let fertile_days: Vec<NaiveDate> = days
        .iter()
        .filter(|d| d.is_fertile)
        .map(|d| d.date)
        .collect();

    let next_ovulation_estimate = days
        .last()
        .and_then(|d| d.date.checked_add_days(Days::new(NEXT_OVULATION_OFFSET_DAYS)));

    CyclePrediction {
        current_phase: current_phase(days),
        cycle_length: days.len(),
        ovulation_day,
        fertile_days_count: fertile_days.len(),
        fertile_days,
        next_ovulation_estimate,
    }
}
