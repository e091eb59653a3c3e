//! PhaseInferenceEngine: temperature-shift detection, phase assignment,
//! menstrual override and fertile window over a normalized day sequence.
//!
//! Every call classifies from scratch. Nothing is cached between calls and
//! the caller's observations are only borrowed.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASELINE_WINDOW, CONFIRMATION_LOOKAHEAD, FERTILE_DAYS_AFTER, FERTILE_DAYS_BEFORE,
    HIGH_THRESHOLD_C, MIN_BASELINE_READINGS, MIN_HIGH_DAYS, MIN_TEMPERATURE_DAYS,
    RISE_THRESHOLD_C, TEMPERATURE_EPSILON,
};
use crate::day::CycleDay;
use crate::error::Result;
use crate::normalize::normalize;
use crate::observation::RawObservation;
use crate::phase::Phase;
use crate::prediction::{CyclePrediction, predict};

/// Outcome of the temperature-rise search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureShift {
    /// Fewer than `MIN_TEMPERATURE_DAYS` recorded temperatures.
    Insufficient,
    /// Enough readings, but no confirmed rise.
    NotFound,
    /// Confirmed rise; ovulation is the day before it.
    Found { ovulation_index: usize },
}

impl TemperatureShift {
    pub fn ovulation_index(self) -> Option<usize> {
        match self {
            TemperatureShift::Found { ovulation_index } => Some(ovulation_index),
            _ => None,
        }
    }
}

/// How much the engine could say about the analyzed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// No observations at all.
    Empty,
    /// Too few temperatures; phases other than Menstrual are Unknown.
    InsufficientData,
    /// Enough temperatures but no rise; phases use the midpoint split.
    NoRiseDetected,
    OvulationDetected,
}

impl AnalysisStatus {
    /// Whether the caller should ask the user for more observations.
    pub fn needs_more_data(self) -> bool {
        matches!(self, AnalysisStatus::Empty | AnalysisStatus::InsufficientData)
    }
}

/// Full result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleAnalysis {
    pub days: Vec<CycleDay>,
    /// 0-based index of the estimated ovulation day (the day before the rise).
    pub ovulation_index: Option<usize>,
    pub status: AnalysisStatus,
    pub prediction: CyclePrediction,
}

fn at_least(value: f64, threshold: f64) -> bool {
    value + TEMPERATURE_EPSILON >= threshold
}

/// Search for the first confirmed temperature rise.
///
/// `temps` is indexed by day; `None` entries are gaps and are skipped, never
/// interpolated.
pub fn detect_shift(temps: &[Option<f64>]) -> TemperatureShift {
    let recorded = temps.iter().filter(|t| t.is_some()).count();
    if recorded < MIN_TEMPERATURE_DAYS {
        return TemperatureShift::Insufficient;
    }

    for i in BASELINE_WINDOW..temps.len() {
        let Some(t) = temps[i] else {
            continue;
        };

        let baseline: Vec<f64> = temps[i - BASELINE_WINDOW..i].iter().flatten().copied().collect();
        if baseline.len() < MIN_BASELINE_READINGS {
            continue;
        }
        let avg_low = baseline.iter().sum::<f64>() / baseline.len() as f64;

        if !at_least(t, avg_low + RISE_THRESHOLD_C) {
            continue;
        }

        // The rise day itself is the first high day
        let end = (i + 1 + CONFIRMATION_LOOKAHEAD).min(temps.len());
        let high_days = 1 + temps[i + 1..end]
            .iter()
            .flatten()
            .filter(|&&v| at_least(v, avg_low + HIGH_THRESHOLD_C))
            .count();

        if high_days >= MIN_HIGH_DAYS {
            tracing::debug!(rise_index = i, avg_low, "temperature shift confirmed");
            return TemperatureShift::Found {
                ovulation_index: i - 1,
            };
        }
    }

    TemperatureShift::NotFound
}

/// Index of the estimated ovulation day, if a rise is confirmed.
pub fn detect_ovulation(temps: &[Option<f64>]) -> Option<usize> {
    detect_shift(temps).ovulation_index()
}

/// Temperature-derived phase for each of `len` days.
///
/// Without a confirmed rise the window is split at its midpoint
/// (Follicular, then Luteal). This is a coarse approximation, not a
/// diagnosis.
pub fn assign_phases(len: usize, shift: TemperatureShift) -> Vec<Phase> {
    match shift {
        TemperatureShift::Insufficient => vec![Phase::Unknown; len],
        TemperatureShift::Found { ovulation_index } => (0..len)
            .map(|i| {
                if i <= ovulation_index {
                    Phase::Follicular
                } else if i == ovulation_index + 1 {
                    Phase::Ovulation
                } else {
                    Phase::Luteal
                }
            })
            .collect(),
        TemperatureShift::NotFound => {
            let mid = len / 2;
            (0..len)
                .map(|i| if i < mid { Phase::Follicular } else { Phase::Luteal })
                .collect()
        }
    }
}

/// Days with recorded bleeding become Menstrual; all others keep their phase.
pub fn apply_menstrual_override(days: &mut [CycleDay]) {
    for day in days.iter_mut().filter(|d| d.is_menstrual()) {
        day.phase = Phase::Menstrual;
    }
}

/// Fertile index range around `ovulation_index`, clipped to `len` days.
pub fn fertile_window(ovulation_index: Option<usize>, len: usize) -> Option<RangeInclusive<usize>> {
    let k = ovulation_index?;
    if len == 0 || k >= len {
        return None;
    }
    let start = k.saturating_sub(FERTILE_DAYS_BEFORE);
    let end = (k + FERTILE_DAYS_AFTER).min(len - 1);
    Some(start..=end)
}

/// Phase of the newest day with a temperature or recorded bleeding; falls
/// back to the last day, then to Unknown.
pub fn current_phase(days: &[CycleDay]) -> Phase {
    days.iter()
        .rev()
        .find(|d| d.has_signal())
        .or(days.last())
        .map(|d| d.phase)
        .unwrap_or_default()
}

/// Classify an already normalized sequence.
pub fn classify(mut days: Vec<CycleDay>) -> CycleAnalysis {
    let temps: Vec<Option<f64>> = days.iter().map(|d| d.temperature).collect();
    let shift = detect_shift(&temps);

    for (day, phase) in days.iter_mut().zip(assign_phases(temps.len(), shift)) {
        day.phase = phase;
    }
    apply_menstrual_override(&mut days);

    let ovulation_index = shift.ovulation_index();
    if let Some(range) = fertile_window(ovulation_index, days.len()) {
        for day in &mut days[range] {
            day.is_fertile = true;
        }
    }

    let status = if days.is_empty() {
        AnalysisStatus::Empty
    } else {
        match shift {
            TemperatureShift::Insufficient => AnalysisStatus::InsufficientData,
            TemperatureShift::NotFound => AnalysisStatus::NoRiseDetected,
            TemperatureShift::Found { .. } => AnalysisStatus::OvulationDetected,
        }
    };

    let prediction = predict(&days);
    tracing::debug!(
        days = days.len(),
        ?status,
        current_phase = %prediction.current_phase,
        "cycle classified"
    );

    CycleAnalysis {
        days,
        ovulation_index,
        status,
        prediction,
    }
}

/// Normalize and classify one user's observations in a single pass.
///
/// Fails only on malformed input (see [`crate::CoreError`]); sparse data
/// yields a degraded [`AnalysisStatus`] instead.
pub fn analyze(observations: &[RawObservation], window: Option<usize>) -> Result<CycleAnalysis> {
    let days = normalize(observations, window)?;
    Ok(classify(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_TEMPS: [f64; 9] = [36.2, 36.1, 36.0, 36.1, 36.0, 36.2, 36.6, 36.7, 36.8];

    fn series(temps: &[f64]) -> Vec<Option<f64>> {
        temps.iter().copied().map(Some).collect()
    }

    fn observations(temps: &[Option<f64>]) -> Vec<RawObservation> {
        temps
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut obs = RawObservation::new(format!("2024-01-{:02}", i + 1));
                if let Some(t) = t {
                    obs = obs.with_temperature(*t);
                }
                obs
            })
            .collect()
    }

    #[test]
    fn test_detects_rise_in_scenario() {
        assert_eq!(detect_ovulation(&series(&SCENARIO_TEMPS)), Some(5));
    }

    #[test]
    fn test_fewer_than_six_readings_is_insufficient() {
        let temps = vec![Some(36.1), None, Some(36.0), Some(36.6), None, Some(36.7), Some(36.8)];
        assert_eq!(detect_shift(&temps), TemperatureShift::Insufficient);
    }

    #[test]
    fn test_flat_series_has_no_rise() {
        let temps = series(&[36.2; 12]);
        assert_eq!(detect_shift(&temps), TemperatureShift::NotFound);
    }

    #[test]
    fn test_single_spike_is_not_confirmed() {
        // Spike at index 6 falls back to baseline on both follow-up days
        let temps = series(&[36.2, 36.1, 36.0, 36.1, 36.0, 36.2, 36.6, 36.1, 36.0]);
        assert_eq!(detect_shift(&temps), TemperatureShift::NotFound);
    }

    #[test]
    fn test_rise_on_last_day_cannot_be_confirmed() {
        let temps = series(&[36.1, 36.1, 36.1, 36.1, 36.1, 36.1, 36.6]);
        assert_eq!(detect_ovulation(&temps), None);
    }

    #[test]
    fn test_exact_threshold_rise_counts() {
        // Baseline 36.1, rise of exactly 0.2 and a follow-up of exactly 0.1
        let temps = series(&[36.1, 36.1, 36.1, 36.1, 36.1, 36.1, 36.3, 36.2]);
        assert_eq!(detect_ovulation(&temps), Some(5));
    }

    #[test]
    fn test_baseline_needs_three_readings() {
        // Only two recorded values precede index 6, so it cannot trigger
        let temps = vec![
            Some(36.0),
            None,
            None,
            None,
            None,
            Some(36.0),
            Some(36.6),
            Some(36.7),
            Some(36.1),
            Some(36.1),
        ];
        assert_eq!(detect_shift(&temps), TemperatureShift::NotFound);
    }

    #[test]
    fn test_gaps_in_lookahead_are_skipped() {
        let temps = vec![
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.5),
            None,
            Some(36.4),
        ];
        assert_eq!(detect_ovulation(&temps), Some(5));
    }

    #[test]
    fn test_gap_on_candidate_day_is_skipped() {
        let temps = vec![
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.1),
            Some(36.1),
            None,
            Some(36.5),
            Some(36.5),
        ];
        // Candidate 6 is a gap; index 7 rises against a baseline of 1..=6
        assert_eq!(detect_ovulation(&temps), Some(6));
    }

    #[test]
    fn test_first_rise_wins() {
        let temps = series(&[
            36.0, 36.0, 36.0, 36.0, 36.0, 36.0, 36.4, 36.4, 36.4, 36.9, 37.0, 37.0,
        ]);
        assert_eq!(detect_ovulation(&temps), Some(5));
    }

    #[test]
    fn test_assign_phases_around_ovulation() {
        let phases = assign_phases(9, TemperatureShift::Found { ovulation_index: 5 });
        assert_eq!(&phases[..6], &[Phase::Follicular; 6]);
        assert_eq!(phases[6], Phase::Ovulation);
        assert_eq!(&phases[7..], &[Phase::Luteal; 2]);
    }

    #[test]
    fn test_assign_phases_midpoint_split() {
        let phases = assign_phases(7, TemperatureShift::NotFound);
        assert_eq!(&phases[..3], &[Phase::Follicular; 3]);
        assert_eq!(&phases[3..], &[Phase::Luteal; 4]);
    }

    #[test]
    fn test_assign_phases_insufficient() {
        assert_eq!(
            assign_phases(4, TemperatureShift::Insufficient),
            vec![Phase::Unknown; 4]
        );
    }

    #[test]
    fn test_fertile_window_bounds() {
        assert_eq!(fertile_window(Some(5), 9), Some(0..=6));
        assert_eq!(fertile_window(Some(2), 9), Some(0..=3));
        assert_eq!(fertile_window(Some(10), 20), Some(5..=11));
        assert_eq!(fertile_window(Some(8), 9), Some(3..=8));
        assert_eq!(fertile_window(None, 9), None);
        assert_eq!(fertile_window(Some(3), 0), None);
    }

    #[test]
    fn test_scenario_classification() {
        let analysis = analyze(&observations(&series(&SCENARIO_TEMPS)), None).unwrap();

        assert_eq!(analysis.ovulation_index, Some(5));
        assert_eq!(analysis.status, AnalysisStatus::OvulationDetected);
        for day in &analysis.days[..6] {
            assert_eq!(day.phase, Phase::Follicular);
        }
        assert_eq!(analysis.days[6].phase, Phase::Ovulation);
        assert_eq!(analysis.days[7].phase, Phase::Luteal);
        assert_eq!(analysis.days[8].phase, Phase::Luteal);

        let fertile: Vec<bool> = analysis.days.iter().map(|d| d.is_fertile).collect();
        assert_eq!(fertile, vec![true, true, true, true, true, true, true, false, false]);
    }

    #[test]
    fn test_insufficient_data_keeps_menstrual_override() {
        let mut obs = observations(&[Some(36.2), Some(36.1), None, None]);
        obs[0] = obs[0].clone().with_menstruation("medium");

        let analysis = analyze(&obs, None).unwrap();
        assert_eq!(analysis.status, AnalysisStatus::InsufficientData);
        assert_eq!(analysis.ovulation_index, None);
        assert_eq!(analysis.days[0].phase, Phase::Menstrual);
        for day in &analysis.days[1..] {
            assert_eq!(day.phase, Phase::Unknown);
        }
        assert!(analysis.days.iter().all(|d| !d.is_fertile));
    }

    #[test]
    fn test_heavy_flow_after_luteal_only_changes_that_day() {
        let mut temps = series(&SCENARIO_TEMPS);
        temps.extend([Some(36.8), Some(36.7), Some(36.6)]);
        let mut obs = observations(&temps);
        obs[10] = obs[10].clone().with_menstruation("heavy");

        let analysis = analyze(&obs, None).unwrap();
        assert_eq!(analysis.days[9].phase, Phase::Luteal);
        assert_eq!(analysis.days[10].phase, Phase::Menstrual);
        assert_eq!(analysis.days[11].phase, Phase::Luteal);
    }

    #[test]
    fn test_no_rise_uses_midpoint_and_no_fertile_days() {
        let analysis = analyze(&observations(&series(&[36.3; 8])), None).unwrap();
        assert_eq!(analysis.status, AnalysisStatus::NoRiseDetected);
        assert_eq!(analysis.days[3].phase, Phase::Follicular);
        assert_eq!(analysis.days[4].phase, Phase::Luteal);
        assert!(analysis.days.iter().all(|d| !d.is_fertile));
    }

    #[test]
    fn test_empty_input() {
        let analysis = analyze(&[], None).unwrap();
        assert!(analysis.days.is_empty());
        assert_eq!(analysis.status, AnalysisStatus::Empty);
        assert!(analysis.status.needs_more_data());
        assert_eq!(analysis.prediction, CyclePrediction::default());
    }

    #[test]
    fn test_current_phase_prefers_newest_signal() {
        let mut obs = observations(&series(&SCENARIO_TEMPS));
        // Trailing day with only a mucus note carries no signal
        obs.push(RawObservation::new("2024-01-10").with_mucus("dry"));
        let mut analysis = analyze(&obs, None).unwrap();
        analysis.days[9].phase = Phase::Unknown;
        assert_eq!(current_phase(&analysis.days), Phase::Luteal);
    }

    #[test]
    fn test_current_phase_falls_back_to_last_day() {
        let obs = vec![
            RawObservation::new("2024-01-01").with_mucus("dry"),
            RawObservation::new("2024-01-02").with_note("tired"),
        ];
        let analysis = analyze(&obs, None).unwrap();
        assert_eq!(current_phase(&analysis.days), Phase::Unknown);
        assert_eq!(current_phase(&[]), Phase::Unknown);
    }

    #[test]
    fn test_idempotent() {
        let obs = observations(&series(&SCENARIO_TEMPS));
        let first = analyze(&obs, None).unwrap();
        let second = analyze(&obs, None).unwrap();
        assert_eq!(first, second);
    }
}
