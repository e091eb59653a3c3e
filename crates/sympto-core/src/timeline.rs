//! Chart-ready views of a classified window: contiguous phase spans,
//! temperature points and day markers. Rendering is left to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::day::CycleDay;
use crate::phase::Phase;

/// Padding added above and below the temperature range of a chart (°C).
pub const CHART_PADDING_C: f64 = 0.1;

/// A run of consecutive days sharing one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpan {
    pub phase: Phase,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Ovulation,
    Fertile,
    Menstrual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMarker {
    pub date: NaiveDate,
    pub temperature: f64,
    pub kind: MarkerKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub points: Vec<(NaiveDate, f64)>,
    pub spans: Vec<PhaseSpan>,
    pub markers: Vec<ChartMarker>,
    /// Padded (min, max) temperature range; `None` without temperatures.
    pub y_range: Option<(f64, f64)>,
}

/// Group consecutive days with the same phase.
pub fn phase_spans(days: &[CycleDay]) -> Vec<PhaseSpan> {
    let mut spans: Vec<PhaseSpan> = Vec::new();
    for day in days {
        match spans.last_mut() {
            Some(span) if span.phase == day.phase => {
                span.end = day.date;
                span.days += 1;
            }
            _ => spans.push(PhaseSpan {
                phase: day.phase,
                start: day.date,
                end: day.date,
                days: 1,
            }),
        }
    }
    spans
}

/// Markers for days that have a temperature to anchor them.
pub fn markers(days: &[CycleDay]) -> Vec<ChartMarker> {
    let mut out = Vec::new();
    for day in days {
        let Some(temperature) = day.temperature else {
            continue;
        };
        let mut push = |kind| {
            out.push(ChartMarker {
                date: day.date,
                temperature,
                kind,
            })
        };
        if day.phase == Phase::Ovulation {
            push(MarkerKind::Ovulation);
        }
        if day.is_fertile && day.phase != Phase::Ovulation {
            push(MarkerKind::Fertile);
        }
        if day.phase == Phase::Menstrual {
            push(MarkerKind::Menstrual);
        }
    }
    out
}

pub fn chart_data(days: &[CycleDay]) -> ChartData {
    let points: Vec<(NaiveDate, f64)> = days
        .iter()
        .filter_map(|d| d.temperature.map(|t| (d.date, t)))
        .collect();

    let y_range = points.iter().map(|(_, t)| *t).fold(None, |acc, t| match acc {
        None => Some((t, t)),
        Some((lo, hi)) => Some((f64::min(lo, t), f64::max(hi, t))),
    });

    ChartData {
        spans: phase_spans(days),
        markers: markers(days),
        y_range: y_range.map(|(lo, hi)| (lo - CHART_PADDING_C, hi + CHART_PADDING_C)),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analyze;
    use crate::observation::RawObservation;
    use approx::assert_relative_eq;

    fn scenario_days() -> Vec<CycleDay> {
        let mut obs: Vec<RawObservation> = [36.2, 36.1, 36.0, 36.1, 36.0, 36.2, 36.6, 36.7, 36.8]
            .iter()
            .enumerate()
            .map(|(i, t)| RawObservation::new(format!("2024-01-{:02}", i + 1)).with_temperature(*t))
            .collect();
        obs[0] = obs[0].clone().with_menstruation("heavy");
        obs.push(RawObservation::new("2024-01-10"));
        analyze(&obs, None).unwrap().days
    }

    #[test]
    fn test_spans_cover_all_days() {
        let days = scenario_days();
        let spans = phase_spans(&days);
        let phases: Vec<Phase> = spans.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![
                Phase::Menstrual,
                Phase::Follicular,
                Phase::Ovulation,
                Phase::Luteal
            ]
        );
        assert_eq!(spans.iter().map(|s| s.days).sum::<usize>(), days.len());
        assert_eq!(spans[3].days, 3);
        assert_eq!(spans[3].end, days[9].date);
    }

    #[test]
    fn test_spans_empty() {
        assert!(phase_spans(&[]).is_empty());
    }

    #[test]
    fn test_markers() {
        let marks = markers(&scenario_days());
        let count = |kind| marks.iter().filter(|m| m.kind == kind).count();
        assert_eq!(count(MarkerKind::Ovulation), 1);
        // Fertile days 0..=6 minus the ovulation day
        assert_eq!(count(MarkerKind::Fertile), 6);
        assert_eq!(count(MarkerKind::Menstrual), 1);
    }

    #[test]
    fn test_chart_range_is_padded() {
        let chart = chart_data(&scenario_days());
        let (lo, hi) = chart.y_range.unwrap();
        assert_relative_eq!(lo, 35.9, epsilon = 1e-9);
        assert_relative_eq!(hi, 36.9, epsilon = 1e-9);
        assert_eq!(chart.points.len(), 9);
    }

    #[test]
    fn test_chart_without_temperatures() {
        let days = analyze(&[RawObservation::new("2024-01-01")], None).unwrap().days;
        let chart = chart_data(&days);
        assert!(chart.points.is_empty());
        assert_eq!(chart.y_range, None);
        assert_eq!(chart.spans.len(), 1);
    }
}
