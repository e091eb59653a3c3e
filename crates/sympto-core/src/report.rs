//! Plain-text reports built from an analysis. Transports decide how to show
//! them; nothing here does I/O.

use crate::day::CycleDay;
use crate::engine::{AnalysisStatus, CycleAnalysis};
use crate::phase::Phase;

/// Below this many observed days the guidance asks for more measurements.
const SHORT_WINDOW_DAYS: usize = 10;

/// How many of the most recent fertile dates the prediction report lists.
const LISTED_FERTILE_DAYS: usize = 5;

pub const NEED_MORE_DATA: &str = "Not enough data yet. Keep recording your morning temperature \
     and other observations; at least 6 temperature readings are needed to look for ovulation.";

pub fn phase_description(phase: Phase) -> &'static str {
    match phase {
        Phase::Menstrual => {
            "Menstrual phase: the period. Hormone levels are low and temperature is usually lower."
        }
        Phase::Follicular => {
            "Follicular phase: the body prepares for ovulation. Temperature stays low."
        }
        Phase::Ovulation => {
            "Ovulation: the most fertile time. Temperature starts rising after the egg is released."
        }
        Phase::Luteal => {
            "Luteal phase: after ovulation. Temperature is raised and conception is unlikely."
        }
        Phase::Unknown => "Phase not determined: more data is needed for an analysis.",
    }
}

pub fn phase_recommendations(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Menstrual => &[
            "Rest more",
            "Take warm baths",
            "Keep an eye on the bleeding intensity",
        ],
        Phase::Follicular => &[
            "Keep measuring your temperature",
            "Watch for changes in mucus",
            "The fertile window is approaching",
        ],
        Phase::Ovulation => &[
            "This is the most fertile time",
            "Pay attention to ovulation symptoms",
            "Temperature should rise over the next days",
        ],
        Phase::Luteal => &[
            "Temperature should stay high",
            "Watch for PMS symptoms",
            "Menstruation is roughly 12-16 days away",
        ],
        Phase::Unknown => &[
            "Keep measuring every day",
            "Record all observations",
            "An accurate analysis takes time",
        ],
    }
}

/// Summary of phase, ovulation, fertile days and the next-ovulation estimate.
pub fn prediction_report(analysis: &CycleAnalysis) -> String {
    if analysis.status == AnalysisStatus::Empty {
        return NEED_MORE_DATA.to_string();
    }
    let p = &analysis.prediction;
    let mut lines = vec!["Fertility analysis".to_string(), String::new()];

    lines.push(format!("Current phase: {}", p.current_phase));
    lines.push(format!("Observed days: {}", p.cycle_length));
    lines.push(match p.ovulation_day {
        Some(day) => format!("Ovulation day: {day}"),
        None => "Ovulation: not determined".to_string(),
    });
    lines.push(format!("Fertile days: {}", p.fertile_days_count));
    if !p.fertile_days.is_empty() {
        let skip = p.fertile_days.len().saturating_sub(LISTED_FERTILE_DAYS);
        let recent: Vec<String> = p.fertile_days[skip..].iter().map(|d| d.to_string()).collect();
        lines.push(format!("Latest fertile days: {}", recent.join(", ")));
    }
    if let Some(next) = p.next_ovulation_estimate {
        lines.push(String::new());
        lines.push(format!("Next ovulation (approximate): {next}"));
        lines.push("(a fixed offset from the last record, not a forecast)".to_string());
    }

    lines.push(String::new());
    lines.push("Guidance:".to_string());
    let guidance: &[&str] = if p.cycle_length < SHORT_WINDOW_DAYS {
        &[
            "Keep taking your temperature daily",
            "Add mucus and other symptom observations",
        ]
    } else if p.ovulation_day.is_none() {
        &[
            "More data is needed to pin down ovulation",
            "Measure your temperature every morning at the same time",
        ]
    } else {
        &[
            "The chart shows a clear pattern",
            "Keep up the regular observations",
        ]
    };
    lines.extend(guidance.iter().map(|line| format!("- {line}")));
    to_text(lines)
}

/// Current phase with its description, recommendations and latest readings.
pub fn phase_report(analysis: &CycleAnalysis) -> String {
    if analysis.status.needs_more_data() && analysis.days.is_empty() {
        return NEED_MORE_DATA.to_string();
    }
    let phase = analysis.prediction.current_phase;
    let mut lines = vec![format!("Current phase: {phase}")];

    if let Some(last) = analysis.days.last() {
        lines.push(format!("Last record: {}", last.date));
    }
    if let Some(t) = analysis.days.iter().rev().find_map(|d| d.temperature) {
        lines.push(format!("Last temperature: {t:.2}°C"));
    }
    lines.push(format!("Records: {}", analysis.days.len()));

    lines.push(String::new());
    lines.push(phase_description(phase).to_string());
    lines.push(String::new());
    lines.push("Recommendations:".to_string());
    lines.extend(phase_recommendations(phase).iter().map(|line| format!("- {line}")));
    if analysis.status == AnalysisStatus::InsufficientData {
        lines.push(String::new());
        lines.push(NEED_MORE_DATA.to_string());
    }
    to_text(lines)
}

/// One block per day, newest first.
pub fn day_listing(days: &[CycleDay]) -> String {
    let mut lines = Vec::new();
    for day in days.iter().rev() {
        lines.push(format!("{} (day {})", day.date, day.day_number));
        if let Some(t) = day.temperature {
            lines.push(format!("  temperature: {t:.2}°C"));
        }
        if let Some(m) = &day.mucus_type {
            lines.push(format!("  mucus: {m}"));
        }
        if let Some(f) = &day.menstruation_type {
            lines.push(format!("  menstruation: {f}"));
        }
        if let Some(c) = day.cervix {
            lines.push(format!("  cervix: {}", c.description()));
        }
        lines.extend(day.symptoms.labels().into_iter().map(|label| format!("  {label}")));
        if let Some(note) = &day.note {
            lines.push(format!("  note: {note}"));
        }
        if day.phase != Phase::Unknown || day.is_fertile {
            let fertile = if day.is_fertile { ", fertile" } else { "" };
            lines.push(format!("  phase: {}{fertile}", day.phase));
        }
    }
    to_text(lines)
}

/// Newline-terminated text; empty for no lines.
fn to_text(lines: Vec<String>) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
