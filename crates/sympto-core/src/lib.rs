//! Sympto-thermal cycle phase inference.
//!
//! Turns a user's daily observations (basal body temperature, bleeding,
//! cervical mucus, cervix position, symptoms) into per-day cycle phases, a
//! fertile window and a coarse next-ovulation estimate.
//!
//! Zero I/O: pure functions over borrowed input, no opinions about transport
//! or persistence. Results are advisory and not a contraceptive method.

pub mod constants;
pub mod day;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod observation;
pub mod phase;
pub mod prediction;
pub mod report;
pub mod timeline;

pub use constants::{DATE_FORMAT, DEFAULT_WINDOW, MIN_TEMPERATURE_DAYS};
pub use day::CycleDay;
pub use engine::{
    AnalysisStatus, CycleAnalysis, TemperatureShift, analyze, apply_menstrual_override,
    assign_phases, classify, current_phase, detect_ovulation, detect_shift, fertile_window,
};
pub use error::{CoreError, Result};
pub use normalize::{normalize, parse_date};
pub use observation::{
    CervixPosition, MenstruationFlow, MucusType, RawObservation, RawTemperature, Symptoms,
};
pub use phase::Phase;
pub use prediction::{CyclePrediction, predict};
pub use report::{day_listing, phase_description, phase_recommendations, phase_report, prediction_report};
pub use timeline::{ChartData, ChartMarker, MarkerKind, PhaseSpan, chart_data, markers, phase_spans};
