/// Minimum number of temperature-bearing days before a rise is looked for
pub const MIN_TEMPERATURE_DAYS: usize = 6;

/// Days before a candidate rise that form the low baseline
pub const BASELINE_WINDOW: usize = 6;

/// Recorded temperatures required inside the baseline window
pub const MIN_BASELINE_READINGS: usize = 3;

/// Rise over the baseline mean that triggers a candidate (°C)
pub const RISE_THRESHOLD_C: f64 = 0.2;

/// Margin over the baseline mean a follow-up day needs to count as high (°C)
pub const HIGH_THRESHOLD_C: f64 = 0.1;

/// Follow-up days inspected after a candidate rise
pub const CONFIRMATION_LOOKAHEAD: usize = 2;

/// High days (rise day included) needed to confirm a shift
pub const MIN_HIGH_DAYS: usize = 2;

/// Fertile days counted before the ovulation day
pub const FERTILE_DAYS_BEFORE: usize = 5;

/// Fertile days counted after the ovulation day
pub const FERTILE_DAYS_AFTER: usize = 1;

/// Fixed offset from the last observed date to the next ovulation estimate
pub const NEXT_OVULATION_OFFSET_DAYS: u64 = 14;

/// Tolerance for threshold comparisons on decimal temperatures
pub const TEMPERATURE_EPSILON: f64 = 1e-9;

/// Most recent records analyzed when the caller does not choose a window
pub const DEFAULT_WINDOW: usize = 30;

/// Date format of raw observations
pub const DATE_FORMAT: &str = "%Y-%m-%d";
