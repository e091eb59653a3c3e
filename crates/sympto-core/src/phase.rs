use std::fmt;

use serde::{Deserialize, Serialize};

/// Menstrual cycle phase assigned to one observed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
    #[default]
    Unknown,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Menstrual,
        Phase::Follicular,
        Phase::Ovulation,
        Phase::Luteal,
        Phase::Unknown,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Menstrual => "Menstrual",
            Phase::Follicular => "Follicular",
            Phase::Ovulation => "Ovulation",
            Phase::Luteal => "Luteal",
            Phase::Unknown => "Unknown",
        }
    }

    /// Stable machine name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulation => "ovulation",
            Phase::Luteal => "luteal",
            Phase::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Phase::default(), Phase::Unknown);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for phase in Phase::ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.as_str()));
        }
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(Phase::Luteal.to_string(), "Luteal");
    }
}
