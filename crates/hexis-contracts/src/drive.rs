use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Drive {
    pub name: String,
    pub current_level: f64,
    pub baseline: f64,
    pub urgency_threshold: f64,
    pub is_urgent: bool,
    pub urgency_percent: f64,
    pub last_satisfied: Option<String>,
}

impl Drive {
    pub fn new(
        name: impl Into<String>,
        current_level: f64,
        baseline: f64,
        urgency_threshold: f64,
        last_satisfied: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_level,
            baseline,
            urgency_threshold,
            is_urgent: current_level >= urgency_threshold,
            urgency_percent: urgency_percent(current_level, urgency_threshold),
            last_satisfied,
        }
    }
}

/// `current / threshold * 100` rounded to one decimal; zero when the threshold is
/// zero or the ratio is not finite.
pub fn urgency_percent(current_level: f64, urgency_threshold: f64) -> f64 {
    if urgency_threshold == 0.0 {
        return 0.0;
    }
    let pct = current_level / urgency_threshold * 100.0;
    if pct.is_finite() {
        (pct * 10.0).round() / 10.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriveReport {
    pub drives: Vec<Drive>,
    pub avg_drive_level: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_at_or_above_threshold() {
        assert!(Drive::new("curiosity", 0.8, 0.5, 0.8, None).is_urgent);
        assert!(Drive::new("curiosity", 0.9, 0.5, 0.8, None).is_urgent);
        assert!(!Drive::new("curiosity", 0.79, 0.5, 0.8, None).is_urgent);
    }

    #[test]
    fn zero_threshold_gives_zero_percent() {
        let drive = Drive::new("rest", 0.4, 0.2, 0.0, None);
        assert_eq!(drive.urgency_percent, 0.0);
        assert!(drive.is_urgent);
        assert_eq!(urgency_percent(0.0, 0.0), 0.0);
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(urgency_percent(1.0, 3.0), 33.3);
        assert_eq!(urgency_percent(0.6, 0.8), 75.0);
    }
}
