//! Single-month contemplation odds for one contract

use super::hazard::participants_remaining;
use serde::{Deserialize, Serialize};

/// Odds of contemplation in one specific month
///
/// `linear_cumulative_probability` is a coarse `2m / N` accumulation and
/// intentionally differs from the survival-based cumulative probability of
/// [`super::ProbabilityCurve`]. Consumers read the two under separate names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContemplationOdds {
    pub contemplation_month: u32,
    pub total_participants: u32,
    pub participants_remaining: u32,
    pub probability_this_month: f64,
    pub linear_cumulative_probability: f64,
}

/// Odds for `contemplation_month` in a group of `total_participants`
pub fn probability_at_month(contemplation_month: u32, total_participants: u32) -> ContemplationOdds {
    let remaining = participants_remaining(total_participants, contemplation_month);

    let probability_this_month = if remaining > 0 {
        (2.0 / remaining as f64).min(1.0)
    } else {
        0.0
    };

    let linear_cumulative_probability = if total_participants > 0 {
        (contemplation_month as f64 * 2.0 / total_participants as f64).min(1.0)
    } else {
        0.0
    };

    ContemplationOdds {
        contemplation_month,
        total_participants,
        participants_remaining: remaining,
        probability_this_month,
        linear_cumulative_probability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_month_17_of_240() {
        let odds = probability_at_month(17, 240);
        assert_eq!(odds.participants_remaining, 208);
        assert_relative_eq!(odds.probability_this_month, 2.0 / 208.0, epsilon = 1e-15);
        assert_relative_eq!(odds.probability_this_month, 0.009615, epsilon = 1e-6);
        assert_relative_eq!(odds.linear_cumulative_probability, 34.0 / 240.0, epsilon = 1e-15);
    }

    #[test]
    fn test_end_of_group() {
        let last = probability_at_month(120, 240);
        assert_eq!(last.participants_remaining, 2);
        assert_eq!(last.probability_this_month, 1.0);
        assert_eq!(last.linear_cumulative_probability, 1.0);

        let beyond = probability_at_month(200, 240);
        assert_eq!(beyond.participants_remaining, 0);
        assert_eq!(beyond.probability_this_month, 0.0);
        assert_eq!(beyond.linear_cumulative_probability, 1.0);
    }

    #[test]
    fn test_empty_group() {
        let odds = probability_at_month(1, 0);
        assert_eq!(odds.probability_this_month, 0.0);
        assert_eq!(odds.linear_cumulative_probability, 0.0);
    }
}
