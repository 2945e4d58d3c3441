//! Discrete hazard curves for contemplation timing
//!
//! The group loses two members every month (one draw winner, one bid winner)
//! in both regimes. Only the hazard formula differs between the curves:
//! draw-only uses `1 / (N - 1)` because the bid slot is not part of the
//! drawing pool, draw-and-bid uses `min(2 / N, 1)`.

use serde::{Deserialize, Serialize};

/// Members leaving the group each month, independent of the regime
pub const PARTICIPANTS_LEAVING_PER_MONTH: u32 = 2;

/// Which contemplation channels a member competes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContemplationRegime {
    /// Draw only (one contemplation per month)
    DrawOnly,
    /// Draw plus free bid (two contemplations per month)
    DrawAndBid,
}

impl ContemplationRegime {
    /// Regime for a number of contemplations per month (1 or 2)
    pub fn from_reduction(reduction_per_month: u32) -> Option<Self> {
        match reduction_per_month {
            1 => Some(ContemplationRegime::DrawOnly),
            2 => Some(ContemplationRegime::DrawAndBid),
            _ => None,
        }
    }

    /// Regime implied by the member's bid
    pub fn for_bid(free_bid_fraction: f64) -> Self {
        if free_bid_fraction > 0.0 {
            ContemplationRegime::DrawAndBid
        } else {
            ContemplationRegime::DrawOnly
        }
    }

    pub fn contemplations_per_month(&self) -> u32 {
        match self {
            ContemplationRegime::DrawOnly => 1,
            ContemplationRegime::DrawAndBid => 2,
        }
    }

    /// Conditional probability of contemplation with `remaining` members left
    pub fn hazard(&self, remaining: u32) -> f64 {
        if remaining == 0 {
            return 0.0;
        }

        let h = match self {
            ContemplationRegime::DrawOnly => {
                if remaining <= 1 {
                    1.0
                } else {
                    1.0 / (remaining - 1) as f64
                }
            }
            ContemplationRegime::DrawAndBid => 2.0 / remaining as f64,
        };
        h.clamp(0.0, 1.0)
    }
}

/// Members still waiting at the start of month `t` (1-indexed)
pub fn participants_remaining(total_participants: u32, month: u32) -> u32 {
    total_participants.saturating_sub(month.saturating_sub(1).saturating_mul(PARTICIPANTS_LEAVING_PER_MONTH))
}

/// One month of a probability curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub month: u32,
    pub participants_remaining: u32,
    pub hazard: f64,
    /// Probability of not being contemplated by the end of this month
    pub survival: f64,
    pub cumulative_probability: f64,
    /// Probability of being contemplated exactly in this month
    pub point_probability: f64,
}

/// Hazard, survival and cumulative probabilities over the group's horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityCurve {
    pub regime: ContemplationRegime,
    pub total_participants: u32,
    pub points: Vec<CurvePoint>,

    /// `sum(t * point_probability)` over the horizon, not renormalized
    pub expected_month: f64,
    pub p10_month: Option<u32>,
    pub median_month: Option<u32>,
    pub p90_month: Option<u32>,
}

impl ProbabilityCurve {
    /// First month whose cumulative probability reaches `p`
    pub fn percentile_month(&self, p: f64) -> Option<u32> {
        self.points
            .iter()
            .find(|pt| pt.cumulative_probability >= p)
            .map(|pt| pt.month)
    }

    /// Point for a 1-indexed month
    pub fn at(&self, month: u32) -> Option<&CurvePoint> {
        month.checked_sub(1).and_then(|idx| self.points.get(idx as usize))
    }

    pub fn months(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn hazards(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.hazard).collect()
    }

    pub fn cumulative_probabilities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cumulative_probability).collect()
    }
}

/// Build the curve for a group of `total_participants`
///
/// The horizon is `ceil(total_participants / contemplations_per_month)` months;
/// months after the group is exhausted carry zero hazard.
pub fn hazard_curve(total_participants: u32, regime: ContemplationRegime) -> ProbabilityCurve {
    let horizon = total_participants.div_ceil(regime.contemplations_per_month());

    let mut points = Vec::with_capacity(horizon as usize);
    let mut survival = 1.0;
    let mut expected_month = 0.0;

    for month in 1..=horizon {
        let remaining = participants_remaining(total_participants, month);
        let hazard = regime.hazard(remaining);

        let point_probability = hazard * survival;
        survival *= 1.0 - hazard;
        expected_month += month as f64 * point_probability;

        points.push(CurvePoint {
            month,
            participants_remaining: remaining,
            hazard,
            survival,
            cumulative_probability: 1.0 - survival,
            point_probability,
        });
    }

    let mut curve = ProbabilityCurve {
        regime,
        total_participants,
        points,
        expected_month,
        p10_month: None,
        median_month: None,
        p90_month: None,
    };
    curve.p10_month = curve.percentile_month(0.10);
    curve.median_month = curve.percentile_month(0.50);
    curve.p90_month = curve.percentile_month(0.90);

    log::debug!(
        "{:?} curve for {} participants: {} months, expected month {:.2}",
        regime,
        total_participants,
        horizon,
        curve.expected_month
    );

    curve
}
