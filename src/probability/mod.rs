//! Contemplation probability: hazard curves and single-month odds

mod hazard;
mod lookup;

pub use hazard::{
    hazard_curve, participants_remaining, ContemplationRegime, CurvePoint, ProbabilityCurve,
    PARTICIPANTS_LEAVING_PER_MONTH,
};
pub use lookup::{probability_at_month, ContemplationOdds};

use crate::sanitize::finite_or_zero;
use serde::{Deserialize, Serialize};

/// Both curves for one group, side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityComparison {
    pub total_participants: u32,

    /// Contemplations per month implied by the member's bid (1 or 2)
    pub contemplations_per_month: u32,

    pub without_bid: ProbabilityCurve,
    pub with_bid: ProbabilityCurve,
}

impl ProbabilityComparison {
    pub fn new(total_participants: u32, free_bid_fraction: f64) -> Self {
        Self {
            total_participants,
            contemplations_per_month: ContemplationRegime::for_bid(free_bid_fraction)
                .contemplations_per_month(),
            without_bid: hazard_curve(total_participants, ContemplationRegime::DrawOnly),
            with_bid: hazard_curve(total_participants, ContemplationRegime::DrawAndBid),
        }
    }

    /// Copy with every non-finite probability replaced, ready for serialization
    pub fn sanitized(mut self) -> Self {
        for curve in [&mut self.without_bid, &mut self.with_bid] {
            curve.expected_month = finite_or_zero(curve.expected_month);
            for pt in &mut curve.points {
                pt.hazard = finite_or_zero(pt.hazard);
                pt.survival = finite_or_zero(pt.survival);
                pt.cumulative_probability = finite_or_zero(pt.cumulative_probability);
                pt.point_probability = finite_or_zero(pt.point_probability);
            }
        }
        self
    }

    /// Curve matching the member's own bid
    pub fn selected(&self) -> &ProbabilityCurve {
        if self.contemplations_per_month == 2 {
            &self.with_bid
        } else {
            &self.without_bid
        }
    }
}
