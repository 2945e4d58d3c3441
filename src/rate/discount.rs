//! Present value of a schedule at a fixed discount rate
//!
//! Always computable, so it is reported next to the CET and becomes the
//! headline figure whenever the rate search fails.

use serde::{Deserialize, Serialize};

/// Annual discount rate used for the present value fallback
pub const DEFAULT_PV_DISCOUNT_RATE: f64 = 0.10;

/// Flat discount curve with an effective annual rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountCurve {
    /// Effective annual rate
    pub annual_rate: f64,
}

impl DiscountCurve {
    pub fn single_rate(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    /// Equivalent effective monthly rate
    pub fn monthly_rate(&self) -> f64 {
        (1.0 + self.annual_rate).powf(1.0 / 12.0) - 1.0
    }

    /// Discount factor from month `months` back to origination
    pub fn discount_to_month(&self, months: u32) -> f64 {
        (1.0 + self.monthly_rate()).powi(-(months as i32))
    }

    /// PV of a cashflow vector whose index is the month; NaN for fewer than two flows
    pub fn present_value(&self, cash_flows: &[f64]) -> f64 {
        if cash_flows.len() < 2 {
            return f64::NAN;
        }

        let v = 1.0 / (1.0 + self.monthly_rate());
        cash_flows
            .iter()
            .enumerate()
            .map(|(t, cf)| cf * v.powi(t as i32))
            .sum()
    }
}

impl Default for DiscountCurve {
    fn default() -> Self {
        Self::single_rate(DEFAULT_PV_DISCOUNT_RATE)
    }
}

/// Present value of `cash_flows` at an effective annual rate
pub fn present_value(cash_flows: &[f64], annual_discount_rate: f64) -> f64 {
    DiscountCurve::single_rate(annual_discount_rate).present_value(cash_flows)
}
