//! Effective cost rate (CET) as the internal rate of return of a schedule
//!
//! The monthly rate `r` is a root of `NPV(r) = sum(cf[i] / (1 + r)^i)`. Several
//! seeds are tried in a fixed order with Newton-Raphson; the first seed that
//! reaches the residual tolerance inside the sanity band wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monthly seeds, tried in order
pub const DEFAULT_SEEDS: [f64; 8] = [0.005, 0.01, 0.015, 0.02, 0.001, 0.03, -0.001, 0.0001];

/// Why no usable rate was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFailure {
    /// Fewer than two cashflows
    InsufficientFlows,
    /// All non-zero cashflows share a sign, so no rate exists
    NoSignChange,
    /// No seed reached the tolerance inside the sanity band
    NotConverged,
    /// A root was found but the annual rate is negative
    NegativeRate,
}

impl RateFailure {
    pub fn message(&self) -> &'static str {
        match self {
            RateFailure::InsufficientFlows => "insufficient flows",
            RateFailure::NoSignChange => "no sign change in cash flows",
            RateFailure::NotConverged => "convergence not achieved",
            RateFailure::NegativeRate => "negative CET: invalid result",
        }
    }
}

impl fmt::Display for RateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Root-finding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Monthly starting guesses
    pub seeds: Vec<f64>,

    /// Maximum absolute NPV at an accepted root
    pub npv_tolerance: f64,

    /// Newton step size below which iteration stops
    pub step_tolerance: f64,

    /// Newton iterations per seed
    pub max_iterations: u32,

    /// Accepted annual rates, inclusive
    pub min_annual_rate: f64,
    pub max_annual_rate: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seeds: DEFAULT_SEEDS.to_vec(),
            npv_tolerance: 1e-6,
            step_tolerance: 1e-12,
            max_iterations: 200,
            min_annual_rate: -0.99,
            max_annual_rate: 5.0,
        }
    }
}

/// Outcome of the rate search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSolution {
    /// Annual effective rate, absent unless converged
    pub annual_rate: Option<f64>,

    /// Monthly equivalent of `annual_rate`
    pub monthly_rate: Option<f64>,

    pub converged: bool,

    /// Present iff `converged` is false
    pub failure_reason: Option<RateFailure>,
}

impl RateSolution {
    fn success(annual_rate: f64) -> Self {
        Self {
            annual_rate: Some(annual_rate),
            monthly_rate: Some(annual_to_monthly(annual_rate)),
            converged: true,
            failure_reason: None,
        }
    }

    fn failure(reason: RateFailure) -> Self {
        Self {
            annual_rate: None,
            monthly_rate: None,
            converged: false,
            failure_reason: Some(reason),
        }
    }
}

/// Compound a monthly rate to an annual one
pub fn monthly_to_annual(monthly_rate: f64) -> f64 {
    (1.0 + monthly_rate).powi(12) - 1.0
}

/// Equivalent monthly rate of an annual one
pub fn annual_to_monthly(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Solve for the effective rate with the default configuration
pub fn solve_effective_rate(cash_flows: &[f64]) -> RateSolution {
    RateSolver::default().solve(cash_flows)
}

/// Multi-seed Newton-Raphson solver
#[derive(Debug, Clone, Default)]
pub struct RateSolver {
    config: SolverConfig,
}

impl RateSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, cash_flows: &[f64]) -> RateSolution {
        if cash_flows.len() < 2 {
            return RateSolution::failure(RateFailure::InsufficientFlows);
        }

        let has_positive = cash_flows.iter().any(|&cf| cf > 0.0);
        let has_negative = cash_flows.iter().any(|&cf| cf < 0.0);
        if !has_positive || !has_negative {
            return RateSolution::failure(RateFailure::NoSignChange);
        }

        let Some(monthly_rate) = self
            .config
            .seeds
            .iter()
            .find_map(|&seed| self.solve_from_seed(cash_flows, seed))
        else {
            log::debug!("no seed converged for {} cashflows", cash_flows.len());
            return RateSolution::failure(RateFailure::NotConverged);
        };

        let annual_rate = monthly_to_annual(monthly_rate);
        if annual_rate < 0.0 {
            // A negative cost is a modelling artifact, never a usable rate
            log::info!("rejecting negative CET {:.6}", annual_rate);
            return RateSolution::failure(RateFailure::NegativeRate);
        }

        RateSolution::success(annual_rate)
    }

    /// Newton-Raphson from one seed; `Some(monthly_rate)` when accepted
    fn solve_from_seed(&self, cash_flows: &[f64], seed: f64) -> Option<f64> {
        let mut rate = seed;

        for _ in 0..self.config.max_iterations {
            let (npv, dnpv) = npv_and_derivative(cash_flows, rate);
            if !npv.is_finite() || !dnpv.is_finite() || dnpv.abs() < 1e-20 {
                break;
            }

            // Bound the rate so (1 + r) stays positive
            let new_rate = (rate - npv / dnpv).clamp(-0.99, 10.0);
            let step = (new_rate - rate).abs();
            rate = new_rate;

            if step < self.config.step_tolerance {
                break;
            }
        }

        let residual = npv_at_rate(cash_flows, rate);
        if !residual.is_finite() || residual.abs() >= self.config.npv_tolerance {
            return None;
        }

        let annual_rate = monthly_to_annual(rate);
        if annual_rate < self.config.min_annual_rate || annual_rate > self.config.max_annual_rate {
            log::debug!("seed {} reached annual rate {:.4} outside sanity band", seed, annual_rate);
            return None;
        }

        Some(rate)
    }
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(cash_flows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cash_flows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / (discount * (1.0 + rate));
        }
    }

    (npv, dnpv)
}

/// Calculate NPV at a given periodic rate
pub fn npv_at_rate(cash_flows: &[f64], rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractParameters;
    use crate::schedule::build_schedule;
    use approx::assert_abs_diff_eq;

    fn flows_for(contemplation_month: u32) -> Vec<f64> {
        let params = ContractParameters {
            contemplation_month,
            ..Default::default()
        };
        build_schedule(&params).unwrap().cash_flows
    }

    #[test]
    fn test_simple_irr() {
        // Receive 1000 now, repay 1100 after 12 months
        let mut cash_flows = vec![1000.0];
        cash_flows.extend(vec![0.0; 11]);
        cash_flows.push(-1100.0);

        let solution = solve_effective_rate(&cash_flows);
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.annual_rate.unwrap(), 0.10, epsilon = 1e-6);
        assert_abs_diff_eq!(
            solution.monthly_rate.unwrap(),
            1.1f64.powf(1.0 / 12.0) - 1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_insufficient_flows() {
        let solution = solve_effective_rate(&[100.0]);
        assert!(!solution.converged);
        assert_eq!(solution.failure_reason, Some(RateFailure::InsufficientFlows));
        assert!(solution.annual_rate.is_none());
    }

    #[test]
    fn test_no_sign_change() {
        let solution = solve_effective_rate(&[0.0, -100.0, -100.0, -100.0]);
        assert!(!solution.converged);
        assert_eq!(solution.failure_reason, Some(RateFailure::NoSignChange));

        // Zeros do not count as a sign
        let solution = solve_effective_rate(&[0.0, 0.0, 50.0]);
        assert_eq!(solution.failure_reason, Some(RateFailure::NoSignChange));
    }

    #[test]
    fn test_early_contemplation_rate() {
        let solution = solve_effective_rate(&flows_for(1));
        assert!(solution.converged);
        let annual = solution.annual_rate.unwrap();
        assert!(annual > 0.10 && annual < 0.15, "unexpected CET {}", annual);

        let monthly = solution.monthly_rate.unwrap();
        assert_abs_diff_eq!(npv_at_rate(&flows_for(1), monthly), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_late_contemplation_negative_rate_is_rejected() {
        let solution = solve_effective_rate(&flows_for(90));
        assert!(!solution.converged);
        assert_eq!(solution.failure_reason, Some(RateFailure::NegativeRate));
        assert!(solution.annual_rate.is_none());
        assert!(solution.monthly_rate.is_none());
        assert!(RateFailure::NegativeRate.to_string().contains("negative"));
    }

    #[test]
    fn test_sanity_band_rejects_roots() {
        let solver = RateSolver::new(SolverConfig {
            max_annual_rate: 0.05,
            ..Default::default()
        });
        let solution = solver.solve(&flows_for(1));
        assert_eq!(solution.failure_reason, Some(RateFailure::NotConverged));
    }

    #[test]
    fn test_first_converging_seed_wins() {
        // Two real roots: 1% and 3% a month
        let cash_flows = [-1.0, 2.04, -1.0403];

        let low_first = RateSolver::new(SolverConfig {
            seeds: vec![0.005, 0.035],
            ..Default::default()
        })
        .solve(&cash_flows);
        assert!(low_first.converged);
        assert_abs_diff_eq!(low_first.monthly_rate.unwrap(), 0.01, epsilon = 1e-8);

        let high_first = RateSolver::new(SolverConfig {
            seeds: vec![0.035, 0.005],
            ..Default::default()
        })
        .solve(&cash_flows);
        assert!(high_first.converged);
        assert_abs_diff_eq!(high_first.monthly_rate.unwrap(), 0.03, epsilon = 1e-8);

        // Default order starts at 0.5% a month
        let default = solve_effective_rate(&cash_flows);
        assert_abs_diff_eq!(default.annual_rate.unwrap(), monthly_to_annual(0.01), epsilon = 1e-8);
    }

    #[test]
    fn test_rate_conversions() {
        assert_abs_diff_eq!(monthly_to_annual(0.01), 0.126825030131969, epsilon = 1e-12);
        assert_abs_diff_eq!(annual_to_monthly(monthly_to_annual(0.0123)), 0.0123, epsilon = 1e-12);
    }
}
