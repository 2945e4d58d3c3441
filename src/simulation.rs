//! Simulation runner: schedule, CET, present value and contemplation odds
//!
//! Holds only configuration, so one runner can be shared across threads and
//! requests. Every call gets its own parameters and cashflow vector.

use crate::contract::{ContractParameters, ValidationError};
use crate::probability::{probability_at_month, ContemplationOdds, ProbabilityComparison};
use crate::rate::{DiscountCurve, RateFailure, RateSolver, SolverConfig, DEFAULT_PV_DISCOUNT_RATE};
use crate::sanitize::{finite_or_none, finite_or_zero, sanitize_slice};
use crate::schedule::{MonthlyLedgerEntry, ScheduleBuilder, ScheduleError, ScheduleSummary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Failure that leaves the caller without a simulation result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid parameters: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Effective annual rate for the present value fallback
    pub discount_rate: f64,

    pub solver: SolverConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_PV_DISCOUNT_RATE,
            solver: SolverConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Defaults overridden by `PV_DISCOUNT_RATE` and `SOLVER_MAX_ITERATIONS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(rate) = env::var("PV_DISCOUNT_RATE").ok().and_then(|s| s.parse().ok()) {
            config.discount_rate = rate;
        }
        if let Some(iters) = env::var("SOLVER_MAX_ITERATIONS").ok().and_then(|s| s.parse().ok()) {
            config.solver.max_iterations = iters;
        }

        config
    }
}

/// Figure to show first: the CET when usable, otherwise the present value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Headline {
    AnnualRate(f64),
    PresentValue(f64),
}

/// Complete outcome of one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub parameters: ContractParameters,

    /// Absent when the solver failed or the rate was negative
    pub annual_effective_rate: Option<f64>,
    pub monthly_effective_rate: Option<f64>,

    /// Always computed at `discount_rate`
    pub present_value: f64,
    pub discount_rate: f64,

    pub converged: bool,
    pub failure_reason: Option<RateFailure>,

    pub cash_flows: Vec<f64>,
    pub ledger: Vec<MonthlyLedgerEntry>,
    pub summary: ScheduleSummary,

    /// Odds for the contemplation month in a group of `2 * term` members
    pub contemplation_odds: ContemplationOdds,
}

impl SimulationResult {
    pub fn headline(&self) -> Headline {
        match self.annual_effective_rate {
            Some(rate) if self.converged => Headline::AnnualRate(rate),
            _ => Headline::PresentValue(self.present_value),
        }
    }

    /// Human-readable failure reason
    pub fn failure_message(&self) -> Option<&'static str> {
        self.failure_reason.map(|r| r.message())
    }

    /// Copy with every non-finite number replaced, ready for serialization
    pub fn sanitized(mut self) -> Self {
        self.annual_effective_rate = finite_or_none(self.annual_effective_rate);
        self.monthly_effective_rate = finite_or_none(self.monthly_effective_rate);
        self.present_value = finite_or_zero(self.present_value);
        sanitize_slice(&mut self.cash_flows);

        for entry in &mut self.ledger {
            entry.correction_factor = finite_or_zero(entry.correction_factor);
            entry.corrected_credit_value = finite_or_zero(entry.corrected_credit_value);
            entry.corrected_installment = finite_or_zero(entry.corrected_installment);
            entry.bid_paid = finite_or_zero(entry.bid_paid);
            entry.net_cash_flow = finite_or_zero(entry.net_cash_flow);
            entry.outstanding_balance = finite_or_zero(entry.outstanding_balance);
        }

        let summary = &mut self.summary;
        for value in [
            &mut summary.base_contract_value,
            &mut summary.bid_amount,
            &mut summary.contemplation_credit_value,
            &mut summary.contemplation_flow,
            &mut summary.total_non_contemplation_installments,
            &mut summary.total_installments,
            &mut summary.first_installment,
            &mut summary.mid_installment,
            &mut summary.last_installment,
        ] {
            *value = finite_or_zero(*value);
        }

        let odds = &mut self.contemplation_odds;
        odds.probability_this_month = finite_or_zero(odds.probability_this_month);
        odds.linear_cumulative_probability = finite_or_zero(odds.linear_cumulative_probability);

        self
    }
}

/// Pre-configured simulation runner
///
/// # Example
/// ```
/// use consortium_simulator::{ContractParameters, Simulator};
///
/// let simulator = Simulator::new();
/// let result = simulator.simulate(&ContractParameters::default()).unwrap();
/// assert!(result.converged);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
    solver: RateSolver,
}

impl Simulator {
    /// Runner with default discount rate and solver settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulatorConfig) -> Self {
        let solver = RateSolver::new(config.solver.clone());
        Self { config, solver }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Validate, build the schedule, then solve the CET and the PV fallback
    pub fn simulate(&self, params: &ContractParameters) -> Result<SimulationResult, SimulationError> {
        params.validate()?;

        let schedule = ScheduleBuilder::new(params).build()?;
        let rate = self.solver.solve(&schedule.cash_flows);
        let present_value = DiscountCurve::single_rate(self.config.discount_rate)
            .present_value(&schedule.cash_flows);

        if let Some(reason) = rate.failure_reason {
            log::info!(
                "CET unavailable for contemplation month {} ({}); PV {:.2}",
                params.contemplation_month,
                reason,
                present_value
            );
        }

        Ok(SimulationResult {
            parameters: params.clone(),
            annual_effective_rate: rate.annual_rate,
            monthly_effective_rate: rate.monthly_rate,
            present_value,
            discount_rate: self.config.discount_rate,
            converged: rate.converged,
            failure_reason: rate.failure_reason,
            cash_flows: schedule.cash_flows,
            ledger: schedule.ledger,
            summary: schedule.summary,
            contemplation_odds: probability_at_month(
                params.contemplation_month,
                params.total_participants(),
            ),
        })
    }

    /// Both probability curves for a contract's group
    pub fn probabilities(&self, params: &ContractParameters) -> ProbabilityComparison {
        ProbabilityComparison::new(params.total_participants(), params.free_bid_fraction)
    }

    /// Simulate many contracts in parallel, keeping input order
    pub fn simulate_batch(
        &self,
        contracts: &[ContractParameters],
    ) -> Vec<Result<SimulationResult, SimulationError>> {
        contracts.par_iter().map(|params| self.simulate(params)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn contract(contemplation_month: u32) -> ContractParameters {
        ContractParameters {
            contemplation_month,
            ..Default::default()
        }
    }

    #[test]
    fn test_early_contemplation_converges() {
        let result = Simulator::new().simulate(&contract(1)).unwrap();

        assert!(result.converged);
        assert!(result.failure_reason.is_none());
        let annual = result.annual_effective_rate.unwrap();
        let monthly = result.monthly_effective_rate.unwrap();
        assert_abs_diff_eq!((1.0 + monthly).powi(12) - 1.0, annual, epsilon = 1e-12);
        assert!(result.present_value.is_finite());
        assert_eq!(result.headline(), Headline::AnnualRate(annual));
        assert_abs_diff_eq!(result.summary.contemplation_flow, 86_566.67, epsilon = 0.01);
    }

    #[test]
    fn test_late_contemplation_falls_back_to_pv() {
        let result = Simulator::new().simulate(&contract(90)).unwrap();

        assert!(!result.converged);
        assert_eq!(result.failure_reason, Some(RateFailure::NegativeRate));
        assert!(result.failure_message().unwrap().contains("negative"));
        assert!(result.annual_effective_rate.is_none());
        assert!(result.monthly_effective_rate.is_none());
        assert!(result.present_value.is_finite());
        assert!(result.present_value < 0.0);
        assert_eq!(result.headline(), Headline::PresentValue(result.present_value));
    }

    #[test]
    fn test_contemplation_odds_attached() {
        let result = Simulator::new().simulate(&contract(17)).unwrap();
        let odds = result.contemplation_odds;
        assert_eq!(odds.total_participants, 240);
        assert_eq!(odds.participants_remaining, 208);
        assert_abs_diff_eq!(odds.probability_this_month, 2.0 / 208.0, epsilon = 1e-15);
    }

    #[test]
    fn test_invalid_parameters_rejected_before_schedule() {
        let err = Simulator::new().simulate(&contract(121)).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Invalid(ValidationError::ContemplationAfterTerm { .. })
        ));
    }

    #[test]
    fn test_custom_discount_rate() {
        let simulator = Simulator::with_config(SimulatorConfig {
            discount_rate: 0.0,
            ..Default::default()
        });
        let result = simulator.simulate(&contract(30)).unwrap();
        let total: f64 = result.cash_flows.iter().sum();
        assert_abs_diff_eq!(result.present_value, total, epsilon = 1e-6);
    }

    #[test]
    fn test_sanitized_replaces_non_finite() {
        let mut result = Simulator::new().simulate(&contract(5)).unwrap();
        result.present_value = f64::NAN;
        result.cash_flows[3] = f64::INFINITY;
        result.monthly_effective_rate = Some(f64::NAN);
        result.summary.contemplation_flow = f64::NEG_INFINITY;

        let clean = result.sanitized();
        assert_eq!(clean.present_value, 0.0);
        assert_eq!(clean.summary.contemplation_flow, 0.0);
        assert!(clean.summary.base_contract_value > 0.0);
        assert_eq!(clean.cash_flows[3], 0.0);
        assert!(clean.monthly_effective_rate.is_none());
        assert!(serde_json::to_string(&clean).is_ok());
    }

    #[test]
    fn test_batch_keeps_order() {
        let contracts: Vec<_> = [1, 90, 200, 60].iter().map(|&m| contract(m)).collect();
        let results = Simulator::new().simulate_batch(&contracts);

        assert_eq!(results.len(), 4);
        assert!(results[0].as_ref().unwrap().converged);
        assert_eq!(
            results[1].as_ref().unwrap().failure_reason,
            Some(RateFailure::NegativeRate)
        );
        assert!(results[2].is_err());
        assert_eq!(results[3].as_ref().unwrap().parameters.contemplation_month, 60);
    }

    #[test]
    fn test_probabilities_use_twice_the_term() {
        let comparison = Simulator::new().probabilities(&contract(1));
        assert_eq!(comparison.total_participants, 240);
        assert_eq!(comparison.contemplations_per_month, 2);
    }
}
