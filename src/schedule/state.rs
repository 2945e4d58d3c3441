//! Running state of a contract while its schedule is built

use crate::contract::ContractParameters;

/// State of a contract at a point in time during the schedule
#[derive(Debug, Clone)]
pub struct ScheduleState {
    /// Current month (1-indexed, 0 before the first advance)
    pub month: u32,

    /// Contract year (1-indexed)
    pub contract_year: u32,

    /// Cumulative correction factor for display values, from origination
    pub correction_factor: f64,

    /// Outstanding debt, starting at the base contract value
    pub outstanding_balance: f64,
}

impl ScheduleState {
    /// Initialize state at origination
    pub fn from_contract(params: &ContractParameters) -> Self {
        Self {
            month: 0,
            contract_year: 1,
            correction_factor: 1.0,
            outstanding_balance: params.base_contract_value(),
        }
    }

    /// Advance to next month
    ///
    /// At each anniversary after the first year the outstanding balance is
    /// re-indexed by one full year of readjustment. This is independent of
    /// `correction_factor`, which is recomputed from origination every month.
    pub fn advance_month(&mut self, params: &ContractParameters) {
        self.month += 1;
        self.contract_year = params.contract_year(self.month);
        self.correction_factor = params.correction_factor(self.month);

        if params.is_anniversary(self.month) {
            self.outstanding_balance *= 1.0 + params.annual_readjustment_rate;
        }
    }

    /// Amortize one installment, never going below zero
    pub fn amortize(&mut self, installment: f64) {
        self.outstanding_balance = (self.outstanding_balance - installment).max(0.0);
    }

    pub fn is_contemplation_month(&self, params: &ContractParameters) -> bool {
        self.month == params.contemplation_month
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_balance_reindexed_on_anniversary() {
        let params = ContractParameters::default();
        let mut state = ScheduleState::from_contract(&params);
        assert_relative_eq!(state.outstanding_balance, 124_000.0);

        for _ in 0..12 {
            state.advance_month(&params);
            state.amortize(1_000.0);
        }
        assert_eq!(state.contract_year, 1);
        assert_relative_eq!(state.outstanding_balance, 112_000.0, epsilon = 1e-9);

        state.advance_month(&params);
        assert_eq!(state.month, 13);
        assert_eq!(state.contract_year, 2);
        assert_relative_eq!(state.correction_factor, 1.05, epsilon = 1e-12);
        assert_relative_eq!(state.outstanding_balance, 117_600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_amortize_clamps_at_zero() {
        let params = ContractParameters::default();
        let mut state = ScheduleState::from_contract(&params);
        state.amortize(500_000.0);
        assert_eq!(state.outstanding_balance, 0.0);
    }
}
