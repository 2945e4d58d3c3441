//! Month-by-month cashflow schedule for a consortium quota

use super::ledger::{MonthlyLedgerEntry, Schedule};
use super::state::ScheduleState;
use crate::contract::ContractParameters;
use thiserror::Error;

/// Unexpected numeric failure while building a schedule
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("schedule generation failed: non-finite value in month {month}")]
    NonFinite { month: u32 },

    #[error("schedule generation failed: empty term")]
    EmptyTerm,
}

/// Builds the ledger and cashflow vector for one contract
pub struct ScheduleBuilder<'a> {
    params: &'a ContractParameters,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(params: &'a ContractParameters) -> Self {
        Self { params }
    }

    /// Run the schedule over the whole term
    ///
    /// Parameters are expected to be validated already; the only failure
    /// reported here is a non-finite amount leaking into the ledger.
    pub fn build(&self) -> Result<Schedule, ScheduleError> {
        let params = self.params;
        if params.term_months == 0 {
            return Err(ScheduleError::EmptyTerm);
        }

        let base_contract_value = params.base_contract_value();
        let flat_installment = params.flat_installment();
        let bid_amount = params.bid_amount();

        let mut schedule = Schedule::new(params.term_months);
        let mut state = ScheduleState::from_contract(params);

        for _month in 1..=params.term_months {
            state.advance_month(params);

            let entry = self.calculate_month(&mut state, flat_installment, bid_amount);
            if !entry.net_cash_flow.is_finite() || !entry.outstanding_balance.is_finite() {
                log::warn!("non-finite schedule value at month {}", entry.month);
                return Err(ScheduleError::NonFinite { month: entry.month });
            }
            schedule.add_entry(entry);
        }

        schedule.summarize(base_contract_value, bid_amount);
        if !schedule.is_finite() {
            return Err(ScheduleError::NonFinite { month: params.term_months });
        }

        log::debug!(
            "built {}-month schedule: base {:.2}, contemplation month {} flow {:.2}",
            params.term_months,
            base_contract_value,
            params.contemplation_month,
            schedule.summary.contemplation_flow,
        );

        Ok(schedule)
    }

    /// Calculate the ledger row for the month `state` was just advanced to
    fn calculate_month(
        &self,
        state: &mut ScheduleState,
        flat_installment: f64,
        bid_amount: f64,
    ) -> MonthlyLedgerEntry {
        let params = self.params;
        let mut entry = MonthlyLedgerEntry::new(state.month);

        entry.contract_year = state.contract_year;
        entry.date_label = params.date_label(state.month);
        entry.correction_factor = state.correction_factor;
        entry.corrected_credit_value = params.credit_value * state.correction_factor;
        entry.corrected_installment = flat_installment * state.correction_factor;

        if state.is_contemplation_month(params) {
            // Member receives the corrected credit, pays the month's installment and the bid
            entry.is_contemplation_month = true;
            entry.bid_paid = bid_amount;
            entry.net_cash_flow = entry.corrected_credit_value - entry.corrected_installment - bid_amount;
        } else {
            entry.net_cash_flow = -entry.corrected_installment;
        }

        state.amortize(entry.corrected_installment);
        entry.outstanding_balance = state.outstanding_balance;

        entry
    }
}

/// Build the schedule for a contract
pub fn build_schedule(params: &ContractParameters) -> Result<Schedule, ScheduleError> {
    ScheduleBuilder::new(params).build()
}
