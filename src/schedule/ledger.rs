//! Ledger output structures for a contract schedule

use serde::{Deserialize, Serialize};

/// A single row of the schedule for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyLedgerEntry {
    // Timing
    pub month: u32,
    pub contract_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_label: Option<String>,

    // Readjustment
    pub correction_factor: f64,
    pub corrected_credit_value: f64,
    pub corrected_installment: f64,

    // Contemplation
    pub is_contemplation_month: bool,
    pub bid_paid: f64,

    // Cashflow and debt
    pub net_cash_flow: f64,
    pub outstanding_balance: f64,
}

impl MonthlyLedgerEntry {
    /// Create a new ledger entry with zeroed amounts
    pub fn new(month: u32) -> Self {
        Self {
            month,
            contract_year: 0,
            date_label: None,
            correction_factor: 1.0,
            corrected_credit_value: 0.0,
            corrected_installment: 0.0,
            is_contemplation_month: false,
            bid_paid: 0.0,
            net_cash_flow: 0.0,
            outstanding_balance: 0.0,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.correction_factor,
            self.corrected_credit_value,
            self.corrected_installment,
            self.bid_paid,
            self.net_cash_flow,
            self.outstanding_balance,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Derived totals reported next to the ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub base_contract_value: f64,
    pub bid_amount: f64,
    /// Corrected credit value received in the contemplation month
    pub contemplation_credit_value: f64,
    /// Net cashflow of the contemplation month
    pub contemplation_flow: f64,
    /// Installments paid in every month except the contemplation month
    pub total_non_contemplation_installments: f64,
    /// Installments paid over the whole term
    pub total_installments: f64,
    pub first_installment: f64,
    pub mid_installment: f64,
    pub last_installment: f64,
}

/// Complete schedule for one contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Monthly ledger rows, month 1 first
    pub ledger: Vec<MonthlyLedgerEntry>,

    /// Net cashflows with a leading zero for origination (length = term + 1)
    pub cash_flows: Vec<f64>,

    pub summary: ScheduleSummary,
}

impl Schedule {
    pub fn new(term_months: u32) -> Self {
        let mut cash_flows = Vec::with_capacity(term_months as usize + 1);
        cash_flows.push(0.0);

        Self {
            ledger: Vec::with_capacity(term_months as usize),
            cash_flows,
            summary: ScheduleSummary::default(),
        }
    }

    /// Append a ledger row and its cashflow
    pub fn add_entry(&mut self, entry: MonthlyLedgerEntry) {
        self.cash_flows.push(entry.net_cash_flow);
        self.ledger.push(entry);
    }

    /// Ledger row for a 1-indexed month
    pub fn entry(&self, month: u32) -> Option<&MonthlyLedgerEntry> {
        month.checked_sub(1).and_then(|idx| self.ledger.get(idx as usize))
    }

    /// The single contemplation row
    pub fn contemplation_entry(&self) -> Option<&MonthlyLedgerEntry> {
        self.ledger.iter().find(|e| e.is_contemplation_month)
    }

    /// Whether every recorded amount is a finite number
    pub fn is_finite(&self) -> bool {
        self.ledger.iter().all(MonthlyLedgerEntry::is_finite)
            && self.cash_flows.iter().all(|cf| cf.is_finite())
    }

    /// Fill the summary from the recorded ledger
    pub(crate) fn summarize(&mut self, base_contract_value: f64, bid_amount: f64) {
        let total_installments: f64 = self.ledger.iter().map(|e| e.corrected_installment).sum();
        let total_non_contemplation_installments: f64 = self
            .ledger
            .iter()
            .filter(|e| !e.is_contemplation_month)
            .map(|e| e.corrected_installment)
            .sum();

        let term = self.ledger.len() as u32;
        let installment_at = |month: u32| self.entry(month).map(|e| e.corrected_installment).unwrap_or(0.0);
        let first_installment = installment_at(1);
        let mid_installment = installment_at((term / 2).max(1));
        let last_installment = installment_at(term);

        let (contemplation_credit_value, contemplation_flow) = self
            .contemplation_entry()
            .map(|e| (e.corrected_credit_value, e.net_cash_flow))
            .unwrap_or((0.0, 0.0));

        self.summary = ScheduleSummary {
            base_contract_value,
            bid_amount,
            contemplation_credit_value,
            contemplation_flow,
            total_non_contemplation_installments,
            total_installments,
            first_installment,
            mid_installment,
            last_installment,
        };
    }
}
