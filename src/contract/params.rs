//! Contract parameters for a single consortium quota

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default credit (letter) value
pub const DEFAULT_CREDIT_VALUE: f64 = 100_000.0;

/// Default term in months
pub const DEFAULT_TERM_MONTHS: u32 = 120;

/// Longest term accepted by [`ContractParameters::validate`]
pub const MAX_TERM_MONTHS: u32 = 600;

/// Default administration fee (fraction of credit value)
pub const DEFAULT_ADMIN_FEE_RATE: f64 = 0.21;

/// Default reserve fund (fraction of credit value)
pub const DEFAULT_RESERVE_FUND_RATE: f64 = 0.03;

/// Default free bid (fraction of base contract value)
pub const DEFAULT_FREE_BID_FRACTION: f64 = 0.10;

/// Default annual readjustment of credit and installments
pub const DEFAULT_ANNUAL_READJUSTMENT_RATE: f64 = 0.05;

fn default_credit_value() -> f64 { DEFAULT_CREDIT_VALUE }
fn default_term_months() -> u32 { DEFAULT_TERM_MONTHS }
fn default_admin_fee_rate() -> f64 { DEFAULT_ADMIN_FEE_RATE }
fn default_reserve_fund_rate() -> f64 { DEFAULT_RESERVE_FUND_RATE }
fn default_contemplation_month() -> u32 { 1 }
fn default_free_bid_fraction() -> f64 { DEFAULT_FREE_BID_FRACTION }
fn default_annual_readjustment_rate() -> f64 { DEFAULT_ANNUAL_READJUSTMENT_RATE }

/// Rejected contract parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("credit value must be positive (got {0})")]
    NonPositiveCredit(f64),

    #[error("term must be positive")]
    NonPositiveTerm,

    #[error("term of {term} months exceeds the maximum of {max}")]
    TermTooLong { term: u32, max: u32 },

    #[error("contemplation month must be positive")]
    NonPositiveContemplation,

    #[error("contemplation month {month} cannot exceed the term of {term} months")]
    ContemplationAfterTerm { month: u32, term: u32 },

    #[error("{field} cannot be negative (got {value})")]
    NegativeRate { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
}

/// Immutable input to a simulation run
///
/// Omitted fields deserialize to the defaults returned by
/// [`ContractParameters::default`], so an empty JSON object is a valid request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractParameters {
    /// Credit (letter) value received at contemplation, before correction
    #[serde(default = "default_credit_value")]
    pub credit_value: f64,

    /// Number of monthly installments
    #[serde(default = "default_term_months")]
    pub term_months: u32,

    /// Administration fee as a fraction of credit value
    #[serde(default = "default_admin_fee_rate")]
    pub admin_fee_rate: f64,

    /// Reserve fund as a fraction of credit value
    #[serde(default = "default_reserve_fund_rate")]
    pub reserve_fund_rate: f64,

    /// Month (1-indexed) in which the member is contemplated
    #[serde(default = "default_contemplation_month")]
    pub contemplation_month: u32,

    /// Free bid as a fraction of the base contract value
    #[serde(default = "default_free_bid_fraction")]
    pub free_bid_fraction: f64,

    /// Annual readjustment applied at each contract anniversary
    #[serde(default = "default_annual_readjustment_rate")]
    pub annual_readjustment_rate: f64,

    /// Month of the first installment, only used to label ledger rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl Default for ContractParameters {
    fn default() -> Self {
        Self {
            credit_value: DEFAULT_CREDIT_VALUE,
            term_months: DEFAULT_TERM_MONTHS,
            admin_fee_rate: DEFAULT_ADMIN_FEE_RATE,
            reserve_fund_rate: DEFAULT_RESERVE_FUND_RATE,
            contemplation_month: 1,
            free_bid_fraction: DEFAULT_FREE_BID_FRACTION,
            annual_readjustment_rate: DEFAULT_ANNUAL_READJUSTMENT_RATE,
            start_date: None,
        }
    }
}

impl ContractParameters {
    /// Check the invariants the schedule builder relies on
    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = [
            ("credit_value", self.credit_value),
            ("admin_fee_rate", self.admin_fee_rate),
            ("reserve_fund_rate", self.reserve_fund_rate),
            ("free_bid_fraction", self.free_bid_fraction),
            ("annual_readjustment_rate", self.annual_readjustment_rate),
        ];
        if let Some((field, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ValidationError::NonFinite { field: *field });
        }

        if self.credit_value <= 0.0 {
            return Err(ValidationError::NonPositiveCredit(self.credit_value));
        }
        if self.term_months == 0 {
            return Err(ValidationError::NonPositiveTerm);
        }
        if self.term_months > MAX_TERM_MONTHS {
            return Err(ValidationError::TermTooLong {
                term: self.term_months,
                max: MAX_TERM_MONTHS,
            });
        }
        if self.contemplation_month == 0 {
            return Err(ValidationError::NonPositiveContemplation);
        }
        if self.contemplation_month > self.term_months {
            return Err(ValidationError::ContemplationAfterTerm {
                month: self.contemplation_month,
                term: self.term_months,
            });
        }

        for (field, value) in [
            ("admin_fee_rate", self.admin_fee_rate),
            ("reserve_fund_rate", self.reserve_fund_rate),
            ("free_bid_fraction", self.free_bid_fraction),
        ] {
            if value < 0.0 {
                return Err(ValidationError::NegativeRate { field, value });
            }
        }

        // Readjustment may be zero or negative (deflation), but not below -100%
        if self.annual_readjustment_rate <= -1.0 {
            return Err(ValidationError::NegativeRate {
                field: "annual_readjustment_rate",
                value: self.annual_readjustment_rate,
            });
        }

        Ok(())
    }

    /// Credit value plus administration fee and reserve fund
    pub fn base_contract_value(&self) -> f64 {
        self.credit_value * (1.0 + self.admin_fee_rate + self.reserve_fund_rate)
    }

    /// Flat (uncorrected) monthly installment
    pub fn flat_installment(&self) -> f64 {
        self.base_contract_value() / self.term_months as f64
    }

    /// Free bid paid in the contemplation month
    pub fn bid_amount(&self) -> f64 {
        self.base_contract_value() * self.free_bid_fraction
    }

    /// Group size implied by the term: two members leave the group every month
    pub fn total_participants(&self) -> u32 {
        self.term_months.saturating_mul(2)
    }

    /// Contract year (1-indexed) of a given month
    pub fn contract_year(&self, month: u32) -> u32 {
        month.saturating_sub(1) / 12 + 1
    }

    /// Whether `month` opens a new contract year after the first
    pub fn is_anniversary(&self, month: u32) -> bool {
        month > 1 && (month - 1) % 12 == 0
    }

    /// Cumulative readjustment factor applied to display values in `month`
    pub fn correction_factor(&self, month: u32) -> f64 {
        let years_elapsed = self.contract_year(month) - 1;
        (1.0 + self.annual_readjustment_rate).powi(years_elapsed as i32)
    }

    /// `MM/YYYY` label for a month, when a start date is known
    pub fn date_label(&self, month: u32) -> Option<String> {
        let start = self.start_date?;
        let date = start.checked_add_months(Months::new(month.saturating_sub(1)))?;
        Some(format!("{:02}/{}", date.month(), date.year()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_contract_values() {
        let params = ContractParameters::default();
        assert!(params.validate().is_ok());
        assert_relative_eq!(params.base_contract_value(), 124_000.0, epsilon = 1e-9);
        assert_relative_eq!(params.bid_amount(), 12_400.0, epsilon = 1e-9);
        assert_relative_eq!(params.flat_installment(), 1_033.333_333_333, epsilon = 1e-6);
        assert_eq!(params.total_participants(), 240);
    }

    #[test]
    fn test_contract_year_boundaries() {
        let params = ContractParameters::default();
        assert_eq!(params.contract_year(1), 1);
        assert_eq!(params.contract_year(12), 1);
        assert_eq!(params.contract_year(13), 2);
        assert!(!params.is_anniversary(1));
        assert!(params.is_anniversary(13));
        assert!(params.is_anniversary(25));
        assert!(!params.is_anniversary(24));
        assert_relative_eq!(params.correction_factor(13), 1.05, epsilon = 1e-12);
        assert_relative_eq!(params.correction_factor(25), 1.1025, epsilon = 1e-12);
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let mut params = ContractParameters::default();
        params.credit_value = 0.0;
        assert_eq!(params.validate(), Err(ValidationError::NonPositiveCredit(0.0)));

        let mut params = ContractParameters::default();
        params.term_months = 0;
        assert_eq!(params.validate(), Err(ValidationError::NonPositiveTerm));

        let mut params = ContractParameters::default();
        params.contemplation_month = 121;
        assert_eq!(
            params.validate(),
            Err(ValidationError::ContemplationAfterTerm { month: 121, term: 120 })
        );

        let mut params = ContractParameters::default();
        params.contemplation_month = 0;
        assert_eq!(params.validate(), Err(ValidationError::NonPositiveContemplation));

        let mut params = ContractParameters::default();
        params.free_bid_fraction = f64::NAN;
        assert!(matches!(params.validate(), Err(ValidationError::NonFinite { .. })));
    }

    #[test]
    fn test_huge_term_is_rejected_without_overflow() {
        let params = ContractParameters {
            term_months: 3_000_000_000,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ValidationError::TermTooLong { term: 3_000_000_000, max: MAX_TERM_MONTHS })
        );
        assert_eq!(params.total_participants(), u32::MAX);

        let params = ContractParameters {
            term_months: MAX_TERM_MONTHS,
            contemplation_month: MAX_TERM_MONTHS,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
        assert_eq!(params.total_participants(), 1_200);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let params: ContractParameters =
            serde_json::from_str(r#"{"contemplation_month": 17}"#).unwrap();
        assert_eq!(params.contemplation_month, 17);
        assert_eq!(params.term_months, DEFAULT_TERM_MONTHS);
        assert!(params.start_date.is_none());
    }

    #[test]
    fn test_date_label() {
        let params = ContractParameters {
            start_date: NaiveDate::from_ymd_opt(2025, 11, 1),
            ..Default::default()
        };
        assert_eq!(params.date_label(1).as_deref(), Some("11/2025"));
        assert_eq!(params.date_label(3).as_deref(), Some("01/2026"));
        assert_eq!(ContractParameters::default().date_label(1), None);
    }
}
