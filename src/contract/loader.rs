//! Load contract batches from CSV
//!
//! Expected header:
//! `ContractID,CreditValue,TermMonths,AdminFee,ReserveFund,ContemplationMonth,BidPct,Readjustment[,StartDate]`

use super::{ContractParameters, ValidationError};
use chrono::NaiveDate;
use csv::Reader;
use std::path::Path;
use thiserror::Error;

/// Default location of the batch input file
pub const DEFAULT_CONTRACTS_PATH: &str = "contracts.csv";

/// Failure while reading a contract batch
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("contract {id}: {source}")]
    Invalid {
        id: u32,
        #[source]
        source: ValidationError,
    },

    #[error("contract {id}: unparseable start date '{value}'")]
    BadDate { id: u32, value: String },
}

/// Raw CSV row matching the batch input columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "ContractID")]
    contract_id: u32,
    #[serde(rename = "CreditValue")]
    credit_value: f64,
    #[serde(rename = "TermMonths")]
    term_months: u32,
    #[serde(rename = "AdminFee")]
    admin_fee: f64,
    #[serde(rename = "ReserveFund")]
    reserve_fund: f64,
    #[serde(rename = "ContemplationMonth")]
    contemplation_month: u32,
    #[serde(rename = "BidPct")]
    bid_pct: f64,
    #[serde(rename = "Readjustment")]
    readjustment: f64,
    #[serde(rename = "StartDate", default)]
    start_date: Option<String>,
}

impl CsvRow {
    fn to_contract(self) -> Result<(u32, ContractParameters), LoadError> {
        let id = self.contract_id;

        let start_date = match self.start_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| LoadError::BadDate { id, value: raw.to_string() })?,
            ),
        };

        let params = ContractParameters {
            credit_value: self.credit_value,
            term_months: self.term_months,
            admin_fee_rate: self.admin_fee,
            reserve_fund_rate: self.reserve_fund,
            contemplation_month: self.contemplation_month,
            free_bid_fraction: self.bid_pct,
            annual_readjustment_rate: self.readjustment,
            start_date,
        };
        params
            .validate()
            .map_err(|source| LoadError::Invalid { id, source })?;

        Ok((id, params))
    }
}

/// Load all contracts from a CSV file
pub fn load_contracts<P: AsRef<Path>>(path: P) -> Result<Vec<(u32, ContractParameters)>, LoadError> {
    let reader = Reader::from_path(path)?;
    collect_rows(reader)
}

/// Load contracts from any reader (e.g., string buffer, request body)
pub fn load_contracts_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<(u32, ContractParameters)>, LoadError> {
    collect_rows(Reader::from_reader(reader))
}

fn collect_rows<R: std::io::Read>(
    mut reader: Reader<R>,
) -> Result<Vec<(u32, ContractParameters)>, LoadError> {
    let mut contracts = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        contracts.push(row.to_contract()?);
    }

    log::debug!("loaded {} contracts", contracts.len());
    Ok(contracts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ContractID,CreditValue,TermMonths,AdminFee,ReserveFund,ContemplationMonth,BidPct,Readjustment,StartDate
1,100000,120,0.21,0.03,1,0.10,0.05,
2,250000,180,0.18,0.02,36,0.25,0.04,2025-03-01
";

    #[test]
    fn test_load_contracts_from_reader() {
        let contracts = load_contracts_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(contracts.len(), 2);

        let (id, first) = &contracts[0];
        assert_eq!(*id, 1);
        assert_eq!(first.term_months, 120);
        assert!(first.start_date.is_none());

        let (id, second) = &contracts[1];
        assert_eq!(*id, 2);
        assert_eq!(second.contemplation_month, 36);
        assert_eq!(second.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn test_invalid_row_is_rejected() {
        let data = "\
ContractID,CreditValue,TermMonths,AdminFee,ReserveFund,ContemplationMonth,BidPct,Readjustment
7,100000,120,0.21,0.03,150,0.10,0.05
";
        let err = load_contracts_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid { id: 7, .. }));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let data = "\
ContractID,CreditValue,TermMonths,AdminFee,ReserveFund,ContemplationMonth,BidPct,Readjustment,StartDate
3,100000,120,0.21,0.03,10,0.10,0.05,03/2025
";
        let err = load_contracts_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::BadDate { id: 3, .. }));
    }
}
