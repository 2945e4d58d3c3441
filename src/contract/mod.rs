//! Contract parameters and batch loading

mod params;
pub mod loader;

pub use params::{
    ContractParameters, ValidationError, DEFAULT_ADMIN_FEE_RATE, DEFAULT_ANNUAL_READJUSTMENT_RATE,
    DEFAULT_CREDIT_VALUE, DEFAULT_FREE_BID_FRACTION, DEFAULT_RESERVE_FUND_RATE,
    DEFAULT_TERM_MONTHS, MAX_TERM_MONTHS,
};
pub use loader::{load_contracts, load_contracts_from_reader, LoadError};
