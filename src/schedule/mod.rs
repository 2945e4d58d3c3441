//! Schedule builder: contract parameters to monthly ledger and cashflows

mod state;
mod ledger;
mod builder;

pub use state::ScheduleState;
pub use ledger::{MonthlyLedgerEntry, Schedule, ScheduleSummary};
pub use builder::{build_schedule, ScheduleBuilder, ScheduleError};
