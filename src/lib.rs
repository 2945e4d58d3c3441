//! Consortium Simulator - cost and timing engine for consortium contracts
//!
//! This library provides:
//! - Monthly schedule building with annual readjustment and contemplation
//! - Effective cost rate (CET) via multi-seed root finding
//! - Present value fallback at a fixed discount rate
//! - Hazard-based contemplation probability curves (draw only vs. draw and bid)

pub mod contract;
pub mod schedule;
pub mod rate;
pub mod probability;
pub mod sanitize;
pub mod simulation;

// Re-export commonly used types
pub use contract::{ContractParameters, ValidationError};
pub use schedule::{build_schedule, MonthlyLedgerEntry, Schedule, ScheduleError, ScheduleSummary};
pub use rate::{present_value, solve_effective_rate, RateFailure, RateSolution};
pub use probability::{
    hazard_curve, probability_at_month, ContemplationOdds, ContemplationRegime, ProbabilityComparison,
    ProbabilityCurve,
};
pub use simulation::{Headline, SimulationError, SimulationResult, Simulator, SimulatorConfig};
