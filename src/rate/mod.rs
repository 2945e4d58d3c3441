//! Effective cost rate solver and present value fallback

mod irr;
mod discount;

pub use irr::{
    annual_to_monthly, monthly_to_annual, npv_at_rate, solve_effective_rate, RateFailure,
    RateSolution, RateSolver, SolverConfig, DEFAULT_SEEDS,
};
pub use discount::{present_value, DiscountCurve, DEFAULT_PV_DISCOUNT_RATE};
