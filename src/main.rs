//! Consortium Simulator CLI
//!
//! Command-line interface for running single-contract simulations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use consortium_simulator::{
    ContractParameters, ProbabilityComparison, ProbabilityCurve, SimulationResult, Simulator,
    SimulatorConfig,
};
use std::path::{Path, PathBuf};

/// Cost (CET) and contemplation timing of a consortium quota
#[derive(Parser)]
#[command(name = "consortium", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the schedule and compute CET and present value
    Simulate {
        #[command(flatten)]
        contract: ContractArgs,

        /// Write the full ledger to this CSV file
        #[arg(long, default_value = "schedule_output.csv")]
        output: PathBuf,

        /// Ledger rows printed to the console
        #[arg(long, default_value_t = 24)]
        rows: usize,
    },
    /// Contemplation probability curves for a group of twice the term
    Probabilities {
        #[command(flatten)]
        contract: ContractArgs,

        /// Write both curves to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default contract parameters
    Defaults,
}

#[derive(Args)]
struct ContractArgs {
    #[arg(long, default_value_t = consortium_simulator::contract::DEFAULT_CREDIT_VALUE)]
    credit: f64,

    #[arg(long, default_value_t = consortium_simulator::contract::DEFAULT_TERM_MONTHS)]
    term: u32,

    #[arg(long, default_value_t = consortium_simulator::contract::DEFAULT_ADMIN_FEE_RATE)]
    admin_fee: f64,

    #[arg(long, default_value_t = consortium_simulator::contract::DEFAULT_RESERVE_FUND_RATE)]
    reserve_fund: f64,

    /// Month of contemplation (1-indexed)
    #[arg(long, default_value_t = 1)]
    contemplation: u32,

    /// Free bid as a fraction of the base contract value
    #[arg(long, default_value_t = consortium_simulator::contract::DEFAULT_FREE_BID_FRACTION)]
    bid: f64,

    /// Annual readjustment of credit and installments
    #[arg(long, default_value_t = consortium_simulator::contract::DEFAULT_ANNUAL_READJUSTMENT_RATE)]
    readjustment: f64,

    /// First installment date (YYYY-MM-DD), used to label months
    #[arg(long)]
    start_date: Option<NaiveDate>,
}

impl From<ContractArgs> for ContractParameters {
    fn from(args: ContractArgs) -> Self {
        Self {
            credit_value: args.credit,
            term_months: args.term,
            admin_fee_rate: args.admin_fee,
            reserve_fund_rate: args.reserve_fund,
            contemplation_month: args.contemplation,
            free_bid_fraction: args.bid,
            annual_readjustment_rate: args.readjustment,
            start_date: args.start_date,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate { contract, output, rows } => {
            let simulator = Simulator::with_config(SimulatorConfig::from_env());
            let params = ContractParameters::from(contract);
            let result = simulator.simulate(&params)?.sanitized();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_simulation(&result, rows);
            }

            write_ledger_csv(&output, &result)?;
            if !cli.json {
                println!("\nFull ledger written to: {}", output.display());
            }
        }
        Command::Probabilities { contract, output } => {
            let params = ContractParameters::from(contract);
            params.validate()?;
            let comparison = Simulator::new().probabilities(&params).sanitized();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                print_probabilities(&comparison);
            }

            if let Some(path) = output {
                write_curves_csv(&path, &comparison)?;
            }
        }
        Command::Defaults => {
            println!("{}", serde_json::to_string_pretty(&ContractParameters::default())?);
        }
    }

    Ok(())
}

fn print_simulation(result: &SimulationResult, rows: usize) {
    let p = &result.parameters;
    let s = &result.summary;

    println!("Consortium Simulator v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");
    println!("Contract:");
    println!("  Credit Value: R${:.2}", p.credit_value);
    println!("  Term: {} months", p.term_months);
    println!("  Base Contract Value: R${:.2}", s.base_contract_value);
    println!("  Bid: R${:.2} ({:.1}%)", s.bid_amount, p.free_bid_fraction * 100.0);
    println!("  Contemplation Month: {}", p.contemplation_month);
    println!();

    println!("{:>5} {:>4} {:>8} {:>7} {:>14} {:>12} {:>14} {:>14}",
        "Month", "Year", "Date", "Factor", "Credit", "Installment", "Net Flow", "Balance");
    println!("{}", "-".repeat(88));

    for e in result.ledger.iter().take(rows) {
        println!("{:>5} {:>4} {:>8} {:>7.4} {:>14.2} {:>12.2} {:>14.2} {:>14.2}{}",
            e.month,
            e.contract_year,
            e.date_label.as_deref().unwrap_or("-"),
            e.correction_factor,
            e.corrected_credit_value,
            e.corrected_installment,
            e.net_cash_flow,
            e.outstanding_balance,
            if e.is_contemplation_month { "  <- contemplation" } else { "" },
        );
    }

    if result.ledger.len() > rows {
        println!("... ({} more months)", result.ledger.len() - rows);
    }

    println!("\nSummary:");
    println!("  Credit at Contemplation: R${:.2}", s.contemplation_credit_value);
    println!("  Contemplation Flow: R${:.2}", s.contemplation_flow);
    println!("  Installments (excl. contemplation): R${:.2}", s.total_non_contemplation_installments);
    println!("  First / Mid / Last Installment: R${:.2} / R${:.2} / R${:.2}",
        s.first_installment, s.mid_installment, s.last_installment);

    println!("\nCost:");
    match (result.annual_effective_rate, result.monthly_effective_rate) {
        (Some(annual), Some(monthly)) => {
            println!("  CET: {:.4}% a.a. ({:.4}% a.m.)", annual * 100.0, monthly * 100.0);
        }
        _ => {
            println!("  CET: unavailable ({})", result.failure_message().unwrap_or("unknown"));
        }
    }
    println!("  Present Value @ {:.1}% a.a.: R${:.2}", result.discount_rate * 100.0, result.present_value);

    let odds = &result.contemplation_odds;
    println!("\nContemplation odds (group of {}):", odds.total_participants);
    println!("  Remaining at month {}: {}", odds.contemplation_month, odds.participants_remaining);
    println!("  Probability this month: {:.4}%", odds.probability_this_month * 100.0);
    println!("  Linear cumulative probability: {:.2}%", odds.linear_cumulative_probability * 100.0);
}

fn print_curve(label: &str, curve: &ProbabilityCurve) {
    let month = |m: Option<u32>| m.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());

    println!("{} ({} months):", label, curve.points.len());
    println!("  Expected month: {:.2}", curve.expected_month);
    println!("  P10 / Median / P90: {} / {} / {}",
        month(curve.p10_month), month(curve.median_month), month(curve.p90_month));

    for pt in curve.points.iter().take(5) {
        println!("  Month {:>3}: remaining={:>4} hazard={:.6} cumulative={:.4}",
            pt.month, pt.participants_remaining, pt.hazard, pt.cumulative_probability);
    }
}

fn print_probabilities(comparison: &ProbabilityComparison) {
    println!("Group of {} participants, {} contemplation(s) per month\n",
        comparison.total_participants, comparison.contemplations_per_month);
    print_curve("Without bid", &comparison.without_bid);
    println!();
    print_curve("With bid", &comparison.with_bid);
}

fn write_ledger_csv(path: &Path, result: &SimulationResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("unable to create {}", path.display()))?;

    writer.write_record([
        "Month", "ContractYear", "Date", "CorrectionFactor", "CorrectedCredit",
        "CorrectedInstallment", "BidPaid", "Contemplation", "NetCashFlow", "OutstandingBalance",
    ])?;

    for e in &result.ledger {
        writer.write_record([
            e.month.to_string(),
            e.contract_year.to_string(),
            e.date_label.clone().unwrap_or_default(),
            format!("{:.8}", e.correction_factor),
            format!("{:.8}", e.corrected_credit_value),
            format!("{:.8}", e.corrected_installment),
            format!("{:.8}", e.bid_paid),
            e.is_contemplation_month.to_string(),
            format!("{:.8}", e.net_cash_flow),
            format!("{:.8}", e.outstanding_balance),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_curves_csv(path: &Path, comparison: &ProbabilityComparison) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("unable to create {}", path.display()))?;

    writer.write_record(["Regime", "Month", "Remaining", "Hazard", "Survival", "Cumulative", "Point"])?;

    for curve in [&comparison.without_bid, &comparison.with_bid] {
        let regime = format!("{:?}", curve.regime);
        for pt in &curve.points {
            writer.write_record([
                regime.clone(),
                pt.month.to_string(),
                pt.participants_remaining.to_string(),
                format!("{:.10}", pt.hazard),
                format!("{:.10}", pt.survival),
                format!("{:.10}", pt.cumulative_probability),
                format!("{:.10}", pt.point_probability),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
