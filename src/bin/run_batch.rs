//! Simulate every contract in a CSV batch
//!
//! Usage: `run_batch [INPUT] [OUTPUT]` (defaults: contracts.csv, batch_output.csv).
//! `PV_DISCOUNT_RATE` and `SOLVER_MAX_ITERATIONS` override the runner config.

use anyhow::{Context, Result};
use consortium_simulator::contract::{load_contracts, loader::DEFAULT_CONTRACTS_PATH};
use consortium_simulator::{ContractParameters, SimulationResult, Simulator, SimulatorConfig};
use std::env;
use std::time::Instant;

/// One output line per contract
#[derive(Debug, serde::Serialize)]
struct BatchRow {
    #[serde(rename = "ContractID")]
    contract_id: u32,
    #[serde(rename = "ContemplationMonth")]
    contemplation_month: u32,
    #[serde(rename = "BaseContractValue")]
    base_contract_value: f64,
    #[serde(rename = "BidAmount")]
    bid_amount: f64,
    #[serde(rename = "ContemplationFlow")]
    contemplation_flow: f64,
    #[serde(rename = "AnnualCET")]
    annual_cet: Option<f64>,
    #[serde(rename = "MonthlyCET")]
    monthly_cet: Option<f64>,
    #[serde(rename = "PresentValue")]
    present_value: f64,
    #[serde(rename = "Converged")]
    converged: bool,
    #[serde(rename = "Reason")]
    reason: String,
    #[serde(rename = "ProbabilityThisMonth")]
    probability_this_month: f64,
}

impl BatchRow {
    fn from_result(contract_id: u32, result: &SimulationResult) -> Self {
        Self {
            contract_id,
            contemplation_month: result.parameters.contemplation_month,
            base_contract_value: result.summary.base_contract_value,
            bid_amount: result.summary.bid_amount,
            contemplation_flow: result.summary.contemplation_flow,
            annual_cet: result.annual_effective_rate,
            monthly_cet: result.monthly_effective_rate,
            present_value: result.present_value,
            converged: result.converged,
            reason: result.failure_message().unwrap_or_default().to_string(),
            probability_this_month: result.contemplation_odds.probability_this_month,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| DEFAULT_CONTRACTS_PATH.to_string());
    let output = args.next().unwrap_or_else(|| "batch_output.csv".to_string());

    let start = Instant::now();
    println!("Loading contracts from {}...", input);

    let contracts = load_contracts(&input).with_context(|| format!("failed to load {}", input))?;
    println!("Loaded {} contracts in {:?}", contracts.len(), start.elapsed());

    let (ids, params): (Vec<u32>, Vec<ContractParameters>) = contracts.into_iter().unzip();

    let simulator = Simulator::with_config(SimulatorConfig::from_env());
    let sim_start = Instant::now();
    let results = simulator.simulate_batch(&params);
    println!("Simulations complete in {:?}", sim_start.elapsed());

    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("unable to create {}", output))?;

    let mut converged = 0usize;
    let mut failed = 0usize;
    for (id, result) in ids.iter().zip(&results) {
        match result {
            Ok(result) => {
                if result.converged {
                    converged += 1;
                }
                writer.serialize(BatchRow::from_result(*id, &result.clone().sanitized()))?;
            }
            Err(e) => {
                failed += 1;
                log::warn!("contract {}: {}", id, e);
            }
        }
    }
    writer.flush()?;

    println!("\nResults written to: {}", output);
    println!("  Contracts: {}", results.len());
    println!("  CET converged: {}", converged);
    println!("  PV fallback only: {}", results.len() - converged - failed);
    println!("  Failed: {}", failed);
    println!("  Total time: {:?}", start.elapsed());

    Ok(())
}
