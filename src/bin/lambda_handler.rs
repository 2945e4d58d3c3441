//! AWS Lambda handler for consortium simulations
//!
//! Routes:
//! - `GET /` health message
//! - `GET /defaults` default contract parameters
//! - `POST /simulate` schedule, CET and present value for one contract
//! - `POST /probabilities` draw-only and draw-and-bid probability curves
//!
//! Supports Lambda Function URLs for direct HTTP access.

use consortium_simulator::{
    contract::DEFAULT_TERM_MONTHS, ContractParameters, ProbabilityComparison, SimulationError,
    Simulator, SimulatorConfig,
};
use consortium_simulator::contract::DEFAULT_FREE_BID_FRACTION;
use lambda_http::{http::Method, run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for the probability curves; the group size is twice the term
#[derive(Debug, Deserialize)]
pub struct ProbabilityRequest {
    #[serde(default = "default_term_months")]
    pub term_months: u32,

    #[serde(default = "default_bid")]
    pub free_bid_fraction: f64,
}

fn default_term_months() -> u32 { DEFAULT_TERM_MONTHS }
fn default_bid() -> f64 { DEFAULT_FREE_BID_FRACTION }

impl ProbabilityRequest {
    fn to_contract(&self) -> ContractParameters {
        ContractParameters {
            term_months: self.term_months,
            free_bid_fraction: self.free_bid_fraction,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ProbabilityResponse {
    #[serde(flatten)]
    comparison: ProbabilityComparison,
    execution_time_ms: u64,
}

fn with_cors(status: u16) -> lambda_http::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
}

fn json_response<T: Serialize>(status: u16, body: &T) -> Result<Response<Body>, Error> {
    let text = serde_json::to_string(body)?;
    Ok(with_cors(status).body(Body::Text(text))?)
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    json_response(status, &serde_json::json!({ "error": message }))
}

fn body_text(event: &Request) -> String {
    match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    }
}

fn simulate(simulator: &Simulator, event: &Request) -> Result<Response<Body>, Error> {
    let params: ContractParameters = match serde_json::from_str(&body_text(event)) {
        Ok(p) => p,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    match simulator.simulate(&params) {
        Ok(result) => json_response(200, &result.sanitized()),
        Err(SimulationError::Invalid(e)) => error_response(400, &e.to_string()),
        Err(SimulationError::Schedule(e)) => {
            log::error!("{}", e);
            error_response(500, "schedule generation failed")
        }
    }
}

fn probabilities(
    simulator: &Simulator,
    event: &Request,
    start: std::time::Instant,
) -> Result<Response<Body>, Error> {
    let request: ProbabilityRequest = match serde_json::from_str(&body_text(event)) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    let params = request.to_contract();
    if let Err(e) = params.validate() {
        return error_response(400, &e.to_string());
    }

    let response = ProbabilityResponse {
        comparison: simulator.probabilities(&params).sanitized(),
        execution_time_ms: start.elapsed().as_millis() as u64,
    };
    json_response(200, &response)
}

/// Lambda handler function
async fn handler(simulator: Arc<Simulator>, event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();
    let path = event.uri().path().trim_end_matches('/').to_string();

    // Handle CORS preflight
    if *event.method() == Method::OPTIONS {
        return Ok(with_cors(200).body(Body::Empty)?);
    }

    let method = event.method();
    let response = if *method == Method::GET && path.is_empty() {
        json_response(200, &serde_json::json!({ "message": "consortium simulator: active" }))
    } else if *method == Method::GET && path == "/defaults" {
        json_response(200, &ContractParameters::default())
    } else if *method == Method::POST && path == "/simulate" {
        simulate(&simulator, &event)
    } else if *method == Method::POST && path == "/probabilities" {
        probabilities(&simulator, &event, start)
    } else {
        error_response(404, "not found")
    };

    log::info!("{} {} in {:?}", event.method(), path, start.elapsed());
    response
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let simulator = Arc::new(Simulator::with_config(SimulatorConfig::from_env()));
    run(service_fn(move |event: Request| handler(Arc::clone(&simulator), event))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use consortium_simulator::contract::MAX_TERM_MONTHS;

    #[test]
    fn test_probability_request_defaults() {
        let request: ProbabilityRequest = serde_json::from_str("{}").unwrap();
        let params = request.to_contract();
        assert_eq!(params.total_participants(), 240);
        assert_eq!(params.free_bid_fraction, DEFAULT_FREE_BID_FRACTION);

        let request: ProbabilityRequest =
            serde_json::from_str(r#"{"term_months": 215, "free_bid_fraction": 0.0}"#).unwrap();
        assert_eq!(request.to_contract().total_participants(), 430);
    }

    #[test]
    fn test_probability_request_rejects_oversized_term() {
        let request: ProbabilityRequest =
            serde_json::from_str(r#"{"term_months": 4000000000}"#).unwrap();
        assert!(request.to_contract().validate().is_err());

        let request: ProbabilityRequest =
            serde_json::from_str(&format!(r#"{{"term_months": {}}}"#, MAX_TERM_MONTHS)).unwrap();
        assert!(request.to_contract().validate().is_ok());
    }
}
