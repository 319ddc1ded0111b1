use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    BalanceTrajectory, DisplayUnit, GrowthParams, MatrixSampler, SolvencyBand, WithdrawalParams,
    run_growth_simulation, run_withdrawal_simulation, summary,
};

const MAX_SIMULATIONS: usize = 10_000;
const MAX_YEARS: usize = 100;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Monte Carlo retirement projections: savings growth and capital drawdown"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project savings growth under monthly contributions and annual raises.
    Growth(GrowthArgs),
    /// Project a drawdown under monthly withdrawals and inflation.
    Withdrawal(WithdrawalArgs),
    /// Serve the JSON API over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GrowthArgs {
    #[arg(long, default_value_t = 100_000.0)]
    start_capital: f64,
    #[arg(long, default_value_t = 7.0, help = "Annual return mean, percent")]
    return_mean: f64,
    #[arg(long, default_value_t = 15.0, help = "Annual return stdev, percent")]
    return_stdev: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual pay raise mean, percent")]
    raise_mean: f64,
    #[arg(long, default_value_t = 1.0, help = "Annual pay raise stdev, percent")]
    raise_stdev: f64,
    #[arg(long, default_value_t = 1_000.0)]
    monthly_contribution: f64,
    #[arg(long, default_value_t = 30)]
    years: usize,
    #[arg(long, default_value_t = 100)]
    simulations: usize,
    #[arg(long, help = "RNG seed; omit for a fresh random stream")]
    seed: Option<u64>,
    #[arg(
        long,
        help = "Calendar year of month 0; omitted, the time axis counts years from now"
    )]
    start_year: Option<f64>,
    #[arg(long, help = "Age at month 0; adds an age axis to the output")]
    start_age: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct WithdrawalArgs {
    #[arg(long, default_value_t = 1_000_000.0)]
    start_capital: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Annual return mean; values above 1 are read as percent"
    )]
    return_mean: f64,
    #[arg(long, default_value_t = 0.10, help = "Annual return stdev, decimal")]
    return_stdev: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual inflation mean; values above 1 are read as percent"
    )]
    inflation_mean: f64,
    #[arg(long, default_value_t = 0.01, help = "Annual inflation stdev, decimal")]
    inflation_stdev: f64,
    #[arg(long, default_value_t = 4_000.0)]
    monthly_withdrawal: f64,
    #[arg(long, default_value_t = 30)]
    years: usize,
    #[arg(long, default_value_t = 100)]
    simulations: usize,
    #[arg(long, help = "RNG seed; omit for a fresh random stream")]
    seed: Option<u64>,
    #[arg(long, default_value_t = 65.0)]
    retire_age: f64,
    #[arg(
        long,
        default_value_t = 90.0,
        help = "Solvent-scenario percentage the bands are measured against"
    )]
    target_solvent_pct: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GrowthPayload {
    start_capital: Option<f64>,
    return_mean: Option<f64>,
    return_stdev: Option<f64>,
    raise_mean: Option<f64>,
    raise_stdev: Option<f64>,
    monthly_contribution: Option<f64>,
    years: Option<usize>,
    simulations: Option<usize>,
    seed: Option<u64>,
    start_year: Option<f64>,
    start_age: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WithdrawalPayload {
    start_capital: Option<f64>,
    return_mean: Option<f64>,
    return_stdev: Option<f64>,
    inflation_mean: Option<f64>,
    inflation_stdev: Option<f64>,
    monthly_withdrawal: Option<f64>,
    years: Option<usize>,
    simulations: Option<usize>,
    seed: Option<u64>,
    retire_age: Option<f64>,
    target_solvent_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthResponse {
    unit: DisplayUnit,
    rows: usize,
    scenarios: usize,
    time_axis: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age_axis: Option<Vec<f64>>,
    mean_path: Vec<Option<f64>>,
    median_path: Vec<Option<f64>>,
    p10_path: Vec<Option<f64>>,
    p90_path: Vec<Option<f64>>,
    final_balances: Vec<f64>,
    balances: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResponse {
    unit: DisplayUnit,
    rows: usize,
    scenarios: usize,
    time_axis: Vec<f64>,
    mean_path: Vec<Option<f64>>,
    median_path: Vec<Option<f64>>,
    solvent_percent: Vec<f64>,
    target_solvent_pct: f64,
    solvency_bands: Vec<SolvencyBand>,
    final_balances: Vec<f64>,
    balances: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn check_run_size(years: usize, simulations: usize) -> Result<(), String> {
    if years == 0 {
        return Err("--years must be > 0".to_string());
    }
    if years > MAX_YEARS {
        return Err(format!("--years must be <= {MAX_YEARS}"));
    }
    if simulations == 0 {
        return Err("--simulations must be > 0".to_string());
    }
    if simulations > MAX_SIMULATIONS {
        return Err(format!("--simulations must be <= {MAX_SIMULATIONS}"));
    }
    Ok(())
}

// False for NaN as well as negatives.
fn is_valid_stdev(stdev: f64) -> bool {
    stdev >= 0.0
}

fn build_growth_params(args: &GrowthArgs) -> Result<GrowthParams, String> {
    check_run_size(args.years, args.simulations)?;

    if !is_valid_stdev(args.return_stdev) || !is_valid_stdev(args.raise_stdev) {
        return Err("--return-stdev and --raise-stdev must be >= 0".to_string());
    }

    Ok(GrowthParams {
        start_capital: args.start_capital,
        return_mean_pct: args.return_mean,
        return_stdev_pct: args.return_stdev,
        raise_mean_pct: args.raise_mean,
        raise_stdev_pct: args.raise_stdev,
        monthly_contribution: args.monthly_contribution,
        n_years: args.years,
        n_simulations: args.simulations,
    })
}

fn build_withdrawal_params(args: &WithdrawalArgs) -> Result<WithdrawalParams, String> {
    check_run_size(args.years, args.simulations)?;

    if !is_valid_stdev(args.return_stdev) || !is_valid_stdev(args.inflation_stdev) {
        return Err("--return-stdev and --inflation-stdev must be >= 0".to_string());
    }

    if !(0.0..=100.0).contains(&args.target_solvent_pct) {
        return Err("--target-solvent-pct must be between 0 and 100".to_string());
    }

    Ok(WithdrawalParams {
        start_capital: args.start_capital,
        return_mean: args.return_mean,
        return_stdev: args.return_stdev,
        inflation_mean: args.inflation_mean,
        inflation_stdev: args.inflation_stdev,
        monthly_withdrawal: args.monthly_withdrawal,
        n_years: args.years,
        n_simulations: args.simulations,
    })
}

fn sampler_for(seed: Option<u64>) -> MatrixSampler {
    match seed {
        Some(seed) => MatrixSampler::seeded(seed),
        None => MatrixSampler::from_entropy(),
    }
}

pub fn run_growth(args: &GrowthArgs) -> Result<GrowthResponse, String> {
    let params = build_growth_params(args)?;
    let mut sampler = sampler_for(args.seed);
    let trajectory = run_growth_simulation(&params, &mut sampler).map_err(|e| e.to_string())?;
    Ok(build_growth_response(args, &trajectory))
}

pub fn run_withdrawal(args: &WithdrawalArgs) -> Result<WithdrawalResponse, String> {
    let params = build_withdrawal_params(args)?;
    let mut sampler = sampler_for(args.seed);
    let trajectory =
        run_withdrawal_simulation(&params, &mut sampler).map_err(|e| e.to_string())?;
    Ok(build_withdrawal_response(args, &trajectory))
}

fn build_growth_response(args: &GrowthArgs, trajectory: &BalanceTrajectory) -> GrowthResponse {
    GrowthResponse {
        unit: trajectory.unit(),
        rows: trajectory.months(),
        scenarios: trajectory.scenarios(),
        time_axis: summary::time_axis(trajectory, args.start_year.unwrap_or(0.0)),
        age_axis: args
            .start_age
            .map(|age| summary::time_axis(trajectory, age)),
        mean_path: summary::mean_path(trajectory),
        median_path: summary::percentile_path(trajectory, 50.0),
        p10_path: summary::percentile_path(trajectory, 10.0),
        p90_path: summary::percentile_path(trajectory, 90.0),
        final_balances: summary::final_balances(trajectory),
        balances: trajectory.nullable_rows(),
    }
}

fn build_withdrawal_response(
    args: &WithdrawalArgs,
    trajectory: &BalanceTrajectory,
) -> WithdrawalResponse {
    let solvent_percent = summary::solvent_percent(trajectory);
    WithdrawalResponse {
        unit: trajectory.unit(),
        rows: trajectory.months(),
        scenarios: trajectory.scenarios(),
        time_axis: summary::time_axis(trajectory, args.retire_age),
        mean_path: summary::mean_path(trajectory),
        median_path: summary::percentile_path(trajectory, 50.0),
        solvency_bands: summary::solvency_bands(&solvent_percent, args.target_solvent_pct),
        solvent_percent,
        target_solvent_pct: args.target_solvent_pct,
        final_balances: summary::final_balances(trajectory),
        balances: trajectory.nullable_rows(),
    }
}

/// Runs one CLI command to completion. Simulation output goes to stdout as
/// JSON.
pub async fn run_cli(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Growth(args) => print_json(&run_growth(&args)?),
        Command::Withdrawal(args) => print_json(&run_withdrawal(&args)?),
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
    }
}

fn print_json<T: Serialize>(body: &T) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(body).map_err(|e| format!("Failed to encode output: {e}"))?;
    println!("{json}");
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/growth",
            get(growth_get_handler).post(growth_post_handler),
        )
        .route(
            "/api/withdrawal",
            get(withdrawal_get_handler).post(withdrawal_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "nestegg HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/growth");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn growth_get_handler(Query(payload): Query<GrowthPayload>) -> Response {
    growth_handler_impl(payload)
}

async fn growth_post_handler(Json(payload): Json<GrowthPayload>) -> Response {
    growth_handler_impl(payload)
}

async fn withdrawal_get_handler(Query(payload): Query<WithdrawalPayload>) -> Response {
    withdrawal_handler_impl(payload)
}

async fn withdrawal_post_handler(Json(payload): Json<WithdrawalPayload>) -> Response {
    withdrawal_handler_impl(payload)
}

fn growth_handler_impl(payload: GrowthPayload) -> Response {
    let args = growth_args_from_payload(payload);
    info!(
        years = args.years,
        simulations = args.simulations,
        seeded = args.seed.is_some(),
        "growth request"
    );
    match run_growth(&args) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!(error = %msg, "growth request rejected");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn withdrawal_handler_impl(payload: WithdrawalPayload) -> Response {
    let args = withdrawal_args_from_payload(payload);
    info!(
        years = args.years,
        simulations = args.simulations,
        seeded = args.seed.is_some(),
        "withdrawal request"
    );
    match run_withdrawal(&args) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!(error = %msg, "withdrawal request rejected");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn growth_args_from_payload(payload: GrowthPayload) -> GrowthArgs {
    let mut args = default_growth_args();

    if let Some(v) = payload.start_capital {
        args.start_capital = v;
    }
    if let Some(v) = payload.return_mean {
        args.return_mean = v;
    }
    if let Some(v) = payload.return_stdev {
        args.return_stdev = v;
    }
    if let Some(v) = payload.raise_mean {
        args.raise_mean = v;
    }
    if let Some(v) = payload.raise_stdev {
        args.raise_stdev = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    args.seed = payload.seed;
    args.start_year = payload.start_year;
    args.start_age = payload.start_age;

    args
}

fn withdrawal_args_from_payload(payload: WithdrawalPayload) -> WithdrawalArgs {
    let mut args = default_withdrawal_args();

    if let Some(v) = payload.start_capital {
        args.start_capital = v;
    }
    if let Some(v) = payload.return_mean {
        args.return_mean = v;
    }
    if let Some(v) = payload.return_stdev {
        args.return_stdev = v;
    }
    if let Some(v) = payload.inflation_mean {
        args.inflation_mean = v;
    }
    if let Some(v) = payload.inflation_stdev {
        args.inflation_stdev = v;
    }
    if let Some(v) = payload.monthly_withdrawal {
        args.monthly_withdrawal = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    if let Some(v) = payload.retire_age {
        args.retire_age = v;
    }
    if let Some(v) = payload.target_solvent_pct {
        args.target_solvent_pct = v;
    }
    args.seed = payload.seed;

    args
}

fn default_growth_args() -> GrowthArgs {
    GrowthArgs {
        start_capital: 100_000.0,
        return_mean: 7.0,
        return_stdev: 15.0,
        raise_mean: 3.0,
        raise_stdev: 1.0,
        monthly_contribution: 1_000.0,
        years: 30,
        simulations: 100,
        seed: None,
        start_year: None,
        start_age: None,
    }
}

fn default_withdrawal_args() -> WithdrawalArgs {
    WithdrawalArgs {
        start_capital: 1_000_000.0,
        return_mean: 5.0,
        return_stdev: 0.10,
        inflation_mean: 3.0,
        inflation_stdev: 0.01,
        monthly_withdrawal: 4_000.0,
        years: 30,
        simulations: 100,
        seed: None,
        retire_age: 65.0,
        target_solvent_pct: 90.0,
    }
}
