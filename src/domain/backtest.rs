//! Backtest request/result records and the two run paths.
//!
//! `simulate_backtest` runs on a synthesized series; `fetch_real_backtest`
//! pulls bars from a [`DataPort`] and fails with a typed error when the
//! provider cannot serve them. Which one to fall back to is the caller's call.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::crossover::{simulate, CrossoverParams};
use super::error::TradesimError;
use super::metrics::{analyze, BacktestPerformance};
use super::ohlcv::PriceBar;
use super::portfolio::EquityPoint;
use super::signal::TradeSignal;
use super::synthesizer::{synthesize, DEFAULT_SEED_PRICE};
use crate::ports::data_port::DataPort;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestParameters {
    pub ticker: String,
    pub start_date: String,
    pub end_date: String,
    pub initial_capital: f64,
    /// Accepted for API compatibility; not applied by this engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
    /// Accepted for API compatibility; not applied by this engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub parameters: BacktestParameters,
    pub strategy: StrategyDescriptor,
}

/// Request fields after parsing and precondition checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

impl ValidatedRequest {
    /// Calendar days between start and end, used for annualization.
    pub fn period_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

impl BacktestRequest {
    pub fn validate(&self) -> Result<ValidatedRequest, TradesimError> {
        let p = &self.parameters;
        let start_date = parse_date(&p.start_date, "start_date")?;
        let end_date = parse_date(&p.end_date, "end_date")?;

        if end_date < start_date {
            return Err(TradesimError::invalid_input(
                "end_date",
                format!("{} is before start_date {}", end_date, start_date),
            ));
        }
        if !(p.initial_capital.is_finite() && p.initial_capital > 0.0) {
            return Err(TradesimError::invalid_input(
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        for (field, value) in [("commission", p.commission), ("slippage", p.slippage)] {
            if value.is_some_and(|v| v < 0.0) {
                return Err(TradesimError::invalid_input(field, "must be non-negative"));
            }
        }

        Ok(ValidatedRequest {
            ticker: p.ticker.trim().to_uppercase(),
            start_date,
            end_date,
            initial_capital: p.initial_capital,
        })
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, TradesimError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        TradesimError::invalid_input(
            field,
            format!("'{}' is not a date, expected YYYY-MM-DD", value),
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacktestStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub status: BacktestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub price_data: Vec<PriceBar>,
    pub trades: Vec<TradeSignal>,
    pub equity: Vec<EquityPoint>,
    pub performance: BacktestPerformance,
}

impl BacktestResult {
    /// An in-band error result with empty series and zeroed metrics.
    pub fn failure(message: impl Into<String>) -> Self {
        BacktestResult {
            status: BacktestStatus::Error,
            message: Some(message.into()),
            price_data: Vec::new(),
            trades: Vec::new(),
            equity: Vec::new(),
            performance: BacktestPerformance::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BacktestStatus::Success
    }
}

/// Run the crossover strategy over `bars` and summarize it.
pub fn run_on_bars(
    request: &ValidatedRequest,
    params: &CrossoverParams,
    bars: Vec<PriceBar>,
) -> Result<BacktestResult, TradesimError> {
    let sim = simulate(&bars, request.initial_capital, params)?;
    let performance = analyze(
        &sim.equity,
        &sim.trades,
        request.initial_capital,
        request.period_days(),
    );

    info!(
        ticker = %request.ticker,
        bars = bars.len(),
        trades = sim.trades.len(),
        total_return = performance.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        status: BacktestStatus::Success,
        message: None,
        price_data: bars,
        trades: sim.trades,
        equity: sim.equity,
        performance,
    })
}

/// Deterministic given `rng`: synthesize a series for the request window and
/// backtest it.
pub fn simulate_backtest<R: Rng + ?Sized>(
    request: &BacktestRequest,
    params: &CrossoverParams,
    seed_price: Option<f64>,
    rng: &mut R,
) -> Result<BacktestResult, TradesimError> {
    let validated = request.validate()?;
    params.validate()?;

    let bars = synthesize(
        validated.start_date,
        validated.end_date,
        seed_price.unwrap_or(DEFAULT_SEED_PRICE),
        rng,
    )?;
    info!(ticker = %validated.ticker, bars = bars.len(), "synthesized price series");

    let mut result = run_on_bars(&validated, params, bars)?;
    result.message = Some("simulated on synthetic price data".to_string());
    Ok(result)
}

/// Backtest on bars served by `data_port`.
pub fn fetch_real_backtest(
    request: &BacktestRequest,
    params: &CrossoverParams,
    data_port: &dyn DataPort,
) -> Result<BacktestResult, TradesimError> {
    let validated = request.validate()?;
    params.validate()?;

    let bars =
        data_port.fetch_ohlcv(&validated.ticker, validated.start_date, validated.end_date)?;
    if bars.is_empty() {
        return Err(TradesimError::NoData {
            ticker: validated.ticker,
        });
    }
    info!(ticker = %validated.ticker, bars = bars.len(), "fetched price series");

    run_on_bars(&validated, params, bars)
}
