#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use tradesim::domain::backtest::{BacktestParameters, BacktestRequest, StrategyDescriptor};
use tradesim::domain::crossover::CrossoverParams;
use tradesim::domain::error::TradesimError;
pub use tradesim::domain::ohlcv::PriceBar;
use tradesim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TradesimError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TradesimError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day starting at `start`, one per close.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start.checked_add_days(Days::new(i as u64)).unwrap(), c))
        .collect()
}

/// `count` daily bars with close = `start_price + step * i`.
pub fn generate_bars(start: NaiveDate, count: usize, start_price: f64, step: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    bars_from_closes(start, &closes)
}

pub fn sample_request(ticker: &str, start: &str, end: &str, capital: f64) -> BacktestRequest {
    BacktestRequest {
        parameters: BacktestParameters {
            ticker: ticker.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            initial_capital: capital,
            commission: None,
            slippage: None,
        },
        strategy: StrategyDescriptor {
            code: String::new(),
            name: Some("SMA Crossover".into()),
            description: None,
        },
    }
}

pub fn sample_params(short_period: usize, long_period: usize) -> CrossoverParams {
    CrossoverParams {
        short_period,
        long_period,
    }
}
