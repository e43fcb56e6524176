//! Dual simple-moving-average crossover engine.
//!
//! Two states, Flat and Long. Once both averages have enough history, a
//! short SMA above the long SMA opens a full-cash long position and a short
//! SMA below the long SMA closes it. Equal averages are no signal.

use tracing::debug;

use super::error::TradesimError;
use super::indicator::sma::calculate_sma;
use super::ohlcv::PriceBar;
use super::portfolio::{EquityPoint, PortfolioState};
use super::signal::TradeSignal;

pub const DEFAULT_SHORT_PERIOD: usize = 10;
pub const DEFAULT_LONG_PERIOD: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverParams {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for CrossoverParams {
    fn default() -> Self {
        CrossoverParams {
            short_period: DEFAULT_SHORT_PERIOD,
            long_period: DEFAULT_LONG_PERIOD,
        }
    }
}

impl CrossoverParams {
    pub fn validate(&self) -> Result<(), TradesimError> {
        if self.short_period == 0 {
            return Err(TradesimError::invalid_input(
                "short_period",
                "short_period must be at least 1",
            ));
        }
        if self.long_period <= self.short_period {
            return Err(TradesimError::invalid_input(
                "long_period",
                format!(
                    "long_period ({}) must be greater than short_period ({})",
                    self.long_period, self.short_period
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    /// Short average above long average.
    Bullish,
    /// Short average below long average.
    Bearish,
}

/// Compare the two averages. `None` for equal or missing values.
pub fn crossover_signal(short_sma: Option<f64>, long_sma: Option<f64>) -> Option<Crossover> {
    let (short, long) = (short_sma?, long_sma?);
    if short > long {
        Some(Crossover::Bullish)
    } else if short < long {
        Some(Crossover::Bearish)
    } else {
        None
    }
}

/// Transition function for a single bar: at most one trade per call.
pub fn step(
    state: PortfolioState,
    bar: &PriceBar,
    signal: Option<Crossover>,
) -> (PortfolioState, Option<TradeSignal>) {
    match signal {
        Some(Crossover::Bullish) if !state.in_position() => state.buy_all(bar.date, bar.close),
        Some(Crossover::Bearish) if state.in_position() => state.sell_all(bar.date, bar.close),
        _ => (state, None),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub trades: Vec<TradeSignal>,
    pub equity: Vec<EquityPoint>,
    pub final_state: PortfolioState,
}

/// Walk `bars` in order, producing one equity point per bar.
///
/// Trading starts at index `long_period`; before that the state is only
/// marked to market.
pub fn simulate(
    bars: &[PriceBar],
    initial_capital: f64,
    params: &CrossoverParams,
) -> Result<Simulation, TradesimError> {
    params.validate()?;
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(TradesimError::invalid_input(
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let short = calculate_sma(bars, params.short_period);
    let long = calculate_sma(bars, params.long_period);

    let mut state = PortfolioState::new(initial_capital);
    let mut trades = Vec::new();
    let mut equity = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i >= params.long_period {
            let signal = crossover_signal(short.value_at(i), long.value_at(i));
            let (next, trade) = step(state, bar, signal);
            if let Some(trade) = trade {
                debug!(
                    date = %trade.date,
                    side = %trade.trade_type,
                    price = trade.price,
                    size = trade.size,
                    "fill"
                );
                trades.push(trade);
            }
            state = next;
        }
        equity.push(state.mark(bar.date, bar.close));
    }

    Ok(Simulation {
        trades,
        equity,
        final_state: state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::TradeType;
    use chrono::{Duration, NaiveDate};

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn small_params() -> CrossoverParams {
        CrossoverParams {
            short_period: 2,
            long_period: 4,
        }
    }

    #[test]
    fn default_params() {
        let p = CrossoverParams::default();
        assert_eq!(p.short_period, 10);
        assert_eq!(p.long_period, 30);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn params_reject_zero_short() {
        let p = CrossoverParams {
            short_period: 0,
            long_period: 5,
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn params_reject_long_not_above_short() {
        let p = CrossoverParams {
            short_period: 10,
            long_period: 10,
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn signal_tie_is_none() {
        assert_eq!(crossover_signal(Some(5.0), Some(5.0)), None);
        assert_eq!(crossover_signal(Some(6.0), Some(5.0)), Some(Crossover::Bullish));
        assert_eq!(crossover_signal(Some(4.0), Some(5.0)), Some(Crossover::Bearish));
        assert_eq!(crossover_signal(None, Some(5.0)), None);
    }

    #[test]
    fn step_transitions() {
        let bar = &make_bars(&[50.0])[0];
        let flat = PortfolioState::new(1_000.0);

        let (long, buy) = step(flat, bar, Some(Crossover::Bullish));
        assert_eq!(buy.unwrap().size, 20);
        assert!(long.in_position());

        let (still_long, none) = step(long, bar, Some(Crossover::Bullish));
        assert!(none.is_none());
        assert_eq!(still_long, long);

        let (still_flat, none) = step(flat, bar, Some(Crossover::Bearish));
        assert!(none.is_none());
        assert_eq!(still_flat, flat);

        let (back_flat, sell) = step(long, bar, Some(Crossover::Bearish));
        assert_eq!(sell.unwrap().trade_type, TradeType::Sell);
        assert!(!back_flat.in_position());
        assert!((back_flat.cash - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_bars_empty_result() {
        let sim = simulate(&[], 10_000.0, &CrossoverParams::default()).unwrap();
        assert!(sim.trades.is_empty());
        assert!(sim.equity.is_empty());
        assert_eq!(sim.final_state, PortfolioState::new(10_000.0));
    }

    #[test]
    fn flat_market_never_trades() {
        let bars = make_bars(&[100.0; 60]);
        let sim = simulate(&bars, 10_000.0, &CrossoverParams::default()).unwrap();

        assert!(sim.trades.is_empty());
        assert_eq!(sim.equity.len(), 60);
        assert!(sim.equity.iter().all(|p| p.value == 10_000.0));
    }

    #[test]
    fn uptrend_buys_once_and_holds() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let sim = simulate(&bars, 10_000.0, &CrossoverParams::default()).unwrap();

        assert_eq!(sim.trades.len(), 1);
        let buy = &sim.trades[0];
        assert_eq!(buy.trade_type, TradeType::Buy);
        assert_eq!(buy.date, bars[30].date);
        assert!((buy.price - 130.0).abs() < f64::EPSILON);
        assert_eq!(buy.size, 76);
        assert!(sim.final_state.position_size > 0);
    }

    #[test]
    fn no_trade_before_long_period() {
        // Rising immediately, so the averages diverge long before index 4.
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let sim = simulate(&bars, 100.0, &small_params()).unwrap();

        assert_eq!(sim.trades.len(), 1);
        assert_eq!(sim.trades[0].date, bars[4].date);
        for point in &sim.equity[..4] {
            assert_eq!(point.holdings, 0.0);
            assert_eq!(point.cash, 100.0);
        }
    }

    #[test]
    fn round_trip_on_reversal() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 8.0, 6.0, 5.0]);
        let sim = simulate(&bars, 1_000.0, &small_params()).unwrap();

        let kinds: Vec<TradeType> = sim.trades.iter().map(|t| t.trade_type).collect();
        assert_eq!(kinds, vec![TradeType::Buy, TradeType::Sell]);
        assert_eq!(sim.trades[0].date, bars[4].date);
        // Index 6 is an exact tie (11 vs 11), so the exit waits for index 7.
        assert_eq!(sim.trades[1].date, bars[7].date);
        assert!((sim.trades[1].price - 6.0).abs() < f64::EPSILON);
        assert!(!sim.final_state.in_position());
    }

    #[test]
    fn equity_point_after_fill_uses_post_trade_state() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sim = simulate(&bars, 100.0, &small_params()).unwrap();

        let last = sim.equity.last().unwrap();
        assert_eq!(last.holdings, 20.0 * 5.0);
        assert_eq!(last.cash, 0.0);
        assert_eq!(last.value, 100.0);
    }

    #[test]
    fn long_period_beyond_series_never_trades() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let sim = simulate(&bars, 100.0, &CrossoverParams::default()).unwrap();
        assert!(sim.trades.is_empty());
        assert_eq!(sim.equity.len(), 3);
    }

    #[test]
    fn rejects_non_positive_capital() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert!(simulate(&bars, 0.0, &small_params()).is_err());
        assert!(simulate(&bars, -1.0, &small_params()).is_err());
    }
}
