//! Performance metrics over an equity curve and trade log.
//!
//! Percent-valued fields (`total_return`, `annualized_return`,
//! `max_drawdown`, `win_rate`) are expressed in percent, not fractions.

use serde::{Deserialize, Serialize};

use super::portfolio::EquityPoint;
use super::signal::{pair_round_trips, TradeSignal};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestPerformance {
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    /// Winning round trips over losing ones; `f64::INFINITY` with no losers.
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Sum of closed round-trip P&L; open positions are excluded.
    pub realized_pnl: f64,
    pub final_equity: f64,
}

/// Reduce a finished run to its performance summary.
///
/// `period_days` is the calendar length of the backtest window; a zero-day
/// window reports an annualized return of 0.
pub fn analyze(
    equity: &[EquityPoint],
    trades: &[TradeSignal],
    initial_capital: f64,
    period_days: i64,
) -> BacktestPerformance {
    let final_equity = equity.last().map(|p| p.value).unwrap_or(initial_capital);

    let total_return = if initial_capital > 0.0 {
        (final_equity / initial_capital - 1.0) * 100.0
    } else {
        0.0
    };

    let annualized_return = annualize(total_return, period_days);
    let max_drawdown = compute_max_drawdown(equity, initial_capital);
    let sharpe_ratio = compute_sharpe(equity);

    let round_trips = pair_round_trips(trades);
    let total_trades = round_trips.len();
    let winning_trades = round_trips.iter().filter(|rt| rt.is_win()).count();
    let losing_trades = total_trades - winning_trades;
    let realized_pnl: f64 = round_trips.iter().map(|rt| rt.pnl()).sum();

    let win_rate = if total_trades > 0 {
        winning_trades as f64 / total_trades as f64 * 100.0
    } else {
        0.0
    };

    let profit_factor = if losing_trades > 0 {
        winning_trades as f64 / losing_trades as f64
    } else if winning_trades > 0 {
        f64::INFINITY
    } else {
        0.0
    };

    BacktestPerformance {
        total_return,
        annualized_return,
        max_drawdown,
        win_rate,
        sharpe_ratio,
        profit_factor,
        total_trades,
        winning_trades,
        losing_trades,
        realized_pnl,
        final_equity,
    }
}

/// (1 + total/100)^(365/days) - 1, in percent.
fn annualize(total_return_pct: f64, period_days: i64) -> f64 {
    if period_days <= 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return_pct / 100.0;
    if growth <= 0.0 {
        return -100.0;
    }
    (growth.powf(CALENDAR_DAYS_PER_YEAR / period_days as f64) - 1.0) * 100.0
}

/// Largest peak-to-trough decline in percent. The peak starts at the
/// initial capital, so an immediate loss counts as drawdown.
fn compute_max_drawdown(equity: &[EquityPoint], initial_capital: f64) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;

    for point in equity {
        peak = peak.max(point.value);
        if peak > 0.0 {
            let dd = (peak - point.value) / peak * 100.0;
            max_dd = max_dd.max(dd);
        }
    }

    max_dd
}

/// Annualized mean/stddev of daily returns (population stddev).
fn compute_sharpe(equity: &[EquityPoint]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| {
            let prev = w[0].value;
            if prev > 0.0 { w[1].value / prev - 1.0 } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
