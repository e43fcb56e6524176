//! Single-position portfolio state and equity snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::signal::{TradeSignal, TradeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub cash: f64,
    pub holdings: f64,
}

/// Cash plus an optional long position. No shorting, no pyramiding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub position_size: u64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            position_size: 0,
        }
    }

    pub fn in_position(&self) -> bool {
        self.position_size != 0
    }

    /// Spend as much cash as whole shares allow. Returns `None` (and leaves
    /// the state untouched) when already long or when not even one share is
    /// affordable.
    pub fn buy_all(self, date: NaiveDate, price: f64) -> (Self, Option<TradeSignal>) {
        if self.in_position() || price <= 0.0 {
            return (self, None);
        }
        let size = (self.cash / price).floor() as u64;
        if size == 0 {
            return (self, None);
        }
        let trade = TradeSignal::new(date, TradeType::Buy, price, size);
        let next = PortfolioState {
            cash: self.cash - trade.value,
            position_size: size,
        };
        (next, Some(trade))
    }

    /// Liquidate the whole position. Returns `None` when flat.
    pub fn sell_all(self, date: NaiveDate, price: f64) -> (Self, Option<TradeSignal>) {
        if !self.in_position() {
            return (self, None);
        }
        let trade = TradeSignal::new(date, TradeType::Sell, price, self.position_size);
        let next = PortfolioState {
            cash: self.cash + trade.value,
            position_size: 0,
        };
        (next, Some(trade))
    }

    /// Snapshot valued at `price`.
    pub fn mark(&self, date: NaiveDate, price: f64) -> EquityPoint {
        let holdings = self.position_size as f64 * price;
        EquityPoint {
            date,
            value: self.cash + holdings,
            cash: self.cash,
            holdings,
        }
    }
}
