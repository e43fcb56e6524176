//! Trade fills emitted by the signal engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => write!(f, "buy"),
            TradeType::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignal {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub price: f64,
    pub size: u64,
    pub value: f64,
}

impl TradeSignal {
    pub fn new(date: NaiveDate, trade_type: TradeType, price: f64, size: u64) -> Self {
        TradeSignal {
            date,
            trade_type,
            price,
            size,
            value: price * size as f64,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.trade_type == TradeType::Buy
    }
}

/// An opening buy matched with the sell that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip<'a> {
    pub entry: &'a TradeSignal,
    pub exit: &'a TradeSignal,
}

impl RoundTrip<'_> {
    pub fn is_win(&self) -> bool {
        self.exit.price > self.entry.price
    }

    pub fn pnl(&self) -> f64 {
        (self.exit.price - self.entry.price) * self.entry.size as f64
    }
}

/// Pair each buy with the next sell, scanning in order.
///
/// Assumes a single-position log: a sell with no open buy and a trailing
/// unclosed buy are both ignored.
pub fn pair_round_trips(trades: &[TradeSignal]) -> Vec<RoundTrip<'_>> {
    let mut pairs = Vec::new();
    let mut open: Option<&TradeSignal> = None;

    for trade in trades {
        match (trade.is_buy(), open) {
            (true, None) => open = Some(trade),
            (false, Some(entry)) => {
                pairs.push(RoundTrip { entry, exit: trade });
                open = None;
            }
            _ => {}
        }
    }

    pairs
}
