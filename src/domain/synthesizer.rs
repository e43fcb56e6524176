//! Synthetic daily price series.
//!
//! Random walk with uniform daily moves. The generator is passed in so runs
//! are reproducible under a seeded RNG.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;

use super::error::TradesimError;
use super::ohlcv::PriceBar;

pub const DEFAULT_SEED_PRICE: f64 = 100.0;

/// Largest absolute daily close-to-close move, as a fraction.
const MAX_DAILY_CHANGE: f64 = 0.02;
/// Largest intraday extension beyond open/close, as a fraction.
const MAX_WICK: f64 = 0.01;
const MIN_VOLUME: u64 = 100_000;
const MAX_VOLUME: u64 = 1_000_000;

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of weekdays in `[start_date, end_date]`.
pub fn count_trading_days(start_date: NaiveDate, end_date: NaiveDate) -> usize {
    start_date
        .iter_days()
        .take_while(|d| *d <= end_date)
        .filter(|d| is_trading_day(*d))
        .count()
}

/// One bar per weekday in `[start_date, end_date]`, weekends skipped.
pub fn synthesize<R: Rng + ?Sized>(
    start_date: NaiveDate,
    end_date: NaiveDate,
    seed_price: f64,
    rng: &mut R,
) -> Result<Vec<PriceBar>, TradesimError> {
    if end_date < start_date {
        return Err(TradesimError::invalid_input(
            "end_date",
            format!("{} is before start_date {}", end_date, start_date),
        ));
    }
    if !(seed_price.is_finite() && seed_price > 0.0) {
        return Err(TradesimError::invalid_input(
            "seed_price",
            "seed_price must be a positive number",
        ));
    }

    let mut bars = Vec::with_capacity(count_trading_days(start_date, end_date));
    let mut current_price = seed_price;

    for date in start_date.iter_days().take_while(|d| *d <= end_date) {
        if !is_trading_day(date) {
            continue;
        }

        let change = rng.gen_range(-MAX_DAILY_CHANGE..=MAX_DAILY_CHANGE);
        let open = current_price;
        let close = current_price * (1.0 + change);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..=MAX_WICK));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..=MAX_WICK));
        let volume = rng.gen_range(MIN_VOLUME..MAX_VOLUME);

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });

        current_price = close;
    }

    Ok(bars)
}
