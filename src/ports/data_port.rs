//! Market data access port trait.
//!
//! Anything that can serve daily bars for a ticker: CSV files, a database,
//! an HTTP provider.

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` in `[start_date, end_date]`, ascending by date.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TradesimError>;

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError>;
}
