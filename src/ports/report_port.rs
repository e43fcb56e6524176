//! Report generation port trait.

use crate::domain::backtest::{BacktestRequest, BacktestResult};
use crate::domain::error::TradesimError;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        request: &BacktestRequest,
        output_path: &str,
    ) -> Result<(), TradesimError>;
}
