//! JSON report adapter.
//!
//! Writes `{ "request": ..., "result": ... }` pretty-printed. A path of `-`
//! writes to stdout. Requests can be read back from the same camelCase JSON.

use crate::domain::backtest::{BacktestRequest, BacktestResult};
use crate::domain::error::TradesimError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};

#[derive(Serialize)]
struct ReportDocument<'a> {
    request: &'a BacktestRequest,
    result: &'a BacktestResult,
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn render(
        result: &BacktestResult,
        request: &BacktestRequest,
    ) -> Result<String, TradesimError> {
        let doc = ReportDocument { request, result };
        serde_json::to_string_pretty(&doc).map_err(|e| TradesimError::Serialization {
            reason: e.to_string(),
        })
    }
}

/// Parse a standalone `BacktestRequest` document.
pub fn read_request<R: Read>(reader: R) -> Result<BacktestRequest, TradesimError> {
    serde_json::from_reader(reader).map_err(|e| TradesimError::Serialization {
        reason: format!("invalid backtest request: {}", e),
    })
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        request: &BacktestRequest,
        output_path: &str,
    ) -> Result<(), TradesimError> {
        let mut content = Self::render(result, request)?;
        content.push('\n');
        if output_path == "-" {
            std::io::stdout().lock().write_all(content.as_bytes())?;
        } else {
            fs::write(output_path, content)?;
        }
        Ok(())
    }
}
