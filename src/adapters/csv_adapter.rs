//! CSV file data adapter.
//!
//! Price files live at `<base_path>/<TICKER>.csv` with header
//! `date,open,high,low,close,volume`. Market series for the narrative report
//! use `date,price,open,high,low,volume`.

use crate::domain::error::TradesimError;
use crate::domain::narrative::OilDataPoint;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn data_error(reason: impl Into<String>) -> TradesimError {
    TradesimError::DataSource {
        reason: reason.into(),
    }
}

fn parse_field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, TradesimError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| data_error(format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("invalid {} value: {}", name, e)))
}

fn parse_date(record: &csv::StringRecord) -> Result<NaiveDate, TradesimError> {
    let date_str = record
        .get(0)
        .ok_or_else(|| data_error("missing date column"))?;
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| data_error(format!("invalid date format: {}", e)))
}

/// Parse a price CSV, keeping rows inside the inclusive date range.
pub fn read_bars<R: Read>(
    reader: R,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<PriceBar>, TradesimError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

        let date = parse_date(&record)?;
        if date < start_date || date > end_date {
            continue;
        }

        let bar = PriceBar {
            date,
            open: parse_field(&record, 1, "open")?,
            high: parse_field(&record, 2, "high")?,
            low: parse_field(&record, 3, "low")?,
            close: parse_field(&record, 4, "close")?,
            volume: parse_field(&record, 5, "volume")?,
        };
        if !bar.is_consistent() {
            return Err(data_error(format!(
                "inconsistent OHLC values on {}",
                bar.date
            )));
        }
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    if bars.windows(2).any(|w| w[0].date == w[1].date) {
        return Err(data_error("duplicate dates in price series"));
    }
    Ok(bars)
}

/// Write bars with the same header `read_bars` expects.
pub fn write_bars<W: Write>(writer: W, bars: &[PriceBar]) -> Result<(), TradesimError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let encode = |e: csv::Error| data_error(format!("CSV write error: {}", e));

    wtr.write_record(["date", "open", "high", "low", "close", "volume"])
        .map_err(encode)?;
    for bar in bars {
        wtr.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            format!("{:.4}", bar.open),
            format!("{:.4}", bar.high),
            format!("{:.4}", bar.low),
            format!("{:.4}", bar.close),
            bar.volume.to_string(),
        ])
        .map_err(encode)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse a `date,price,open,high,low,volume` series, in file order.
pub fn read_market_series<R: Read>(reader: R) -> Result<Vec<OilDataPoint>, TradesimError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;
        points.push(OilDataPoint {
            date: parse_date(&record)?,
            price: parse_field(&record, 1, "price")?,
            open: parse_field(&record, 2, "open")?,
            high: parse_field(&record, 3, "high")?,
            low: parse_field(&record, 4, "low")?,
            volume: parse_field(&record, 5, "volume")?,
        });
    }

    Ok(points)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TradesimError> {
        let path = self.csv_path(ticker);
        let file = fs::File::open(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;
        read_bars(file, start_date, end_date)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not a price file").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_ohlcv("AAPL", date(2024, 1, 15), date(2024, 1, 17))
            .unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(2024, 1, 15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, date(2024, 1, 17));
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_ohlcv("AAPL", date(2024, 1, 16), date(2024, 1, 16))
            .unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2024, 1, 16));
    }

    #[test]
    fn fetch_ohlcv_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_ohlcv("XYZ", date(2024, 1, 1), date(2024, 1, 31));
        assert!(matches!(result, Err(TradesimError::DataSource { .. })));
    }

    #[test]
    fn inconsistent_row_is_rejected() {
        let csv = "date,open,high,low,close,volume\n2024-01-15,100.0,99.0,90.0,95.0,10\n";
        let result = read_bars(csv.as_bytes(), date(2024, 1, 1), date(2024, 12, 31));
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = "date,open,high,low,close,volume\n\
            2024-01-15,100,110,90,105,10\n\
            2024-01-15,100,110,90,105,10\n";
        let result = read_bars(csv.as_bytes(), date(2024, 1, 1), date(2024, 12, 31));
        assert!(result.is_err());
    }

    #[test]
    fn bad_number_names_column() {
        let csv = "date,open,high,low,close,volume\n2024-01-15,abc,110,90,105,10\n";
        let err = read_bars(csv.as_bytes(), date(2024, 1, 1), date(2024, 12, 31)).unwrap_err();
        assert!(err.to_string().contains("invalid open value"));
    }

    #[test]
    fn written_bars_read_back() {
        let bars = vec![PriceBar {
            date: date(2024, 2, 1),
            open: 10.0,
            high: 11.5,
            low: 9.25,
            close: 11.0,
            volume: 123_456,
        }];
        let mut buf = Vec::new();
        write_bars(&mut buf, &bars).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("date,open,high,low,close,volume\n"));
        assert!(text.contains("2024-02-01,10.0000,11.5000,9.2500,11.0000,123456"));

        let back = read_bars(buf.as_slice(), date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(back, bars);
    }

    #[test]
    fn market_series_keeps_file_order() {
        let csv = "date,price,open,high,low,volume\n\
            2024-05-02,81.5,80.0,82.0,79.5,1200000\n\
            2024-05-01,80.0,79.0,80.5,78.0,950000\n";
        let points = read_market_series(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2024, 5, 2));
        assert_eq!(points[0].price, 81.5);
        assert_eq!(points[1].volume, 950_000);
    }

    #[test]
    fn list_tickers_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let tickers = adapter.list_tickers().unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }
}
