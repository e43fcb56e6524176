//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const FALLBACK_SYNTHETIC: &str = "synthetic";
pub const FALLBACK_NONE: &str = "none";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_ticker(config)?;
    validate_initial_capital(config)?;
    validate_costs(config)?;
    validate_dates(config)?;
    validate_run_options(config)
}

/// `[backtest]` keys that steer a run regardless of where the request fields
/// come from: seed, seed_price, fallback.
pub fn validate_run_options(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_seed(config)?;
    validate_seed_price(config)?;
    validate_fallback(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_periods(config)?;
    Ok(())
}

pub fn validate_chunking_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let chunk_size = config.get_int("chunking", "chunk_size", 1000);
    let overlap = config.get_int("chunking", "overlap", 200);
    if chunk_size <= 0 {
        return Err(invalid("chunking", "chunk_size", "chunk_size must be positive"));
    }
    if overlap < 0 || overlap >= chunk_size {
        return Err(invalid(
            "chunking",
            "overlap",
            "overlap must be non-negative and smaller than chunk_size",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string("backtest", "ticker") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("backtest", "ticker", "ticker must not be empty")),
        None => Err(TradesimError::ConfigMissing {
            section: "backtest".to_string(),
            key: "ticker".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    for key in ["commission", "slippage"] {
        if config.get_double("backtest", key, 0.0) < 0.0 {
            return Err(invalid("backtest", key, "must be non-negative"));
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if end_date < start_date {
        return Err(invalid(
            "backtest",
            "end_date",
            "end_date must not be before start_date",
        ));
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TradesimError> {
    match value {
        None => Err(TradesimError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TradesimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_seed(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string("backtest", "seed") {
        Some(s) if s.trim().parse::<u64>().is_err() => Err(invalid(
            "backtest",
            "seed",
            "seed must be a non-negative integer",
        )),
        _ => Ok(()),
    }
}

fn validate_seed_price(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", "seed_price", 100.0);
    if value <= 0.0 {
        return Err(invalid("backtest", "seed_price", "seed_price must be positive"));
    }
    Ok(())
}

fn validate_fallback(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string("backtest", "fallback") {
        None => Ok(()),
        Some(s) => match s.trim().to_lowercase().as_str() {
            FALLBACK_SYNTHETIC | FALLBACK_NONE => Ok(()),
            _ => Err(invalid(
                "backtest",
                "fallback",
                "fallback must be 'synthetic' or 'none'",
            )),
        },
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let short = config.get_int("strategy", "short_period", 10);
    let long = config.get_int("strategy", "long_period", 30);

    if short < 1 {
        return Err(invalid(
            "strategy",
            "short_period",
            "short_period must be at least 1",
        ));
    }
    if long <= short {
        return Err(invalid(
            "strategy",
            "long_period",
            "long_period must be greater than short_period",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[backtest]
ticker = AAPL
start_date = 2023-01-02
end_date = 2023-12-29
initial_capital = 10000
seed = 42

[strategy]
short_period = 5
long_period = 20
"#;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    /// VALID with `key = value` set in [backtest], replacing any existing key.
    fn with_backtest_line(line: &str) -> FileConfigAdapter {
        let key = line.split('=').next().unwrap().trim();
        let content: Vec<String> = VALID
            .lines()
            .filter(|l| l.split('=').next().unwrap().trim() != key)
            .map(|l| {
                if l == "[backtest]" {
                    format!("[backtest]\n{}", line)
                } else {
                    l.to_string()
                }
            })
            .collect();
        adapter(&content.join("\n"))
    }

    fn assert_invalid(result: Result<(), TradesimError>, expected_key: &str) {
        match result {
            Err(TradesimError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = adapter(VALID);
        assert!(validate_backtest_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn missing_ticker() {
        let config = adapter("[backtest]\nstart_date = 2023-01-02\nend_date = 2023-02-01\ninitial_capital = 1\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(TradesimError::ConfigMissing { ref key, .. }) if key == "ticker"
        ));
    }

    #[test]
    fn non_positive_capital() {
        assert_invalid(
            validate_backtest_config(&with_backtest_line("initial_capital = 0")),
            "initial_capital",
        );
    }

    #[test]
    fn negative_commission() {
        assert_invalid(
            validate_backtest_config(&with_backtest_line("commission = -1")),
            "commission",
        );
    }

    #[test]
    fn reversed_dates() {
        assert_invalid(
            validate_backtest_config(&with_backtest_line("end_date = 2022-01-01")),
            "end_date",
        );
    }

    #[test]
    fn same_start_and_end_is_allowed() {
        let config = with_backtest_line("end_date = 2023-01-02");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn bad_date_format() {
        assert_invalid(
            validate_backtest_config(&with_backtest_line("start_date = 2023/01/02")),
            "start_date",
        );
    }

    #[test]
    fn missing_end_date() {
        let config = adapter("[backtest]\nticker = X\nstart_date = 2023-01-02\ninitial_capital = 1\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(TradesimError::ConfigMissing { ref key, .. }) if key == "end_date"
        ));
    }

    #[test]
    fn bad_seed() {
        assert_invalid(
            validate_backtest_config(&with_backtest_line("seed = -3")),
            "seed",
        );
    }

    #[test]
    fn bad_seed_price() {
        assert_invalid(
            validate_backtest_config(&with_backtest_line("seed_price = 0")),
            "seed_price",
        );
    }

    #[test]
    fn fallback_values() {
        assert!(validate_backtest_config(&with_backtest_line("fallback = synthetic")).is_ok());
        assert!(validate_backtest_config(&with_backtest_line("fallback = None")).is_ok());
        assert_invalid(
            validate_backtest_config(&with_backtest_line("fallback = retry")),
            "fallback",
        );
    }

    #[test]
    fn run_options_checked_without_request_fields() {
        assert!(validate_run_options(&adapter("[backtest]\n")).is_ok());
        assert_invalid(validate_run_options(&adapter("[backtest]\nseed = abc\n")), "seed");
        assert_invalid(
            validate_run_options(&adapter("[backtest]\nfallback = bogus\n")),
            "fallback",
        );
        assert_invalid(
            validate_run_options(&adapter("[backtest]\nseed_price = -5\n")),
            "seed_price",
        );
    }

    #[test]
    fn periods_must_be_ordered() {
        let config = adapter("[strategy]\nshort_period = 30\nlong_period = 10\n");
        assert_invalid(validate_strategy_config(&config), "long_period");

        let config = adapter("[strategy]\nshort_period = 0\n");
        assert_invalid(validate_strategy_config(&config), "short_period");
    }

    #[test]
    fn strategy_defaults_are_valid() {
        assert!(validate_strategy_config(&adapter("[strategy]\n")).is_ok());
    }

    #[test]
    fn chunking_bounds() {
        assert!(validate_chunking_config(&adapter("[chunking]\n")).is_ok());
        assert_invalid(
            validate_chunking_config(&adapter("[chunking]\nchunk_size = 100\noverlap = 100\n")),
            "overlap",
        );
        assert_invalid(
            validate_chunking_config(&adapter("[chunking]\nchunk_size = 0\n")),
            "chunk_size",
        );
    }
}
