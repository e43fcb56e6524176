//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{self, JsonReportAdapter};
use crate::domain::backtest::{
    fetch_real_backtest, simulate_backtest, BacktestParameters, BacktestRequest, BacktestResult,
    StrategyDescriptor, DATE_FORMAT,
};
use crate::domain::chunker::{chunk_text, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::domain::config_validation::{
    validate_backtest_config, validate_chunking_config, validate_run_options,
    validate_strategy_config, FALLBACK_NONE,
};
use crate::domain::crossover::{CrossoverParams, DEFAULT_LONG_PERIOD, DEFAULT_SHORT_PERIOD};
use crate::domain::error::TradesimError;
use crate::domain::narrative::format_market_report;
use crate::domain::synthesizer::{synthesize, DEFAULT_SEED_PRICE};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "SMA crossover backtester with a synthetic market")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// JSON request document used instead of the [backtest] section
        #[arg(short, long)]
        request: Option<PathBuf>,
        /// JSON report path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overrides [backtest] seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a synthetic price series as CSV
    Synthesize {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = DEFAULT_SEED_PRICE)]
        seed_price: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a market narrative for a date,price,open,high,low,volume CSV
    Report {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Split a text file into overlapping chunks
    Chunk {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
        /// Reads [chunking] defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in a CSV data directory
    Tickers {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

/// What to do when real market data cannot be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    Synthetic,
    Fail,
}

impl FallbackPolicy {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        match config.get_string("backtest", "fallback") {
            Some(s) if s.trim().eq_ignore_ascii_case(FALLBACK_NONE) => FallbackPolicy::Fail,
            _ => FallbackPolicy::Synthetic,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            request,
            output,
            seed,
        } => run_backtest(&config, request.as_deref(), output.as_ref(), seed),
        Command::Synthesize {
            start,
            end,
            seed,
            seed_price,
            output,
        } => run_synthesize(&start, &end, seed, seed_price, output.as_ref()),
        Command::Report { input } => run_report(&input),
        Command::Chunk {
            input,
            chunk_size,
            overlap,
            config,
        } => run_chunk(&input, chunk_size, overlap, config.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Tickers { data_dir } => run_tickers(&data_dir),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradesimError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_request(config: &dyn ConfigPort) -> Result<BacktestRequest, TradesimError> {
    let required = |key: &str| {
        config
            .get_string("backtest", key)
            .ok_or_else(|| TradesimError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })
    };

    Ok(BacktestRequest {
        parameters: BacktestParameters {
            ticker: required("ticker")?.trim().to_uppercase(),
            start_date: required("start_date")?.trim().to_string(),
            end_date: required("end_date")?.trim().to_string(),
            initial_capital: config.get_double("backtest", "initial_capital", 10_000.0),
            commission: config.get_optional_double("backtest", "commission"),
            slippage: config.get_optional_double("backtest", "slippage"),
        },
        strategy: StrategyDescriptor {
            code: config.get_string("strategy", "code").unwrap_or_default(),
            name: config.get_string("strategy", "name"),
            description: config.get_string("strategy", "description"),
        },
    })
}

pub fn build_crossover_params(config: &dyn ConfigPort) -> CrossoverParams {
    let period = |key: &str, default: usize| {
        usize::try_from(config.get_int("strategy", key, default as i64)).unwrap_or(default)
    };
    CrossoverParams {
        short_period: period("short_period", DEFAULT_SHORT_PERIOD),
        long_period: period("long_period", DEFAULT_LONG_PERIOD),
    }
}

/// CLI seed wins over the config seed; neither means an entropy-seeded run.
pub fn resolve_seed(cli_seed: Option<u64>, config: &dyn ConfigPort) -> Option<u64> {
    cli_seed.or_else(|| {
        config
            .get_string("backtest", "seed")
            .and_then(|s| s.trim().parse().ok())
    })
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Real data when a port is configured, falling back to a synthetic series
/// only for data-source failures and only when the policy allows it.
pub fn run_backtest_pipeline(
    request: &BacktestRequest,
    params: &CrossoverParams,
    data_port: Option<&dyn DataPort>,
    policy: FallbackPolicy,
    seed_price: f64,
    seed: Option<u64>,
) -> Result<BacktestResult, TradesimError> {
    let Some(port) = data_port else {
        return simulate_backtest(request, params, Some(seed_price), &mut make_rng(seed));
    };

    match fetch_real_backtest(request, params, port) {
        Ok(result) => Ok(result),
        Err(e @ (TradesimError::DataSource { .. } | TradesimError::NoData { .. }))
            if policy == FallbackPolicy::Synthetic =>
        {
            warn!(error = %e, "market data unavailable, using synthetic series");
            simulate_backtest(request, params, Some(seed_price), &mut make_rng(seed))
        }
        Err(e) => Err(e),
    }
}

fn run_backtest(
    config_path: &Path,
    request_path: Option<&Path>,
    output_path: Option<&PathBuf>,
    cli_seed: Option<u64>,
) -> Result<(), TradesimError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    match request_path {
        Some(_) => validate_run_options(&adapter)?,
        None => validate_backtest_config(&adapter)?,
    }
    validate_strategy_config(&adapter)?;

    // Stage 2: Build request and strategy parameters
    let request = match request_path {
        Some(path) => {
            info!(path = %path.display(), "loading request");
            json_report_adapter::read_request(fs::File::open(path)?)?
        }
        None => build_backtest_request(&adapter)?,
    };
    let params = build_crossover_params(&adapter);
    let seed = resolve_seed(cli_seed, &adapter);
    let seed_price = adapter.get_double("backtest", "seed_price", DEFAULT_SEED_PRICE);
    let policy = FallbackPolicy::from_config(&adapter);

    info!(
        ticker = %request.parameters.ticker,
        start = %request.parameters.start_date,
        end = %request.parameters.end_date,
        short = params.short_period,
        long = params.long_period,
        "running backtest"
    );

    // Stage 3: Run against real data or the synthesizer
    let csv_port = adapter
        .get_string("backtest", "data_dir")
        .map(|dir| CsvAdapter::new(PathBuf::from(dir)));
    let result = run_backtest_pipeline(
        &request,
        &params,
        csv_port.as_ref().map(|p| p as &dyn DataPort),
        policy,
        seed_price,
        seed,
    )?;

    // Stage 4: Console summary to stderr
    print_summary(&request, &result);

    // Stage 5: Report
    let output = output_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    JsonReportAdapter.write(&result, &request, &output)?;
    if output != "-" {
        eprintln!("\nReport written to: {}", output);
    }
    Ok(())
}

fn print_summary(request: &BacktestRequest, result: &BacktestResult) {
    let perf = &result.performance;
    let name = request
        .strategy
        .name
        .as_deref()
        .unwrap_or("SMA Crossover");

    eprintln!("\n=== {} on {} ===", name, request.parameters.ticker);
    if let Some(message) = &result.message {
        eprintln!("Note:             {}", message);
    }
    eprintln!("Bars:             {}", result.price_data.len());
    eprintln!("Final Equity:     ${:.2}", perf.final_equity);
    eprintln!("Total Return:     {:.2}%", perf.total_return);
    eprintln!("Annualized:       {:.2}%", perf.annualized_return);
    eprintln!("Sharpe Ratio:     {:.2}", perf.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", perf.max_drawdown);
    eprintln!("Round Trips:      {}", perf.total_trades);
    eprintln!("Win Rate:         {:.1}%", perf.win_rate);
    eprintln!("Realized P&L:     ${:.2}", perf.realized_pnl);
    if perf.profit_factor.is_infinite() {
        eprintln!("Profit Factor:    inf");
    } else {
        eprintln!("Profit Factor:    {:.2}", perf.profit_factor);
    }
}

fn run_synthesize(
    start: &str,
    end: &str,
    seed: Option<u64>,
    seed_price: f64,
    output_path: Option<&PathBuf>,
) -> Result<(), TradesimError> {
    let parse = |value: &str, field: &str| {
        chrono::NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            TradesimError::invalid_input(field, format!("'{}' is not a YYYY-MM-DD date", value))
        })
    };
    let start_date = parse(start, "start")?;
    let end_date = parse(end, "end")?;

    let bars = synthesize(start_date, end_date, seed_price, &mut make_rng(seed))?;
    info!(bars = bars.len(), "synthesized series");

    match output_path {
        Some(path) => {
            let file = fs::File::create(path)?;
            csv_adapter::write_bars(file, &bars)?;
            eprintln!("Wrote {} bars to {}", bars.len(), path.display());
        }
        None => csv_adapter::write_bars(std::io::stdout().lock(), &bars)?,
    }
    Ok(())
}

fn run_report(input: &Path) -> Result<(), TradesimError> {
    let file = fs::File::open(input)?;
    let series = csv_adapter::read_market_series(file)?;
    info!(points = series.len(), "loaded market series");
    println!("{}", format_market_report(&series));
    Ok(())
}

fn run_chunk(
    input: &Path,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    config_path: Option<&PathBuf>,
) -> Result<(), TradesimError> {
    let (mut size, mut lap) = (DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP);
    if let Some(path) = config_path {
        let adapter = load_config(path)?;
        validate_chunking_config(&adapter)?;
        size = adapter.get_int("chunking", "chunk_size", size as i64) as usize;
        lap = adapter.get_int("chunking", "overlap", lap as i64) as usize;
    }
    let size = chunk_size.unwrap_or(size);
    let lap = overlap.unwrap_or(lap);

    let text = fs::read_to_string(input)?;
    let chunks = chunk_text(&text, size, lap)?;
    info!(chunks = chunks.len(), chunk_size = size, overlap = lap, "chunked text");

    let mut out = std::io::stdout().lock();
    for (i, chunk) in chunks.iter().enumerate() {
        writeln!(out, "--- chunk {} ({} chars) ---", i + 1, chunk.chars().count())?;
        writeln!(out, "{}", chunk)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradesimError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    validate_chunking_config(&adapter)?;

    let request = build_backtest_request(&adapter)?;
    let validated = request.validate()?;
    let params = build_crossover_params(&adapter);

    eprintln!("Ticker:           {}", validated.ticker);
    eprintln!(
        "Window:           {} to {} ({} days)",
        validated.start_date,
        validated.end_date,
        validated.period_days()
    );
    eprintln!("Initial Capital:  ${:.2}", validated.initial_capital);
    eprintln!(
        "Strategy:         SMA({}) / SMA({})",
        params.short_period, params.long_period
    );
    match adapter.get_string("backtest", "data_dir") {
        Some(dir) => eprintln!(
            "Data:             {} (fallback: {:?})",
            dir,
            FallbackPolicy::from_config(&adapter)
        ),
        None => eprintln!("Data:             synthetic"),
    }
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_tickers(data_dir: &Path) -> Result<(), TradesimError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let tickers = adapter.list_tickers()?;
    if tickers.is_empty() {
        eprintln!("No tickers found in {}", data_dir.display());
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    Ok(())
}
