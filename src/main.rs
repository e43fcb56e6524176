use clap::Parser;
use tradesim::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    // Logs go to stderr so stdout stays clean for reports and CSV output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}
