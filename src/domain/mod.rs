//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod portfolio;
pub mod indicator;
pub mod synthesizer;
pub mod crossover;
pub mod metrics;
pub mod backtest;
pub mod chunker;
pub mod narrative;
pub mod config_validation;
pub mod error;
