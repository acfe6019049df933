//! Deterministic replay of recommendation streams.
//!
//! This crate provides:
//! - [`BacktestEngine`], the chronological, no-look-ahead simulator
//! - [`SimulatorConfig`] with sizing, fee, and execution-delay policy
//! - [`summarize`], pure performance metrics over an equity curve
//! - [`ReportFormatter`] for the CLI's text report

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod portfolio;
pub mod report;

// Re-export main types for convenience
pub use config::{SimulatorConfig, SizingPolicy};
pub use engine::{BacktestEngine, BacktestRun};
pub use error::{Result, SimulationError};
pub use metrics::{summarize, PerformanceMetrics, TRADING_DAYS_PER_YEAR};
pub use portfolio::{ClosedTrade, PortfolioState, TradeSide};
pub use report::ReportFormatter;
