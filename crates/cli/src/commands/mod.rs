pub mod analyze;
pub mod backtest;
