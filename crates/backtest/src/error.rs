use chrono::NaiveDate;
use thiserror::Error;

/// Errors from configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A config bound was violated.
    #[error("invalid simulator config: {0}")]
    InvalidConfig(String),

    /// The requested period is inverted.
    #[error("invalid period: end {end} is before start {start}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    /// No prices to replay against.
    #[error("no price data for {ticker} in the requested period")]
    EmptyPrices { ticker: String },
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_lowercase_and_specific() {
        let err = SimulationError::EmptyPrices {
            ticker: "0700.HK".to_string(),
        };
        assert_eq!(err.to_string(), "no price data for 0700.HK in the requested period");

        let err = SimulationError::InvalidPeriod {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        };
        assert!(err.to_string().contains("end 2024-04-01 is before start 2024-05-01"));
    }
}
