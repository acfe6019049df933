use thiserror::Error;

/// Errors that can occur when loading market data.
#[derive(Debug, Error)]
pub enum DataError {
    /// No price data exists for the requested ticker and window.
    #[error("no price data for {ticker}: {detail}")]
    Unavailable {
        /// Ticker that had no data.
        ticker: String,
        /// What exactly was missing.
        detail: String,
    },

    /// The source exists but its contents are invalid.
    #[error("malformed price data: {0}")]
    Malformed(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Creates an unavailable-data error.
    pub fn unavailable(ticker: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unavailable {
            ticker: ticker.into(),
            detail: detail.into(),
        }
    }

    /// Creates a malformed-data error.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Result type alias for market-data operations.
pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display_names_the_ticker() {
        let err = DataError::unavailable("600519", "no file in data/prices");
        assert!(err.to_string().contains("600519"));
        assert!(err.to_string().contains("no file"));
    }

    #[test]
    fn malformed_display_is_lowercase() {
        let err = DataError::malformed("duplicate date 2024-03-01");
        assert!(err.to_string().starts_with("malformed price data"));
    }
}
