use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange venue inferred from the shape of a ticker symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    /// Mainland China A-share (six digits, e.g. "600519")
    ChinaA,
    /// Hong Kong (4-5 digits with ".HK" suffix, e.g. "0700.HK")
    HongKong,
    /// United States (1-5 uppercase letters, e.g. "AAPL")
    Us,
    /// Anything that matches none of the known shapes
    Unknown,
}

impl Market {
    /// Classifies a ticker by its symbol shape alone.
    #[must_use]
    pub fn classify(ticker: &str) -> Self {
        let t = ticker.trim();
        if t.len() == 6 && t.bytes().all(|b| b.is_ascii_digit()) {
            return Self::ChinaA;
        }
        if let Some(code) = t.strip_suffix(".HK") {
            if (4..=5).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit()) {
                return Self::HongKong;
            }
        }
        if (1..=5).contains(&t.len()) && t.bytes().all(|b| b.is_ascii_uppercase()) {
            return Self::Us;
        }
        Self::Unknown
    }

    /// ISO currency code the market trades in. Unknown defaults to USD.
    #[must_use]
    pub const fn currency(self) -> &'static str {
        match self {
            Self::ChinaA => "CNY",
            Self::HongKong => "HKD",
            Self::Us | Self::Unknown => "USD",
        }
    }

    /// Display symbol for prices in this market's currency.
    #[must_use]
    pub const fn currency_symbol(self) -> &'static str {
        match self {
            Self::ChinaA => "¥",
            Self::HongKong => "HK$",
            Self::Us | Self::Unknown => "$",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ChinaA => "China A-share",
            Self::HongKong => "Hong Kong",
            Self::Us => "US",
            Self::Unknown => "unknown market",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
