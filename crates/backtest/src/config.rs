//! Simulator configuration.

use crate::error::{Result, SimulationError};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stock_council_core::BacktestConfig;

/// How much of available cash an entry commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizingPolicy {
    /// Commit all available cash.
    FullEquity,
    /// Commit a fixed fraction of available cash, in (0, 1].
    FixedFraction(Decimal),
}

impl SizingPolicy {
    /// The cash fraction this policy commits.
    #[must_use]
    pub fn fraction(self) -> Decimal {
        match self {
            Self::FullEquity => Decimal::ONE,
            Self::FixedFraction(f) => f,
        }
    }
}

/// Parameters of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Starting cash.
    pub capital: Decimal,
    /// Entry sizing policy.
    pub sizing: SizingPolicy,
    /// Fee in basis points of executed notional.
    pub fee_bps: u32,
    /// Trading days between a recommendation and its execution.
    pub execution_delay_days: u32,
    /// Whether SELL while flat opens a short.
    pub allow_short: bool,
    /// Whether BUY while long adds to the position.
    pub averaging_in: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            capital: dec!(10_000),
            sizing: SizingPolicy::FullEquity,
            fee_bps: 0,
            execution_delay_days: 1,
            allow_short: false,
            averaging_in: false,
        }
    }
}

impl SimulatorConfig {
    #[must_use]
    pub fn with_capital(mut self, capital: Decimal) -> Self {
        self.capital = capital;
        self
    }

    #[must_use]
    pub fn with_sizing(mut self, sizing: SizingPolicy) -> Self {
        self.sizing = sizing;
        self
    }

    #[must_use]
    pub fn with_fee_bps(mut self, fee_bps: u32) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    #[must_use]
    pub fn with_execution_delay_days(mut self, days: u32) -> Self {
        self.execution_delay_days = days;
        self
    }

    #[must_use]
    pub fn with_allow_short(mut self, allow_short: bool) -> Self {
        self.allow_short = allow_short;
        self
    }

    #[must_use]
    pub fn with_averaging_in(mut self, averaging_in: bool) -> Self {
        self.averaging_in = averaging_in;
        self
    }

    /// Fee rate as a fraction of notional.
    #[must_use]
    pub fn fee_rate(&self) -> Decimal {
        Decimal::from(self.fee_bps) / dec!(10_000)
    }

    /// Checks every config bound.
    ///
    /// # Errors
    /// Returns [`SimulationError::InvalidConfig`] naming the first
    /// violated bound.
    pub fn validate(&self) -> Result<()> {
        if self.capital <= Decimal::ZERO {
            return Err(SimulationError::InvalidConfig(format!(
                "starting capital must be positive, got {}",
                self.capital
            )));
        }
        if self.execution_delay_days == 0 {
            return Err(SimulationError::InvalidConfig(
                "execution delay must be at least one trading day".to_string(),
            ));
        }
        if let SizingPolicy::FixedFraction(f) = self.sizing {
            if f <= Decimal::ZERO || f > Decimal::ONE {
                return Err(SimulationError::InvalidConfig(format!(
                    "sizing fraction must be in (0, 1], got {f}"
                )));
            }
        }
        Ok(())
    }
}

impl From<&BacktestConfig> for SimulatorConfig {
    fn from(cfg: &BacktestConfig) -> Self {
        let defaults = Self::default();
        let capital = Decimal::from_f64(cfg.capital)
            .filter(|c| *c > Decimal::ZERO)
            .unwrap_or(defaults.capital);
        let sizing = match Decimal::from_f64(cfg.sizing_fraction) {
            Some(f) if f > Decimal::ZERO && f < Decimal::ONE => SizingPolicy::FixedFraction(f),
            _ => SizingPolicy::FullEquity,
        };
        Self {
            capital,
            sizing,
            fee_bps: cfg.fee_bps,
            execution_delay_days: cfg.execution_delay_days.max(1),
            allow_short: cfg.allow_short,
            averaging_in: cfg.averaging_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capital_is_rejected() {
        let cfg = SimulatorConfig::default().with_capital(Decimal::ZERO);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("capital"));
    }

    #[test]
    fn zero_delay_is_rejected() {
        let cfg = SimulatorConfig::default().with_execution_delay_days(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fraction_outside_unit_interval_is_rejected() {
        let cfg = SimulatorConfig::default().with_sizing(SizingPolicy::FixedFraction(dec!(1.5)));
        assert!(cfg.validate().is_err());
        let cfg = SimulatorConfig::default().with_sizing(SizingPolicy::FixedFraction(dec!(0)));
        assert!(cfg.validate().is_err());
        let cfg = SimulatorConfig::default().with_sizing(SizingPolicy::FixedFraction(dec!(0.5)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn fee_rate_is_fraction_of_notional() {
        let cfg = SimulatorConfig::default().with_fee_bps(25);
        assert_eq!(cfg.fee_rate(), dec!(0.0025));
    }

    #[test]
    fn from_app_config_maps_fraction_and_clamps() {
        let app = BacktestConfig {
            capital: 50_000.0,
            fee_bps: 10,
            execution_delay_days: 0,
            sizing_fraction: 0.5,
            allow_short: true,
            averaging_in: false,
        };
        let cfg = SimulatorConfig::from(&app);
        assert_eq!(cfg.capital, dec!(50000));
        assert_eq!(cfg.sizing, SizingPolicy::FixedFraction(dec!(0.5)));
        assert_eq!(cfg.execution_delay_days, 1);
        assert!(cfg.allow_short);
    }

    #[test]
    fn from_app_config_full_fraction_is_full_equity() {
        let app = BacktestConfig::default();
        let cfg = SimulatorConfig::from(&app);
        assert_eq!(cfg.sizing, SizingPolicy::FullEquity);
        assert_eq!(cfg.capital, dec!(10000));
    }
}
