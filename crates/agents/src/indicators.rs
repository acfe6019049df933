//! Price indicators quoted to the technical analyst.
//!
//! Computed locally from the context window so the technical agent is
//! not asked to do arithmetic. All functions return `None` when the
//! window is too short for the period.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use stock_council_core::PricePoint;

/// Simple moving average of the last `period` closes.
#[must_use]
pub fn sma(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let sum: Decimal = window.iter().copied().sum();
    Some(sum / Decimal::from(period))
}

/// Relative strength index over the last `period` close-to-close moves.
///
/// Needs `period + 1` closes. A window with no losses reads 100, no
/// gains reads 0, and a flat window reads 50.
#[must_use]
pub fn rsi(closes: &[Decimal], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let tail = &closes[closes.len() - period - 1..];
    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    for pair in tail.windows(2) {
        let change = pair[1] - pair[0];
        if change > Decimal::ZERO {
            gains += change;
        } else {
            losses -= change;
        }
    }
    if gains.is_zero() && losses.is_zero() {
        return Some(50.0);
    }
    if losses.is_zero() {
        return Some(100.0);
    }
    let rs = (gains / losses).to_f64().unwrap_or(0.0);
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Renders the indicator section appended to the technical agent's
/// prompt. Empty when the window supports no indicator at all.
#[must_use]
pub fn indicator_block(prices: &[PricePoint]) -> String {
    let closes: Vec<Decimal> = prices.iter().map(|p| p.close).collect();
    let mut lines = Vec::new();
    if let Some(value) = sma(&closes, 5) {
        lines.push(format!("  SMA-5: {}", value.round_dp(4)));
    }
    if let Some(value) = sma(&closes, 20) {
        lines.push(format!("  SMA-20: {}", value.round_dp(4)));
    }
    if let Some(value) = rsi(&closes, 14) {
        lines.push(format!("  RSI-14: {value:.1}"));
    }
    if lines.is_empty() {
        return String::new();
    }
    format!("Technical indicators:\n{}\n", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn closes(values: &[Decimal]) -> Vec<Decimal> {
        values.to_vec()
    }

    #[test]
    fn sma_averages_the_tail() {
        let series = closes(&[dec!(1), dec!(2), dec!(3), dec!(4)]);
        assert_eq!(sma(&series, 2), Some(dec!(3.5)));
        assert_eq!(sma(&series, 4), Some(dec!(2.5)));
    }

    #[test]
    fn sma_short_window_is_none() {
        let series = closes(&[dec!(1), dec!(2)]);
        assert_eq!(sma(&series, 3), None);
        assert_eq!(sma(&series, 0), None);
    }

    #[test]
    fn rsi_all_gains_reads_100() {
        let series = closes(&[dec!(10), dec!(11), dec!(12), dec!(13)]);
        assert_eq!(rsi(&series, 3), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_reads_0() {
        let series = closes(&[dec!(13), dec!(12), dec!(11), dec!(10)]);
        let value = rsi(&series, 3).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn rsi_flat_window_reads_50() {
        let series = closes(&[dec!(10), dec!(10), dec!(10)]);
        assert_eq!(rsi(&series, 2), Some(50.0));
    }

    #[test]
    fn rsi_mixed_moves_match_hand_calculation() {
        // Gains 1.0, losses 0.5, RS = 2, RSI = 100 - 100/3.
        let series = closes(&[dec!(10), dec!(11), dec!(10.5)]);
        let value = rsi(&series, 2).unwrap();
        assert!((value - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn rsi_needs_period_plus_one_closes() {
        let series = closes(&[dec!(10), dec!(11)]);
        assert_eq!(rsi(&series, 2), None);
    }

    #[test]
    fn indicator_block_lists_what_the_window_supports() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 2, d).unwrap();
        let prices: Vec<PricePoint> = (1..=20)
            .map(|d| PricePoint::new("AAPL", day(d), Decimal::from(100 + i64::from(d))))
            .collect();
        let block = indicator_block(&prices);
        assert!(block.contains("SMA-5"));
        assert!(block.contains("SMA-20"));
        assert!(block.contains("RSI-14: 100.0"));
    }

    #[test]
    fn indicator_block_empty_for_tiny_window() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let prices = vec![PricePoint::new("AAPL", day, dec!(100))];
        assert_eq!(indicator_block(&prices), "");
    }
}
