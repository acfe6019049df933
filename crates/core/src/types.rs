//! Core domain types for multi-agent stock analysis.
//!
//! This module defines the vocabulary shared by every crate in the
//! workspace: agent verdicts, opinions, aggregated recommendations,
//! and daily price points.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional call made by an agent or a final recommendation.
///
/// `Abstain` is legal only on an [`AgentOpinion`]; aggregation never
/// produces an abstaining [`Recommendation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Open or add to a long position
    Buy,
    /// Exit (or short) the position
    Sell,
    /// Keep the current position unchanged
    Hold,
    /// No opinion; excluded from scoring but kept for audit
    Abstain,
}

impl Verdict {
    /// Returns true if this verdict changes a position when executed.
    #[must_use]
    pub const fn is_actionable(self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }

    /// Canonical uppercase form used in reports and ledger output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
            Self::Abstain => "ABSTAIN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single agent's view of a ticker on a given day.
///
/// Opinions are immutable once produced: aggregation reads them but
/// never rewrites confidence or weight on a stored opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOpinion {
    /// Role that produced the opinion (e.g. "fundamental", "bear")
    pub role: String,
    /// The directional call
    pub verdict: Verdict,
    /// Self-reported confidence from 0.0 to 1.0
    pub confidence: f64,
    /// Configured voting weight, >= 0.0
    pub weight: f64,
    /// Free-form reasoning retained for audit
    #[serde(default)]
    pub rationale: String,
}

impl AgentOpinion {
    /// Creates a new opinion with validation.
    ///
    /// # Errors
    /// Returns error if confidence is outside [0.0, 1.0] or weight is negative.
    pub fn new(
        role: impl Into<String>,
        verdict: Verdict,
        confidence: f64,
        weight: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            anyhow::bail!("confidence must be in [0.0, 1.0], got {confidence}");
        }
        if weight < 0.0 {
            anyhow::bail!("weight must be >= 0.0, got {weight}");
        }
        Ok(Self {
            role: role.into(),
            verdict,
            confidence,
            weight,
            rationale: String::new(),
        })
    }

    /// Creates an abstaining opinion carrying zero score.
    ///
    /// Used when an agent fails permanently or exhausts its retries;
    /// the rationale records why.
    #[must_use]
    pub fn abstain(role: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            verdict: Verdict::Abstain,
            confidence: 0.0,
            weight: 0.0,
            rationale: rationale.into(),
        }
    }

    /// Attaches a rationale to this opinion.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Score contributed to the weighted vote: `weight * confidence`,
    /// always 0.0 for abstentions.
    #[must_use]
    pub fn score(&self) -> f64 {
        if self.verdict == Verdict::Abstain {
            0.0
        } else {
            self.weight * self.confidence
        }
    }
}

/// Accumulated weighted-vote scores per verdict.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoteScores {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl VoteScores {
    /// Adds `score` under `verdict`. Abstentions are ignored.
    pub fn add(&mut self, verdict: Verdict, score: f64) {
        match verdict {
            Verdict::Buy => self.buy += score,
            Verdict::Sell => self.sell += score,
            Verdict::Hold => self.hold += score,
            Verdict::Abstain => {}
        }
    }

    /// Tallies opinions at their produced weights.
    #[must_use]
    pub fn tally<'a>(opinions: impl IntoIterator<Item = &'a AgentOpinion>) -> Self {
        let mut scores = Self::default();
        for op in opinions {
            scores.add(op.verdict, op.score());
        }
        scores
    }

    /// Sum of all verdict scores.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.buy + self.sell + self.hold
    }

    /// Resolves the vote. The strictly highest score wins; any tie for
    /// the top, including the all-zero case, resolves to `Hold`.
    #[must_use]
    pub fn decide(&self) -> Verdict {
        if self.buy > self.sell && self.buy > self.hold {
            Verdict::Buy
        } else if self.sell > self.buy && self.sell > self.hold {
            Verdict::Sell
        } else {
            Verdict::Hold
        }
    }

    /// Share of the total score held by the winning verdict, in [0.0, 1.0].
    /// Returns 0.0 when no score was cast.
    #[must_use]
    pub fn winning_share(&self) -> f64 {
        let total = self.total();
        if total <= f64::EPSILON {
            return 0.0;
        }
        let winning = match self.decide() {
            Verdict::Buy => self.buy,
            Verdict::Sell => self.sell,
            Verdict::Hold | Verdict::Abstain => self.hold,
        };
        winning / total
    }
}

/// Aggregated, dated analysis outcome for one ticker.
///
/// Pure data: equality over two recommendations (used by the ledger's
/// idempotent append) compares every field including the opinion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Ticker the recommendation applies to
    pub ticker: String,
    /// Analysis date (one recommendation day granularity)
    pub date: NaiveDate,
    /// Final verdict; never `Abstain`
    pub verdict: Verdict,
    /// Winning verdict's share of the total cast score
    pub confidence: f64,
    /// Aggregation method tag (e.g. "weighted-vote", "debate")
    pub method: String,
    /// Per-verdict scores at decision time
    pub scores: VoteScores,
    /// Contributing opinions in evaluation order, abstentions included
    pub opinions: Vec<AgentOpinion>,
}

impl Recommendation {
    /// Builds a recommendation from tallied scores and the opinions
    /// behind them.
    #[must_use]
    pub fn from_scores(
        ticker: impl Into<String>,
        date: NaiveDate,
        method: impl Into<String>,
        scores: VoteScores,
        opinions: Vec<AgentOpinion>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            verdict: scores.decide(),
            confidence: scores.winning_share(),
            method: method.into(),
            scores,
            opinions,
        }
    }

    /// Number of opinions that actually voted (non-abstaining).
    #[must_use]
    pub fn voting_opinions(&self) -> usize {
        self.opinions
            .iter()
            .filter(|op| op.verdict != Verdict::Abstain)
            .count()
    }
}

/// One trading day's closing price for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Ticker symbol
    pub ticker: String,
    /// Trading day
    pub date: NaiveDate,
    /// Closing price
    pub close: Decimal,
}

impl PricePoint {
    #[must_use]
    pub fn new(ticker: impl Into<String>, date: NaiveDate, close: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            close,
        }
    }
}
