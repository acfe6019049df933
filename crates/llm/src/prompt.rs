//! Role prompt templates.
//!
//! Prompt wording is deliberately plain; what matters here is the
//! output contract the agents parse (VERDICT / CONFIDENCE lines, and
//! ADJUST lines for the judge) and that rendering is deterministic.

use stock_council_core::{AgentContext, AgentOpinion, Market};

/// How many recent closes a prompt quotes at most.
const MAX_QUOTED_CLOSES: usize = 10;

/// Output contract every analyst reply must honour.
const VERDICT_CONTRACT: &str = "Finish your reply with exactly two lines:\n\
    VERDICT: BUY, SELL, or HOLD\n\
    CONFIDENCE: a number between 0.0 and 1.0";

/// Additional contract for the judge role.
const ADJUST_CONTRACT: &str = "For every role whose vote you would reweight, \
    also add a line: ADJUST <role> <factor> (factor 0.0 to 2.0, 1.0 = unchanged)";

pub struct PromptLibrary;

impl PromptLibrary {
    /// System instruction for a role. Unknown roles get a generic
    /// analyst instruction with the same output contract.
    #[must_use]
    pub fn system(role: &str, market: Market) -> String {
        let charge = match role {
            "fundamental" => {
                "You are a fundamental analyst. Judge the company's valuation, \
                 earnings quality, and balance-sheet strength."
            }
            "technical" => {
                "You are a technical analyst. Judge trend, momentum, and \
                 support/resistance from the quoted price action."
            }
            "sentiment" => {
                "You are a market-sentiment analyst. Judge crowd positioning \
                 and mood around the stock."
            }
            "news" => {
                "You are a news analyst. Judge the likely price impact of \
                 recent company and sector headlines."
            }
            "risk" => {
                "You are a risk analyst. Judge downside exposure, volatility, \
                 and what could invalidate the consensus."
            }
            "bull" => {
                "You are the bull researcher in a debate. Argue the strongest \
                 honest case for buying, engaging the other analysts' views."
            }
            "bear" => {
                "You are the bear researcher in a debate. Argue the strongest \
                 honest case against buying, engaging the other analysts' views."
            }
            "judge" => {
                "You are the judge of an analyst debate. Weigh every argument \
                 and decide which analysts deserve more or less influence."
            }
            _ => "You are a stock analyst. Give your best overall assessment.",
        };

        let mut prompt = format!(
            "{charge} The stock trades on the {} market in {}.\n\n{VERDICT_CONTRACT}",
            market.name(),
            market.currency(),
        );
        if role == "judge" {
            prompt.push('\n');
            prompt.push_str(ADJUST_CONTRACT);
        }
        prompt
    }

    /// Renders the shared analysis context as the user message body.
    #[must_use]
    pub fn context_block(ctx: &AgentContext) -> String {
        let mut out = String::new();

        match &ctx.company {
            Some(name) => out.push_str(&format!("Stock: {} ({})\n", ctx.ticker, name)),
            None => out.push_str(&format!("Stock: {}\n", ctx.ticker)),
        }
        out.push_str(&format!("Analysis date: {}\n", ctx.date));

        if ctx.prices.is_empty() {
            out.push_str("No recent price history is available.\n");
        } else {
            let start = ctx.prices.len().saturating_sub(MAX_QUOTED_CLOSES);
            out.push_str(&format!(
                "Recent daily closes ({}):\n",
                ctx.market.currency_symbol()
            ));
            for point in &ctx.prices[start..] {
                out.push_str(&format!("  {}  {}\n", point.date, point.close));
            }
            if let Some(change) = ctx.window_change() {
                out.push_str(&format!(
                    "Change over the quoted window: {:+.2}%\n",
                    change * 100.0
                ));
            }
        }

        if !ctx.prior_opinions.is_empty() {
            out.push('\n');
            out.push_str(&Self::debate_block(&ctx.prior_opinions));
        }

        out
    }

    /// Renders prior opinions for the debate round.
    #[must_use]
    pub fn debate_block(opinions: &[AgentOpinion]) -> String {
        let mut out = String::from("The analyst round concluded:\n");
        for op in opinions {
            out.push_str(&format!(
                "  {}: {} (confidence {:.2})",
                op.role, op.verdict, op.confidence
            ));
            if !op.rationale.is_empty() {
                out.push_str(&format!(" - {}", op.rationale));
            }
            out.push('\n');
        }
        out
    }
}
