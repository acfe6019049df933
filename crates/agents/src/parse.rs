//! Parsing of agent replies.
//!
//! Replies follow the prompt contract: a `VERDICT:` line, a
//! `CONFIDENCE:` line, and for the judge role zero or more
//! `ADJUST <role> <factor>` lines. Models drift, so parsing is
//! tolerant: labels match case-insensitively, markdown emphasis around
//! tokens is stripped, and the Chinese verdict terms used by mainland
//! market prompts are accepted alongside the English ones.

use std::collections::HashMap;
use stock_council_core::{AgentOpinion, Verdict};
use stock_council_llm::LlmError;

/// Confidence assumed when the reply names a verdict but no usable
/// confidence value.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Upper bound on a judge reweight factor.
const MAX_ADJUST_FACTOR: f64 = 2.0;

/// Extracts the verdict from a reply.
///
/// Accepts a labelled `VERDICT:` line or, failing that, a line that is
/// nothing but the verdict token. Tokens inside prose never match, so
/// "I would not BUY here" stays unparsed.
#[must_use]
pub fn parse_verdict(reply: &str) -> Option<Verdict> {
    for line in reply.lines() {
        let line = line.trim();
        if let Some(value) = labeled_value(line, "VERDICT") {
            if let Some(verdict) = verdict_token(value) {
                return Some(verdict);
            }
        }
    }
    reply.lines().find_map(|line| verdict_token(line))
}

/// Extracts the confidence from a reply, clamped into [0.0, 1.0].
#[must_use]
pub fn parse_confidence(reply: &str) -> Option<f64> {
    for line in reply.lines() {
        if let Some(value) = labeled_value(line.trim(), "CONFIDENCE") {
            if let Some(raw) = leading_float(value) {
                return Some(raw.clamp(0.0, 1.0));
            }
        }
    }
    None
}

/// Builds an opinion for `role` from a raw reply.
///
/// The full trimmed reply is kept as the rationale for audit. A missing
/// confidence falls back to [`DEFAULT_CONFIDENCE`].
///
/// # Errors
/// Returns [`LlmError::MalformedResponse`] when no verdict can be
/// found; the caller treats that as a permanent failure.
pub fn parse_opinion(
    role: &str,
    weight: f64,
    reply: &str,
) -> std::result::Result<AgentOpinion, LlmError> {
    let verdict = parse_verdict(reply)
        .ok_or_else(|| LlmError::malformed(format!("no verdict line in {role} reply")))?;
    let confidence = parse_confidence(reply).unwrap_or(DEFAULT_CONFIDENCE);
    let opinion = AgentOpinion::new(role, verdict, confidence, weight)
        .map_err(|err| LlmError::malformed(err.to_string()))?
        .with_rationale(reply.trim());
    Ok(opinion)
}

/// Extracts judge reweight directives.
///
/// Each `ADJUST <role> <factor>` line maps a lowercased role name to a
/// factor clamped into [0.0, 2.0]. Lines with an unparsable factor are
/// skipped; a repeated role keeps the last factor.
#[must_use]
pub fn parse_adjustments(reply: &str) -> HashMap<String, f64> {
    let mut adjustments = HashMap::new();
    for line in reply.lines() {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        if !trim_emphasis(keyword).eq_ignore_ascii_case("ADJUST") {
            continue;
        }
        let (Some(role), Some(raw_factor)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let Some(factor) = leading_float(raw_factor) else {
            continue;
        };
        if !factor.is_finite() {
            continue;
        }
        adjustments.insert(
            trim_emphasis(role).to_lowercase(),
            factor.clamp(0.0, MAX_ADJUST_FACTOR),
        );
    }
    adjustments
}

/// Returns the value part of `label: value`, matching the label
/// case-insensitively and ignoring markdown emphasis around it.
fn labeled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let (head, tail) = line.split_once(':')?;
    trim_emphasis(head.trim())
        .eq_ignore_ascii_case(label)
        .then_some(tail)
}

/// Matches a verdict token, tolerating emphasis and punctuation around
/// it. Accepts the Chinese terms for buy, sell, and hold.
fn verdict_token(value: &str) -> Option<Verdict> {
    let token = trim_emphasis(value.trim());
    if token.eq_ignore_ascii_case("buy") || token == "买入" {
        Some(Verdict::Buy)
    } else if token.eq_ignore_ascii_case("sell") || token == "卖出" {
        Some(Verdict::Sell)
    } else if token.eq_ignore_ascii_case("hold") || token == "持有" {
        Some(Verdict::Hold)
    } else {
        None
    }
}

/// Strips non-alphanumeric characters from both ends. CJK ideographs
/// are alphanumeric, so Chinese verdict tokens pass through intact.
fn trim_emphasis(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Parses the leading numeric run of a value like `0.85 (fairly sure)`.
fn leading_float(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .last()
        .map(|(i, c)| i + c.len_utf8())?;
    trimmed[..end].trim_end_matches('.').parse().ok()
}
