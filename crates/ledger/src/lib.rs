//! Append-only recommendation ledger for the stock council.
//!
//! This crate provides:
//! - The [`RecommendationStore`] trait with idempotent, versioned appends
//! - [`MemoryLedger`], the default in-process store
//! - [`JsonlLedger`], a JSON-lines file store that survives restarts

pub mod jsonl;
pub mod memory;
pub mod store;

// Re-export main types for convenience
pub use jsonl::JsonlLedger;
pub use memory::MemoryLedger;
pub use store::{AppendOutcome, LedgerError, RecommendationStore, Result};
