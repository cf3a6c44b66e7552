//! Error handling for opcoes-ir
//!
//! Typed errors for the two core stages (note extraction and tax
//! computation) plus a unified Result alias using anyhow for the
//! application edges (file reading, CLI).

use thiserror::Error;

use crate::tax::YearMonth;

/// Document-level failures while extracting trades from a brokerage note.
///
/// Line-level problems never surface here: they are recorded as
/// [`crate::notes::SkipReason`] and scanning continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error("found {trade_lines} trade line(s) but no trade date marker before any of them")]
    MissingTradeDate { trade_lines: usize },

    #[error("unknown note format profile: {0} (expected a, b or auto)")]
    UnknownProfile(String),
}

/// Violations of the tax engine's input contract. Fatal, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxError {
    #[error("invalid trade record #{index} ({asset}): {reason}")]
    InvalidRecord {
        index: usize,
        asset: String,
        reason: &'static str,
    },

    #[error("amounts in period {period} exceed the supported decimal range")]
    Overflow { period: YearMonth },
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
