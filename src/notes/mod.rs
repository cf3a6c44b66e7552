//! Brokerage note extraction
//!
//! Turns the decoded text of one brokerage note into [`TradeRecord`]s.
//! Every call is a pure function of its input: no caching, no shared state,
//! so notes can be parsed independently and their records concatenated.

pub mod fields;
pub mod profile;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::NoteError;
pub use profile::FormatProfile;

/// Trade side (compra / venda)
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Resolve the literal C/V column printed on notes
    pub fn from_marker(token: &str) -> Option<Self> {
        match token {
            "C" => Some(Side::Buy),
            "V" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// One options trade line from a brokerage note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRecord {
    pub trade_date: NaiveDate,
    pub asset_code: String,
    pub side: Side,
    pub quantity: u64,
    pub unit_price: Decimal,
    /// Value as printed on the note (quantity × price)
    pub gross_value: Decimal,
}

/// Fields of a trade line, before the trade date is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeFields {
    pub asset_code: String,
    pub side: Side,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub gross_value: Decimal,
}

impl TradeFields {
    fn with_date(self, trade_date: NaiveDate) -> TradeRecord {
        TradeRecord {
            trade_date,
            asset_code: self.asset_code,
            side: self.side,
            quantity: self.quantity,
            unit_price: self.unit_price,
            gross_value: self.gross_value,
        }
    }
}

/// Why a recognized trade line produced no record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no trade date marker before this line")]
    NoTradeDate,

    #[error("no C/V side marker")]
    MissingSide,

    #[error("no asset code")]
    MissingAsset,

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: '{token}'")]
    InvalidNumber { field: &'static str, token: String },

    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("line does not match the profile's trade layout")]
    UnrecognizedLayout,
}

/// A trade line that was recognized but skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the note text
    pub line_no: usize,
    pub line: String,
    pub reason: SkipReason,
}

/// Full outcome of scanning one note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteScan {
    pub records: Vec<TradeRecord>,
    pub skipped: Vec<SkippedLine>,
    /// Lines matching the profile's trade signature, parsed or not
    pub trade_lines: usize,
}

impl NoteScan {
    fn undated_lines(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| s.reason == SkipReason::NoTradeDate)
            .count()
    }
}

/// Scan a note line by line and report every trade line's outcome.
pub fn scan(text: &str, profile: FormatProfile) -> NoteScan {
    let rules = profile.rules();
    let raw_lines: Vec<&str> = text.lines().collect();
    let folded: Vec<String> = raw_lines.iter().map(|l| fields::fold_line(l)).collect();

    let mut current_date: Option<NaiveDate> = None;
    let mut result = NoteScan::default();

    for (idx, line) in folded.iter().enumerate() {
        if let Some(date) = rules.match_date(&folded, idx) {
            if date.is_none() {
                debug!("Unreadable trade date near line {}", idx + 1);
            }
            current_date = date;
            continue;
        }

        if !rules.is_trade_line(line) {
            continue;
        }
        result.trade_lines += 1;

        let outcome = match current_date {
            Some(date) => rules.extract(line).map(|f| f.with_date(date)),
            None => Err(SkipReason::NoTradeDate),
        };

        match outcome {
            Ok(record) => result.records.push(record),
            Err(reason) => {
                warn!(
                    "Skipping note line {} ({}): {}",
                    idx + 1,
                    reason,
                    raw_lines[idx].trim()
                );
                result.skipped.push(SkippedLine {
                    line_no: idx + 1,
                    line: raw_lines[idx].to_string(),
                    reason,
                });
            }
        }
    }

    debug!(
        "Profile {}: {} trade lines, {} records, {} skipped",
        profile,
        result.trade_lines,
        result.records.len(),
        result.skipped.len()
    );
    result
}

/// Parse one note with the given profile.
///
/// Malformed lines are skipped (see [`scan`]). An empty vector means no
/// operations were detected. Fails only when trade lines exist but none
/// of them has a trade date to attach.
pub fn parse(text: &str, profile: FormatProfile) -> Result<Vec<TradeRecord>, NoteError> {
    scan_checked(text, profile).map(|result| result.records)
}

/// [`scan`], failing like [`parse`] when no trade line could be dated.
pub fn scan_checked(text: &str, profile: FormatProfile) -> Result<NoteScan, NoteError> {
    let result = scan(text, profile);

    if result.trade_lines > 0 && result.undated_lines() == result.trade_lines {
        return Err(NoteError::MissingTradeDate {
            trade_lines: result.trade_lines,
        });
    }

    Ok(result)
}

/// Scan a note with the requested profile, or the one detected from its
/// contents when none is requested.
///
/// `None` means no known profile matched, so the note has no operations.
/// Otherwise the chosen profile comes back with the checked scan, letting
/// callers report which profile a failing note was read with.
pub fn parse_detected(
    text: &str,
    requested: Option<FormatProfile>,
) -> Option<(FormatProfile, Result<NoteScan, NoteError>)> {
    let profile = match requested {
        Some(profile) => profile,
        None => match FormatProfile::detect(text) {
            Some(profile) => {
                info!("Detected note profile {}", profile);
                profile
            }
            None => {
                info!("No known note profile matched; no operations detected");
                return None;
            }
        },
    };
    Some((profile, scan_checked(text, profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const NOTE_A: &str = "\
NOTA DE CORRETAGEM
Nr. nota Folha Data pregão
98765 1 05/01/2024
Negócios realizados
B3 RV LISTADO C OPÇÃO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 10,00 1.000,00 D
B3 RV LISTADO V OPÇÃO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 12,00 1.200,00 C
Resumo dos Negócios
";

    #[test]
    fn test_scan_columnar_note() {
        let result = scan(NOTE_A, FormatProfile::Columnar);
        assert_eq!(result.trade_lines, 2);
        assert!(result.skipped.is_empty());

        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(
            result.records,
            vec![
                TradeRecord {
                    trade_date: date,
                    asset_code: "PETRA400".to_string(),
                    side: Side::Buy,
                    quantity: 100,
                    unit_price: dec!(10.00),
                    gross_value: dec!(1000.00),
                },
                TradeRecord {
                    trade_date: date,
                    asset_code: "PETRA400".to_string(),
                    side: Side::Sell,
                    quantity: 100,
                    unit_price: dec!(12.00),
                    gross_value: dec!(1200.00),
                },
            ]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse(NOTE_A, FormatProfile::Columnar).unwrap();
        let second = parse(NOTE_A, FormatProfile::Columnar).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_trade_before_date_marker_is_excluded() {
        let text = "\
B3 RV LISTADO C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 10,00 1.000,00 D
Data pregão
08/01/2024
B3 RV LISTADO C OPCAO DE VENDA 01/24 PETRM380 PN 38,00 PETR 200 0,40 80,00 D
";
        let result = scan(text, FormatProfile::Columnar);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].asset_code, "PETRM380");
        assert_eq!(
            result.records[0].trade_date,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].line_no, 1);
        assert_eq!(result.skipped[0].reason, SkipReason::NoTradeDate);
    }

    #[test]
    fn test_columnar_value_with_thousands_dot_only() {
        let text = "\
Data pregão
05/01/2024
B3 RV LISTADO C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 10,00 1.000 D
";
        let records = parse(text, FormatProfile::Columnar).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 100);
        assert_eq!(records[0].gross_value, dec!(1000));
    }

    #[test]
    fn test_malformed_line_is_skipped_and_scan_continues() {
        let text = "\
Data pregão
05/01/2024
B3 RV LISTADO C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR cem 10,00 1.000,00 D
B3 RV LISTADO C OPCAO DE COMPRA 01/24 VALEB700 ON 70,00 VALE 50 2,00 100,00 D
";
        let result = scan(text, FormatProfile::Columnar);
        assert_eq!(result.trade_lines, 2);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].asset_code, "VALEB700");
        assert_eq!(
            result.skipped[0].reason,
            SkipReason::InvalidNumber {
                field: "quantity",
                token: "CEM".to_string()
            }
        );
        assert_eq!(result.skipped[0].line_no, 3);
    }

    #[test]
    fn test_new_date_marker_replaces_previous() {
        let text = "\
Data pregão: 05/01/2024
1-BOVESPA C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 1,00 100,00 D
Data pregão: 06/01/2024
1-BOVESPA V OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 1,50 150,00 C
";
        let records = parse(text, FormatProfile::Segmented).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trade_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(records[1].trade_date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(records[1].side, Side::Sell);
    }

    #[test]
    fn test_unreadable_date_clears_current_date() {
        let text = "\
Data pregão: 05/01/2024
1-BOVESPA C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 1,00 100,00 D
Data pregão: --/--/----
1-BOVESPA V OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 1,50 150,00 C
";
        let result = scan(text, FormatProfile::Segmented);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.skipped[0].reason, SkipReason::NoTradeDate);
    }

    #[test]
    fn test_all_trades_undated_is_hard_failure() {
        let text = "B3 RV LISTADO C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 10,00 1.000,00 D";
        assert_eq!(
            parse(text, FormatProfile::Columnar),
            Err(NoteError::MissingTradeDate { trade_lines: 1 })
        );
    }

    #[test]
    fn test_zero_trade_note_is_empty_not_error() {
        let text = "Data pregão\n05/01/2024\nNenhum negócio realizado";
        assert_eq!(parse(text, FormatProfile::Columnar), Ok(Vec::new()));
        assert_eq!(parse_detected(text, None), None);
    }

    #[test]
    fn test_parse_detected_picks_profile() {
        let (profile, result) = parse_detected(NOTE_A, None).unwrap();
        assert_eq!(profile, FormatProfile::Columnar);
        assert_eq!(result.unwrap().records.len(), 2);
    }

    #[test]
    fn test_parse_detected_honours_requested_profile() {
        // Read as Segmented, the Columnar lines do not match any trade signature
        let (profile, result) = parse_detected(NOTE_A, Some(FormatProfile::Segmented)).unwrap();
        assert_eq!(profile, FormatProfile::Segmented);
        assert_eq!(result.unwrap(), NoteScan::default());
    }

    #[test]
    fn test_parse_detected_keeps_profile_on_error() {
        let text = "B3 RV LISTADO C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 10,00 1.000,00 D";
        let (profile, result) = parse_detected(text, None).unwrap();
        assert_eq!(profile, FormatProfile::Columnar);
        assert_eq!(
            result.unwrap_err(),
            NoteError::MissingTradeDate { trade_lines: 1 }
        );
    }

    #[test]
    fn test_side_from_marker() {
        assert_eq!(Side::from_marker("C"), Some(Side::Buy));
        assert_eq!(Side::from_marker("V"), Some(Side::Sell));
        assert_eq!(Side::from_marker("D"), None);
        assert_eq!(Side::Sell.as_str(), "SELL");
    }
}
