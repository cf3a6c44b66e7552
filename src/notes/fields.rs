//! Token-level helpers shared by every note profile: accent folding,
//! Brazilian number formats and day-first dates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::SkipReason;

/// Fold a note line for marker matching: NFKD, combining marks dropped,
/// uppercased. `Opção de` and `OPCAO DE` fold to the same text.
///
/// Whitespace, digits and punctuation are kept, so tokens keep their
/// positions.
pub fn fold_line(line: &str) -> String {
    line.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_uppercase()
}

/// Parse a non-negative decimal printed in a note.
///
/// Handles both Brazilian (`1.234,56`) and international (`1,234.56`)
/// layouts by looking at which separator comes last.
pub fn parse_decimal(token: &str, field: &'static str) -> Result<Decimal, SkipReason> {
    let cleaned = token.trim().trim_start_matches("R$");
    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(comma_pos), Some(dot_pos)) if comma_pos > dot_pos => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if is_dot_grouped(cleaned) => cleaned.replace('.', ""),
        _ => cleaned.to_string(),
    };

    let invalid = || SkipReason::InvalidNumber {
        field,
        token: token.to_string(),
    };

    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if value.is_sign_negative() {
        return Err(invalid());
    }
    Ok(value)
}

/// `1.000` or `12.345.678`: dots only as thousands separators
fn is_dot_grouped(token: &str) -> bool {
    let mut groups = token.split('.');
    let head = groups.next().unwrap_or_default();
    let head_ok = (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && head.chars().all(|ch| ch.is_ascii_digit());

    head_ok && groups.all(|g| g.len() == 3 && g.chars().all(|ch| ch.is_ascii_digit()))
}

/// Parse a contract quantity. Quantities are whole numbers, optionally
/// with `.` thousands separators (`1.000`).
pub fn parse_quantity(token: &str) -> Result<u64, SkipReason> {
    let digits: String = token.trim().chars().filter(|ch| *ch != '.').collect();
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(SkipReason::InvalidNumber {
            field: "quantity",
            token: token.to_string(),
        });
    }

    let quantity = digits.parse::<u64>().map_err(|_| SkipReason::InvalidNumber {
        field: "quantity",
        token: token.to_string(),
    })?;

    if quantity == 0 {
        return Err(SkipReason::NonPositiveQuantity);
    }
    Ok(quantity)
}

/// Parse a `DD/MM/YYYY` date (day first, as printed on B3 notes)
pub fn parse_day_first(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token.trim(), "%d/%m/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fold_line_strips_accents() {
        assert_eq!(fold_line("B3 RV Listado C Opção de Compra"), "B3 RV LISTADO C OPCAO DE COMPRA");
        assert_eq!(fold_line("Data pregão"), "DATA PREGAO");
    }

    #[test]
    fn test_fold_line_keeps_numbers() {
        assert_eq!(fold_line("100 1.234,56 d"), "100 1.234,56 D");
    }

    #[test]
    fn test_parse_decimal_formats() {
        assert_eq!(parse_decimal("1.234,56", "price").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("20,245.73", "price").unwrap(), dec!(20245.73));
        assert_eq!(parse_decimal("0,50", "price").unwrap(), dec!(0.50));
        assert_eq!(parse_decimal("12", "price").unwrap(), dec!(12));
        assert_eq!(parse_decimal("R$10,50", "price").unwrap(), dec!(10.50));
    }

    #[test]
    fn test_parse_decimal_thousands_dot_without_comma() {
        assert_eq!(parse_decimal("1.000", "value").unwrap(), dec!(1000));
        assert_eq!(parse_decimal("12.345.678", "value").unwrap(), dec!(12345678));
        // Not thousands groups: plain decimal point
        assert_eq!(parse_decimal("0.750", "price").unwrap(), dec!(0.750));
        assert_eq!(parse_decimal("1.25", "price").unwrap(), dec!(1.25));
        assert_eq!(parse_decimal("1234.500", "price").unwrap(), dec!(1234.5));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage_and_negatives() {
        assert_eq!(
            parse_decimal("abc", "price"),
            Err(SkipReason::InvalidNumber {
                field: "price",
                token: "abc".to_string()
            })
        );
        assert!(parse_decimal("-1,00", "value").is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("100").unwrap(), 100);
        assert_eq!(parse_quantity("1.000").unwrap(), 1000);
        assert_eq!(parse_quantity("0"), Err(SkipReason::NonPositiveQuantity));
        assert!(parse_quantity("1,5").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_parse_day_first() {
        assert_eq!(
            parse_day_first("05/01/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(parse_day_first("2024-01-05"), None);
        assert_eq!(parse_day_first("31/02/2024"), None);
    }
}
