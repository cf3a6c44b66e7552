//! Formatting helpers shared by the CLI and the report writers
//!
//! Money is displayed in Brazilian locale: `.` groups thousands and
//! `,` separates cents.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "R$ " prefix (Brazilian Real)
    BRL,
    /// No currency symbol (unit prices in tables)
    None,
}

/// Round a monetary amount to cents, half away from zero.
///
/// # Examples
/// ```
/// use opcoes_ir::utils::round_cents;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_cents(dec!(0.105)), dec!(0.11));
/// assert_eq!(round_cents(dec!(-0.105)), dec!(-0.11));
/// ```
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Core formatting function with full control over output.
///
/// `width` right-aligns the result (0 for no padding).
///
/// # Examples
/// ```
/// use opcoes_ir::utils::{format_currency_with_width, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234.56), 0, CurrencySymbol::BRL),
///     "R$ 1.234,56"
/// );
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234), 15, CurrencySymbol::None),
///     "       1.234,00"
/// );
/// ```
pub fn format_currency_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let rounded = round_cents(value);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, c) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::BRL => "R$ ",
        CurrencySymbol::None => "",
    };

    let result = format!("{}{}{},{}", prefix, sign, grouped, decimal_part);

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format as Brazilian Real with symbol: "R$ 1.234,56"
///
/// # Examples
/// ```
/// use opcoes_ir::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56)), "R$ 1.234,56");
/// assert_eq!(format_currency(dec!(-500)), "R$ -500,00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::BRL)
}

/// Format number only (no symbol): "1.234,56"
pub fn format_decimal_br(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::None)
}
