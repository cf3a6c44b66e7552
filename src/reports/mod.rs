// Reports module - monthly IR result renderers

use std::io::Write;

use crate::error::Result;
use crate::tax::MonthlyResult;
use crate::utils::format_currency;

const CSV_HEADER: [&str; 6] = [
    "period",
    "swing_profit_net",
    "swing_tax",
    "day_profit_net",
    "day_tax",
    "total_tax",
];

/// Write one CSV row per period, amounts as plain 2-dp decimals.
pub fn write_csv<W: Write>(results: &[MonthlyResult], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for result in results {
        csv.write_record([
            result.period.to_string(),
            format!("{:.2}", result.swing_profit_net),
            format!("{:.2}", result.swing_tax),
            format!("{:.2}", result.day_profit_net),
            format!("{:.2}", result.day_tax),
            format!("{:.2}", result.total_tax),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Human-readable one-liner per period
pub fn summary_lines(results: &[MonthlyResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| {
            format!(
                "{} {}: swing {} (IR {}), day trade {} (IR {}), total {}",
                r.period.month_name(),
                r.period.year,
                format_currency(r.swing_profit_net),
                format_currency(r.swing_tax),
                format_currency(r.day_profit_net),
                format_currency(r.day_tax),
                format_currency(r.total_tax)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::YearMonth;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sample() -> Vec<MonthlyResult> {
        vec![
            MonthlyResult {
                period: YearMonth::new(2024, 1).unwrap(),
                swing_profit_net: dec!(-1000.00),
                swing_tax: Decimal::ZERO,
                day_profit_net: dec!(1234.5),
                day_tax: dec!(246.90),
                total_tax: dec!(246.90),
            },
            MonthlyResult {
                period: YearMonth::new(2024, 2).unwrap(),
                swing_profit_net: dec!(100),
                swing_tax: dec!(15),
                day_profit_net: Decimal::ZERO,
                day_tax: Decimal::ZERO,
                total_tax: dec!(15),
            },
        ]
    }

    #[test]
    fn test_csv_export() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "period,swing_profit_net,swing_tax,day_profit_net,day_tax,total_tax"
        );
        assert_eq!(lines[1], "2024-01,-1000.00,0.00,1234.50,246.90,246.90");
        assert_eq!(lines[2], "2024-02,100.00,15.00,0.00,0.00,15.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_export_empty_has_header_only() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines(&sample());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Janeiro 2024"));
        assert!(lines[0].contains("R$ -1.000,00"));
        assert!(lines[0].contains("R$ 1.234,50"));
        assert!(lines[1].contains("total R$ 15,00"));
    }
}
