//! Output formatting module for CLI display
//!
//! Keeps table and JSON rendering out of the command handlers.

use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use opcoes_ir::notes::{Side, TradeRecord};
use opcoes_ir::tax::{CarryForwardState, MonthlyResult, TradeType};
use opcoes_ir::utils::{format_currency, format_decimal_br};

fn colored_amount(value: Decimal) -> String {
    let text = format_currency(value);
    if value > Decimal::ZERO {
        text.green().to_string()
    } else if value < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

/// Table of extracted trades
pub fn format_records_table(records: &[TradeRecord]) -> String {
    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Asset")]
        asset: String,
        #[tabled(rename = "Side")]
        side: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            date: r.trade_date.format("%d/%m/%Y").to_string(),
            asset: r.asset_code.clone(),
            side: match r.side {
                Side::Buy => r.side.as_str().cyan().to_string(),
                Side::Sell => r.side.as_str().yellow().to_string(),
            },
            quantity: r.quantity.to_string(),
            price: format_decimal_br(r.unit_price),
            value: format_currency(r.gross_value),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string()
}

/// Monthly IR table
pub fn format_monthly_table(results: &[MonthlyResult]) -> String {
    #[derive(Tabled)]
    struct MonthRow {
        #[tabled(rename = "Month")]
        month: String,
        #[tabled(rename = "Swing Net")]
        swing_net: String,
        #[tabled(rename = "Swing IR")]
        swing_tax: String,
        #[tabled(rename = "Day Net")]
        day_net: String,
        #[tabled(rename = "Day IR")]
        day_tax: String,
        #[tabled(rename = "Total IR")]
        total_tax: String,
    }

    let rows: Vec<MonthRow> = results
        .iter()
        .map(|m| MonthRow {
            month: format!("{} {}", m.period.month_name(), m.period.year),
            swing_net: colored_amount(m.swing_profit_net),
            swing_tax: format_currency(m.swing_tax),
            day_net: colored_amount(m.day_profit_net),
            day_tax: format_currency(m.day_tax),
            total_tax: format_currency(m.total_tax).bold().to_string(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

/// Losses still open after the last period, if any
pub fn format_closing_carry(carry: &CarryForwardState) -> Option<String> {
    if !carry.has_losses() {
        return None;
    }
    Some(format!(
        "{} Losses to Carry Forward:\n  {:<12} {}\n  {:<12} {}",
        "📋".yellow().bold(),
        format!("{}:", TradeType::Swing.display_name()),
        format_currency(carry.carry(TradeType::Swing)).yellow(),
        format!("{}:", TradeType::Day.display_name()),
        format_currency(carry.carry(TradeType::Day)).yellow()
    ))
}

/// Message for documents without any options trade
pub fn format_no_operations(source: &str) -> String {
    format!("{} {}: No operations detected", "ℹ".blue().bold(), source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_records_table_has_brazilian_amounts() {
        colored::control::set_override(false);
        let records = vec![TradeRecord {
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            asset_code: "PETRA400".to_string(),
            side: Side::Sell,
            quantity: 1000,
            unit_price: dec!(1.25),
            gross_value: dec!(1250),
        }];
        let table = format_records_table(&records);
        assert!(table.contains("05/01/2024"));
        assert!(table.contains("PETRA400"));
        assert!(table.contains("SELL"));
        assert!(table.contains("R$ 1.250,00"));
    }

    #[test]
    fn test_closing_carry_only_when_losses() {
        assert!(format_closing_carry(&CarryForwardState::default()).is_none());
        let carry = CarryForwardState {
            swing_loss_carry: dec!(-400),
            day_loss_carry: Decimal::ZERO,
        };
        let text = format_closing_carry(&carry).unwrap();
        assert!(text.contains("R$ -400,00"));
    }

    #[test]
    fn test_no_operations_message() {
        let msg = format_no_operations("nota.txt");
        assert!(msg.contains("nota.txt"));
        assert!(msg.contains("No operations detected"));
    }
}
