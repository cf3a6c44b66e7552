use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::monthly::MonthlyResult;
use super::period::YearMonth;
use crate::utils::format_currency;

/// Receita code for variable-income gains (swing and day trade)
pub const DARF_CODE: &str = "6015";

/// DARF payment information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DarfPayment {
    pub period: YearMonth,
    pub darf_code: &'static str,
    pub description: &'static str,
    pub tax_due: Decimal,
    pub due_date: NaiveDate,
    /// Under R$ 10,00: cannot be paid alone, rolls into a later DARF
    pub below_minimum: bool,
}

/// One DARF per month with tax due
pub fn generate_darf_payments(results: &[MonthlyResult]) -> Vec<DarfPayment> {
    let minimum = Decimal::new(10, 0);

    results
        .iter()
        .filter(|r| r.total_tax > Decimal::ZERO)
        .filter_map(|r| {
            Some(DarfPayment {
                period: r.period,
                darf_code: DARF_CODE,
                description: "Renda Variável - Operações com Opções",
                tax_due: r.total_tax,
                due_date: calculate_darf_due_date(r.period)?,
                below_minimum: r.total_tax < minimum,
            })
        })
        .collect()
}

/// Tax is due by the end of the month following the trades.
/// Business-day adjustment is not applied.
fn calculate_darf_due_date(period: YearMonth) -> Option<NaiveDate> {
    period.next().last_day()
}

/// Format DARF payment for display
pub fn format_darf_payment(payment: &DarfPayment) -> String {
    let mut out = format!(
        "DARF {code} - {period} {description}\n  Vencimento: {due_date}\n  Valor: {amount}",
        code = payment.darf_code,
        period = payment.period,
        description = payment.description,
        due_date = payment.due_date.format("%d/%m/%Y"),
        amount = format_currency(payment.tax_due)
    );
    if payment.below_minimum {
        out.push_str("\n  Abaixo de R$ 10,00: acumular com o próximo DARF");
    }
    out
}

/// Format all DARF payments of a run
pub fn format_darf_summary(payments: &[DarfPayment]) -> String {
    if payments.is_empty() {
        return "Nenhum DARF a pagar".to_string();
    }

    let mut output = String::from("DARFs a pagar:\n\n");

    for payment in payments {
        output.push_str(&format_darf_payment(payment));
        output.push_str("\n\n");
    }

    let total: Decimal = payments.iter().map(|p| p.tax_due).sum();
    output.push_str(&format!("Total: {}", format_currency(total)));

    output
}
