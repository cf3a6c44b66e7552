use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use super::carryforward::{CarryForwardState, LaneOutcome};
use super::classify::{classify, TradeType};
use super::period::YearMonth;
use super::TaxConfig;
use crate::error::TaxError;
use crate::notes::{Side, TradeRecord};
use crate::utils::round_cents;

/// One row of the monthly IR report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyResult {
    pub period: YearMonth,
    pub swing_profit_net: Decimal,
    pub swing_tax: Decimal,
    pub day_profit_net: Decimal,
    pub day_tax: Decimal,
    pub total_tax: Decimal,
}

impl MonthlyResult {
    fn new(period: YearMonth, swing: LaneOutcome, day: LaneOutcome) -> Self {
        let swing_tax = round_cents(swing.tax);
        let day_tax = round_cents(day.tax);
        Self {
            period,
            swing_profit_net: round_cents(swing.net_profit),
            swing_tax,
            day_profit_net: round_cents(day.net_profit),
            day_tax,
            total_tax: swing_tax + day_tax,
        }
    }
}

/// Monthly rows plus the losses still open after the last period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxReport {
    pub months: Vec<MonthlyResult>,
    pub closing_carry: CarryForwardState,
}

impl TaxReport {
    pub fn total_tax(&self) -> Decimal {
        self.months.iter().map(|m| m.total_tax).sum()
    }
}

/// Compute the monthly report with the default rates and day trade rule.
pub fn compute(records: &[TradeRecord]) -> Result<Vec<MonthlyResult>, TaxError> {
    compute_with(records, &TaxConfig::default()).map(|report| report.months)
}

/// Compute the monthly report for records from any number of notes.
///
/// One row per calendar month present in `records`, in chronological
/// order. Periods are settled strictly in that order because each one
/// consumes the loss carried by the previous one.
pub fn compute_with(records: &[TradeRecord], config: &TaxConfig) -> Result<TaxReport, TaxError> {
    validate(records)?;

    let by_period = classify(records, config.day_trade_rule)
        .into_iter()
        .into_group_map_by(|(_, record)| YearMonth::from(record.trade_date));

    let mut carry = CarryForwardState::default();
    let mut months = Vec::with_capacity(by_period.len());

    for (period, trades) in by_period.into_iter().sorted_by_key(|(period, _)| *period) {
        let overflow = || TaxError::Overflow { period };
        let lane_total = |wanted: TradeType| {
            lane_profit(
                trades
                    .iter()
                    .filter(|(lane, _)| *lane == wanted)
                    .map(|(_, record)| *record),
            )
            .map(round_cents)
        };
        let swing_raw = lane_total(TradeType::Swing).ok_or_else(overflow)?;
        let day_raw = lane_total(TradeType::Day).ok_or_else(overflow)?;

        let swing = carry
            .settle(TradeType::Swing, swing_raw, config.rate(TradeType::Swing))
            .ok_or_else(overflow)?;
        let day = carry
            .settle(TradeType::Day, day_raw, config.rate(TradeType::Day))
            .ok_or_else(overflow)?;

        debug!(
            "{}: swing raw {} net {}, day raw {} net {}",
            period, swing_raw, swing.net_profit, day_raw, day.net_profit
        );
        months.push(MonthlyResult::new(period, swing, day));
    }

    info!(
        "Computed {} monthly result(s) from {} trade record(s)",
        months.len(),
        records.len()
    );

    Ok(TaxReport {
        months,
        closing_carry: carry,
    })
}

/// Sum of per-asset results in one lane of one period. Assets traded on
/// one side only contribute nothing (open positions are not valued).
/// `None` on decimal overflow.
fn lane_profit<'a>(trades: impl Iterator<Item = &'a TradeRecord>) -> Option<Decimal> {
    trades
        .map(|record| (record.asset_code.as_str(), record))
        .into_group_map()
        .values()
        .try_fold(Decimal::ZERO, |total, records| {
            total.checked_add(asset_profit(records)?)
        })
}

/// (Σ sell qty × mean sell price) − (Σ buy qty × mean buy price)
fn asset_profit(records: &[&TradeRecord]) -> Option<Decimal> {
    let (buys, sells): (Vec<&TradeRecord>, Vec<&TradeRecord>) =
        records.iter().copied().partition(|r| r.side == Side::Buy);

    if buys.is_empty() || sells.is_empty() {
        return Some(Decimal::ZERO);
    }
    side_amount(&sells)?.checked_sub(side_amount(&buys)?)
}

fn side_amount(records: &[&TradeRecord]) -> Option<Decimal> {
    let quantity = records
        .iter()
        .try_fold(Decimal::ZERO, |sum, r| sum.checked_add(Decimal::from(r.quantity)))?;
    let price_sum = records
        .iter()
        .try_fold(Decimal::ZERO, |sum, r| sum.checked_add(r.unit_price))?;
    let mean_price = price_sum.checked_div(Decimal::from(records.len()))?;
    quantity.checked_mul(mean_price)
}

fn validate(records: &[TradeRecord]) -> Result<(), TaxError> {
    for (index, record) in records.iter().enumerate() {
        let reason = if record.quantity == 0 {
            Some("quantity must be positive")
        } else if record.unit_price.is_sign_negative() {
            Some("unit price must not be negative")
        } else if record.gross_value.is_sign_negative() {
            Some("gross value must not be negative")
        } else if record.asset_code.trim().is_empty() {
            Some("asset code is empty")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(TaxError::InvalidRecord {
                index,
                asset: record.asset_code.clone(),
                reason,
            });
        }
    }
    Ok(())
}
