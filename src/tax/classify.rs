//! Day trade vs swing trade classification.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::notes::{Side, TradeRecord};

/// Tax lane a trade falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeType {
    /// Operações comuns: opened and closed on different dates (15%)
    Swing,
    /// Opened and closed on the same date (20%)
    Day,
}

impl TradeType {
    pub fn display_name(&self) -> &'static str {
        match self {
            TradeType::Swing => "Swing Trade",
            TradeType::Day => "Day Trade",
        }
    }
}

/// Which trades share a bucket when looking for a buy/sell pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DayTradeRule {
    /// Same trade date and asset
    #[default]
    SameDate,
    /// Same calendar month and asset
    SameMonth,
}

impl DayTradeRule {
    fn bucket_date(&self, date: NaiveDate) -> NaiveDate {
        match self {
            DayTradeRule::SameDate => date,
            DayTradeRule::SameMonth => date.with_day(1).unwrap_or(date),
        }
    }
}

impl FromStr for DayTradeRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "same-date" | "date" => Ok(DayTradeRule::SameDate),
            "same-month" | "month" => Ok(DayTradeRule::SameMonth),
            other => Err(format!(
                "unknown day trade rule '{}' (expected same-date or same-month)",
                other
            )),
        }
    }
}

impl fmt::Display for DayTradeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayTradeRule::SameDate => f.write_str("same-date"),
            DayTradeRule::SameMonth => f.write_str("same-month"),
        }
    }
}

/// Tag every record with its lane. A bucket holding both a buy and a sell
/// is day trade; everything else is swing trade. Input order is preserved.
pub fn classify(records: &[TradeRecord], rule: DayTradeRule) -> Vec<(TradeType, &TradeRecord)> {
    let mut sides: HashMap<(NaiveDate, &str), (bool, bool)> = HashMap::new();
    for record in records {
        let key = (rule.bucket_date(record.trade_date), record.asset_code.as_str());
        let entry = sides.entry(key).or_insert((false, false));
        match record.side {
            Side::Buy => entry.0 = true,
            Side::Sell => entry.1 = true,
        }
    }

    records
        .iter()
        .map(|record| {
            let key = (rule.bucket_date(record.trade_date), record.asset_code.as_str());
            let lane = match sides.get(&key) {
                Some((true, true)) => TradeType::Day,
                _ => TradeType::Swing,
            };
            (lane, record)
        })
        .collect()
}
