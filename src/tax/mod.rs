// Tax module - monthly IR on options: day/swing classification, carry-forward, DARF

pub mod carryforward;
pub mod classify;
pub mod darf;
pub mod monthly;
pub mod period;

use rust_decimal::Decimal;
use serde::Serialize;

pub use carryforward::{CarryForwardState, LaneOutcome};
pub use classify::{classify, DayTradeRule, TradeType};
pub use darf::{format_darf_summary, generate_darf_payments, DarfPayment};
pub use monthly::{compute, compute_with, MonthlyResult, TaxReport};
pub use period::YearMonth;

/// Rates and classification rule for one computation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxConfig {
    /// Operações comuns rate (15%)
    pub swing_rate: Decimal,
    /// Day trade rate (20%)
    pub day_rate: Decimal,
    pub day_trade_rule: DayTradeRule,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            swing_rate: Decimal::new(15, 2),
            day_rate: Decimal::new(20, 2),
            day_trade_rule: DayTradeRule::default(),
        }
    }
}

impl TaxConfig {
    pub fn rate(&self, lane: TradeType) -> Decimal {
        match lane {
            TradeType::Swing => self.swing_rate,
            TradeType::Day => self.day_rate,
        }
    }
}
