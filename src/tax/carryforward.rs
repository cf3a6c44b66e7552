use rust_decimal::Decimal;
use serde::Serialize;

use super::classify::TradeType;

/// Losses carried into the next period, one per lane. Both are ≤ 0.
///
/// Owned by a single computation run and advanced once per period in
/// chronological order; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CarryForwardState {
    pub swing_loss_carry: Decimal,
    pub day_loss_carry: Decimal,
}

/// Net result and tax of one lane in one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneOutcome {
    pub net_profit: Decimal,
    pub tax: Decimal,
}

impl CarryForwardState {
    pub fn carry(&self, lane: TradeType) -> Decimal {
        match lane {
            TradeType::Swing => self.swing_loss_carry,
            TradeType::Day => self.day_loss_carry,
        }
    }

    fn carry_mut(&mut self, lane: TradeType) -> &mut Decimal {
        match lane {
            TradeType::Swing => &mut self.swing_loss_carry,
            TradeType::Day => &mut self.day_loss_carry,
        }
    }

    /// Net a period's raw profit against the carried loss and tax it.
    ///
    /// A positive net is taxed and clears the carry. A net ≤ 0 pays nothing
    /// and becomes the new carry, replacing the previous one. `None` when
    /// the amounts overflow; the state is left untouched in that case.
    pub fn settle(
        &mut self,
        lane: TradeType,
        raw_profit: Decimal,
        rate: Decimal,
    ) -> Option<LaneOutcome> {
        let net_profit = raw_profit.checked_add(self.carry(lane))?;

        let (tax, carry) = if net_profit > Decimal::ZERO {
            (net_profit.checked_mul(rate)?, Decimal::ZERO)
        } else {
            (Decimal::ZERO, net_profit)
        };
        *self.carry_mut(lane) = carry;

        Some(LaneOutcome { net_profit, tax })
    }

    pub fn has_losses(&self) -> bool {
        self.swing_loss_carry < Decimal::ZERO || self.day_loss_carry < Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profit_is_taxed_and_clears_carry() {
        let mut state = CarryForwardState::default();
        let outcome = state.settle(TradeType::Swing, dec!(1000), dec!(0.15)).unwrap();
        assert_eq!(outcome.net_profit, dec!(1000));
        assert_eq!(outcome.tax, dec!(150.00));
        assert_eq!(state.swing_loss_carry, Decimal::ZERO);
    }

    #[test]
    fn test_loss_replaces_previous_carry() {
        let mut state = CarryForwardState::default();
        state.settle(TradeType::Swing, dec!(-1000), dec!(0.15)).unwrap();
        assert_eq!(state.swing_loss_carry, dec!(-1000));

        let outcome = state.settle(TradeType::Swing, dec!(600), dec!(0.15)).unwrap();
        assert_eq!(outcome.net_profit, dec!(-400));
        assert_eq!(outcome.tax, Decimal::ZERO);
        // Latest net loss, not -1400
        assert_eq!(state.swing_loss_carry, dec!(-400));
    }

    #[test]
    fn test_lanes_are_independent() {
        let mut state = CarryForwardState::default();
        state.settle(TradeType::Day, dec!(-300), dec!(0.20)).unwrap();

        let swing = state.settle(TradeType::Swing, dec!(100), dec!(0.15)).unwrap();
        assert_eq!(swing.tax, dec!(15.00));
        assert_eq!(state.day_loss_carry, dec!(-300));

        let day = state.settle(TradeType::Day, dec!(500), dec!(0.20)).unwrap();
        assert_eq!(day.net_profit, dec!(200));
        assert_eq!(day.tax, dec!(40.00));
        assert!(!state.has_losses());
    }

    #[test]
    fn test_zero_profit_keeps_zero_carry() {
        let mut state = CarryForwardState::default();
        let outcome = state.settle(TradeType::Day, Decimal::ZERO, dec!(0.20)).unwrap();
        assert_eq!(outcome.tax, Decimal::ZERO);
        assert_eq!(state, CarryForwardState::default());
    }

    #[test]
    fn test_overflow_leaves_carry_untouched() {
        let mut state = CarryForwardState {
            swing_loss_carry: Decimal::ZERO,
            day_loss_carry: dec!(-1),
        };
        assert_eq!(state.settle(TradeType::Day, Decimal::MIN, dec!(0.20)), None);
        assert_eq!(state.day_loss_carry, dec!(-1));
        assert_eq!(state.settle(TradeType::Swing, Decimal::MAX, dec!(1.5)), None);
    }
}
