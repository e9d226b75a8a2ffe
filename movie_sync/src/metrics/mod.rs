//! Metrics engine.
//!
//! The functions in this module are pure: ROI and the classification tiers are
//! functions of `(budget, revenue)` only. Tiers are computed on demand and
//! never persisted. [`recompute`] writes the derived `roi_percent` column;
//! [`rollup`] and [`portfolio`] serve the read-only aggregate queries.

pub mod portfolio;
pub mod recompute;
pub mod rollup;

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

/// Decimal places ROI is rounded and stored with.
pub const ROI_SCALE: u32 = 2;

/// `((revenue - budget) / budget) * 100`, rounded to two places.
///
/// `None` unless `budget > 0` and `revenue` is present. Rounding is
/// half-to-even; the result always carries exactly two decimal places.
pub fn roi_percent(budget: Option<Decimal>, revenue: Option<Decimal>) -> Option<Decimal> {
    let budget = budget.filter(|b| *b > Decimal::ZERO)?;
    let revenue = revenue?;
    let Some(roi) = revenue
        .checked_sub(budget)
        .and_then(|gain| gain.checked_div(budget))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        warn!(%budget, %revenue, "ROI overflows the decimal range; leaving it unset");
        return None;
    };
    let mut roi = roi.round_dp(ROI_SCALE);
    roi.rescale(ROI_SCALE);
    Some(roi)
}

/// `Some(revenue > budget)` when ROI is defined.
pub fn is_profitable(budget: Option<Decimal>, revenue: Option<Decimal>) -> Option<bool> {
    roi_percent(budget, revenue).map(|roi| roi > Decimal::ZERO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BudgetTier {
    Unknown,
    Micro,
    Low,
    Medium,
    High,
    Blockbuster,
}

impl BudgetTier {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetTier::Unknown => "Unknown",
            BudgetTier::Micro => "Micro",
            BudgetTier::Low => "Low",
            BudgetTier::Medium => "Medium",
            BudgetTier::High => "High",
            BudgetTier::Blockbuster => "Blockbuster",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PerformanceTier {
    Unknown,
    Poor,
    Loss,
    BreakEven,
    Good,
    Excellent,
}

impl PerformanceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceTier::Unknown => "Unknown",
            PerformanceTier::Poor => "Poor",
            PerformanceTier::Loss => "Loss",
            PerformanceTier::BreakEven => "BreakEven",
            PerformanceTier::Good => "Good",
            PerformanceTier::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower bounds are inclusive, upper bounds exclusive.
pub fn budget_tier(budget: Option<Decimal>) -> BudgetTier {
    let Some(budget) = budget else {
        return BudgetTier::Unknown;
    };
    if budget < Decimal::from(1_000_000) {
        BudgetTier::Micro
    } else if budget < Decimal::from(15_000_000) {
        BudgetTier::Low
    } else if budget < Decimal::from(50_000_000) {
        BudgetTier::Medium
    } else if budget < Decimal::from(150_000_000) {
        BudgetTier::High
    } else {
        BudgetTier::Blockbuster
    }
}

/// Lower bounds are inclusive, upper bounds exclusive.
pub fn performance_tier(roi: Option<Decimal>) -> PerformanceTier {
    let Some(roi) = roi else {
        return PerformanceTier::Unknown;
    };
    if roi < Decimal::from(-50) {
        PerformanceTier::Poor
    } else if roi < Decimal::ZERO {
        PerformanceTier::Loss
    } else if roi < Decimal::from(50) {
        PerformanceTier::BreakEven
    } else if roi < Decimal::from(200) {
        PerformanceTier::Good
    } else {
        PerformanceTier::Excellent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roi_of_a_hit() {
        let roi = roi_percent(Some(dec!(20000000)), Some(dec!(80000000))).unwrap();
        assert_eq!(roi, dec!(300));
        assert_eq!(roi.to_string(), "300.00");
    }

    #[test]
    fn roi_needs_positive_budget_and_revenue() {
        assert_eq!(roi_percent(None, Some(dec!(10))), None);
        assert_eq!(roi_percent(Some(dec!(0)), Some(dec!(10))), None);
        assert_eq!(roi_percent(Some(dec!(10)), None), None);
        assert_eq!(roi_percent(Some(dec!(10)), Some(dec!(0))), Some(dec!(-100.00)));
    }

    #[test]
    fn roi_rounds_to_two_places() {
        // 1/3 = 33.333..%
        assert_eq!(roi_percent(Some(dec!(3)), Some(dec!(4))), Some(dec!(33.33)));
        // 2/3 = 66.666..%
        assert_eq!(roi_percent(Some(dec!(3)), Some(dec!(5))), Some(dec!(66.67)));
    }

    #[test]
    fn roi_out_of_decimal_range_is_unset() {
        assert_eq!(roi_percent(Some(dec!(0.0000000001)), Some(Decimal::MAX)), None);
        assert_eq!(is_profitable(Some(dec!(0.0000000001)), Some(Decimal::MAX)), None);
    }

    #[test]
    fn budget_tier_boundaries() {
        assert_eq!(budget_tier(None), BudgetTier::Unknown);
        assert_eq!(budget_tier(Some(dec!(999999))), BudgetTier::Micro);
        assert_eq!(budget_tier(Some(dec!(1000000))), BudgetTier::Low);
        assert_eq!(budget_tier(Some(dec!(14999999.99))), BudgetTier::Low);
        assert_eq!(budget_tier(Some(dec!(15000000))), BudgetTier::Medium);
        assert_eq!(budget_tier(Some(dec!(50000000))), BudgetTier::High);
        assert_eq!(budget_tier(Some(dec!(149999999))), BudgetTier::High);
        assert_eq!(budget_tier(Some(dec!(150000000))), BudgetTier::Blockbuster);
    }

    #[test]
    fn performance_tier_boundaries() {
        assert_eq!(performance_tier(None), PerformanceTier::Unknown);
        assert_eq!(performance_tier(Some(dec!(-50.01))), PerformanceTier::Poor);
        assert_eq!(performance_tier(Some(dec!(-50))), PerformanceTier::Loss);
        assert_eq!(performance_tier(Some(dec!(-0.01))), PerformanceTier::Loss);
        assert_eq!(performance_tier(Some(dec!(0))), PerformanceTier::BreakEven);
        assert_eq!(performance_tier(Some(dec!(49.99))), PerformanceTier::BreakEven);
        assert_eq!(performance_tier(Some(dec!(50))), PerformanceTier::Good);
        assert_eq!(performance_tier(Some(dec!(200))), PerformanceTier::Excellent);
    }

    #[test]
    fn profitability_follows_roi() {
        assert_eq!(is_profitable(Some(dec!(100)), Some(dec!(150))), Some(true));
        assert_eq!(is_profitable(Some(dec!(100)), Some(dec!(100))), Some(false));
        assert_eq!(is_profitable(Some(dec!(0)), Some(dec!(100))), None);
    }

    proptest! {
        #[test]
        fn roi_matches_formula(
            budget in 1i64..1_000_000_000_000,
            revenue in 0i64..5_000_000_000_000,
        ) {
            let b = Decimal::from(budget);
            let r = Decimal::from(revenue);
            let expected = ((r - b) / b * Decimal::ONE_HUNDRED).round_dp(2);
            let roi = roi_percent(Some(b), Some(r)).unwrap();
            prop_assert_eq!(roi, expected);
            prop_assert_eq!(roi.scale(), 2);
        }

        #[test]
        fn tiers_are_monotonic(a in 0i64..500_000_000, b in 0i64..500_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (lo, hi) = (Decimal::from(lo), Decimal::from(hi));
            prop_assert!(budget_tier(Some(lo)) <= budget_tier(Some(hi)));
            let shift = Decimal::from(250_000_000);
            prop_assert!(performance_tier(Some(lo - shift)) <= performance_tier(Some(hi - shift)));
        }
    }
}
