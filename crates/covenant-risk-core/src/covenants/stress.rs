use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::model::RatioCategory;
use crate::error::CovenantRiskError;
use crate::types::Percent;
use crate::CovenantRiskResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest EBITDA multiplier used when a scenario wipes out all EBITDA.
pub const EBITDA_MULTIPLIER_FLOOR: Decimal = dec!(0.0001);
/// Flat working-capital haircut applied to liquidity ratios under stress.
pub const LIQUIDITY_HAIRCUT: Decimal = dec!(0.9);
/// Basis points divisor
const BPS_DIVISOR: Decimal = dec!(10000);
const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A hypothetical macro shock. The default is the baseline (no shock).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressScenario {
    /// EBITDA decline in percent (20 = 20%), 0 to 100.
    pub ebitda_drop_percent: Percent,
    /// Interest rate increase in basis points, non-negative.
    pub interest_rate_hike_bps: Decimal,
}

impl StressScenario {
    pub fn baseline() -> Self {
        Self::default()
    }

    pub fn new(ebitda_drop_percent: Percent, interest_rate_hike_bps: Decimal) -> CovenantRiskResult<Self> {
        let scenario = StressScenario {
            ebitda_drop_percent,
            interest_rate_hike_bps,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> CovenantRiskResult<()> {
        if self.ebitda_drop_percent < Decimal::ZERO || self.ebitda_drop_percent > HUNDRED {
            return Err(CovenantRiskError::InvalidInput {
                field: "ebitda_drop_percent".into(),
                reason: format!(
                    "EBITDA drop must be between 0 and 100 percent (got {})",
                    self.ebitda_drop_percent
                ),
            });
        }
        if self.interest_rate_hike_bps < Decimal::ZERO {
            return Err(CovenantRiskError::InvalidInput {
                field: "interest_rate_hike_bps".into(),
                reason: format!(
                    "Rate hike cannot be negative (got {} bps)",
                    self.interest_rate_hike_bps
                ),
            });
        }
        Ok(())
    }

    pub fn is_baseline(&self) -> bool {
        self.ebitda_drop_percent.is_zero() && self.interest_rate_hike_bps.is_zero()
    }

    /// `1 - drop / 100`, floored at [`EBITDA_MULTIPLIER_FLOOR`].
    pub fn ebitda_multiplier(&self) -> Decimal {
        let m = Decimal::ONE - self.ebitda_drop_percent / HUNDRED;
        if m <= Decimal::ZERO {
            EBITDA_MULTIPLIER_FLOOR
        } else {
            m
        }
    }

    /// `1 + bps / 10000`
    pub fn rate_multiplier(&self) -> Decimal {
        Decimal::ONE + self.interest_rate_hike_bps / BPS_DIVISOR
    }
}

// ---------------------------------------------------------------------------
// Stress model
// ---------------------------------------------------------------------------

/// Project a covenant value under `scenario`.
///
/// The baseline scenario returns `current` unchanged for every category.
/// A projection that leaves the `Decimal` range is an error for this
/// covenant only.
pub fn stress(
    current: Decimal,
    category: RatioCategory,
    scenario: &StressScenario,
) -> CovenantRiskResult<Decimal> {
    if scenario.is_baseline() {
        return Ok(current);
    }

    let ebitda = scenario.ebitda_multiplier();
    let stressed = match category {
        RatioCategory::LeverageRatio | RatioCategory::Other => current.checked_div(ebitda),
        RatioCategory::CoverageRatio | RatioCategory::ServiceCoverageRatio => current
            .checked_mul(ebitda)
            .and_then(|v| v.checked_div(scenario.rate_multiplier())),
        RatioCategory::LiquidityRatio => current.checked_mul(LIQUIDITY_HAIRCUT),
    };
    stressed.ok_or_else(|| CovenantRiskError::out_of_range("stressed_value"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
