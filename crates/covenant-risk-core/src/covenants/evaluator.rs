use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::model::{Bound, CovenantOperator};
use crate::error::CovenantRiskError;
use crate::types::Percent;
use crate::CovenantRiskResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A compliant covenant with less cushion than this (in percent) is at risk.
pub const AT_RISK_CUSHION_PCT: Percent = dec!(5);

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compliance classification, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CovenantStatus {
    Compliant,
    AtRisk,
    Breached,
}

impl CovenantStatus {
    pub const ALL: [CovenantStatus; 3] = [
        CovenantStatus::Compliant,
        CovenantStatus::AtRisk,
        CovenantStatus::Breached,
    ];

    /// The more severe of the two statuses.
    pub fn worst(self, other: CovenantStatus) -> CovenantStatus {
        self.max(other)
    }

    pub fn label(self) -> &'static str {
        match self {
            CovenantStatus::Compliant => "compliant",
            CovenantStatus::AtRisk => "at_risk",
            CovenantStatus::Breached => "breached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantEvaluation {
    pub status: CovenantStatus,
    pub observed_value: Decimal,
    /// `None` when the threshold is zero and the cushion cannot be expressed
    /// as a percentage.
    pub cushion_percent: Option<Percent>,
    /// Distance past the threshold; positive means overshoot.
    pub breach_margin: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// True when `observed` violates `observed <op> threshold`.
pub fn is_breached(threshold: Decimal, operator: CovenantOperator, observed: Decimal) -> bool {
    match operator {
        CovenantOperator::LT => observed >= threshold,
        CovenantOperator::LTE => observed > threshold,
        CovenantOperator::GT => observed <= threshold,
        CovenantOperator::GTE => observed < threshold,
    }
}

/// Percentage distance from the threshold, positive on the safe side.
///
/// `Ok(None)` when the threshold is zero. Values so far from a tiny
/// threshold that the percentage cannot be represented are an error.
pub fn cushion_percent(
    threshold: Decimal,
    operator: CovenantOperator,
    observed: Decimal,
) -> CovenantRiskResult<Option<Percent>> {
    if threshold.is_zero() {
        return Ok(None);
    }
    let headroom = match operator.bound() {
        Bound::Upper => threshold.checked_sub(observed),
        Bound::Lower => observed.checked_sub(threshold),
    };
    headroom
        .and_then(|h| h.checked_div(threshold))
        .and_then(|r| r.checked_mul(HUNDRED))
        .map(Some)
        .ok_or_else(|| CovenantRiskError::out_of_range("cushion_percent"))
}

pub fn breach_margin(
    threshold: Decimal,
    operator: CovenantOperator,
    observed: Decimal,
) -> CovenantRiskResult<Decimal> {
    let margin = match operator.bound() {
        Bound::Upper => observed.checked_sub(threshold),
        Bound::Lower => threshold.checked_sub(observed),
    };
    margin.ok_or_else(|| CovenantRiskError::out_of_range("breach_margin"))
}

/// Classify an observed (current or stressed) value against a covenant.
///
/// Breached when the breach predicate holds; otherwise at risk when the
/// cushion is below [`AT_RISK_CUSHION_PCT`]. With a zero threshold the
/// cushion is undefined and only the breach predicate decides.
pub fn evaluate(
    threshold: Decimal,
    operator: CovenantOperator,
    observed: Decimal,
) -> CovenantRiskResult<CovenantEvaluation> {
    let breached = is_breached(threshold, operator, observed);
    let cushion = cushion_percent(threshold, operator, observed)?;

    let status = if breached {
        CovenantStatus::Breached
    } else {
        match cushion {
            Some(c) if c < AT_RISK_CUSHION_PCT => CovenantStatus::AtRisk,
            _ => CovenantStatus::Compliant,
        }
    };

    Ok(CovenantEvaluation {
        status,
        observed_value: observed,
        cushion_percent: cushion,
        breach_margin: breach_margin(threshold, operator, observed)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
