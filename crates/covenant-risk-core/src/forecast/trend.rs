//! Linear trend projection of a short covenant history.
//!
//! The slope is `(last - first) / count`, a deliberately simple estimate
//! rather than a least-squares fit. Whether a rising value is bad depends on
//! the covenant's operator, so the operator is a required input.

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::covenants::evaluator::is_breached;
use crate::covenants::model::{Bound, CovenantOperator};
use crate::error::CovenantRiskError;
use crate::types::*;
use crate::CovenantRiskResult;

/// Scale applied to the adverse slope when turning it into a probability.
const PROBABILITY_SENSITIVITY: Decimal = dec!(1000);
const NEUTRAL_PROBABILITY: Percent = dec!(50);
/// Probability above which the borrower should be engaged.
const ESCALATION_PROBABILITY: Percent = dec!(30);
const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Moving toward the threshold.
    Deteriorating,
    /// Moving away from the threshold.
    Improving,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    #[serde(default)]
    pub loan_id: Option<String>,
    #[serde(default)]
    pub covenant_id: Option<String>,
    /// Oldest first.
    pub historical_values: Vec<Decimal>,
    pub threshold: Decimal,
    pub operator: String,
    /// One date per value, strictly increasing.
    #[serde(default)]
    pub historical_dates: Option<Vec<NaiveDate>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub trend_per_period: Decimal,
    pub direction: TrendDirection,
    /// Periods until the threshold is crossed; zero when already breached.
    pub projected_periods_to_breach: Option<Decimal>,
    pub breach_probability_pct: Percent,
    pub projected_breach_date: Option<NaiveDate>,
    pub recommendation: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn forecast_trend(
    values: &[Decimal],
    threshold: Decimal,
    operator: CovenantOperator,
) -> CovenantRiskResult<TrendForecast> {
    let (first, last) = match values {
        [first, .., last] => (*first, *last),
        _ => {
            return Err(CovenantRiskError::InsufficientData(format!(
                "Trend forecast needs at least 2 historical values (got {})",
                values.len()
            )))
        }
    };

    let trend = last
        .checked_sub(first)
        .ok_or_else(|| CovenantRiskError::out_of_range("historical_values"))?
        / Decimal::from(values.len());
    // Positive when the value is moving toward the threshold.
    let adverse_trend = match operator.bound() {
        Bound::Upper => trend,
        Bound::Lower => -trend,
    };

    let direction = if adverse_trend > Decimal::ZERO {
        TrendDirection::Deteriorating
    } else if adverse_trend < Decimal::ZERO {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    };

    let already_breached = is_breached(threshold, operator, last);
    let projected_periods_to_breach = if already_breached {
        Some(Decimal::ZERO)
    } else if direction == TrendDirection::Deteriorating {
        // None when the distance is too large to express in periods.
        threshold.checked_sub(last).and_then(|gap| gap.checked_div(trend))
    } else {
        None
    };

    let breach_probability_pct = if already_breached {
        HUNDRED
    } else {
        adverse_trend
            .checked_mul(PROBABILITY_SENSITIVITY)
            .and_then(|p| p.checked_add(NEUTRAL_PROBABILITY))
            .map(|p| p.clamp(Decimal::ZERO, HUNDRED))
            // a slope too steep to scale is saturated either way
            .unwrap_or(if adverse_trend > Decimal::ZERO {
                HUNDRED
            } else {
                Decimal::ZERO
            })
    };

    let recommendation = if breach_probability_pct > ESCALATION_PROBABILITY {
        "Monitor quarterly and discuss with borrower"
    } else {
        "Current trajectory acceptable"
    };

    Ok(TrendForecast {
        trend_per_period: trend,
        direction,
        projected_periods_to_breach,
        breach_probability_pct,
        projected_breach_date: None,
        recommendation: recommendation.to_string(),
    })
}

/// Validate a forecast request, run [`forecast_trend`] and project a breach
/// date when observation dates are supplied.
pub fn forecast_covenant(
    input: &ForecastInput,
) -> CovenantRiskResult<ComputationOutput<TrendForecast>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let operator: CovenantOperator = input.operator.parse()?;
    let mut forecast = forecast_trend(&input.historical_values, input.threshold, operator)?;

    if let Some(dates) = &input.historical_dates {
        validate_dates(dates, input.historical_values.len())?;
        forecast.projected_breach_date = forecast
            .projected_periods_to_breach
            .and_then(|periods| project_date(dates, periods));
    }

    if input.historical_values.len() < 4 {
        warnings.push(format!(
            "Only {} observations; trend is indicative.",
            input.historical_values.len()
        ));
    }
    if input.threshold.is_zero() {
        warnings.push("Threshold is zero; breach probability may be misleading.".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "loan_id": input.loan_id,
        "covenant_id": input.covenant_id,
        "operator": operator.symbol(),
        "threshold": input.threshold.to_string(),
        "observations": input.historical_values.len(),
        "slope": "(last - first) / count",
    });

    Ok(with_metadata(
        "Linear Covenant Trend Forecast",
        &assumptions,
        warnings,
        elapsed,
        forecast,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_dates(dates: &[NaiveDate], value_count: usize) -> CovenantRiskResult<()> {
    if dates.len() != value_count {
        return Err(CovenantRiskError::InvalidInput {
            field: "historical_dates".into(),
            reason: format!(
                "Expected {} dates to match the historical values (got {})",
                value_count,
                dates.len()
            ),
        });
    }
    if dates.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CovenantRiskError::InvalidInput {
            field: "historical_dates".into(),
            reason: "Dates must be strictly increasing".into(),
        });
    }
    Ok(())
}

/// Last observation date plus `periods` times the mean spacing, rounded up
/// to whole days.
fn project_date(dates: &[NaiveDate], periods: Decimal) -> Option<NaiveDate> {
    let first = *dates.first()?;
    let last = *dates.last()?;
    let span_days = Decimal::from((last - first).num_days());
    let spacing = span_days.checked_div(Decimal::from(dates.len() - 1))?;
    let offset = periods.checked_mul(spacing)?.ceil().to_u64()?;
    last.checked_add_days(Days::new(offset))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rising_leverage_deteriorates() {
        let f = forecast_trend(&[dec!(2.8), dec!(2.9), dec!(3.1)], dec!(4.0), CovenantOperator::LT)
            .unwrap();
        assert_eq!(f.trend_per_period, dec!(0.1));
        assert_eq!(f.direction, TrendDirection::Deteriorating);
        assert_eq!(f.projected_periods_to_breach, Some(dec!(9)));
        assert_eq!(f.breach_probability_pct, dec!(100));
        assert_eq!(f.recommendation, "Monitor quarterly and discuss with borrower");
    }

    #[test]
    fn test_falling_coverage_deteriorates() {
        // Lower-bound covenant: a falling value is the bad direction.
        let f = forecast_trend(&[dec!(3.0), dec!(2.7)], dec!(2.0), CovenantOperator::GTE).unwrap();
        assert_eq!(f.trend_per_period, dec!(-0.15));
        assert_eq!(f.direction, TrendDirection::Deteriorating);
        // (2.0 - 2.7) / -0.15
        assert_eq!(
            f.projected_periods_to_breach.map(|p| p.round_dp(4)),
            Some(dec!(4.6667))
        );
    }

    #[test]
    fn test_rising_coverage_improves() {
        let f = forecast_trend(&[dec!(2.5), dec!(2.6), dec!(2.7)], dec!(2.0), CovenantOperator::GTE)
            .unwrap();
        assert_eq!(f.direction, TrendDirection::Improving);
        assert!(f.projected_periods_to_breach.is_none());
        assert_eq!(f.breach_probability_pct, Decimal::ZERO);
        assert_eq!(f.recommendation, "Current trajectory acceptable");
    }

    #[test]
    fn test_flat_history_is_stable() {
        let f = forecast_trend(&[dec!(3.0), dec!(3.0)], dec!(4.0), CovenantOperator::LT).unwrap();
        assert_eq!(f.direction, TrendDirection::Stable);
        assert!(f.projected_periods_to_breach.is_none());
        assert_eq!(f.breach_probability_pct, dec!(50));
    }

    #[test]
    fn test_already_breached_reports_zero_periods() {
        let f = forecast_trend(&[dec!(4.4), dec!(4.2)], dec!(4.0), CovenantOperator::LT).unwrap();
        assert_eq!(f.direction, TrendDirection::Improving);
        assert_eq!(f.projected_periods_to_breach, Some(Decimal::ZERO));
        assert_eq!(f.breach_probability_pct, dec!(100));
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let err = forecast_trend(&[dec!(3.0)], dec!(4.0), CovenantOperator::LT).unwrap_err();
        assert!(matches!(err, CovenantRiskError::InsufficientData(_)));
        assert!(forecast_trend(&[], dec!(4.0), CovenantOperator::LT).is_err());
    }

    #[test]
    fn test_breach_date_from_quarterly_history() {
        let input = ForecastInput {
            loan_id: Some("loan-001".into()),
            covenant_id: None,
            historical_values: vec![dec!(2.8), dec!(2.9), dec!(3.1)],
            threshold: dec!(4.0),
            operator: "<".into(),
            historical_dates: Some(vec![date(2024, 1, 1), date(2024, 4, 1), date(2024, 7, 1)]),
        };
        let out = forecast_covenant(&input).unwrap();
        // 182 days over 2 gaps = 91 per period; 9 periods = 819 days.
        assert_eq!(out.result.projected_breach_date, Some(date(2026, 9, 28)));
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_history_spanning_decimal_range_is_rejected() {
        let err = forecast_trend(&[Decimal::MIN, Decimal::MAX], Decimal::ZERO, CovenantOperator::LT)
            .unwrap_err();
        assert!(matches!(err, CovenantRiskError::InvalidInput { .. }));
    }

    #[test]
    fn test_steep_slope_saturates_probability() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        let f = forecast_trend(&[Decimal::ZERO, huge], Decimal::MAX, CovenantOperator::LT).unwrap();
        assert_eq!(f.direction, TrendDirection::Deteriorating);
        assert_eq!(f.breach_probability_pct, dec!(100));

        let f = forecast_trend(&[Decimal::ZERO, huge], -Decimal::MAX, CovenantOperator::GT).unwrap();
        assert_eq!(f.direction, TrendDirection::Improving);
        assert_eq!(f.breach_probability_pct, Decimal::ZERO);
    }

    #[test]
    fn test_unreachable_breach_date_is_none() {
        let dates = [date(2024, 1, 1), date(2024, 4, 1)];
        let periods = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        // 1e27 periods * 91 days does not fit in a Decimal
        assert_eq!(project_date(&dates, periods), None);

        let input = ForecastInput {
            loan_id: None,
            covenant_id: None,
            historical_values: vec![Decimal::ZERO, Decimal::new(1, 20)],
            threshold: dec!(10_000_000),
            operator: "<".into(),
            historical_dates: Some(dates.to_vec()),
        };
        let out = forecast_covenant(&input).unwrap();
        assert!(out.result.projected_periods_to_breach.is_some());
        assert_eq!(out.result.projected_breach_date, None);
    }

    #[test]
    fn test_mismatched_dates_rejected() {
        let input = ForecastInput {
            loan_id: None,
            covenant_id: None,
            historical_values: vec![dec!(2.8), dec!(2.9)],
            threshold: dec!(4.0),
            operator: "LT".into(),
            historical_dates: Some(vec![date(2024, 1, 1)]),
        };
        assert!(forecast_covenant(&input).is_err());
    }

    #[test]
    fn test_unsorted_dates_rejected() {
        let input = ForecastInput {
            loan_id: None,
            covenant_id: None,
            historical_values: vec![dec!(2.8), dec!(2.9)],
            threshold: dec!(4.0),
            operator: "LT".into(),
            historical_dates: Some(vec![date(2024, 4, 1), date(2024, 1, 1)]),
        };
        assert!(forecast_covenant(&input).is_err());
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let input = ForecastInput {
            loan_id: None,
            covenant_id: None,
            historical_values: vec![dec!(2.8), dec!(2.9)],
            threshold: dec!(4.0),
            operator: "==".into(),
            historical_dates: None,
        };
        let err = forecast_covenant(&input).unwrap_err();
        assert!(matches!(err, CovenantRiskError::InvalidInput { .. }));
    }
}
