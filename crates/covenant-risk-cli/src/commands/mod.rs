pub mod compare;
pub mod evaluate;
pub mod forecast;
pub mod presets;
pub mod stress;
pub mod update;

use clap::Args;
use covenant_risk_core::covenants::{CovenantKind, CovenantRecord, StressScenario};
use covenant_risk_core::portfolio::ScenarioPreset;
use rust_decimal::Decimal;

/// Scenario flags shared by the portfolio commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioFlags {
    /// EBITDA decline in percent (20 = 20%)
    #[arg(long)]
    pub ebitda_drop: Option<Decimal>,

    /// Interest rate increase in basis points
    #[arg(long)]
    pub rate_hike_bps: Option<Decimal>,

    /// Named preset: baseline, rate_plus_200bps, ebitda_minus_10, combined
    #[arg(long)]
    pub preset: Option<ScenarioPreset>,
}

impl ScenarioFlags {
    pub fn has_explicit_shock(&self) -> bool {
        self.ebitda_drop.is_some() || self.rate_hike_bps.is_some()
    }

    /// The scenario asked for on the command line. Explicit shocks override
    /// the matching field of the preset.
    pub fn resolve(&self) -> Option<StressScenario> {
        if !self.has_explicit_shock() {
            return self.preset.map(ScenarioPreset::scenario);
        }
        let base = self.preset.map(ScenarioPreset::scenario).unwrap_or_default();
        Some(StressScenario {
            ebitda_drop_percent: self.ebitda_drop.unwrap_or(base.ebitda_drop_percent),
            interest_rate_hike_bps: self.rate_hike_bps.unwrap_or(base.interest_rate_hike_bps),
        })
    }
}

/// Covenant definition given through individual flags.
#[derive(Args, Debug, Clone, Default)]
#[command(allow_hyphen_values = true)]
pub struct CovenantFlags {
    /// Covenant name, e.g. "Debt/EBITDA" (drives the ratio category)
    #[arg(long)]
    pub name: Option<String>,

    /// Comparison the value must satisfy: <, <=, >, >=
    #[arg(long)]
    pub operator: Option<String>,

    /// Threshold value
    #[arg(long)]
    pub threshold: Option<Decimal>,
}

impl CovenantFlags {
    pub fn to_record(&self, current_value: Option<Decimal>) -> Result<CovenantRecord, String> {
        let name = self.name.clone().ok_or("--name is required")?;
        let operator = self.operator.clone().ok_or("--operator is required")?;
        let threshold_value = self.threshold.ok_or("--threshold is required")?;
        Ok(CovenantRecord {
            id: "cli".into(),
            name,
            clause_ref: String::new(),
            kind: CovenantKind::Financial,
            threshold_value,
            operator,
            unit: "x".into(),
            current_value,
            ratio_category: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_preset_alone() {
        let flags = ScenarioFlags {
            preset: Some(ScenarioPreset::RatePlus200Bps),
            ..Default::default()
        };
        assert_eq!(flags.resolve(), Some(ScenarioPreset::RatePlus200Bps.scenario()));
    }

    #[test]
    fn test_flag_overrides_preset_field() {
        let flags = ScenarioFlags {
            ebitda_drop: Some(dec!(25)),
            rate_hike_bps: None,
            preset: Some(ScenarioPreset::Combined),
        };
        let s = flags.resolve().unwrap();
        assert_eq!(s.ebitda_drop_percent, dec!(25));
        assert_eq!(s.interest_rate_hike_bps, dec!(200));
    }

    #[test]
    fn test_no_flags_no_scenario() {
        assert!(ScenarioFlags::default().resolve().is_none());
    }

    #[test]
    fn test_covenant_flags_require_operator() {
        let flags = CovenantFlags {
            name: Some("Debt/EBITDA".into()),
            operator: None,
            threshold: Some(dec!(4)),
        };
        assert!(flags.to_record(Some(dec!(3))).is_err());
    }
}
