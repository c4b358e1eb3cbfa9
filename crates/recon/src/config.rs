use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::money::BPS_SCALE;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine parameters. Every key is optional; an empty document yields the
/// production defaults (9% commission, 30.00 service fee, RON, top 3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SettlementConfig {
    /// Commission on total net, in basis points.
    pub commission_bps: u32,
    /// Flat weekly fee charged to every driver, in minor units.
    pub service_fee_cents: i64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            commission_bps: 900,
            service_fee_cents: 3_000,
        }
    }
}

impl SettlementConfig {
    /// `9%`, `12.5%`
    pub fn commission_label(&self) -> String {
        let whole = self.commission_bps / 100;
        let frac = self.commission_bps % 100;
        if frac == 0 {
            format!("{whole}%")
        } else {
            format!("{}%", format!("{whole}.{frac:02}").trim_end_matches('0'))
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReportConfig {
    /// Suffix for display amounts (`1,335.00 RON`).
    pub currency: String,
    /// How many drivers the ranking keeps.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency: "RON".into(),
            top_n: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if i64::from(self.settlement.commission_bps) > BPS_SCALE {
            return Err(ReconError::ConfigValidation(format!(
                "settlement.commission_bps must be at most {BPS_SCALE}, got {}",
                self.settlement.commission_bps
            )));
        }

        if self.settlement.service_fee_cents < 0 {
            return Err(ReconError::ConfigValidation(format!(
                "settlement.service_fee_cents must not be negative, got {}",
                self.settlement.service_fee_cents
            )));
        }

        if self.report.currency.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "report.currency must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
