//! The per-driver formula chain.
//!
//! Applied in a fixed order on integer minor units:
//!
//! ```text
//! total_net        = Σ platform net
//! commission       = round(total_net × commission_bps / 10 000)
//! after_commission = total_net − commission
//! total_cash       = Σ platform cash
//! to_be_paid       = after_commission − service_fee − total_cash
//! final_gross      = to_be_paid + total_cash
//! ```
//!
//! `to_be_paid` may be negative: the driver then owes the fleet. Every step
//! is checked; a result outside the `i64` range is `AmountOverflow`.

use std::collections::BTreeMap;

use crate::aggregate::DriverAggregate;
use crate::config::SettlementConfig;
use crate::error::ReconError;
use crate::model::{DriverSettlement, Platform, PlatformAmounts, SettlementAmounts};
use crate::money::apply_bps;

impl SettlementAmounts {
    /// Run the formula chain over per-platform sums. `None` when a step
    /// leaves the `i64` range.
    pub fn compute(
        platforms: BTreeMap<Platform, PlatformAmounts>,
        config: &SettlementConfig,
    ) -> Option<Self> {
        let mut platforms = platforms;
        for p in Platform::ALL {
            platforms.entry(p).or_default();
        }

        let total_net_cents = checked_total(platforms.values().map(|a| a.net_cents))?;
        let commission_cents = apply_bps(total_net_cents, config.commission_bps);
        let after_commission_cents = total_net_cents.checked_sub(commission_cents)?;
        let total_cash_cents = checked_total(platforms.values().map(|a| a.cash_cents))?;
        let service_fee_cents = config.service_fee_cents;
        let to_be_paid_cents = after_commission_cents
            .checked_sub(service_fee_cents)?
            .checked_sub(total_cash_cents)?;
        let final_gross_cents = to_be_paid_cents.checked_add(total_cash_cents)?;

        Some(Self {
            platforms,
            total_net_cents,
            commission_cents,
            after_commission_cents,
            service_fee_cents,
            total_cash_cents,
            to_be_paid_cents,
            final_gross_cents,
        })
    }

    /// Check every row invariant against `config`. `fleetpay summary` warns
    /// about reloaded rows that fail this under the current settings.
    pub fn is_consistent(&self, config: &SettlementConfig) -> bool {
        Self::compute(self.platforms.clone(), config).as_ref() == Some(self)
    }
}

fn checked_total(mut values: impl Iterator<Item = i64>) -> Option<i64> {
    values.try_fold(0i64, i64::checked_add)
}

pub fn settle_driver(
    aggregate: DriverAggregate,
    config: &SettlementConfig,
) -> Result<DriverSettlement, ReconError> {
    let amounts = SettlementAmounts::compute(aggregate.platforms, config).ok_or_else(|| {
        ReconError::AmountOverflow {
            record_id: aggregate.driver.to_string(),
        }
    })?;
    Ok(DriverSettlement {
        driver: aggregate.driver,
        amounts,
    })
}
