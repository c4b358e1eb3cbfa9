use std::collections::{BTreeMap, BTreeSet};

use crate::canonical::CanonicalName;
use crate::error::ReconError;
use crate::model::{Platform, PlatformAmounts, ReconInput};

/// Per-driver sums across every platform and file, before the formula chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverAggregate {
    pub driver: CanonicalName,
    /// One entry per [`Platform::ALL`] member, zero where the driver has no rows.
    pub platforms: BTreeMap<Platform, PlatformAmounts>,
    /// Platforms that actually contributed rows.
    pub seen: BTreeSet<Platform>,
}

impl DriverAggregate {
    fn empty(driver: CanonicalName) -> Self {
        Self {
            driver,
            platforms: Platform::ALL
                .into_iter()
                .map(|p| (p, PlatformAmounts::default()))
                .collect(),
            seen: BTreeSet::new(),
        }
    }
}

/// Group stacked rows by canonical driver, summing net and cash per platform.
///
/// Output is sorted by driver and does not depend on row or platform order.
/// A sum leaving the `i64` range fails with the offending row's id.
pub fn aggregate_rows(input: &ReconInput) -> Result<Vec<DriverAggregate>, ReconError> {
    let mut groups: BTreeMap<CanonicalName, DriverAggregate> = BTreeMap::new();

    for (platform, rows) in &input.records {
        for row in rows {
            let entry = groups
                .entry(row.driver.clone())
                .or_insert_with(|| DriverAggregate::empty(row.driver.clone()));
            let amounts = entry.platforms.entry(*platform).or_default();
            let overflow = || ReconError::AmountOverflow {
                record_id: row.record_id.clone(),
            };
            amounts.net_cents = amounts.net_cents.checked_add(row.net_cents).ok_or_else(overflow)?;
            amounts.cash_cents = amounts.cash_cents.checked_add(row.cash_cents).ok_or_else(overflow)?;
            entry.seen.insert(*platform);
        }
    }

    Ok(groups.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlatformEarningsRow;

    fn row(platform: Platform, driver: &str, net: i64, cash: i64) -> PlatformEarningsRow {
        PlatformEarningsRow {
            platform,
            driver: CanonicalName::new(driver),
            net_cents: net,
            cash_cents: cash,
            record_id: format!("{platform}_{driver}_{net}"),
        }
    }

    #[test]
    fn merges_across_platforms_and_spellings() {
        let mut input = ReconInput::default();
        input.extend(Platform::Bolt, vec![row(Platform::Bolt, "Ion Popescu", 100_000, 20_000)]);
        input.extend(Platform::Uber, vec![row(Platform::Uber, "POPESCU ion", 50_000, 5_000)]);

        let aggs = aggregate_rows(&input).unwrap();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].driver.as_str(), "Ion Popescu");
        assert_eq!(aggs[0].platforms[&Platform::Bolt].net_cents, 100_000);
        assert_eq!(aggs[0].platforms[&Platform::Uber].cash_cents, 5_000);
        assert_eq!(aggs[0].seen.len(), 2);
    }

    #[test]
    fn rows_from_several_files_are_summed() {
        let mut input = ReconInput::default();
        input.extend(Platform::Bolt, vec![row(Platform::Bolt, "Ana Pop", 10_000, 0)]);
        input.extend(Platform::Bolt, vec![row(Platform::Bolt, "Pop Ana", 2_500, 1_000)]);

        let aggs = aggregate_rows(&input).unwrap();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].platforms[&Platform::Bolt].net_cents, 12_500);
        assert_eq!(aggs[0].platforms[&Platform::Bolt].cash_cents, 1_000);
    }

    #[test]
    fn absent_platform_is_zero() {
        let mut input = ReconInput::default();
        input.extend(Platform::Uber, vec![row(Platform::Uber, "Dan Ene", 7_000, 0)]);

        let aggs = aggregate_rows(&input).unwrap();
        assert_eq!(aggs[0].platforms[&Platform::Bolt], PlatformAmounts::default());
        assert_eq!(aggs[0].seen, BTreeSet::from([Platform::Uber]));
    }

    #[test]
    fn sorted_by_driver() {
        let mut input = ReconInput::default();
        input.extend(
            Platform::Bolt,
            vec![
                row(Platform::Bolt, "Zoe Ursu", 1, 0),
                row(Platform::Bolt, "Ana Pop", 1, 0),
                row(Platform::Bolt, "Mihai Radu", 1, 0),
            ],
        );
        let names: Vec<_> = aggregate_rows(&input)
            .unwrap()
            .into_iter()
            .map(|a| a.driver.to_string())
            .collect();
        assert_eq!(names, vec!["Ana Pop", "Mihai Radu", "Ursu Zoe"]);
    }

    #[test]
    fn sum_beyond_i64_is_an_overflow_error() {
        let mut input = ReconInput::default();
        input.extend(
            Platform::Bolt,
            vec![
                row(Platform::Bolt, "Ion", 9_000_000_000_000_000_000, 0),
                row(Platform::Bolt, "Ion", 9_000_000_000_000_000_000, 1),
            ],
        );
        let err = aggregate_rows(&input).unwrap_err();
        assert!(err.is_computation(), "{err}");
        assert_eq!(
            err,
            ReconError::AmountOverflow {
                record_id: "bolt_Ion_9000000000000000000".into()
            }
        );
    }
}
