use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::canonical::CanonicalName;
use crate::money;
use crate::report::{amount_columns, PlatformDue, SettlementColumn};

// ---------------------------------------------------------------------------
// Platforms
// ---------------------------------------------------------------------------

/// Upstream ride-hailing platform. Declaration order fixes column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Bolt,
    Uber,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Bolt, Platform::Uber];

    /// Stable lowercase key, used as column prefix (`bolt_net`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Bolt => "bolt",
            Self::Uber => "uber",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bolt => "Bolt",
            Self::Uber => "Uber",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One parsed export file: header texts as read plus rows of cell texts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// File name or other label used in error messages and record ids.
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map_or(true, |r| r.iter().all(|c| c.trim().is_empty()))
    }

    /// `<source>#<line>` where line 1 is the header row.
    pub fn record_id(&self, row: usize) -> String {
        format!("{}#{}", self.source, row + 2)
    }
}

/// An export tagged with the platform it was uploaded for.
#[derive(Debug, Clone)]
pub struct PlatformUpload {
    pub platform: Platform,
    pub table: RawTable,
}

impl PlatformUpload {
    pub fn new(platform: Platform, table: RawTable) -> Self {
        Self { platform, table }
    }
}

/// A single normalized row from one platform's export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEarningsRow {
    pub platform: Platform,
    pub driver: CanonicalName,
    pub net_cents: i64,
    /// Never negative; the sign some exports use for cash-out is dropped.
    pub cash_cents: i64,
    pub record_id: String,
}

/// Normalized rows grouped by platform, already stacked across files.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub records: BTreeMap<Platform, Vec<PlatformEarningsRow>>,
}

impl ReconInput {
    pub fn extend(&mut self, platform: Platform, rows: Vec<PlatformEarningsRow>) {
        self.records.entry(platform).or_default().extend(rows);
    }

    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformAmounts {
    #[serde(serialize_with = "money::serialize_major")]
    pub net_cents: i64,
    #[serde(serialize_with = "money::serialize_major")]
    pub cash_cents: i64,
}

/// The numeric half of a settlement row. Also used for column totals.
///
/// `platforms` holds an entry for every [`Platform::ALL`] member; a platform
/// the driver never drove for is present with zero amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementAmounts {
    pub platforms: BTreeMap<Platform, PlatformAmounts>,
    pub total_net_cents: i64,
    pub commission_cents: i64,
    pub after_commission_cents: i64,
    pub service_fee_cents: i64,
    pub total_cash_cents: i64,
    pub to_be_paid_cents: i64,
    pub final_gross_cents: i64,
}

impl SettlementAmounts {
    pub fn net_cents(&self, platform: Platform) -> i64 {
        self.platforms.get(&platform).map_or(0, |a| a.net_cents)
    }

    pub fn cash_cents(&self, platform: Platform) -> i64 {
        self.platforms.get(&platform).map_or(0, |a| a.cash_cents)
    }

    /// Column-wise sum, `None` if any column leaves the `i64` range.
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a SettlementAmounts>) -> Option<Self> {
        let mut total = Self {
            platforms: Platform::ALL
                .into_iter()
                .map(|p| (p, PlatformAmounts::default()))
                .collect(),
            ..Self::default()
        };
        for item in items {
            for (platform, amounts) in &item.platforms {
                let entry = total.platforms.entry(*platform).or_default();
                entry.net_cents = entry.net_cents.checked_add(amounts.net_cents)?;
                entry.cash_cents = entry.cash_cents.checked_add(amounts.cash_cents)?;
            }
            total.total_net_cents = total.total_net_cents.checked_add(item.total_net_cents)?;
            total.commission_cents = total.commission_cents.checked_add(item.commission_cents)?;
            total.after_commission_cents =
                total.after_commission_cents.checked_add(item.after_commission_cents)?;
            total.service_fee_cents = total.service_fee_cents.checked_add(item.service_fee_cents)?;
            total.total_cash_cents = total.total_cash_cents.checked_add(item.total_cash_cents)?;
            total.to_be_paid_cents = total.to_be_paid_cents.checked_add(item.to_be_paid_cents)?;
            total.final_gross_cents = total.final_gross_cents.checked_add(item.final_gross_cents)?;
        }
        Some(total)
    }
}

// Flat `{bolt_net, uber_net, total_net, ..., to_be_paid, final_gross}` in
// export column order, amounts in major units.
impl Serialize for SettlementAmounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns = amount_columns();
        let mut map = serializer.serialize_map(Some(columns.len() + 1))?;
        for column in &columns {
            let cents = column.amount(self).unwrap_or(0);
            map.serialize_entry(&column.key(), &money::to_major(cents))?;
        }
        map.serialize_entry("final_gross", &money::to_major(self.final_gross_cents))?;
        map.end()
    }
}

/// One row per unique driver after merging every platform and file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverSettlement {
    pub driver: CanonicalName,
    #[serde(flatten)]
    pub amounts: SettlementAmounts,
}

impl DriverSettlement {
    /// Value of one export column, `None` for the driver column.
    pub fn amount(&self, column: SettlementColumn) -> Option<i64> {
        column.amount(&self.amounts)
    }
}

// ---------------------------------------------------------------------------
// Ranking + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopEarner {
    pub driver: String,
    #[serde(rename = "to_be_paid", serialize_with = "money::serialize_major")]
    pub to_be_paid_cents: i64,
    #[serde(rename = "total_cash", serialize_with = "money::serialize_major")]
    pub total_cash_cents: i64,
    #[serde(rename = "final_gross", serialize_with = "money::serialize_major")]
    pub final_gross_cents: i64,
    pub final_gross_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchMeta {
    pub week: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub drivers: usize,
    /// Normalized rows received per platform, across all files.
    pub records: BTreeMap<Platform, usize>,
    /// Drivers with rows on exactly one platform.
    pub single_platform_drivers: usize,
}

/// Every settlement row for one week plus its derived aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyBatch {
    pub meta: BatchMeta,
    pub summary: BatchSummary,
    /// Sorted by driver.
    pub settlements: Vec<DriverSettlement>,
    pub totals: SettlementAmounts,
    pub ranking: Vec<TopEarner>,
    /// What each platform still has to transfer to the fleet.
    pub platform_due: PlatformDue,
}
