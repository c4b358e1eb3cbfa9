//! Week artifacts derived from a [`WeeklyBatch`]: the summary table with its
//! TOTAL row, one single-row table per driver, the platform-due breakdown and
//! the metadata record. Also the reverse path, rebuilding settlements from a
//! persisted summary.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalName;
use crate::config::{ReconConfig, SettlementConfig};
use crate::error::ReconError;
use crate::model::{DriverSettlement, Platform, PlatformAmounts, RawTable, SettlementAmounts, WeeklyBatch};
use crate::money::{format_display, format_plain, parse_cents};
use crate::schema::normalize_header;

pub const TOTAL_LABEL: &str = "TOTAL";
pub const SUMMARY_FILE: &str = "summary.xlsx";
pub const SUMMARY_SHEET: &str = "Rezumat";
pub const DRIVER_SHEET: &str = "Raport";
pub const PLATFORM_DUE_SHEET: &str = "Sume Platforme";
pub const PLATFORM_DUE_TITLE: &str = "SUME AȘTEPTATE DIN PARTEA PLATFORMELOR";
pub const TOTAL_DUE_LABEL: &str = "TOTAL VENIT NET";

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// One column of the settlement export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementColumn {
    Driver,
    Net(Platform),
    TotalNet,
    Commission,
    AfterCommission,
    ServiceFee,
    Cash(Platform),
    TotalCash,
    ToBePaid,
}

impl SettlementColumn {
    /// Stable machine key (`bolt_net`, `to_be_paid`).
    pub fn key(&self) -> String {
        match self {
            Self::Driver => "driver".into(),
            Self::Net(p) => format!("{}_net", p.key()),
            Self::TotalNet => "total_net".into(),
            Self::Commission => "commission".into(),
            Self::AfterCommission => "after_commission".into(),
            Self::ServiceFee => "service_fee".into(),
            Self::Cash(p) => format!("{}_cash", p.key()),
            Self::TotalCash => "total_cash".into(),
            Self::ToBePaid => "to_be_paid".into(),
        }
    }

    /// Localized header. The commission header gets its rate appended by
    /// [`SettlementColumn::header`].
    pub fn label(&self) -> String {
        match self {
            Self::Driver => "Șofer".into(),
            Self::Net(p) => format!("Câștig Net {}", p.display_name()),
            Self::TotalNet => "Total Net".into(),
            Self::Commission => "Comision".into(),
            Self::AfterCommission => "După Comision".into(),
            Self::ServiceFee => "Taxă de Serviciu".into(),
            Self::Cash(p) => format!("Numerar {}", p.display_name()),
            Self::TotalCash => "Numerar Total".into(),
            Self::ToBePaid => "De Plătit".into(),
        }
    }

    /// Header text as written to spreadsheets (`Comision 9%`).
    pub fn header(&self, settlement: &SettlementConfig) -> String {
        match self {
            Self::Commission => format!("{} {}", self.label(), settlement.commission_label()),
            _ => self.label(),
        }
    }

    pub fn amount(&self, amounts: &SettlementAmounts) -> Option<i64> {
        Some(match self {
            Self::Driver => return None,
            Self::Net(p) => amounts.net_cents(*p),
            Self::TotalNet => amounts.total_net_cents,
            Self::Commission => amounts.commission_cents,
            Self::AfterCommission => amounts.after_commission_cents,
            Self::ServiceFee => amounts.service_fee_cents,
            Self::Cash(p) => amounts.cash_cents(*p),
            Self::TotalCash => amounts.total_cash_cents,
            Self::ToBePaid => amounts.to_be_paid_cents,
        })
    }

    /// Resolve a persisted header, given either as key or as label. Any
    /// header starting with `Comision` is the commission column, whatever
    /// rate it names.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = normalize_header(header);
        if normalized.starts_with("comision") {
            return Some(Self::Commission);
        }
        settlement_columns().into_iter().find(|column| {
            normalized == normalize_header(&column.key()) || normalized == normalize_header(&column.label())
        })
    }
}

/// Export column order: driver, net per platform, the commission chain,
/// cash per platform, then the payout.
pub fn settlement_columns() -> Vec<SettlementColumn> {
    let mut columns = vec![SettlementColumn::Driver];
    columns.extend(Platform::ALL.into_iter().map(SettlementColumn::Net));
    columns.extend([
        SettlementColumn::TotalNet,
        SettlementColumn::Commission,
        SettlementColumn::AfterCommission,
        SettlementColumn::ServiceFee,
    ]);
    columns.extend(Platform::ALL.into_iter().map(SettlementColumn::Cash));
    columns.extend([SettlementColumn::TotalCash, SettlementColumn::ToBePaid]);
    columns
}

/// [`settlement_columns`] without the driver column.
pub fn amount_columns() -> Vec<SettlementColumn> {
    settlement_columns()
        .into_iter()
        .filter(|c| *c != SettlementColumn::Driver)
        .collect()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Driver name, or [`TOTAL_LABEL`].
    pub label: String,
    /// Aligned with [`amount_columns`].
    pub values: Vec<i64>,
}

impl SummaryRow {
    fn from_amounts(label: impl Into<String>, amounts: &SettlementAmounts) -> Self {
        Self {
            label: label.into(),
            values: amount_columns()
                .iter()
                .map(|c| c.amount(amounts).unwrap_or(0))
                .collect(),
        }
    }
}

/// Settlement rows in export column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTable {
    pub headers: Vec<String>,
    pub rows: Vec<SummaryRow>,
    /// Column sums, present on the week summary only.
    pub total: Option<SummaryRow>,
}

impl SummaryTable {
    fn headers(settlement: &SettlementConfig) -> Vec<String> {
        settlement_columns().iter().map(|c| c.header(settlement)).collect()
    }

    /// Plain-text rendering, two decimals per amount. The TOTAL row is
    /// included when present.
    pub fn to_raw_table(&self, source: &str) -> RawTable {
        let rows = self
            .rows
            .iter()
            .chain(self.total.iter())
            .map(|row| {
                std::iter::once(row.label.clone())
                    .chain(row.values.iter().map(|v| format_plain(*v)))
                    .collect()
            })
            .collect();
        RawTable::new(source, self.headers.clone(), rows)
    }
}

/// One driver's single-row report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverExtract {
    pub driver: CanonicalName,
    /// File name without extension, unique within the week.
    pub file_stem: String,
    pub table: SummaryTable,
}

/// File-system safe stem for a driver report. Canonical names are ASCII, so
/// only path and shell metacharacters need replacing.
pub fn driver_file_stem(driver: &CanonicalName) -> String {
    let cleaned: String = driver
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '\'') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "driver".into()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Platform due
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDueRow {
    pub platform: Platform,
    #[serde(rename = "net", serialize_with = "crate::money::serialize_major")]
    pub net_cents: i64,
    #[serde(rename = "cash", serialize_with = "crate::money::serialize_major")]
    pub cash_cents: i64,
    /// What the platform still owes the fleet: net minus cash already collected.
    #[serde(rename = "due", serialize_with = "crate::money::serialize_major")]
    pub due_cents: i64,
    pub due_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDue {
    pub platforms: Vec<PlatformDueRow>,
    #[serde(rename = "total_due", serialize_with = "crate::money::serialize_major")]
    pub total_due_cents: i64,
    pub total_due_display: String,
}

impl PlatformDue {
    pub fn from_totals(totals: &SettlementAmounts, currency: &str) -> Result<Self, ReconError> {
        let overflow = || ReconError::AmountOverflow {
            record_id: TOTAL_DUE_LABEL.to_string(),
        };

        let mut platforms = Vec::with_capacity(Platform::ALL.len());
        let mut total_due_cents: i64 = 0;
        for platform in Platform::ALL {
            let net_cents = totals.net_cents(platform);
            let cash_cents = totals.cash_cents(platform);
            let due_cents = net_cents.checked_sub(cash_cents).ok_or_else(overflow)?;
            total_due_cents = total_due_cents.checked_add(due_cents).ok_or_else(overflow)?;
            platforms.push(PlatformDueRow {
                platform,
                net_cents,
                cash_cents,
                due_cents,
                due_display: format_display(due_cents, currency),
            });
        }

        Ok(Self {
            platforms,
            total_due_cents,
            total_due_display: format_display(total_due_cents, currency),
        })
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// `metadata.json`: enough to list a week without opening any spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekMetadata {
    pub week: String,
    pub timestamp: String,
    /// Summary location relative to the week directory.
    #[serde(alias = "summary_file")]
    pub summary_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_driver: Option<String>,
    #[serde(default, alias = "top_earning", skip_serializing_if = "Option::is_none")]
    pub top_earning_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivers: Option<usize>,
    /// Canonical driver name to report file stem under `drivers/`. Absent in
    /// snapshots written before stems were deduplicated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_reports: Option<BTreeMap<String, String>>,
}

impl WeekMetadata {
    /// File stem of a driver's report. Snapshots without a stored mapping
    /// fall back to the undeduplicated stem.
    pub fn driver_report_stem(&self, driver: &CanonicalName) -> Option<String> {
        match &self.driver_reports {
            Some(map) => map.get(driver.as_str()).cloned(),
            None => Some(driver_file_stem(driver)),
        }
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Everything persisted for one week.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub summary: SummaryTable,
    pub drivers: Vec<DriverExtract>,
    pub platform_due: PlatformDue,
    pub metadata: WeekMetadata,
}

impl SettlementReport {
    pub fn build(config: &ReconConfig, batch: &WeeklyBatch) -> Self {
        let headers = SummaryTable::headers(&config.settlement);

        let summary = SummaryTable {
            headers: headers.clone(),
            rows: batch
                .settlements
                .iter()
                .map(|s| SummaryRow::from_amounts(s.driver.as_str(), &s.amounts))
                .collect(),
            total: Some(SummaryRow::from_amounts(TOTAL_LABEL, &batch.totals)),
        };

        let mut used_stems = BTreeSet::new();
        let drivers: Vec<DriverExtract> = batch
            .settlements
            .iter()
            .map(|s| {
                let base = driver_file_stem(&s.driver);
                let mut stem = base.clone();
                let mut n = 2;
                while !used_stems.insert(stem.to_ascii_lowercase()) {
                    stem = format!("{base} ({n})");
                    n += 1;
                }
                DriverExtract {
                    driver: s.driver.clone(),
                    file_stem: stem,
                    table: SummaryTable {
                        headers: headers.clone(),
                        rows: vec![SummaryRow::from_amounts(s.driver.as_str(), &s.amounts)],
                        total: None,
                    },
                }
            })
            .collect();

        let top = batch.ranking.first();
        let metadata = WeekMetadata {
            week: batch.meta.week.clone(),
            timestamp: batch.meta.run_at.clone(),
            summary_location: SUMMARY_FILE.to_string(),
            top_driver: top.map(|t| t.driver.clone()),
            top_earning_display: top.map(|t| t.final_gross_display.clone()),
            engine_version: Some(batch.meta.engine_version.clone()),
            drivers: Some(batch.settlements.len()),
            driver_reports: Some(
                drivers
                    .iter()
                    .map(|d| (d.driver.to_string(), d.file_stem.clone()))
                    .collect(),
            ),
        };

        Self {
            summary,
            drivers,
            platform_due: batch.platform_due.clone(),
            metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// Reload
// ---------------------------------------------------------------------------

/// Rebuild settlement rows from a persisted summary table.
///
/// Headers may be machine keys or localized labels. Blank rows are skipped,
/// and so is the last non-blank row when it is labelled exactly `TOTAL`;
/// canonical names are title-cased, so a driver called "Total" is kept. Stored values are taken as they are; only `final_gross`
/// is recomputed (`to_be_paid + total_cash`) since it is never persisted.
pub fn settlements_from_summary(table: &RawTable) -> Result<Vec<DriverSettlement>, ReconError> {
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    for (i, header) in table.headers.iter().enumerate() {
        if let Some(column) = SettlementColumn::from_header(header) {
            positions.entry(column.key()).or_insert(i);
        }
    }

    let missing: Vec<String> = settlement_columns()
        .iter()
        .filter(|c| !positions.contains_key(&c.key()))
        .map(|c| c.label())
        .collect();
    if !missing.is_empty() {
        return Err(ReconError::SummarySchema {
            source: table.source.clone(),
            missing,
        });
    }

    let col = |column: SettlementColumn| positions[&column.key()];
    let driver_col = col(SettlementColumn::Driver);

    let total_row = (0..table.rows.len())
        .rev()
        .find(|&row| !table.is_blank_row(row))
        .filter(|&row| table.cell(row, driver_col).trim() == TOTAL_LABEL);

    let mut settlements = Vec::new();
    for row in 0..table.rows.len() {
        if table.is_blank_row(row) || Some(row) == total_row {
            continue;
        }
        let label = table.cell(row, driver_col).trim();

        let value = |column: SettlementColumn| -> Result<i64, ReconError> {
            let idx = col(column);
            let raw = table.cell(row, idx);
            parse_cents(raw).ok_or_else(|| ReconError::AmountParse {
                record_id: table.record_id(row),
                column: table.headers[idx].clone(),
                value: raw.to_string(),
            })
        };

        let mut platforms = BTreeMap::new();
        for p in Platform::ALL {
            platforms.insert(
                p,
                PlatformAmounts {
                    net_cents: value(SettlementColumn::Net(p))?,
                    cash_cents: value(SettlementColumn::Cash(p))?,
                },
            );
        }

        let to_be_paid_cents = value(SettlementColumn::ToBePaid)?;
        let total_cash_cents = value(SettlementColumn::TotalCash)?;
        let amounts = SettlementAmounts {
            platforms,
            total_net_cents: value(SettlementColumn::TotalNet)?,
            commission_cents: value(SettlementColumn::Commission)?,
            after_commission_cents: value(SettlementColumn::AfterCommission)?,
            service_fee_cents: value(SettlementColumn::ServiceFee)?,
            total_cash_cents,
            to_be_paid_cents,
            final_gross_cents: to_be_paid_cents.checked_add(total_cash_cents).ok_or_else(|| {
                ReconError::AmountOverflow {
                    record_id: table.record_id(row),
                }
            })?,
        };

        let driver = CanonicalName::new(label);
        if driver.is_empty() {
            log::warn!("summary {}: row without driver, skipped", table.record_id(row));
            continue;
        }
        settlements.push(DriverSettlement { driver, amounts });
    }

    log::debug!("summary '{}': {} settlements reloaded", table.source, settlements.len());
    Ok(settlements)
}
