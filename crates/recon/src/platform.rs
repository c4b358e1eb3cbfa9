//! Platform adapters: one per upstream export format.
//!
//! Each adapter turns a validated [`RawTable`] into rows with exactly three
//! logical fields (driver, net, cash). Supporting another platform means
//! adding a [`Platform`] variant and one adapter here; the reconciler only
//! ever sees [`PlatformEarningsRow`]s.

use crate::canonical::CanonicalName;
use crate::error::ReconError;
use crate::model::{Platform, PlatformEarningsRow, RawTable};
use crate::money::parse_cents;
use crate::schema::{self, HeaderIndex};

pub const BOLT_DRIVER: &str = "Șofer";
pub const BOLT_NET: &str = "Câștiguri nete|lei";
pub const BOLT_CASH: &str = "Numerar încasat|lei";

pub const UBER_FIRST_NAME: &str = "Prenumele șoferului";
pub const UBER_LAST_NAME: &str = "Numele de familie al șoferului";
pub const UBER_NET: &str = "Câștiguri primite : Câștigurile tale";
pub const UBER_CASH: &str = "Câștiguri primite : Sold cursă : Plăți : Numerar încasat";

pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    /// Headers that must be present, in declared spelling.
    fn required_headers(&self) -> &'static [&'static str];

    /// Validate `table`, then extract one row per non-blank input row.
    fn extract(&self, table: &RawTable) -> Result<Vec<PlatformEarningsRow>, ReconError>;
}

pub fn adapter_for(platform: Platform) -> &'static dyn PlatformAdapter {
    match platform {
        Platform::Bolt => &BoltAdapter,
        Platform::Uber => &UberAdapter,
    }
}

// ---------------------------------------------------------------------------
// Bolt: single driver-name column
// ---------------------------------------------------------------------------

pub struct BoltAdapter;

impl PlatformAdapter for BoltAdapter {
    fn platform(&self) -> Platform {
        Platform::Bolt
    }

    fn required_headers(&self) -> &'static [&'static str] {
        &[BOLT_DRIVER, BOLT_NET, BOLT_CASH]
    }

    fn extract(&self, table: &RawTable) -> Result<Vec<PlatformEarningsRow>, ReconError> {
        schema::validate_headers(self.platform(), self.required_headers(), table)?;
        let index = HeaderIndex::new(&table.headers);
        let driver = column(&index, self.platform(), table, BOLT_DRIVER)?;
        let amounts = AmountColumns {
            net: column(&index, self.platform(), table, BOLT_NET)?,
            net_header: BOLT_NET,
            cash: column(&index, self.platform(), table, BOLT_CASH)?,
            cash_header: BOLT_CASH,
        };

        collect_rows(table, self.platform(), &amounts, |row| {
            CanonicalName::new(table.cell(row, driver))
        })
    }
}

// ---------------------------------------------------------------------------
// Uber: first + last name columns, cash-out may be negative
// ---------------------------------------------------------------------------

pub struct UberAdapter;

impl PlatformAdapter for UberAdapter {
    fn platform(&self) -> Platform {
        Platform::Uber
    }

    fn required_headers(&self) -> &'static [&'static str] {
        &[UBER_FIRST_NAME, UBER_LAST_NAME, UBER_NET, UBER_CASH]
    }

    fn extract(&self, table: &RawTable) -> Result<Vec<PlatformEarningsRow>, ReconError> {
        schema::validate_headers(self.platform(), self.required_headers(), table)?;
        let index = HeaderIndex::new(&table.headers);
        let first = column(&index, self.platform(), table, UBER_FIRST_NAME)?;
        let last = column(&index, self.platform(), table, UBER_LAST_NAME)?;
        let amounts = AmountColumns {
            net: column(&index, self.platform(), table, UBER_NET)?,
            net_header: UBER_NET,
            cash: column(&index, self.platform(), table, UBER_CASH)?,
            cash_header: UBER_CASH,
        };

        collect_rows(table, self.platform(), &amounts, |row| {
            CanonicalName::from_parts(Some(table.cell(row, first)), Some(table.cell(row, last)))
        })
    }
}

// ---------------------------------------------------------------------------
// Shared extraction
// ---------------------------------------------------------------------------

struct AmountColumns {
    net: usize,
    net_header: &'static str,
    cash: usize,
    cash_header: &'static str,
}

fn column(
    index: &HeaderIndex,
    platform: Platform,
    table: &RawTable,
    header: &str,
) -> Result<usize, ReconError> {
    index.position(header).ok_or_else(|| ReconError::Schema {
        platform,
        source: table.source.clone(),
        missing: vec![header.to_string()],
    })
}

fn amount(table: &RawTable, row: usize, col: usize, header: &str) -> Result<i64, ReconError> {
    let raw = table.cell(row, col);
    parse_cents(raw).ok_or_else(|| ReconError::AmountParse {
        record_id: table.record_id(row),
        column: header.to_string(),
        value: raw.to_string(),
    })
}

fn collect_rows(
    table: &RawTable,
    platform: Platform,
    columns: &AmountColumns,
    driver_of: impl Fn(usize) -> CanonicalName,
) -> Result<Vec<PlatformEarningsRow>, ReconError> {
    let mut rows = Vec::with_capacity(table.rows.len());

    for row in 0..table.rows.len() {
        if table.is_blank_row(row) {
            continue;
        }

        let net_cents = amount(table, row, columns.net, columns.net_header)?;
        let cash_cents = amount(table, row, columns.cash, columns.cash_header)?.abs();
        let driver = driver_of(row);

        if driver.is_empty() {
            if net_cents == 0 && cash_cents == 0 {
                log::warn!("{platform} {}: no driver and no amounts, skipped", table.record_id(row));
                continue;
            }
            return Err(ReconError::MissingDriver {
                platform,
                record_id: table.record_id(row),
            });
        }

        rows.push(PlatformEarningsRow {
            platform,
            driver,
            net_cents,
            cash_cents,
            record_id: table.record_id(row),
        });
    }

    log::debug!("{platform} '{}': {} rows extracted", table.source, rows.len());
    Ok(rows)
}
