use std::collections::BTreeMap;

use crate::aggregate::aggregate_rows;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{
    BatchMeta, BatchSummary, Platform, PlatformUpload, RawTable, ReconInput, SettlementAmounts,
    WeeklyBatch,
};
use crate::platform::adapter_for;
use crate::ranking::top_earners;
use crate::report::{PlatformDue, TOTAL_LABEL};
use crate::schema;
use crate::settlement::settle_driver;

/// Validate every upload, extract rows, then reconcile.
///
/// All schema checks run before any row is extracted, so one malformed file
/// fails the whole week with nothing computed.
pub fn settle(
    config: &ReconConfig,
    week: &str,
    uploads: &[PlatformUpload],
) -> Result<WeeklyBatch, ReconError> {
    if uploads.is_empty() {
        return Err(ReconError::EmptyUpload);
    }

    for upload in uploads {
        schema::validate(upload.platform, &upload.table)?;
    }

    let mut input = ReconInput::default();
    for upload in uploads {
        let rows = adapter_for(upload.platform).extract(&upload.table)?;
        input.extend(upload.platform, rows);
    }

    run(config, week, &input)
}

/// Reconcile already-normalized rows into one settlement per driver.
///
/// Only fails when a sum leaves the `i64` minor-unit range.
pub fn run(config: &ReconConfig, week: &str, input: &ReconInput) -> Result<WeeklyBatch, ReconError> {
    let aggregates = aggregate_rows(input)?;
    log::debug!(
        "week {week}: {} rows grouped into {} drivers",
        input.record_count(),
        aggregates.len()
    );

    let single_platform_drivers = aggregates.iter().filter(|a| a.seen.len() == 1).count();

    let settlements = aggregates
        .into_iter()
        .map(|agg| settle_driver(agg, &config.settlement))
        .collect::<Result<Vec<_>, _>>()?;

    let totals = SettlementAmounts::sum(settlements.iter().map(|s| &s.amounts)).ok_or_else(|| {
        ReconError::AmountOverflow {
            record_id: TOTAL_LABEL.to_string(),
        }
    })?;
    let platform_due = PlatformDue::from_totals(&totals, &config.report.currency)?;
    let ranking = top_earners(&settlements, config.report.top_n, &config.report.currency);

    let mut records: BTreeMap<Platform, usize> = Platform::ALL.into_iter().map(|p| (p, 0)).collect();
    for (platform, rows) in &input.records {
        *records.entry(*platform).or_default() += rows.len();
    }

    Ok(WeeklyBatch {
        meta: BatchMeta {
            week: week.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: BatchSummary {
            drivers: settlements.len(),
            records,
            single_platform_drivers,
        },
        settlements,
        totals,
        ranking,
        platform_due,
    })
}

// ---------------------------------------------------------------------------
// CSV helpers
// ---------------------------------------------------------------------------

/// Parse comma-separated text into a [`RawTable`].
pub fn load_csv_table(source: &str, csv_data: &str) -> Result<RawTable, ReconError> {
    load_csv_table_with_delimiter(source, csv_data, b',')
}

/// Parse delimited text into a [`RawTable`]. Ragged rows are accepted; a
/// leading UTF-8 BOM is dropped.
pub fn load_csv_table_with_delimiter(
    source: &str,
    csv_data: &str,
    delimiter: u8,
) -> Result<RawTable, ReconError> {
    let data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(format!("{source}: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(format!("{source}: {e}")))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable::new(source, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOLT: &str = "\
Șofer,Câștiguri nete|lei,Numerar încasat|lei
Ion Popescu,1000,200
Ana-Maria Pop,300,0
";

    const UBER: &str = "\
Prenumele șoferului,Numele de familie al șoferului,Câștiguri primite : Câștigurile tale,Câștiguri primite : Sold cursă : Plăți : Numerar încasat
Popescu,Ion,500,-50
Dan,Ene,800,100
";

    fn uploads() -> Vec<PlatformUpload> {
        vec![
            PlatformUpload::new(Platform::Bolt, load_csv_table("bolt.csv", BOLT).unwrap()),
            PlatformUpload::new(Platform::Uber, load_csv_table("uber.csv", UBER).unwrap()),
        ]
    }

    #[test]
    fn load_csv_basic() {
        let table = load_csv_table("bolt.csv", BOLT).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 0), "Ion Popescu");
        assert_eq!(table.source, "bolt.csv");
    }

    #[test]
    fn load_csv_strips_bom_and_accepts_ragged_rows() {
        let data = "\u{feff}a;b;c\n1;2\n";
        let table = load_csv_table_with_delimiter("x.csv", data, b';').unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn settle_two_platforms() {
        let batch = settle(&ReconConfig::default(), "2026-W03", &uploads()).unwrap();
        assert_eq!(batch.meta.week, "2026-W03");
        assert_eq!(batch.summary.drivers, 3);
        assert_eq!(batch.summary.records[&Platform::Bolt], 2);
        assert_eq!(batch.summary.records[&Platform::Uber], 2);
        assert_eq!(batch.summary.single_platform_drivers, 2);

        let ion = batch
            .settlements
            .iter()
            .find(|s| s.driver.as_str() == "Ion Popescu")
            .unwrap();
        assert_eq!(ion.amounts.to_be_paid_cents, 108_500);
        assert_eq!(ion.amounts.final_gross_cents, 133_500);

        let names: Vec<_> = batch.settlements.iter().map(|s| s.driver.as_str()).collect();
        assert_eq!(names, vec!["Ana Maria Pop", "Dan Ene", "Ion Popescu"]);
    }

    #[test]
    fn totals_are_column_sums() {
        let batch = settle(&ReconConfig::default(), "w", &uploads()).unwrap();
        let net: i64 = batch.settlements.iter().map(|s| s.amounts.total_net_cents).sum();
        let paid: i64 = batch.settlements.iter().map(|s| s.amounts.to_be_paid_cents).sum();
        assert_eq!(batch.totals.total_net_cents, net);
        assert_eq!(batch.totals.to_be_paid_cents, paid);
        assert_eq!(batch.totals.service_fee_cents, 3 * 3_000);
    }

    #[test]
    fn ranking_uses_final_gross() {
        let batch = settle(&ReconConfig::default(), "w", &uploads()).unwrap();
        assert_eq!(batch.ranking.len(), 3);
        assert_eq!(batch.ranking[0].driver, "Ion Popescu");
        assert_eq!(batch.ranking[0].final_gross_display, "1,335.00 RON");
    }

    #[test]
    fn single_platform_upload_is_fine() {
        let only_bolt = vec![PlatformUpload::new(
            Platform::Bolt,
            load_csv_table("bolt.csv", BOLT).unwrap(),
        )];
        let batch = settle(&ReconConfig::default(), "w", &only_bolt).unwrap();
        assert_eq!(batch.summary.records[&Platform::Uber], 0);
        for s in &batch.settlements {
            assert_eq!(s.amounts.net_cents(Platform::Uber), 0);
            assert_eq!(s.amounts.cash_cents(Platform::Uber), 0);
        }
    }

    #[test]
    fn no_uploads_is_an_error() {
        assert_eq!(
            settle(&ReconConfig::default(), "w", &[]).unwrap_err(),
            ReconError::EmptyUpload
        );
    }

    #[test]
    fn schema_error_reported_before_bad_amounts_elsewhere() {
        let bad_bolt = "Șofer,Câștiguri nete|lei,Numerar încasat|lei\nIon,abc,0\n";
        let bad_uber = "Prenumele șoferului,Numerar\nIon,1\n";
        let uploads = vec![
            PlatformUpload::new(Platform::Bolt, load_csv_table("bolt.csv", bad_bolt).unwrap()),
            PlatformUpload::new(Platform::Uber, load_csv_table("uber.csv", bad_uber).unwrap()),
        ];
        let err = settle(&ReconConfig::default(), "w", &uploads).unwrap_err();
        assert!(err.is_schema(), "{err}");
    }

    #[test]
    fn run_on_empty_input() {
        let batch = run(&ReconConfig::default(), "w", &ReconInput::default()).unwrap();
        assert!(batch.settlements.is_empty());
        assert!(batch.ranking.is_empty());
        assert_eq!(batch.totals.total_net_cents, 0);
        assert_eq!(batch.platform_due.total_due_cents, 0);
    }

    #[test]
    fn huge_amounts_fail_instead_of_wrapping() {
        let bolt = "Șofer,Câștiguri nete|lei,Numerar încasat|lei\nIon,90000000000000000,0\nIon,90000000000000000,0\n";
        let uploads = vec![PlatformUpload::new(Platform::Bolt, load_csv_table("bolt.csv", bolt).unwrap())];
        let err = settle(&ReconConfig::default(), "w", &uploads).unwrap_err();
        assert!(err.is_computation(), "{err}");
        assert_eq!(err, ReconError::AmountOverflow { record_id: "bolt.csv#3".into() });
    }

    #[test]
    fn platform_due_is_net_minus_cash() {
        let batch = settle(&ReconConfig::default(), "w", &uploads()).unwrap();
        let bolt = &batch.platform_due.platforms[0];
        assert_eq!(bolt.platform, Platform::Bolt);
        assert_eq!(bolt.due_cents, 130_000 - 20_000);
    }
}
