//! `fleetpay settle` and `fleetpay validate`: platform exports in, one
//! settled week out.

use std::path::PathBuf;

use fleetpay_config::Settings;
use fleetpay_io::table::{read_table, read_upload};
use fleetpay_recon::money::format_display;
use fleetpay_recon::platform::{adapter_for, PlatformAdapter};
use fleetpay_recon::{schema, Platform, PlatformUpload, SettlementReport, WeeklyBatch};

use crate::{history_store, load_recon_config, to_json, CliError};

pub fn cmd_settle(
    settings: &Settings,
    week: String,
    files: Vec<(Platform, Vec<PathBuf>)>,
    config_path: Option<PathBuf>,
    history: Option<PathBuf>,
    json_output: bool,
    dry_run: bool,
) -> Result<(), CliError> {
    fleetpay_io::history::validate_week(&week)?;
    let config = load_recon_config(config_path, settings)?;

    let mut uploads: Vec<PlatformUpload> = Vec::new();
    for (platform, paths) in files {
        for path in paths {
            let upload = read_upload(platform, &path)
                .map_err(|e| CliError::io(format!("cannot read {} export: {e}", platform)))?;
            uploads.push(upload);
        }
    }

    let batch = fleetpay_recon::settle(&config, &week, &uploads)?;
    let report = SettlementReport::build(&config, &batch);

    let saved = if dry_run {
        None
    } else {
        Some(history_store(history, settings).save(&report)?)
    };

    if json_output {
        println!("{}", to_json(&batch)?);
    }

    print_batch_summary(&batch, &report, &config.report.currency);
    match saved {
        Some(dir) => eprintln!("saved: {}", dir.display()),
        None => eprintln!("dry run: nothing saved"),
    }
    Ok(())
}

fn print_batch_summary(batch: &WeeklyBatch, report: &SettlementReport, currency: &str) {
    let s = &batch.summary;
    let records: Vec<String> = s
        .records
        .iter()
        .map(|(platform, n)| format!("{n} {platform}"))
        .collect();
    eprintln!(
        "week {}: {} drivers from {} records, {} on one platform only",
        batch.meta.week,
        s.drivers,
        records.join(" + "),
        s.single_platform_drivers,
    );
    eprintln!(
        "to be paid: {}; cash held: {}",
        format_display(batch.totals.to_be_paid_cents, currency),
        format_display(batch.totals.total_cash_cents, currency),
    );
    for due in &report.platform_due.platforms {
        eprintln!("  {} owes {}", due.platform.display_name(), due.due_display);
    }
    for (rank, top) in batch.ranking.iter().enumerate() {
        eprintln!("  #{} {} {}", rank + 1, top.driver, top.final_gross_display);
    }
}

pub fn cmd_validate(platform: Platform, files: Vec<PathBuf>) -> Result<(), CliError> {
    let adapter = adapter_for(platform);
    for path in &files {
        let table = read_table(path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
        schema::validate(platform, &table)?;
        let rows = adapter.extract(&table)?;
        eprintln!(
            "valid: {} {} export with {} driver row(s)",
            path.display(),
            platform.display_name(),
            rows.len(),
        );
    }
    Ok(())
}
