//! Read side of the history store: `summary`, `history`, `driver`, `due`,
//! `archive`.

use std::path::PathBuf;

use fleetpay_config::Settings;
use fleetpay_recon::money::format_display;
use fleetpay_recon::ranking::top_earners;
use fleetpay_recon::report::TOTAL_LABEL;
use fleetpay_recon::{DriverSettlement, ReconError, SettlementAmounts, TopEarner};
use serde::Serialize;

use crate::{history_store, load_recon_config, to_json, CliError};

/// A stored week as re-derived from its summary spreadsheet.
#[derive(Serialize)]
struct WeekSummary {
    week: String,
    drivers: usize,
    settlements: Vec<DriverSettlement>,
    totals: SettlementAmounts,
    ranking: Vec<TopEarner>,
}

pub fn cmd_summary(
    settings: &Settings,
    week: String,
    history: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_recon_config(None, settings)?;
    let store = history_store(history, settings);
    let settlements = store.load_summary(&week)?;
    for s in &settlements {
        if !s.amounts.is_consistent(&config.settlement) {
            log::warn!(
                "week {week}: row for {} does not match the current commission and fee settings",
                s.driver
            );
        }
    }

    let totals = SettlementAmounts::sum(settlements.iter().map(|s| &s.amounts)).ok_or_else(|| {
        ReconError::AmountOverflow {
            record_id: TOTAL_LABEL.to_string(),
        }
    })?;
    let ranking = top_earners(&settlements, config.report.top_n, &config.report.currency);
    let summary = WeekSummary {
        week,
        drivers: settlements.len(),
        settlements,
        totals,
        ranking,
    };

    if json_output {
        println!("{}", to_json(&summary)?);
        return Ok(());
    }

    let currency = &config.report.currency;
    println!("week {}: {} drivers", summary.week, summary.drivers);
    for s in &summary.settlements {
        println!(
            "  {:<32} to be paid {:>16}  final gross {:>16}",
            s.driver.as_str(),
            format_display(s.amounts.to_be_paid_cents, currency),
            format_display(s.amounts.final_gross_cents, currency),
        );
    }
    println!(
        "  {:<32} to be paid {:>16}  final gross {:>16}",
        TOTAL_LABEL,
        format_display(summary.totals.to_be_paid_cents, currency),
        format_display(summary.totals.final_gross_cents, currency),
    );
    for (rank, top) in summary.ranking.iter().enumerate() {
        println!("#{} {} {}", rank + 1, top.driver, top.final_gross_display);
    }
    Ok(())
}

pub fn cmd_history(settings: &Settings, history: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let store = history_store(history, settings);
    let weeks = store.list()?;

    if json_output {
        println!("{}", to_json(&weeks)?);
        return Ok(());
    }

    if weeks.is_empty() {
        eprintln!("no weeks stored under {}", store.root().display());
        return Ok(());
    }
    for meta in &weeks {
        let top = match (&meta.top_driver, &meta.top_earning_display) {
            (Some(driver), Some(amount)) => format!("top: {driver} {amount}"),
            _ => "top: -".to_string(),
        };
        println!("{}\t{}\t{}", meta.week, meta.timestamp, top);
    }
    Ok(())
}

pub fn cmd_driver(
    settings: &Settings,
    week: String,
    driver: String,
    history: Option<PathBuf>,
) -> Result<(), CliError> {
    let path = history_store(history, settings).driver_report_path(&week, &driver)?;
    println!("{}", path.display());
    Ok(())
}

pub fn cmd_due(settings: &Settings, week: String, history: Option<PathBuf>) -> Result<(), CliError> {
    let path = history_store(history, settings).platform_due_path(&week)?;
    println!("{}", path.display());
    Ok(())
}

pub fn cmd_archive(settings: &Settings, week: String, history: Option<PathBuf>) -> Result<(), CliError> {
    let path = history_store(history, settings).archive_path(&week)?;
    println!("{}", path.display());
    Ok(())
}
