// XLSX export of week artifacts. Presentation only: values are written as
// plain numbers so the summary reads back through calamine unchanged.

use std::path::Path;

use fleetpay_recon::money::to_major;
use fleetpay_recon::report::{
    PlatformDue, SummaryRow, SummaryTable, PLATFORM_DUE_SHEET, PLATFORM_DUE_TITLE, TOTAL_DUE_LABEL,
};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};

const AMOUNT_FORMAT: &str = "#,##0.00";
const HEADER_GREEN: u32 = 0x228B22;
const TOTAL_GREY: u32 = 0xCCCCCC;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_GREEN))
        .set_align(FormatAlign::Center)
}

fn total_format(amount: bool) -> Format {
    let format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(TOTAL_GREY))
        .set_align(FormatAlign::Center);
    if amount {
        format.set_num_format(AMOUNT_FORMAT)
    } else {
        format
    }
}

/// Write a settlement table as the only sheet of a new workbook: bold
/// header row, one row per driver, the TOTAL row (if any) highlighted, header
/// frozen.
pub fn write_summary(path: &Path, sheet_name: &str, table: &SummaryTable) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    let header = header_format();
    for (col, name) in table.headers.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, name, &header)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
        let width = (name.chars().count() + 4).max(14) as f64;
        worksheet
            .set_column_width(col, width)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }

    let label = Format::new();
    let amount = Format::new().set_num_format(AMOUNT_FORMAT);
    let mut row = 1u32;
    for summary_row in &table.rows {
        write_row(worksheet, row, summary_row, &label, &amount)?;
        row += 1;
    }
    if let Some(total) = &table.total {
        write_row(worksheet, row, total, &total_format(false), &total_format(true))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to set freeze panes: {}", e))?;

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file '{}': {}", path.display(), e))
}

fn write_row(
    worksheet: &mut Worksheet,
    row: u32,
    summary_row: &SummaryRow,
    label_format: &Format,
    amount_format: &Format,
) -> Result<(), String> {
    worksheet
        .write_string_with_format(row, 0, &summary_row.label, label_format)
        .map_err(|e| format!("Failed to write row {}: {}", row + 1, e))?;
    for (i, cents) in summary_row.values.iter().enumerate() {
        worksheet
            .write_number_with_format(row, (i + 1) as u16, to_major(*cents), amount_format)
            .map_err(|e| format!("Failed to write row {}: {}", row + 1, e))?;
    }
    Ok(())
}

/// Amounts each platform still has to transfer: a title, one row per
/// platform and the grand total.
pub fn write_platform_due(path: &Path, due: &PlatformDue) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(PLATFORM_DUE_SHEET)
        .map_err(|e| format!("Failed to create sheet '{}': {}", PLATFORM_DUE_SHEET, e))?;

    let title = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_align(FormatAlign::Center);
    worksheet
        .merge_range(0, 0, 0, 3, PLATFORM_DUE_TITLE, &title)
        .map_err(|e| format!("Failed to write title: {}", e))?;

    let header = header_format();
    for (col, name) in ["Platformă", "Câștig Net", "Numerar", "De Încasat"].iter().enumerate() {
        worksheet
            .write_string_with_format(2, col as u16, *name, &header)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
        worksheet
            .set_column_width(col as u16, 18)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }

    let amount = Format::new().set_num_format(AMOUNT_FORMAT);
    let mut row = 3u32;
    for platform in &due.platforms {
        let cells = [platform.net_cents, platform.cash_cents, platform.due_cents];
        worksheet
            .write_string(row, 0, platform.platform.display_name())
            .map_err(|e| format!("Failed to write row {}: {}", row + 1, e))?;
        for (i, cents) in cells.iter().enumerate() {
            worksheet
                .write_number_with_format(row, (i + 1) as u16, to_major(*cents), &amount)
                .map_err(|e| format!("Failed to write row {}: {}", row + 1, e))?;
        }
        row += 1;
    }

    worksheet
        .write_string_with_format(row, 0, TOTAL_DUE_LABEL, &total_format(false))
        .map_err(|e| format!("Failed to write total: {}", e))?;
    worksheet
        .write_number_with_format(row, 3, to_major(due.total_due_cents), &total_format(true))
        .map_err(|e| format!("Failed to write total: {}", e))?;

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_first_sheet;
    use fleetpay_recon::report::{settlements_from_summary, SettlementReport, SUMMARY_SHEET};
    use fleetpay_recon::{run, CanonicalName, Platform, PlatformEarningsRow, ReconConfig, ReconInput};

    fn report() -> (fleetpay_recon::WeeklyBatch, SettlementReport) {
        let mut input = ReconInput::default();
        input.extend(
            Platform::Bolt,
            vec![PlatformEarningsRow {
                platform: Platform::Bolt,
                driver: CanonicalName::new("Ion Popescu"),
                net_cents: 100_000,
                cash_cents: 20_000,
                record_id: "bolt.csv#2".into(),
            }],
        );
        input.extend(
            Platform::Uber,
            vec![PlatformEarningsRow {
                platform: Platform::Uber,
                driver: CanonicalName::new("Ana Pop"),
                net_cents: 33_333,
                cash_cents: 1_050,
                record_id: "uber.csv#2".into(),
            }],
        );
        let config = ReconConfig::default();
        let batch = run(&config, "2026-W03", &input).unwrap();
        let report = SettlementReport::build(&config, &batch);
        (batch, report)
    }

    #[test]
    fn summary_reads_back_identically() {
        let (batch, report) = report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.xlsx");

        write_summary(&path, SUMMARY_SHEET, &report.summary).unwrap();
        let table = read_first_sheet(&path, "summary.xlsx").unwrap();

        assert_eq!(table.headers, report.summary.headers);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2][0], "TOTAL");
        assert_eq!(settlements_from_summary(&table).unwrap(), batch.settlements);
    }

    #[test]
    fn platform_due_sheet_is_written() {
        let (_, report) = report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform_due.xlsx");

        write_platform_due(&path, &report.platform_due).unwrap();
        let table = read_first_sheet(&path, "platform_due.xlsx").unwrap();

        assert_eq!(table.headers[0], PLATFORM_DUE_TITLE);
        let labels: Vec<_> = table.rows.iter().map(|r| r.first().cloned().unwrap_or_default()).collect();
        assert!(labels.contains(&"Bolt".to_string()));
        assert!(labels.contains(&"Uber".to_string()));
        assert!(labels.contains(&TOTAL_DUE_LABEL.to_string()));
    }

    #[test]
    fn bad_sheet_name_is_an_error() {
        let (_, report) = report();
        let dir = tempfile::tempdir().unwrap();
        let err = write_summary(&dir.path().join("x.xlsx"), "bad/name", &report.summary).unwrap_err();
        assert!(err.contains("bad/name"), "{err}");
    }
}
