//! Per-week history store.
//!
//! ```text
//! <root>/<week>/
//!     summary.xlsx        sheet "Rezumat", TOTAL row last
//!     drivers/<Name>.xlsx sheet "Raport", one row
//!     drivers.zip         every driver report, deflated
//!     platform_due.xlsx   sheet "Sume Platforme"
//!     metadata.json
//! ```
//!
//! A week is written into a staging directory next to its final location and
//! swapped in only when every artifact is on disk, so a failed run leaves the
//! previous snapshot (if any) untouched. Nothing serializes two writers of
//! the same week: the last one to swap wins.

use std::path::{Path, PathBuf};

use fleetpay_recon::report::{
    settlements_from_summary, SettlementReport, WeekMetadata, DRIVER_SHEET,
    SUMMARY_FILE, SUMMARY_SHEET,
};
use fleetpay_recon::{CanonicalName, DriverSettlement};

use crate::error::HistoryError;
use crate::{archive, table, xlsx};

pub const DRIVERS_DIR: &str = "drivers";
pub const ARCHIVE_FILE: &str = "drivers.zip";
pub const PLATFORM_DUE_FILE: &str = "platform_due.xlsx";
pub const METADATA_FILE: &str = "metadata.json";

const STAGING_PREFIX: &str = ".staging-";
const REPLACED_PREFIX: &str = ".replaced-";

/// Single path component: `[A-Za-z0-9._-]+`, not starting with `.`.
pub fn validate_week(week: &str) -> Result<(), HistoryError> {
    let valid = !week.is_empty()
        && !week.starts_with('.')
        && week
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(HistoryError::InvalidWeek(week.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn week_dir(&self, week: &str) -> Result<PathBuf, HistoryError> {
        validate_week(week)?;
        Ok(self.root.join(week))
    }

    fn existing_week_dir(&self, week: &str) -> Result<PathBuf, HistoryError> {
        let dir = self.week_dir(week)?;
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(HistoryError::NotFound {
                what: format!("week '{week}'"),
            })
        }
    }

    fn existing_file(&self, week: &str, relative: &Path, what: String) -> Result<PathBuf, HistoryError> {
        let path = self.existing_week_dir(week)?.join(relative);
        if path.is_file() {
            Ok(path)
        } else {
            Err(HistoryError::NotFound { what })
        }
    }

    // -----------------------------------------------------------------------
    // Write
    // -----------------------------------------------------------------------

    /// Persist every artifact of `report` under its week, replacing any
    /// previous snapshot of that week. Returns the week directory.
    pub fn save(&self, report: &SettlementReport) -> Result<PathBuf, HistoryError> {
        let week = &report.metadata.week;
        let final_dir = self.week_dir(week)?;
        std::fs::create_dir_all(&self.root)?;

        let staging = self
            .root
            .join(format!("{STAGING_PREFIX}{week}-{}", std::process::id()));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }

        if let Err(e) = write_artifacts(&staging, report) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        let aside = self
            .root
            .join(format!("{REPLACED_PREFIX}{week}-{}", std::process::id()));
        swap_in(&staging, &final_dir, &aside)?;

        log::debug!(
            "week {week}: {} driver reports saved to {}",
            report.drivers.len(),
            final_dir.display()
        );
        Ok(final_dir)
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    pub fn load_metadata(&self, week: &str) -> Result<WeekMetadata, HistoryError> {
        let path = self.existing_file(week, Path::new(METADATA_FILE), format!("metadata for week '{week}'"))?;
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Metadata of every stored week, newest first. Directories without
    /// readable metadata are skipped.
    pub fn list(&self) -> Result<Vec<WeekMetadata>, HistoryError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut weeks = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_week(&name).is_err() {
                continue;
            }
            match self.load_metadata(&name) {
                Ok(meta) => weeks.push(meta),
                Err(e) => log::warn!("history: skipping '{name}': {e}"),
            }
        }

        weeks.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.week.cmp(&a.week))
        });
        Ok(weeks)
    }

    pub fn summary_path(&self, week: &str) -> Result<PathBuf, HistoryError> {
        self.existing_file(week, Path::new(SUMMARY_FILE), format!("summary for week '{week}'"))
    }

    /// Settlements re-derived from the stored summary alone.
    pub fn load_summary(&self, week: &str) -> Result<Vec<DriverSettlement>, HistoryError> {
        let path = self.summary_path(week)?;
        let table = table::read_first_sheet(&path, SUMMARY_FILE).map_err(HistoryError::Xlsx)?;
        Ok(settlements_from_summary(&table)?)
    }

    /// Report file of one driver, resolved through the week's stored name to
    /// file mapping. `driver` may be spelled any way the canonical form
    /// accepts.
    pub fn driver_report_path(&self, week: &str, driver: &str) -> Result<PathBuf, HistoryError> {
        let not_found = || HistoryError::NotFound {
            what: format!("report for driver '{driver}' in week '{week}'"),
        };
        let stem = self
            .load_metadata(week)?
            .driver_report_stem(&CanonicalName::new(driver))
            .ok_or_else(not_found)?;
        let relative = Path::new(DRIVERS_DIR).join(format!("{stem}.xlsx"));
        self.existing_file(
            week,
            &relative,
            format!("report for driver '{driver}' in week '{week}'"),
        )
    }

    pub fn archive_path(&self, week: &str) -> Result<PathBuf, HistoryError> {
        self.existing_file(week, Path::new(ARCHIVE_FILE), format!("driver archive for week '{week}'"))
    }

    pub fn platform_due_path(&self, week: &str) -> Result<PathBuf, HistoryError> {
        self.existing_file(
            week,
            Path::new(PLATFORM_DUE_FILE),
            format!("platform sums for week '{week}'"),
        )
    }
}

/// Move `staging` to `final_dir`. An existing snapshot is renamed aside
/// first and only deleted once the new one is in place; if the swap fails
/// it is moved back and the staging directory removed.
fn swap_in(staging: &Path, final_dir: &Path, aside: &Path) -> Result<(), HistoryError> {
    let replacing = final_dir.exists();
    if replacing {
        log::warn!("{}: replacing existing snapshot", final_dir.display());
        if aside.exists() {
            std::fs::remove_dir_all(aside)?;
        }
        if let Err(e) = std::fs::rename(final_dir, aside) {
            let _ = std::fs::remove_dir_all(staging);
            return Err(e.into());
        }
    }

    if let Err(e) = std::fs::rename(staging, final_dir) {
        let _ = std::fs::remove_dir_all(staging);
        if replacing {
            if let Err(restore) = std::fs::rename(aside, final_dir) {
                log::warn!("previous snapshot left at {}: {restore}", aside.display());
            }
        }
        return Err(e.into());
    }

    if replacing {
        if let Err(e) = std::fs::remove_dir_all(aside) {
            log::warn!("could not remove old snapshot {}: {e}", aside.display());
        }
    }
    Ok(())
}

fn write_artifacts(dir: &Path, report: &SettlementReport) -> Result<(), HistoryError> {
    let drivers_dir = dir.join(DRIVERS_DIR);
    std::fs::create_dir_all(&drivers_dir)?;

    xlsx::write_summary(&dir.join(SUMMARY_FILE), SUMMARY_SHEET, &report.summary)
        .map_err(HistoryError::Xlsx)?;

    for extract in &report.drivers {
        let path = drivers_dir.join(format!("{}.xlsx", extract.file_stem));
        xlsx::write_summary(&path, DRIVER_SHEET, &extract.table).map_err(HistoryError::Xlsx)?;
    }

    archive::zip_directory(&drivers_dir, &dir.join(ARCHIVE_FILE)).map_err(HistoryError::Archive)?;

    xlsx::write_platform_due(&dir.join(PLATFORM_DUE_FILE), &report.platform_due)
        .map_err(HistoryError::Xlsx)?;

    let json = serde_json::to_string_pretty(&report.metadata)?;
    std::fs::write(dir.join(METADATA_FILE), json)?;
    Ok(())
}
