// fleetpay CLI - weekly Bolt/Uber driver settlements

mod exit_codes;
mod history;
mod settle;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use fleetpay_config::Settings;
use fleetpay_io::{HistoryError, HistoryStore};
use fleetpay_recon::{Platform, ReconConfig, ReconError};

use exit_codes::{
    EXIT_COMPUTATION, EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_NOT_FOUND, EXIT_SCHEMA, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "fleetpay")]
#[command(about = "Reconcile weekly Bolt and Uber driver earnings into settlement reports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Settle one week from platform exports and store its reports
    #[command(after_help = "\
Examples:
  fleetpay settle --week 2026-W03 --bolt bolt.csv --uber uber.xlsx
  fleetpay settle --week 2026-W03 --bolt bolt_a.csv --bolt bolt_b.csv --json
  fleetpay settle --week 2026-W03 --uber uber.csv --config fleet.recon.toml
  fleetpay settle --week 2026-W03 --bolt bolt.csv --dry-run --json")]
    Settle {
        /// Week identifier, used as the history directory name
        #[arg(long)]
        week: String,

        /// Bolt earnings export (CSV, TSV or spreadsheet); repeatable
        #[arg(long)]
        bolt: Vec<PathBuf>,

        /// Uber earnings export (CSV, TSV or spreadsheet); repeatable
        #[arg(long)]
        uber: Vec<PathBuf>,

        /// Recon config TOML (commission, service fee, currency, top N)
        #[arg(long)]
        config: Option<PathBuf>,

        /// History store root
        #[arg(long, env = "FLEETPAY_HISTORY")]
        history: Option<PathBuf>,

        /// Print the settled batch as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Compute and report without writing to the history store
        #[arg(long)]
        dry_run: bool,
    },

    /// Check exports against a platform's required columns and amounts
    #[command(after_help = "\
Examples:
  fleetpay validate --platform bolt bolt.csv
  fleetpay validate --platform uber uber_w1.csv uber_w2.xlsx")]
    Validate {
        #[arg(long, value_enum)]
        platform: PlatformArg,

        /// Export files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show a stored week, re-ranked from its summary
    #[command(after_help = "\
Examples:
  fleetpay summary 2026-W03
  fleetpay summary 2026-W03 --json")]
    Summary {
        week: String,

        #[arg(long, env = "FLEETPAY_HISTORY")]
        history: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// List stored weeks, newest first
    #[command(after_help = "\
Examples:
  fleetpay history
  fleetpay history --json
  fleetpay history --history /srv/fleetpay/history")]
    History {
        #[arg(long, env = "FLEETPAY_HISTORY")]
        history: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Print the path of one driver's report for a stored week
    #[command(after_help = "\
Examples:
  fleetpay driver 2026-W03 \"Ion Popescu\"
  fleetpay driver 2026-W03 \"popescu ion\"")]
    Driver {
        week: String,

        /// Driver name, any word order or diacritics
        driver: String,

        #[arg(long, env = "FLEETPAY_HISTORY")]
        history: Option<PathBuf>,
    },

    /// Print the path of the per-platform amounts due for a stored week
    #[command(after_help = "\
Examples:
  fleetpay due 2026-W03")]
    Due {
        week: String,

        #[arg(long, env = "FLEETPAY_HISTORY")]
        history: Option<PathBuf>,
    },

    /// Print the path of the zipped driver reports for a stored week
    #[command(after_help = "\
Examples:
  fleetpay archive 2026-W03
  cp \"$(fleetpay archive 2026-W03)\" /mnt/share/")]
    Archive {
        week: String,

        #[arg(long, env = "FLEETPAY_HISTORY")]
        history: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Bolt,
    Uber,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Bolt => Platform::Bolt,
            PlatformArg::Uber => Platform::Uber,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_IO, message)
    }
}

impl From<ReconError> for CliError {
    fn from(e: ReconError) -> Self {
        let code = match &e {
            ReconError::Schema { .. } | ReconError::SummarySchema { .. } => EXIT_SCHEMA,
            ReconError::AmountParse { .. }
            | ReconError::MissingDriver { .. }
            | ReconError::AmountOverflow { .. } => EXIT_COMPUTATION,
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
            ReconError::EmptyUpload => EXIT_USAGE,
            ReconError::Io(_) => EXIT_IO,
        };
        let hint = match &e {
            ReconError::Schema { .. } => Some("check the export was downloaded from the right platform; nothing was saved"),
            ReconError::EmptyUpload => Some("pass at least one --bolt or --uber file"),
            _ => None,
        };
        Self { code, message: e.to_string(), hint: hint.map(str::to_string) }
    }
}

impl From<HistoryError> for CliError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::Recon(inner) => inner.into(),
            HistoryError::NotFound { .. } => Self::new(EXIT_NOT_FOUND, e.to_string())
                .with_hint("run `fleetpay history` to see stored weeks"),
            HistoryError::InvalidWeek(_) => Self::usage(e.to_string()),
            HistoryError::Io(_) | HistoryError::Xlsx(_) | HistoryError::Archive(_) => Self::io(e.to_string()),
            HistoryError::Json(_) => Self::new(EXIT_ERROR, e.to_string()),
        }
    }
}

// ============================================================================
// Shared resolution
// ============================================================================

/// History store from `--history`, else the settings file, else the default
/// data directory.
pub fn history_store(flag: Option<PathBuf>, settings: &Settings) -> HistoryStore {
    HistoryStore::new(flag.unwrap_or_else(|| settings.history_root()))
}

/// Recon config from `--config`, else the settings file, else built-in
/// defaults.
pub fn load_recon_config(flag: Option<PathBuf>, settings: &Settings) -> Result<ReconConfig, CliError> {
    match flag.or_else(|| settings.recon_config.clone()) {
        Some(path) => read_recon_config(&path),
        None => Ok(ReconConfig::default()),
    }
}

fn read_recon_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_CONFIG, format!("cannot read config {}: {e}", path.display()))
    })?;
    ReconConfig::from_toml(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("config file: {}", path.display()))
    })
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))
}

// ============================================================================
// Entry point
// ============================================================================

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load();

    let result = match cli.command {
        Commands::Settle { week, bolt, uber, config, history, json, dry_run } => {
            let uploads = vec![(Platform::Bolt, bolt), (Platform::Uber, uber)];
            settle::cmd_settle(&settings, week, uploads, config, history, json, dry_run)
        }
        Commands::Validate { platform, files } => settle::cmd_validate(platform.into(), files),
        Commands::Summary { week, history, json } => {
            history::cmd_summary(&settings, week, history, json)
        }
        Commands::History { history, json } => history::cmd_history(&settings, history, json),
        Commands::Driver { week, driver, history } => {
            history::cmd_driver(&settings, week, driver, history)
        }
        Commands::Due { week, history } => history::cmd_due(&settings, week, history),
        Commands::Archive { week, history } => history::cmd_archive(&settings, week, history),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn errors_map_to_registry_codes() {
        let schema = ReconError::Schema {
            platform: Platform::Uber,
            source: "uber.csv".into(),
            missing: vec!["net".into()],
        };
        assert_eq!(CliError::from(schema).code, EXIT_SCHEMA);

        let amount = ReconError::AmountParse {
            record_id: "bolt.csv#2".into(),
            column: "net".into(),
            value: "abc".into(),
        };
        assert_eq!(CliError::from(amount).code, EXIT_COMPUTATION);
        let overflow = ReconError::AmountOverflow { record_id: "bolt.csv#3".into() };
        assert_eq!(CliError::from(overflow).code, EXIT_COMPUTATION);
        assert_eq!(CliError::from(ReconError::ConfigParse("x".into())).code, EXIT_CONFIG);
        assert_eq!(CliError::from(ReconError::EmptyUpload).code, EXIT_USAGE);

        let missing = HistoryError::NotFound { what: "week 'x'".into() };
        assert_eq!(CliError::from(missing).code, EXIT_NOT_FOUND);
        let wrapped = HistoryError::Recon(ReconError::SummarySchema {
            source: "summary.xlsx".into(),
            missing: vec![],
        });
        assert_eq!(CliError::from(wrapped).code, EXIT_SCHEMA);
        assert_eq!(CliError::from(HistoryError::InvalidWeek("../x".into())).code, EXIT_USAGE);
    }

    #[test]
    fn settings_supply_defaults_and_flags_win() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("fleet.toml");
        std::fs::write(&config_path, "[settlement]\ncommission_bps = 1250\n").unwrap();

        let settings = Settings {
            history_dir: Some(dir.path().join("from-settings")),
            recon_config: Some(config_path),
        };

        let config = load_recon_config(None, &settings).unwrap_or_else(|e| panic!("{}", e.message));
        assert_eq!(config.settlement.commission_bps, 1250);

        let store = history_store(Some(dir.path().join("flag")), &settings);
        assert_eq!(store.root(), dir.path().join("flag"));
        assert_eq!(history_store(None, &settings).root(), dir.path().join("from-settings"));
    }

    #[test]
    fn unreadable_config_is_a_config_error() {
        let err = load_recon_config(Some(PathBuf::from("/nonexistent/fleet.toml")), &Settings::default())
            .err()
            .unwrap();
        assert_eq!(err.code, EXIT_CONFIG);
    }
}
