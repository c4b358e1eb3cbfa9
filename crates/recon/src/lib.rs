//! `fleetpay-recon`: weekly driver-earnings reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded platform exports, returns one
//! settlement row per driver plus the artifacts persisted for the week.
//! No CLI or filesystem dependencies.

pub mod aggregate;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod money;
pub mod platform;
pub mod ranking;
pub mod report;
pub mod schema;
pub mod settlement;

pub use canonical::CanonicalName;
pub use config::ReconConfig;
pub use engine::{run, settle};
pub use error::ReconError;
pub use model::{
    DriverSettlement, Platform, PlatformEarningsRow, PlatformUpload, RawTable, ReconInput,
    SettlementAmounts, TopEarner, WeeklyBatch,
};
pub use report::{SettlementReport, WeekMetadata};
