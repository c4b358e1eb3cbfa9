// File I/O: platform exports in, week artifacts out

pub mod archive;
pub mod error;
pub mod history;
pub mod table;
pub mod xlsx;

pub use error::HistoryError;
pub use history::HistoryStore;
