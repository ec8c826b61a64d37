//! Legacy dump importer for the EistedGlobal festival manager.
//!
//! Parses the old MySQL export (a Latin-1 text dump of `INSERT` statements),
//! remaps it into the new SQLite schema as one atomic pass, then backfills
//! the current edition by cloning the most recent prior year's competitions
//! and registrations.

pub mod backfill;
pub mod db;
pub mod domain;
pub mod dump;
pub mod error;
pub mod import;
pub mod mapping;
pub mod seed;

pub use backfill::{ensure_current_year_registrations, BackfillReport};
pub use error::{MigrateError, Result};
pub use import::{run_import, ImportReport};
