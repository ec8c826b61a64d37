//! The atomic table-import pass.
//!
//! Seven legacy tables are extracted from the dump and written through their
//! positional mappings inside one transaction, with foreign-key enforcement
//! suspended for the duration: the old data contains orphan references and
//! the parent rows for a child may appear later in the dump, or never.

use rusqlite::{params_from_iter, Connection, Transaction};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::FkGuard;
use crate::dump::{self, Cell};
use crate::error::MigrateError;
use crate::mapping::{self, TableMapping};

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub tables: Vec<TableReport>,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn table(&self, dest_table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == dest_table)
    }

    pub fn rows(&self, dest_table: &str) -> usize {
        self.table(dest_table).map_or(0, |t| t.rows)
    }
}

/// Run the whole multi-table import as one atomic pass. A missing table
/// block is a warning and the pass continues; any store error aborts the
/// transaction, and foreign-key enforcement is restored on every exit path.
pub fn run_import(conn: &Connection, dump_text: &str) -> Result<ImportReport, MigrateError> {
    let mut report = ImportReport::default();

    let _fk = FkGuard::suspend(conn)?;
    let tx = conn.unchecked_transaction()?;

    import_editions(&tx, dump_text, &mut report)?;
    import_categories(&tx, dump_text, &mut report)?;
    import_competitions(&tx, dump_text, &mut report)?;
    import_participants(&tx, dump_text, &mut report)?;
    import_registrations(&tx, dump_text, &mut report)?;
    import_works(&tx, dump_text, &mut report)?;
    import_uploads(&tx, dump_text, &mut report)?;

    tx.commit()?;
    Ok(report)
}

fn import_editions(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    import_mapped(tx, dump_text, &mapping::EDITION, report, |_, _| Ok(true))
}

fn import_categories(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    // The destination may carry seeded defaults whose ids collide with the
    // legacy ones. Categories are replaced outright, not merged.
    tx.execute("DELETE FROM category", [])?;
    import_mapped(tx, dump_text, &mapping::CATEGORY, report, |_, _| Ok(true))
}

fn import_competitions(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    import_mapped(tx, dump_text, &mapping::COMPETITION, report, |tx, cells| {
        // The referenced edition may come from a year with no anio row.
        tx.execute(
            "INSERT OR IGNORE INTO edition (year) VALUES (?)",
            [&cells[mapping::COMPETITION_YEAR]],
        )?;
        Ok(true)
    })
}

fn import_participants(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    import_mapped(tx, dump_text, &mapping::PARTICIPANT, report, |_, _| Ok(true))
}

fn import_registrations(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    import_mapped(tx, dump_text, &mapping::REGISTRATION, report, |_, _| Ok(true))
}

fn import_works(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    import_mapped(tx, dump_text, &mapping::WORK, report, |_, _| Ok(true))
}

fn import_uploads(
    tx: &Transaction<'_>,
    dump_text: &str,
    report: &mut ImportReport,
) -> Result<(), MigrateError> {
    import_mapped(tx, dump_text, &mapping::UPLOAD, report, |tx, cells| {
        // Uploads attached to year 0 are junk rows in the legacy data;
        // filter them out rather than invent an edition for them.
        if cells[mapping::UPLOAD_YEAR].as_i64().map_or(true, |y| y <= 0) {
            return Ok(false);
        }
        tx.execute(
            "INSERT OR IGNORE INTO edition (year) VALUES (?)",
            [&cells[mapping::UPLOAD_YEAR]],
        )?;
        Ok(true)
    })
}

/// Shared per-table pass: extract the block, split it, map every row, and
/// insert-or-ignore. `prepare_row` runs before each insert; returning false
/// filters the row out. Rows narrower than the mapping are skipped and
/// tallied, never fatal.
fn import_mapped(
    tx: &Transaction<'_>,
    dump_text: &str,
    table_mapping: &'static TableMapping,
    report: &mut ImportReport,
    mut prepare_row: impl FnMut(&Transaction<'_>, &[Cell]) -> Result<bool, MigrateError>,
) -> Result<(), MigrateError> {
    let Some(block) = dump::extract_block(dump_text, table_mapping.legacy_table) else {
        warn!(table = table_mapping.legacy_table, "no INSERT block found in dump");
        report
            .warnings
            .push(format!("no {} block found", table_mapping.legacy_table));
        report.tables.push(TableReport {
            table: table_mapping.dest_table.to_string(),
            rows: 0,
            skipped: 0,
        });
        return Ok(());
    };

    let rows = dump::parse_insert_values(block);
    let mut stmt = tx.prepare(&table_mapping.insert_sql())?;
    let mut count = 0usize;
    let mut skipped = 0usize;

    for (row_idx, raw) in rows.iter().enumerate() {
        let cells = match table_mapping.apply(raw, row_idx) {
            Ok(cells) => cells,
            Err(err @ MigrateError::RowShape { .. }) => {
                warn!(%err, "skipping malformed row");
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };
        if !prepare_row(tx, &cells)? {
            skipped += 1;
            continue;
        }
        stmt.execute(params_from_iter(cells.iter()))?;
        count += 1;
    }

    info!(
        table = table_mapping.dest_table,
        rows = count,
        skipped,
        "imported"
    );
    report.tables.push(TableReport {
        table: table_mapping.dest_table.to_string(),
        rows: count,
        skipped,
    });
    Ok(())
}
