//! Current-year backfill.
//!
//! After an import the newest edition usually has no data of its own yet:
//! the committee opens registrations by reusing the previous year's
//! competition list. This pass clones the most recent prior year's
//! competitions and registrations into the current year, once.

use std::collections::HashMap;

use chrono::Datelike;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{date_in_year, language_or_other};
use crate::error::MigrateError;

#[derive(Debug, Default, Serialize)]
pub struct BackfillReport {
    pub year: i32,
    pub source_year: Option<i32>,
    pub competitions_cloned: usize,
    pub registrations_cloned: usize,
    pub registrations_skipped: usize,
}

struct SourceCompetition {
    id: String,
    category_id: i64,
    description: Option<String>,
    language: Option<String>,
    kind: String,
    rank: i64,
    preliminary: Option<String>,
}

struct SourceRegistration {
    participant_id: i64,
    competition_id: String,
    pseudonym: Option<String>,
    registered_at: Option<String>,
    dropped: i64,
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Clone the most recent prior year's competitions and registrations into
/// `year` unless that year already has registrations. Idempotent across
/// re-runs; each write is insert-or-ignore or guarded by the year check, so
/// an interrupted pass is repaired by running again.
pub fn ensure_current_year_registrations(
    conn: &Connection,
    year: i32,
) -> Result<BackfillReport, MigrateError> {
    let mut report = BackfillReport {
        year,
        ..Default::default()
    };

    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM registration WHERE year = ?",
        [year],
        |row| row.get(0),
    )?;
    if existing > 0 {
        info!(year, registrations = existing, "current year already has registrations");
        return Ok(report);
    }

    let source_year: Option<i32> = conn
        .query_row(
            "SELECT MAX(year) FROM registration WHERE year < ?",
            [year],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    let Some(source_year) = source_year else {
        warn!(year, "no prior registrations to backfill from");
        conn.execute("INSERT OR IGNORE INTO edition (year) VALUES (?)", [year])?;
        return Ok(report);
    };
    report.source_year = Some(source_year);

    conn.execute("INSERT OR IGNORE INTO edition (year) VALUES (?)", [year])?;

    // Deterministic clone order: rank, then id.
    let mut comp_stmt = conn.prepare(
        "SELECT id, category_id, description, language, type, rank, preliminary
         FROM competition
         WHERE year = ?
         ORDER BY rank ASC, id ASC",
    )?;
    let comps = comp_stmt
        .query_map([source_year], |row| {
            Ok(SourceCompetition {
                id: row.get(0)?,
                category_id: row.get(1)?,
                description: row.get(2)?,
                language: row.get(3)?,
                kind: row.get(4)?,
                rank: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                preliminary: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if comps.is_empty() {
        warn!(source_year, year, "source year has no competitions to clone");
        return Ok(report);
    }

    let mut insert_comp = conn.prepare(
        "INSERT OR IGNORE INTO competition
            (id, category_id, description, language, year, type, rank, preliminary)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )?;
    let mut id_map: HashMap<String, String> = HashMap::new();
    for comp in &comps {
        let cloned_id = format!("{}-{}", year, comp.id);
        let language = comp.language.as_deref().map(language_or_other);
        insert_comp.execute(params![
            cloned_id,
            comp.category_id,
            comp.description,
            language,
            year,
            comp.kind,
            comp.rank,
            comp.preliminary,
        ])?;
        id_map.insert(comp.id.clone(), cloned_id);
        report.competitions_cloned += 1;
    }

    let mut reg_stmt = conn.prepare(
        "SELECT participant_id, competition_id, pseudonym, registered_at, dropped
         FROM registration
         WHERE year = ?",
    )?;
    let regs = reg_stmt
        .query_map([source_year], |row| {
            Ok(SourceRegistration {
                participant_id: row.get(0)?,
                competition_id: row.get(1)?,
                pseudonym: row.get(2)?,
                registered_at: row.get(3)?,
                dropped: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if regs.is_empty() {
        warn!(source_year, year, "source year has no registrations to clone");
        return Ok(report);
    }

    let mut insert_reg = conn.prepare(
        "INSERT INTO registration
            (participant_id, competition_id, pseudonym, registered_at, year, dropped)
         VALUES (?, ?, ?, ?, ?, ?)",
    )?;
    for reg in &regs {
        // A registration can reference a competition that never made it into
        // the clone map; old data holds a few of those. Skip, don't fail.
        let Some(cloned_comp) = id_map.get(&reg.competition_id) else {
            report.registrations_skipped += 1;
            continue;
        };
        insert_reg.execute(params![
            reg.participant_id,
            cloned_comp,
            reg.pseudonym,
            date_in_year(reg.registered_at.as_deref(), year),
            year,
            reg.dropped,
        ])?;
        report.registrations_cloned += 1;
    }

    info!(
        year,
        source_year,
        competitions = report.competitions_cloned,
        registrations = report.registrations_cloned,
        skipped = report.registrations_skipped,
        "backfilled current year"
    );
    Ok(report)
}
