//! Positional column mappings for the seven legacy tables.
//!
//! The legacy dump never names its columns; the index -> meaning assignments
//! below were recovered from the old database and are fixed. Each mapping is
//! bounds-checked against every row before any cell is read.

use crate::domain::{safe_language, safe_placement};
use crate::dump::{cell, Cell};
use crate::error::MigrateError;

/// How a coerced cell is reshaped before binding to its destination column.
#[derive(Clone, Copy, Debug)]
pub enum Transform {
    /// Bind the coerced cell unchanged.
    Keep,
    /// Optional legacy columns stored '' or 0 where the new schema wants NULL.
    NullIfFalsy,
    /// Fall back to the given text when the cell is NULL, '' or 0.
    OrText(&'static str),
    /// Legacy numeric ids become text keys in the new schema.
    IntToText,
    /// Stringified and trimmed, with a fallback for blank values.
    IntToTextOr(&'static str),
    /// NULL collapses to integer 0.
    ZeroIfNull,
    /// NULL collapses to "0"; everything else is stringified.
    TextZeroIfNull,
    Language,
    Placement,
}

/// One positional assignment: legacy cell index -> destination column.
pub struct ColumnMap {
    pub src: usize,
    pub dest: &'static str,
    pub transform: Transform,
}

pub struct TableMapping {
    pub legacy_table: &'static str,
    pub dest_table: &'static str,
    pub columns: &'static [ColumnMap],
}

impl TableMapping {
    /// `INSERT OR IGNORE` statement covering every mapped destination column,
    /// in mapping order.
    pub fn insert_sql(&self) -> String {
        let cols: Vec<&str> = self.columns.iter().map(|c| c.dest).collect();
        let marks = vec!["?"; cols.len()].join(", ");
        format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
            self.dest_table,
            cols.join(", "),
            marks
        )
    }

    pub fn dest_index(&self, dest: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.dest == dest)
    }

    /// Coerce and transform every mapped cell of one raw row. Rows narrower
    /// than the mapping yield a typed RowShape error instead of an
    /// out-of-bounds access.
    pub fn apply(&self, raw: &[String], row_idx: usize) -> Result<Vec<Cell>, MigrateError> {
        let needed = self.columns.iter().map(|c| c.src + 1).max().unwrap_or(0);
        if raw.len() < needed {
            return Err(MigrateError::RowShape {
                table: self.legacy_table,
                row: row_idx,
                expected: needed,
                actual: raw.len(),
            });
        }
        Ok(self
            .columns
            .iter()
            .map(|c| apply_transform(cell(&raw[c.src]), c.transform))
            .collect())
    }
}

fn apply_transform(value: Cell, transform: Transform) -> Cell {
    match transform {
        Transform::Keep => value,
        Transform::NullIfFalsy => {
            if value.is_falsy() {
                Cell::Null
            } else {
                value
            }
        }
        Transform::OrText(fallback) => {
            if value.is_falsy() {
                Cell::Text(fallback.to_string())
            } else {
                value
            }
        }
        Transform::IntToText => match value {
            Cell::Null => Cell::Null,
            v => Cell::Text(v.to_text()),
        },
        Transform::IntToTextOr(fallback) => {
            let s = if value.is_falsy() {
                fallback.to_string()
            } else {
                value.to_text().trim().to_string()
            };
            if s.is_empty() {
                Cell::Text(fallback.to_string())
            } else {
                Cell::Text(s)
            }
        }
        Transform::ZeroIfNull => match value {
            Cell::Null => Cell::Int(0),
            v => v,
        },
        Transform::TextZeroIfNull => match value {
            Cell::Null => Cell::Text("0".to_string()),
            v => Cell::Text(v.to_text()),
        },
        Transform::Language => safe_language(&value),
        Transform::Placement => safe_placement(&value),
    }
}

/// Positions of the mapped `year` column inside COMPETITION and UPLOAD,
/// used by the importers that ensure the parent edition row first.
pub const COMPETITION_YEAR: usize = 4;
pub const UPLOAD_YEAR: usize = 1;

// Legacy `anio` columns:
// 0 Id_anio, 1 comision, 2 presentadores, 3 coordinadores, 4 jurado,
// 5 balance, 6 extra, 7 comisionimg, 8 presentadoresimg
pub static EDITION: TableMapping = TableMapping {
    legacy_table: "anio",
    dest_table: "edition",
    columns: &[
        ColumnMap { src: 0, dest: "year", transform: Transform::Keep },
        ColumnMap { src: 1, dest: "committee", transform: Transform::NullIfFalsy },
        ColumnMap { src: 7, dest: "committee_img", transform: Transform::NullIfFalsy },
        ColumnMap { src: 2, dest: "presenters", transform: Transform::NullIfFalsy },
        ColumnMap { src: 8, dest: "presenters_img", transform: Transform::NullIfFalsy },
    ],
};

// Legacy `categoria` columns: 0 id_cat, 1 nombre, 2 nomcym, 3 descripcion
pub static CATEGORY: TableMapping = TableMapping {
    legacy_table: "categoria",
    dest_table: "category",
    columns: &[
        ColumnMap { src: 0, dest: "id", transform: Transform::Keep },
        ColumnMap { src: 1, dest: "name", transform: Transform::Keep },
        ColumnMap { src: 2, dest: "name_welsh", transform: Transform::NullIfFalsy },
    ],
};

// Legacy `competencia` columns:
// 0 id_comp, 1 categoria, 2 descripcion, 3 fk_anio, 4 idioma, 5 rank,
// 6 preliminar, 7 pre_lugar, 8 grupind, 9 extra
pub static COMPETITION: TableMapping = TableMapping {
    legacy_table: "competencia",
    dest_table: "competition",
    columns: &[
        ColumnMap { src: 0, dest: "id", transform: Transform::IntToText },
        ColumnMap { src: 1, dest: "category_id", transform: Transform::Keep },
        ColumnMap { src: 2, dest: "description", transform: Transform::Keep },
        ColumnMap { src: 4, dest: "language", transform: Transform::Language },
        ColumnMap { src: 3, dest: "year", transform: Transform::Keep },
        ColumnMap { src: 8, dest: "type", transform: Transform::IntToTextOr("IND") },
        ColumnMap { src: 5, dest: "rank", transform: Transform::ZeroIfNull },
        ColumnMap { src: 6, dest: "preliminary", transform: Transform::TextZeroIfNull },
    ],
};

// Legacy `persona` columns:
// 0 id_persona, 1 DNI, 2 Nombre, 3 Apellido, 4 direccion, 5 FechaNac,
// 6 Nacionalidad, 7 Residencia, 8 Email, 9 Telefono, 10 Telefono2, 11 tipo
pub static PARTICIPANT: TableMapping = TableMapping {
    legacy_table: "persona",
    dest_table: "participant",
    columns: &[
        ColumnMap { src: 0, dest: "id", transform: Transform::Keep },
        ColumnMap { src: 2, dest: "name", transform: Transform::Keep },
        ColumnMap { src: 3, dest: "surname", transform: Transform::Keep },
        ColumnMap { src: 1, dest: "document_id", transform: Transform::Keep },
        ColumnMap { src: 5, dest: "birth_date", transform: Transform::Keep },
        ColumnMap { src: 6, dest: "nationality", transform: Transform::Keep },
        ColumnMap { src: 7, dest: "residence", transform: Transform::Keep },
        ColumnMap { src: 8, dest: "email", transform: Transform::Keep },
        ColumnMap { src: 9, dest: "phone", transform: Transform::Keep },
        ColumnMap { src: 11, dest: "type", transform: Transform::Keep },
    ],
};

// Legacy `inscriptos` columns:
// 0 id_inscripto, 1 fk_persona, 2 fk_comp, 3 seudonimo, 4 fechainscrip,
// 5 anio_insc, 6 baja
pub static REGISTRATION: TableMapping = TableMapping {
    legacy_table: "inscriptos",
    dest_table: "registration",
    columns: &[
        ColumnMap { src: 0, dest: "id", transform: Transform::Keep },
        ColumnMap { src: 1, dest: "participant_id", transform: Transform::Keep },
        ColumnMap { src: 2, dest: "competition_id", transform: Transform::IntToText },
        ColumnMap { src: 3, dest: "pseudonym", transform: Transform::Keep },
        ColumnMap { src: 4, dest: "registered_at", transform: Transform::Keep },
        ColumnMap { src: 5, dest: "year", transform: Transform::Keep },
        ColumnMap { src: 6, dest: "dropped", transform: Transform::ZeroIfNull },
    ],
};

// Legacy `Obra` columns:
// 0 id_obra, 1 fk_particip, 2 puesto, 3 competencia, 4 Nombre, 5 fecha,
// 6 VIDEOURLS, 7 PHOTOURLS
pub static WORK: TableMapping = TableMapping {
    legacy_table: "Obra",
    dest_table: "work",
    columns: &[
        ColumnMap { src: 0, dest: "id", transform: Transform::Keep },
        ColumnMap { src: 1, dest: "participant_id", transform: Transform::Keep },
        ColumnMap { src: 2, dest: "placement", transform: Transform::Placement },
        ColumnMap { src: 3, dest: "competition_id", transform: Transform::IntToText },
        ColumnMap { src: 4, dest: "title", transform: Transform::OrText("(untitled)") },
        ColumnMap { src: 5, dest: "date", transform: Transform::Keep },
        ColumnMap { src: 6, dest: "video_url", transform: Transform::NullIfFalsy },
        ColumnMap { src: 7, dest: "photo_url", transform: Transform::NullIfFalsy },
    ],
};

// Legacy `subidas` columns: 0 id_subida, 1 archivo, 2 descripcion, 3 id_anio
pub static UPLOAD: TableMapping = TableMapping {
    legacy_table: "subidas",
    dest_table: "upload",
    columns: &[
        ColumnMap { src: 0, dest: "id", transform: Transform::Keep },
        ColumnMap { src: 3, dest: "year", transform: Transform::Keep },
        ColumnMap { src: 1, dest: "filename", transform: Transform::OrText("") },
        ColumnMap { src: 2, dest: "description", transform: Transform::Keep },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_row_is_a_typed_anomaly() {
        let row = raw(&["1", "2"]);
        let err = COMPETITION.apply(&row, 3).unwrap_err();
        match err {
            MigrateError::RowShape { table, row, expected, actual } => {
                assert_eq!(table, "competencia");
                assert_eq!(row, 3);
                assert_eq!(expected, 9);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn competition_row_transforms() {
        let row = raw(&[
            "7", "2", "'Group dance'", "2024", "'Klingon'", "NULL", "NULL", "''", "''", "''",
        ]);
        let cells = COMPETITION.apply(&row, 0).expect("apply");
        assert_eq!(cells[0], Cell::Text("7".into()));
        assert_eq!(cells[3], Cell::Text("Other".into()));
        assert_eq!(cells[4], Cell::Int(2024));
        assert_eq!(cells[5], Cell::Text("IND".into()));
        assert_eq!(cells[6], Cell::Int(0));
        assert_eq!(cells[7], Cell::Text("0".into()));
    }

    #[test]
    fn work_row_transforms() {
        let row = raw(&["1", "4", "'4'", "9", "''", "'2017-10-01'", "''", "NULL"]);
        let cells = WORK.apply(&row, 0).expect("apply");
        assert_eq!(cells[2], Cell::Null, "unknown placement drops to NULL");
        assert_eq!(cells[3], Cell::Text("9".into()), "competition ref stringified");
        assert_eq!(cells[4], Cell::Text("(untitled)".into()));
        assert_eq!(cells[6], Cell::Null);
        assert_eq!(cells[7], Cell::Null);
    }

    #[test]
    fn year_positions_match_the_mappings() {
        assert_eq!(COMPETITION.dest_index("year"), Some(COMPETITION_YEAR));
        assert_eq!(UPLOAD.dest_index("year"), Some(UPLOAD_YEAR));
    }

    #[test]
    fn insert_sql_lists_columns_in_mapping_order() {
        assert_eq!(
            EDITION.insert_sql(),
            "INSERT OR IGNORE INTO edition (year, committee, committee_img, presenters, presenters_img) VALUES (?, ?, ?, ?, ?)"
        );
    }
}
