use std::path::Path;

/// One coerced cell from the dump.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Real(f64),
}

impl Cell {
    /// The legacy schema stored '', 0 and NULL interchangeably for optional
    /// columns; importers use this to collapse them.
    pub fn is_falsy(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Int(n) => *n == 0,
            Cell::Real(f) => *f == 0.0,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(n) => Some(*n),
            Cell::Real(f) => Some(*f as i64),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Null => None,
        }
    }

    /// Render the cell as text, the way the old importer stringified ids.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Real(f) => f.to_string(),
        }
    }
}

impl rusqlite::types::ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value, ValueRef};
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Cell::Int(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            Cell::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
        })
    }
}

/// Read the whole dump into memory. The legacy export is Latin-1, not UTF-8.
pub fn read_dump(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
    Ok(text.into_owned())
}

/// Extract the VALUES substring of the first `INSERT INTO `table`` statement,
/// from the first `(` after the VALUES keyword up to (excluding) the first
/// semicolon outside quotes. The backtick-quoted header match is exact, so a
/// table name never matches a longer name sharing its prefix.
pub fn extract_block<'a>(sql: &'a str, table: &str) -> Option<&'a str> {
    let header = format!("INSERT INTO `{}`", table);
    let start = sql.find(&header)?;
    let values = sql[start..].find("VALUES")? + start + "VALUES".len();

    let b = sql.as_bytes();
    let mut i = values;
    while i < b.len() && b[i] != b'(' {
        i += 1;
    }
    let block_start = i;

    // Scan character-by-character so semicolons inside quoted strings don't
    // terminate the block early. A doubled '' inside an open quote is an
    // escaped literal quote, not a close.
    let mut in_str = false;
    while i < b.len() {
        match b[i] {
            b'\'' if !in_str => in_str = true,
            b'\'' => {
                if b.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    in_str = false;
                }
            }
            b';' if !in_str => return Some(&sql[block_start..i]),
            _ => {}
        }
        i += 1;
    }
    Some(&sql[block_start..])
}

/// Split a VALUES block into rows of raw cell strings. Each top-level `(...)`
/// group is one row; nested unquoted parens are tracked by depth and kept
/// verbatim as part of the row text.
pub fn parse_insert_values(block: &str) -> Vec<Vec<String>> {
    let b = block.as_bytes();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut i = 0;

    while i < b.len() {
        while i < b.len() && b[i] != b'(' {
            i += 1;
        }
        if i >= b.len() {
            break;
        }
        i += 1;
        let row_start = i;
        let mut row_end = block.len();

        let mut depth = 1usize;
        let mut in_str = false;
        while i < b.len() && depth > 0 {
            match b[i] {
                b'\'' if !in_str => in_str = true,
                b'\'' => {
                    if b.get(i + 1) == Some(&b'\'') {
                        i += 1;
                    } else {
                        in_str = false;
                    }
                }
                b'(' if !in_str => depth += 1,
                b')' if !in_str => {
                    depth -= 1;
                    if depth == 0 {
                        row_end = i;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let raw = &block[row_start..row_end];
        if !raw.trim().is_empty() {
            rows.push(split_row(raw));
        }
    }
    rows
}

/// Split one row like `1, 'hello', NULL, '2012-01-01'` on commas outside
/// quotes. Escaped '' stays verbatim inside the cell text; every cell is
/// trimmed.
pub fn split_row(row: &str) -> Vec<String> {
    let b = row.as_bytes();
    let mut cells: Vec<String> = Vec::new();
    let mut start = 0;
    let mut in_str = false;
    let mut i = 0;

    while i < b.len() {
        match b[i] {
            b'\'' if !in_str => in_str = true,
            b'\'' => {
                if b.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    in_str = false;
                }
            }
            b',' if !in_str => {
                cells.push(row[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    cells.push(row[start..].trim().to_string());
    cells
}

/// Coerce one raw cell string to a typed value. Unquoted numeric-looking
/// tokens always become numbers, which drops significant leading zeros
/// ("007" -> 7); that mirrors the legacy dump convention and is kept as-is.
pub fn cell(raw: &str) -> Cell {
    let v = raw.trim();
    if v == "NULL" {
        return Cell::Null;
    }
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        return Cell::Text(v[1..v.len() - 1].replace("''", "'"));
    }
    if let Ok(n) = v.parse::<i64>() {
        return Cell::Int(n);
    }
    if let Ok(f) = v.parse::<f64>() {
        if !f.is_nan() {
            return Cell::Real(f);
        }
    }
    Cell::Text(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
-- MySQL dump 10.13\n\
CREATE TABLE `inscriptos` (`id_inscripto` int(11));\n\
INSERT INTO `inscriptos` VALUES (1,7,'a;b','O''Brien'),(2,8,NULL,'x');\n\
INSERT INTO `inscriptos` VALUES (99,99,'later','ignored');\n";

    #[test]
    fn extract_block_stops_at_unquoted_semicolon() {
        let block = extract_block(DUMP, "inscriptos").expect("block");
        assert!(block.starts_with("(1,7,'a;b'"));
        assert!(block.ends_with("(2,8,NULL,'x')"));
    }

    #[test]
    fn extract_block_requires_exact_table_name() {
        // "inscripto" must not match the longer "inscriptos" header.
        assert!(extract_block(DUMP, "inscripto").is_none());
        assert!(extract_block(DUMP, "personas").is_none());
    }

    #[test]
    fn extract_block_uses_only_the_first_statement() {
        let block = extract_block(DUMP, "inscriptos").expect("block");
        let rows = parse_insert_values(block);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[1][0], "2");
    }

    #[test]
    fn parse_insert_values_counts_rows_and_cells() {
        let rows = parse_insert_values("(1,'a',NULL),(2,'b',3)");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "'a'", "NULL"]);
        assert_eq!(rows[1], vec!["2", "'b'", "3"]);
    }

    #[test]
    fn nested_parens_stay_inside_the_row() {
        let rows = parse_insert_values("(1, CONCAT('a', 'b'), 2)");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], vec!["1", "CONCAT('a', 'b')", "2"]);
    }

    #[test]
    fn quoted_delimiters_do_not_split() {
        let rows = parse_insert_values("(1,'x,y),(z')");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], vec!["1", "'x,y),(z'"]);
    }

    #[test]
    fn escaped_quote_is_not_a_cell_boundary() {
        let rows = parse_insert_values("(1,'O''Brien, Jr',2)");
        assert_eq!(rows[0], vec!["1", "'O''Brien, Jr'", "2"]);
    }

    #[test]
    fn cell_coercions() {
        assert_eq!(cell("NULL"), Cell::Null);
        assert_eq!(cell("'abc'"), Cell::Text("abc".into()));
        assert_eq!(cell("42"), Cell::Int(42));
        assert_eq!(cell("4.5"), Cell::Real(4.5));
        assert_eq!(cell("'4''2'"), Cell::Text("4'2".into()));
        assert_eq!(cell("007"), Cell::Int(7));
        assert_eq!(cell("2012-01-01"), Cell::Text("2012-01-01".into()));
    }

    #[test]
    fn falsy_cells() {
        assert!(Cell::Null.is_falsy());
        assert!(Cell::Text(String::new()).is_falsy());
        assert!(Cell::Int(0).is_falsy());
        assert!(!Cell::Text("x".into()).is_falsy());
        assert!(!Cell::Int(7).is_falsy());
    }
}
