use crate::dump::Cell;

/// Languages the competition schema accepts. Anything else collapses to the
/// "Other" sentinel rather than failing the row.
const LANGUAGES: [&str; 9] = [
    "Welsh",
    "Spanish",
    "English",
    "German",
    "Polish",
    "French",
    "Portuguese",
    "Italian",
    "Other",
];

const PLACEMENTS: [&str; 4] = ["1", "2", "3", "mention"];

pub fn language_or_other(s: &str) -> String {
    if LANGUAGES.contains(&s) {
        s.to_string()
    } else {
        "Other".to_string()
    }
}

pub fn safe_language(value: &Cell) -> Cell {
    match value {
        Cell::Null => Cell::Null,
        v => Cell::Text(language_or_other(&v.to_text())),
    }
}

/// Placements outside {"1","2","3","mention"} are dropped to NULL, never an
/// error. Case-sensitive, trimmed.
pub fn safe_placement(value: &Cell) -> Cell {
    match value {
        Cell::Null => Cell::Null,
        v => {
            let s = v.to_text().trim().to_string();
            if PLACEMENTS.contains(&s.as_str()) {
                Cell::Text(s)
            } else {
                Cell::Null
            }
        }
    }
}

/// Rewrite the year segment of a `YYYY-MM-DD` date, keeping month and day.
/// Anything else gets the synthetic mid-January default for that year.
pub fn date_in_year(raw: Option<&str>, year: i32) -> String {
    if let Some(s) = raw {
        let d = s.trim();
        if is_iso_date(d) {
            return format!("{}{}", year, &d[4..]);
        }
    }
    format!("{}-01-15", year)
}

fn is_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && [0usize, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| b[i].is_ascii_digit())
}
