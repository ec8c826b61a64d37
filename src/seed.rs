use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

// Default festival categories, Spanish name + Welsh name.
const DEFAULT_CATEGORIES: [(&str, &str); 7] = [
    ("Canto Individual", "Canu Unigol"),
    ("Canto Grupal", "Canu Grŵp"),
    ("Recitado", "Adrodd"),
    ("Danza", "Dawns"),
    ("Instrumental", "Offerynnol"),
    ("Composición", "Cyfansoddi"),
    ("Artesanías", "Crefft"),
];

/// Seed the default categories and make sure the given edition exists.
/// Safe to run repeatedly; categories are matched by name.
pub fn seed_defaults(conn: &Connection, year: i32) -> Result<()> {
    conn.execute("INSERT OR IGNORE INTO edition (year) VALUES (?)", [year])?;

    let mut existing = conn.prepare("SELECT id FROM category WHERE name = ?")?;
    let mut insert = conn.prepare("INSERT INTO category (name, name_welsh) VALUES (?, ?)")?;
    let mut created = 0usize;
    for (name, welsh) in DEFAULT_CATEGORIES {
        if existing.exists([name])? {
            continue;
        }
        insert.execute([name, welsh])?;
        created += 1;
    }

    info!(year, created, "seeded defaults");
    Ok(())
}
