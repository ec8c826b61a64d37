use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    /// A dump row is narrower than its positional column mapping expects.
    /// Recovered per row: the importer skips and tallies it.
    #[error("table {table}: row {row} has {actual} cells, mapping expects at least {expected}")]
    RowShape {
        table: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("destination store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
