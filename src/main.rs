use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eistedmigrate::{backfill, db, dump, import, seed};

#[derive(Parser, Debug)]
#[command(name = "eistedmigrate", version, about = "EistedGlobal legacy dump importer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Import a legacy SQL dump, then backfill the current year
    Migrate {
        /// Path to the legacy dump file
        dump: PathBuf,
        /// Destination database (defaults to $DB_PATH, then ./data/eistedglobal.db)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Backfill target year (defaults to the current calendar year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Seed the default categories and the current edition
    Seed {
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        year: Option<i32>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    init_tracing("info");

    if let Err(err) = run() {
        error!("migration failed: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate { dump: dump_path, db: db_flag, year } => {
            let year = year.unwrap_or_else(backfill::current_year);
            let text = dump::read_dump(&dump_path)
                .with_context(|| format!("reading dump {}", dump_path.display()))?;
            let conn = db::open_db(&db_path(db_flag))?;

            let import_report = import::run_import(&conn, &text)?;
            let backfill_report = backfill::ensure_current_year_registrations(&conn, year)?;

            let summary = serde_json::json!({
                "import": import_report,
                "backfill": backfill_report,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            info!("migration complete");
        }
        Commands::Seed { db: db_flag, year } => {
            let year = year.unwrap_or_else(backfill::current_year);
            let conn = db::open_db(&db_path(db_flag))?;
            seed::seed_defaults(&conn, year)?;
        }
    }
    Ok(())
}

fn db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("DB_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./data/eistedglobal.db"))
}
