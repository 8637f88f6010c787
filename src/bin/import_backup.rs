//! Load a JSON backup file into the store
//! Usage: cargo run --bin import_backup -- <file.json> [merge|replace]

use macrotrack::config::Config;
use macrotrack::tools::backup;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("macrotrack=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let input = match args.get(1) {
        Some(path) => path.as_str(),
        None => {
            eprintln!("Usage: import_backup <file.json> [merge|replace]");
            std::process::exit(2);
        }
    };
    let mode = args.get(2).map(|s| s.as_str()).unwrap_or("merge");

    let config = Config::from_env();
    println!("Database: {}", config.database_path.display());

    let database = macrotrack::db::open(&config.database_path)?;

    let result = backup::import_data(&database, input, mode)?;
    let summary = &result.summary;
    println!("Import ({}) from {}", result.mode, result.file_path);
    println!("  Foods:   {} imported, {} skipped", summary.foods_imported, summary.foods_skipped);
    println!("  Entries: {} imported, {} skipped", summary.entries_imported, summary.entries_skipped);
    if summary.goals_restored {
        println!("  Goals restored");
    }
    if summary.profile_restored {
        println!("  Profile restored");
    }

    Ok(())
}
