//! Write the whole store to a JSON backup file
//! Usage: cargo run --bin export_backup -- <file.json>

use macrotrack::config::Config;
use macrotrack::tools::backup;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("macrotrack=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let output = match args.get(1) {
        Some(path) => path.clone(),
        None => format!("macrotrack_backup_{}.json", chrono::Local::now().format("%Y-%m-%d")),
    };

    let config = Config::from_env();
    println!("Database: {}", config.database_path.display());

    let database = macrotrack::db::open(&config.database_path)?;

    let result = backup::export_data(&database, &output)?;
    println!("Exported {} foods and {} entries to {}", result.foods, result.entries, result.file_path);

    Ok(())
}
