/// Raw data pull utility.
///
/// Usage:
///   pull_data pull          - Download all CSVs
///   pull_data pull-missing  - Download only CSVs for uncached cities
///   pull_data status        - Check local files
///   pull_data clear         - Clear local files
use anyhow::Result;
use city_price_collector::{sources, CacheStore, LocalStore};

fn print_usage() {
    println!("Usage:");
    println!("  pull_data pull          - Download all CSVs");
    println!("  pull_data pull-missing  - Download only missing CSVs (recommended)");
    println!("  pull_data status        - Check local files");
    println!("  pull_data clear         - Clear local files");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    city_price_collector::init_logging();

    let store = LocalStore::from_env()?;
    let sources = sources::data_sources();

    match std::env::args().nth(1).as_deref() {
        Some("pull") => {
            let summary = store.pull_all(&sources).await?;
            println!("Hard pull completed:");
            println!("  successful: {}", summary.successful);
            println!("  failed:     {}", summary.failed);
        }
        Some("pull-missing") | Some("pullMissing") => {
            let cache = CacheStore::from_env();
            let summary = store.pull_missing(&sources, &cache).await?;
            println!("Targeted pull completed:");
            println!("  missing:    {}", summary.missing_count);
            println!("  successful: {}", summary.successful);
            println!("  failed:     {}", summary.failed);
            println!("  skipped:    {}", summary.skipped);
        }
        Some("status") => {
            let status = store.status().await?;
            println!("Local CSV files: {}", status.total_csvs);
            println!("Data directory: {}", status.directory);
            if !status.csv_files.is_empty() {
                let shown = status.csv_files.iter().take(5).cloned().collect::<Vec<_>>();
                print!("Files: {}", shown.join(", "));
                if status.csv_files.len() > 5 {
                    print!(" ... and {} more", status.csv_files.len() - 5);
                }
                println!();
            }
        }
        Some("clear") => {
            let cleared = store.clear().await?;
            println!("Cleared {cleared} files from local storage");
        }
        _ => print_usage(),
    }

    Ok(())
}
