/// Cache inspection utility.
///
/// Usage:
///   cache_status info   - Show cache summary
///   cache_status list   - List cached city ids
///   cache_status clear  - Delete the cache document
use anyhow::Result;
use city_price_collector::CacheStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    city_price_collector::init_logging();

    let cache = CacheStore::from_env();

    match std::env::args().nth(1).as_deref() {
        Some("info") | None => {
            let info = cache.info().await;
            if info.exists {
                println!("Cache file: {}", cache.path().display());
                println!("  version:      {}", info.version.unwrap_or_default());
                println!("  cities:       {}", info.cities_count);
                println!("  last updated: {}", info.last_updated.unwrap_or_default());
            } else {
                println!("No cache found at {}", cache.path().display());
            }
        }
        Some("list") => {
            let cities = cache.cached_cities().await;
            if cities.is_empty() {
                println!("Cache is empty");
            }
            for city in cities {
                println!(
                    "  {:<20} {:<24} avg ${:.2} USD",
                    city.id, city.city_name, city.average_price
                );
            }
        }
        Some("clear") => {
            cache.clear().await?;
            println!("Cache cleared");
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            println!("Usage: cache_status [info|list|clear]");
        }
    }

    Ok(())
}
