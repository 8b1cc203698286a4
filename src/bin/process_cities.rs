/// Pipeline entry point: compute per-city price statistics and persist
/// them to the cache.
///
/// Usage:
///   process_cities [--local] [--force]
///
///   --local   read raw CSVs from the local file store (run
///             `pull_data pull` first) instead of downloading
///   --force   clear the cache and reprocess every source
use anyhow::Result;
use city_price_collector::{sources, CacheStore, CityStats, LocalSource, LocalStore, Processor, RemoteSource};

fn print_result(cities: &[CityStats]) {
    println!("Processed city statistics ({} cities):", cities.len());
    for city in cities {
        println!(
            "  {:<20} {:<16} avg ${:>8.2} USD  ({} listings)",
            city.city_name, city.country, city.average_price, city.total_listings
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    city_price_collector::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let local = args.iter().any(|a| a == "--local");
    let force = args.iter().any(|a| a == "--force");

    let sources = sources::data_sources();
    let cache = CacheStore::from_env();

    let cities = if local {
        let store = LocalStore::from_env()?;
        let processor = Processor::new(LocalSource::new(store), cache);
        processor.process_all_sources(&sources, force).await?
    } else {
        let processor = Processor::new(RemoteSource::new()?, cache);
        processor.process_all_sources(&sources, force).await?
    };

    print_result(&cities);
    Ok(())
}
