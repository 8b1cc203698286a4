/// Single-city diagnostic: record-by-record analysis of a local CSV,
/// for understanding why a city's average looks wrong.
///
/// Usage:
///   debug_city <city_id>
///
/// Run `cache_status list` for known ids and `pull_data pull` to
/// download the CSVs first.
use anyhow::Result;
use city_price_collector::processor::CityDebugReport;
use city_price_collector::{debug_city, LocalStore};

fn print_report(report: &CityDebugReport) {
    let source = &report.source;
    println!("City: {}, {}", source.city_name, source.country);
    println!("Source URL: {}", source.url);
    println!("Scraped: {}", source.scraped_date);
    println!();
    println!("Currency: {}", report.currency);
    println!(
        "Outlier threshold: {} {:.2} (~$1000 USD)",
        report.currency, report.outlier_ceiling_local
    );
    println!();
    println!("Total records:   {}", report.total_records);
    println!("Invalid prices:  {}", report.invalid_prices);
    println!("Outliers:        {}", report.outliers);
    println!("Valid listings:  {}", report.valid_listings);

    if let (Some(local), Some(usd)) = (&report.local, &report.usd) {
        println!();
        println!("Price statistics (local {}):", report.currency);
        println!("  average: {:.2}", local.average);
        println!("  median:  {:.2}", local.median);
        println!("  min:     {:.2}", local.min);
        println!("  max:     {:.2}", local.max);
        println!();
        println!("Price statistics (USD):");
        println!("  average: ${:.2}", usd.average);
        println!("  median:  ${:.2}", usd.median);
        println!("  min:     ${:.2}", usd.min);
        println!("  max:     ${:.2}", usd.max);
    } else {
        println!();
        println!("No valid prices found");
    }

    println!();
    println!("Room type breakdown (USD):");
    for (label, tally) in [
        ("Entire place", &report.entire_place),
        ("Private room", &report.private_room),
        ("Shared room", &report.shared_room),
        ("Other/Unknown", &report.other),
    ] {
        if tally.count > 0 {
            println!(
                "  {:<14} {} listings, avg ${:.2}",
                label, tally.count, tally.average_usd
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    city_price_collector::init_logging();

    let Some(city_id) = std::env::args().nth(1) else {
        println!("Usage: debug_city <city_id>");
        println!();
        println!("Examples:");
        println!("  debug_city budapest");
        println!("  debug_city new-york-city");
        println!();
        println!("Tip: run `cache_status list` to see available city ids");
        return Ok(());
    };

    let store = LocalStore::from_env()?;
    let report = debug_city(&store, &city_id).await?;
    print_report(&report);

    Ok(())
}
