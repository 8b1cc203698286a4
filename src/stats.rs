//! Reduction of filtered listings into per-city price statistics.

use crate::currency::convert_to_usd;
use crate::error::{PipelineError, Result};
use crate::listing::{RoomCategory, ValidListing};
use crate::types::{CityStats, DataSourceRef, PriceBreakdown, SourceDescriptor};

/// Round to two decimals, half-up on the cent.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn mean(prices: &[f64]) -> f64 {
    prices.iter().sum::<f64>() / prices.len() as f64
}

/// Average in the native currency, rounded, then converted to USD and
/// rounded again. The same order everywhere so the overall average and
/// the breakdown entries agree.
fn native_avg_to_usd(prices: &[f64], currency: &str) -> Result<f64> {
    if prices.is_empty() {
        return Ok(0.0);
    }
    let local = round2(mean(prices));
    Ok(round2(convert_to_usd(local, currency)?))
}

/// Reduce the filtered listings of one source into `CityStats`.
///
/// Fails with `NoValidListings` when the set is empty; callers in batch
/// mode treat that as a skip. A room-type category with no listings
/// reports an average of 0, not an absent field.
pub fn aggregate(listings: &[ValidListing], source: &SourceDescriptor) -> Result<CityStats> {
    if listings.is_empty() {
        return Err(PipelineError::NoValidListings(source.city_name.clone()));
    }

    let currency = source.currency_code();

    let all: Vec<f64> = listings.iter().map(|l| l.price).collect();
    let local_average_price = round2(mean(&all));
    let average_price = round2(convert_to_usd(local_average_price, currency)?);

    let by_category = |category: RoomCategory| -> Vec<f64> {
        listings
            .iter()
            .filter(|l| l.category == category)
            .map(|l| l.price)
            .collect()
    };

    let price_breakdown = PriceBreakdown {
        entire_place: native_avg_to_usd(&by_category(RoomCategory::EntirePlace), currency)?,
        private_room: native_avg_to_usd(&by_category(RoomCategory::PrivateRoom), currency)?,
        shared_room: native_avg_to_usd(&by_category(RoomCategory::SharedRoom), currency)?,
    };

    Ok(CityStats {
        id: source.id.clone(),
        city_name: source.city_name.clone(),
        country: source.country.clone(),
        region: source.region.clone(),
        currency: currency.to_string(),
        local_average_price: Some(local_average_price),
        average_price,
        total_listings: listings.len(),
        price_breakdown,
        last_updated: chrono::Utc::now().to_rfc3339(),
        data_source: DataSourceRef {
            url: source.url.clone(),
            scraped_date: source.scraped_date.clone(),
        },
        local_file_info: None,
    })
}
