//! Price parsing, room-type classification, and the validity filter
//! applied to raw listing rows before aggregation.

use crate::currency::usd_rate;
use crate::types::RawListingRecord;
use serde::{Deserialize, Serialize};

/// Outlier threshold expressed in USD. Listings at or above the
/// equivalent in their own currency are excluded from statistics.
pub const MAX_PRICE_USD: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomCategory {
    EntirePlace,
    PrivateRoom,
    SharedRoom,
    Other,
}

/// A raw record that passed the validity filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidListing {
    /// Nightly price in the source's native currency.
    pub price: f64,
    pub category: RoomCategory,
}

/// Parse a raw price string like `"$1,234.56"` into a number.
///
/// Strips currency symbols and grouping separators. An empty or absent
/// price parses to `Some(0.0)` (the export uses empty for "no price");
/// anything non-numeric is `None`. Either way the record fails the
/// strictly-positive validity check.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }

    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Case-insensitive substring classification of the free-text
/// `room_type` column.
pub fn classify_room_type(raw: &str) -> RoomCategory {
    let lower = raw.to_lowercase();
    if lower.contains("entire") {
        RoomCategory::EntirePlace
    } else if lower.contains("private") {
        RoomCategory::PrivateRoom
    } else if lower.contains("shared") {
        RoomCategory::SharedRoom
    } else {
        RoomCategory::Other
    }
}

/// Upper price bound in the listing's own currency: 1000 USD converted
/// at the table rate, falling back to 1000 when the currency is USD or
/// unrecognized.
pub fn outlier_ceiling(currency: &str) -> f64 {
    match usd_rate(currency) {
        Some(rate) if currency != "USD" => MAX_PRICE_USD / rate,
        _ => MAX_PRICE_USD,
    }
}

/// Apply the two-sided validity filter to one raw record.
///
/// Raw exports contain zero/negative placeholder prices as well as
/// extreme erroneous entries; both break an average if included.
pub fn to_valid(record: &RawListingRecord, currency: &str) -> Option<ValidListing> {
    let price = parse_price(&record.price)?;
    if price > 0.0 && price < outlier_ceiling(currency) {
        Some(ValidListing {
            price,
            category: classify_room_type(&record.room_type),
        })
    } else {
        None
    }
}
