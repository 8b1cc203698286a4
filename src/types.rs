use serde::{Deserialize, Serialize};

/// Static config entry identifying one city's dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub id: String,
    pub city_name: String,
    pub country: String,
    pub region: String,
    pub url: String,
    pub scraped_date: String,
    /// Currency of the listing prices in this export. Absent means USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl SourceDescriptor {
    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }
}

/// One row from a listings CSV. Exports carry dozens of columns; only
/// `price` and `room_type` are consumed, the rest are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListingRecord {
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub room_type: String,
}

/// Average price per room type, in USD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub entire_place: f64,
    pub private_room: f64,
    pub shared_room: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceRef {
    pub url: String,
    pub scraped_date: String,
}

/// Provenance of a locally stored CSV, attached when a city was computed
/// from the local file store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFileInfo {
    pub downloaded_at: String,
    pub file_size: u64,
    pub filename: String,
}

/// The persisted/served unit: computed statistics for one city.
///
/// `average_price` and the breakdown are USD; `local_average_price` keeps
/// the pre-conversion value in the source currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub id: String,
    pub city_name: String,
    pub country: String,
    pub region: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_average_price: Option<f64>,
    pub average_price: f64,
    pub total_listings: usize,
    pub price_breakdown: PriceBreakdown,
    pub last_updated: String,
    pub data_source: DataSourceRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_file_info: Option<LocalFileInfo>,
}

/// The single persisted JSON structure holding all computed city stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    pub version: String,
    pub last_updated: String,
    pub cities_count: usize,
    pub cities: Vec<CityStats>,
}

/// Metadata sidecar written next to each downloaded CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub id: String,
    pub city_name: String,
    pub country: String,
    pub region: String,
    pub original_url: String,
    pub scraped_date: String,
    pub downloaded_at: String,
    pub filename: String,
    pub file_size: u64,
}

/// Outcome of one download within a pull batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResult {
    pub id: String,
    pub city_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary written after each pull batch. For a full pull
/// `missing_count == total_sources` and `skipped == 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSummary {
    pub total_sources: usize,
    pub total_cached: usize,
    pub missing_count: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<PullResult>,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub csv_files: Vec<String>,
    pub metadata_files: Vec<String>,
    #[serde(rename = "totalCSVs")]
    pub total_csvs: usize,
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub exists: bool,
    pub cities_count: usize,
    pub last_updated: Option<String>,
    pub version: Option<String>,
}
