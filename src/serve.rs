//! Helpers behind the read surface: query filtering/sorting of the
//! cached city list and a process-scoped memo of the cache contents.

use crate::cache::CacheStore;
use crate::types::CityStats;
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    AveragePrice,
    CityName,
    Country,
    TotalListings,
}

impl SortField {
    /// Parse the query-string spelling of a sort field.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "averagePrice" => Some(Self::AveragePrice),
            "cityName" => Some(Self::CityName),
            "country" => Some(Self::Country),
            "totalListings" => Some(Self::TotalListings),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct CityQuery {
    /// Case-insensitive substring match on the country name.
    pub country: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
}

/// Filter and sort a city list according to a query.
pub fn apply_query(cities: &[CityStats], query: &CityQuery) -> Vec<CityStats> {
    let mut selected: Vec<CityStats> = match &query.country {
        Some(needle) => {
            let needle = needle.to_lowercase();
            cities
                .iter()
                .filter(|c| c.country.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        }
        None => cities.to_vec(),
    };

    selected.sort_by(|a, b| {
        let ordering = match query.sort_by {
            SortField::AveragePrice => a.average_price.total_cmp(&b.average_price),
            SortField::CityName => a.city_name.cmp(&b.city_name),
            SortField::Country => a.country.cmp(&b.country),
            SortField::TotalListings => a.total_listings.cmp(&b.total_listings),
        };
        match query.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });

    selected
}

/// Response shape of the city list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CityListResponse {
    pub success: bool,
    pub data: Vec<CityStats>,
    pub count: usize,
}

impl CityListResponse {
    pub fn from_cities(data: Vec<CityStats>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Process-scoped view of the cached city list.
///
/// The memo is invalidated by comparing the store's `lastUpdated` stamp
/// on every access, so a rewrite of the cache by the pipeline is picked
/// up on the next read rather than being shadowed by a first-call memo.
pub struct ServedCities {
    cache: CacheStore,
    memo: Mutex<Option<(String, Vec<CityStats>)>>,
}

impl ServedCities {
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache,
            memo: Mutex::new(None),
        }
    }

    /// The current city list, re-read from the store when it changed.
    pub async fn cities(&self) -> Vec<CityStats> {
        let info = self.cache.info().await;
        let mut memo = self.memo.lock().await;

        if let (Some(stamp), Some((memo_stamp, cities))) = (&info.last_updated, memo.as_ref()) {
            if stamp == memo_stamp {
                return cities.clone();
            }
        }

        let fresh = self.cache.cached_cities().await;
        *memo = info.last_updated.map(|stamp| (stamp, fresh.clone()));
        fresh
    }

    /// Filtered/sorted view in the public response shape.
    pub async fn query(&self, query: &CityQuery) -> CityListResponse {
        CityListResponse::from_cities(apply_query(&self.cities().await, query))
    }
}
