//! End-to-end processing orchestrator.
//!
//! One `Processor` drives both pipeline variants; the raw-row origin is
//! behind the `RowSource` trait. Sources are processed strictly
//! sequentially with a throttle between them, and the whole working
//! list is persisted after every successful city so a crash loses at
//! most the in-flight one.

use crate::cache::CacheStore;
use crate::error::{PipelineError, Result};
use crate::fetch::{parse_rows, RowSource};
use crate::listing::{classify_room_type, outlier_ceiling, parse_price, to_valid, RoomCategory, ValidListing};
use crate::local_store::LocalStore;
use crate::sources::find_source;
use crate::stats::{aggregate, round2};
use crate::types::{CityStats, SourceDescriptor};
use crate::currency::convert_to_usd;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{error, info};

pub struct Processor<S: RowSource> {
    rows: S,
    cache: CacheStore,
}

impl<S: RowSource> Processor<S> {
    pub fn new(rows: S, cache: CacheStore) -> Self {
        Self { rows, cache }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Process the configured sources and return the merged city list.
    ///
    /// `force_refresh` clears the cache and reprocesses everything.
    /// Otherwise a non-empty cache short-circuits the run, and an empty
    /// one triggers a missing-only pass seeded from the cache contents.
    /// Per-city failures are logged and skipped; the batch continues.
    pub async fn process_all_sources(
        &self,
        sources: &[SourceDescriptor],
        force_refresh: bool,
    ) -> Result<Vec<CityStats>> {
        info!("processing {} sources", sources.len());

        if force_refresh {
            info!("force refresh requested, clearing cache");
            self.cache.clear().await?;
        } else {
            let cached = self.cache.cached_cities().await;
            if !cached.is_empty() {
                info!("returning {} cached cities", cached.len());
                return Ok(cached);
            }
        }

        self.rows.ensure_available().await?;

        let mut all_cities = if force_refresh {
            Vec::new()
        } else {
            self.cache.cached_cities().await
        };
        let to_process: Vec<&SourceDescriptor> = if force_refresh {
            sources.iter().collect()
        } else {
            let cached_ids: Vec<&str> = all_cities.iter().map(|c| c.id.as_str()).collect();
            sources
                .iter()
                .filter(|s| !cached_ids.contains(&s.id.as_str()))
                .collect()
        };

        info!("need to process {} cities", to_process.len());

        let mut processed = 0;
        for (index, source) in to_process.iter().enumerate() {
            info!(
                "processing {} ({}/{})",
                source.city_name,
                index + 1,
                to_process.len()
            );

            match self.process_single_source(source).await {
                Ok(stats) => {
                    info!(
                        "processed {}: {} listings, avg ${}",
                        source.city_name, stats.total_listings, stats.average_price
                    );
                    match all_cities.iter_mut().find(|c| c.id == stats.id) {
                        Some(existing) => *existing = stats,
                        None => all_cities.push(stats),
                    }
                    // Persist after every city so finished work survives
                    // a mid-batch crash.
                    self.cache.write(&all_cities).await?;
                    processed += 1;
                }
                Err(e) => {
                    error!("failed to process {}, skipping: {e}", source.city_name);
                }
            }

            if index + 1 < to_process.len() {
                sleep(self.rows.throttle()).await;
            }
        }

        info!("processed {processed} cities");
        Ok(all_cities)
    }

    /// Per-city path: cache hit first, else fetch, filter, and
    /// aggregate. Errors propagate here; batch mode converts them into
    /// skips, direct callers see them.
    pub async fn process_single_source(&self, source: &SourceDescriptor) -> Result<CityStats> {
        self.cache
            .city_or_compute(&source.id, || self.compute_city(source))
            .await
    }

    async fn compute_city(&self, source: &SourceDescriptor) -> Result<CityStats> {
        let rows = self.rows.fetch_rows(source).await?;
        let currency = source.currency_code();

        let valid: Vec<ValidListing> = rows.iter().filter_map(|r| to_valid(r, currency)).collect();

        let mut stats = aggregate(&valid, source)?;
        stats.local_file_info = self.rows.local_file_info(&source.id).await;
        Ok(stats)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub count: usize,
    pub average_usd: f64,
}

/// Detailed single-city analysis over the local CSV, for diagnosing
/// suspicious averages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDebugReport {
    pub source: SourceDescriptor,
    pub currency: String,
    pub outlier_ceiling_local: f64,
    pub total_records: usize,
    pub invalid_prices: usize,
    pub outliers: usize,
    pub valid_listings: usize,
    pub local: Option<PriceSummary>,
    pub usd: Option<PriceSummary>,
    pub entire_place: CategoryTally,
    pub private_room: CategoryTally,
    pub shared_room: CategoryTally,
    pub other: CategoryTally,
}

fn summarize(prices: &mut [f64]) -> PriceSummary {
    prices.sort_by(|a, b| a.total_cmp(b));
    PriceSummary {
        min: prices[0],
        max: prices[prices.len() - 1],
        median: prices[prices.len() / 2],
        average: prices.iter().sum::<f64>() / prices.len() as f64,
    }
}

fn tally(valid: &[(f64, RoomCategory)], category: RoomCategory, currency: &str) -> Result<CategoryTally> {
    let prices: Vec<f64> = valid
        .iter()
        .filter(|(_, c)| *c == category)
        .map(|(p, _)| *p)
        .collect();
    if prices.is_empty() {
        return Ok(CategoryTally::default());
    }
    let local_avg = prices.iter().sum::<f64>() / prices.len() as f64;
    Ok(CategoryTally {
        count: prices.len(),
        average_usd: round2(convert_to_usd(round2(local_avg), currency)?),
    })
}

/// Analyze one city's local CSV record by record.
///
/// Unlike batch processing, a missing local file is fatal here: the
/// caller asked for this specific city.
pub async fn debug_city(store: &LocalStore, id: &str) -> Result<CityDebugReport> {
    let source = find_source(id).ok_or_else(|| PipelineError::UnknownSource(id.to_string()))?;
    info!("debugging city: {id}");

    let text = store.read_csv(id).await?;
    let rows = parse_rows(text.as_bytes())?;

    let currency = source.currency_code().to_string();
    let ceiling = outlier_ceiling(&currency);

    let mut invalid_prices = 0;
    let mut outliers = 0;
    let mut valid: Vec<(f64, RoomCategory)> = Vec::new();

    for row in &rows {
        match parse_price(&row.price) {
            None => invalid_prices += 1,
            Some(price) if price <= 0.0 => invalid_prices += 1,
            Some(price) if price >= ceiling => outliers += 1,
            Some(price) => valid.push((price, classify_room_type(&row.room_type))),
        }
    }

    let (local, usd) = if valid.is_empty() {
        (None, None)
    } else {
        let mut local_prices: Vec<f64> = valid.iter().map(|(p, _)| *p).collect();
        let local = summarize(&mut local_prices);
        let usd = PriceSummary {
            min: convert_to_usd(local.min, &currency)?,
            max: convert_to_usd(local.max, &currency)?,
            median: convert_to_usd(local.median, &currency)?,
            average: convert_to_usd(local.average, &currency)?,
        };
        (Some(local), Some(usd))
    };

    Ok(CityDebugReport {
        currency: currency.clone(),
        outlier_ceiling_local: ceiling,
        total_records: rows.len(),
        invalid_prices,
        outliers,
        valid_listings: valid.len(),
        local,
        usd,
        entire_place: tally(&valid, RoomCategory::EntirePlace, &currency)?,
        private_room: tally(&valid, RoomCategory::PrivateRoom, &currency)?,
        shared_room: tally(&valid, RoomCategory::SharedRoom, &currency)?,
        other: tally(&valid, RoomCategory::Other, &currency)?,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawListingRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn source(id: &str, currency: Option<&str>) -> SourceDescriptor {
        SourceDescriptor {
            id: id.to_string(),
            city_name: id.to_string(),
            country: "United States".to_string(),
            region: "North America".to_string(),
            url: format!("https://example.com/{id}/listings.csv.gz"),
            scraped_date: "2024-09-05".to_string(),
            currency: currency.map(|c| c.to_string()),
        }
    }

    fn record(price: &str, room_type: &str) -> RawListingRecord {
        RawListingRecord {
            price: price.to_string(),
            room_type: room_type.to_string(),
        }
    }

    /// Returns the same rows for every source and counts fetches.
    struct StubRows {
        rows: Vec<RawListingRecord>,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl StubRows {
        fn with_rows(rows: Vec<RawListingRecord>) -> Self {
            Self {
                rows,
                fetches: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                rows: Vec::new(),
                fetches: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RowSource for &StubRows {
        async fn fetch_rows(&self, source: &SourceDescriptor) -> Result<Vec<RawListingRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::LocalFileMissing(
                    format!("{}.csv", source.id).into(),
                ));
            }
            Ok(self.rows.clone())
        }

        fn throttle(&self) -> Duration {
            Duration::ZERO
        }
    }

    fn temp_cache(dir: &tempfile::TempDir) -> CacheStore {
        CacheStore::new(dir.path().join("cache.json"))
    }

    #[tokio::test]
    async fn processes_and_persists_each_city() {
        let dir = tempdir().unwrap();
        let rows = StubRows::with_rows(vec![
            record("€100", "Entire home/apt"),
            record("€0", "Private room"),
        ]);
        let processor = Processor::new(&rows, temp_cache(&dir));
        let sources = vec![source("a", Some("EUR"))];

        let cities = processor.process_all_sources(&sources, false).await.unwrap();

        assert_eq!(cities.len(), 1);
        let city = &cities[0];
        assert_eq!(city.total_listings, 1);
        assert_eq!(city.local_average_price, Some(100.0));
        assert_eq!(city.average_price, 109.0);
        assert_eq!(city.price_breakdown.entire_place, 109.0);
        assert_eq!(city.price_breakdown.private_room, 0.0);

        // Progress was made durable.
        let doc = processor.cache().read().await.unwrap();
        assert_eq!(doc.cities_count, 1);
        assert_eq!(doc.cities[0].id, "a");
    }

    #[tokio::test]
    async fn second_run_hits_cache_without_fetching() {
        let dir = tempdir().unwrap();
        let rows = StubRows::with_rows(vec![record("$80.00", "Private room")]);
        let processor = Processor::new(&rows, temp_cache(&dir));
        let sources = vec![source("a", None)];

        let first = processor.process_all_sources(&sources, false).await.unwrap();
        assert_eq!(rows.fetch_count(), 1);

        let second = processor.process_all_sources(&sources, false).await.unwrap();
        assert_eq!(rows.fetch_count(), 1, "cache hit must not fetch");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn force_refresh_clears_and_reprocesses() {
        let dir = tempdir().unwrap();
        let rows = StubRows::with_rows(vec![record("$80.00", "Private room")]);
        let processor = Processor::new(&rows, temp_cache(&dir));
        let sources = vec![source("a", None)];

        processor.process_all_sources(&sources, false).await.unwrap();
        let again = processor.process_all_sources(&sources, true).await.unwrap();

        assert_eq!(rows.fetch_count(), 2);
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn failing_fetch_skips_city_and_leaves_no_cache() {
        let dir = tempdir().unwrap();
        let rows = StubRows::failing();
        let processor = Processor::new(&rows, temp_cache(&dir));
        let sources = vec![source("a", None), source("b", None)];

        let cities = processor.process_all_sources(&sources, false).await.unwrap();

        assert!(cities.is_empty());
        assert_eq!(rows.fetch_count(), 2, "batch continues past failures");
        assert!(processor.cache().read().await.is_none(), "no cache file created");
    }

    #[tokio::test]
    async fn all_invalid_rows_is_a_skip_not_an_abort() {
        let dir = tempdir().unwrap();
        let rows = StubRows::with_rows(vec![record("0", "Private room"), record("", "")]);
        let processor = Processor::new(&rows, temp_cache(&dir));
        let sources = vec![source("a", None)];

        let cities = processor.process_all_sources(&sources, false).await.unwrap();
        assert!(cities.is_empty());
    }

    #[tokio::test]
    async fn missing_only_pass_keeps_prior_cities() {
        let dir = tempdir().unwrap();
        let cache = temp_cache(&dir);

        // Seed the cache with one finished city, then empty it of "b" by
        // writing a single-city list, simulating a crashed batch.
        let rows_a = StubRows::with_rows(vec![record("$50.00", "Shared room")]);
        let processor_a = Processor::new(&rows_a, cache.clone());
        processor_a
            .process_all_sources(&[source("a", None)], false)
            .await
            .unwrap();

        // A later run over a wider source list short-circuits on the
        // non-empty cache (partial-progress semantics).
        let rows_b = StubRows::with_rows(vec![record("$60.00", "Private room")]);
        let processor_b = Processor::new(&rows_b, cache.clone());
        let cities = processor_b
            .process_all_sources(&[source("a", None), source("b", None)], false)
            .await
            .unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(rows_b.fetch_count(), 0);

        // Forcing picks up both, replacing "a".
        let cities = processor_b
            .process_all_sources(&[source("a", None), source("b", None)], true)
            .await
            .unwrap();
        assert_eq!(cities.len(), 2);
        assert!(cities.iter().all(|c| c.average_price == 60.0));
    }

    #[tokio::test]
    async fn single_source_error_propagates_when_direct() {
        let dir = tempdir().unwrap();
        let rows = StubRows::failing();
        let processor = Processor::new(&rows, temp_cache(&dir));

        let err = processor
            .process_single_source(&source("a", None))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::LocalFileMissing(_)));
    }

    #[tokio::test]
    async fn debug_report_tallies_filter_decisions() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();
        // "budapest" is a configured source with HUF pricing.
        tokio::fs::write(
            store.csv_path("budapest"),
            "price,room_type\n\
             30000,Entire home/apt\n\
             45000,Private room\n\
             0,Private room\n\
             N/A,Shared room\n\
             9000000,Entire home/apt\n",
        )
        .await
        .unwrap();

        let report = debug_city(&store, "budapest").await.unwrap();

        assert_eq!(report.currency, "HUF");
        assert_eq!(report.total_records, 5);
        assert_eq!(report.valid_listings, 2);
        assert_eq!(report.invalid_prices, 2);
        assert_eq!(report.outliers, 1);
        assert_eq!(report.entire_place.count, 1);
        assert_eq!(report.private_room.count, 1);
        assert_eq!(report.shared_room.count, 0);

        let local = report.local.unwrap();
        assert_eq!(local.min, 30000.0);
        assert_eq!(local.max, 45000.0);
        let usd = report.usd.unwrap();
        assert!((usd.min - 30000.0 * 0.0026).abs() < 1e-9);
    }

    #[tokio::test]
    async fn debug_unknown_city_fails() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        let err = debug_city(&store, "atlantis").await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownSource(_)));
    }

    #[tokio::test]
    async fn debug_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        let err = debug_city(&store, "budapest").await.unwrap_err();
        assert!(matches!(err, PipelineError::LocalFileMissing(_)));
    }
}
