//! JSON cache of computed city statistics.
//!
//! The cache document is the single source of truth for what has already
//! been computed. Reads fail soft: a missing or structurally invalid
//! file is reported as "no cache" so the pipeline rebuilds it. Writes
//! replace the whole document through a temp-file-then-rename so a
//! concurrent reader never observes a partial document.

use crate::error::Result;
use crate::types::{CacheDocument, CacheInfo, CityStats};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const CACHE_VERSION: &str = "1.0";
const DEFAULT_CACHE_FILE: &str = "data/cities-cache.json";

#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache location from `CACHE_FILE`, defaulting to
    /// `data/cities-cache.json`.
    pub fn from_env() -> Self {
        let path = std::env::var("CACHE_FILE").unwrap_or_else(|_| DEFAULT_CACHE_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache document. `None` when the file is missing or the
    /// contents fail structural validation; neither case is an error.
    pub async fn read(&self) -> Option<CacheDocument> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no cache file found, will create new one");
                return None;
            }
            Err(e) => {
                warn!("error reading cache: {e}");
                return None;
            }
        };

        match serde_json::from_str::<CacheDocument>(&raw) {
            Ok(doc) if doc.version.is_empty() || doc.last_updated.is_empty() => {
                warn!("invalid cache format, will rebuild");
                None
            }
            Ok(doc) => {
                info!(
                    "cache found with {} cities (last updated: {})",
                    doc.cities.len(),
                    doc.last_updated
                );
                Some(doc)
            }
            Err(e) => {
                warn!("invalid cache format, will rebuild: {e}");
                None
            }
        }
    }

    /// Replace the persisted document with a fresh one built from
    /// `cities`. Version, timestamp, and count are recomputed here.
    pub async fn write(&self, cities: &[CityStats]) -> Result<()> {
        let doc = CacheDocument {
            version: CACHE_VERSION.to_string(),
            last_updated: chrono::Utc::now().to_rfc3339(),
            cities_count: cities.len(),
            cities: cities.to_vec(),
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        // Write-new-then-rename keeps concurrent readers on the old
        // document until the new one is complete.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&doc)?).await?;
        fs::rename(&tmp, &self.path).await?;

        info!("cache updated with {} cities", cities.len());
        Ok(())
    }

    /// All cached cities, empty when the cache is absent.
    pub async fn cached_cities(&self) -> Vec<CityStats> {
        self.read().await.map(|doc| doc.cities).unwrap_or_default()
    }

    /// Linear scan of the cached list for one city.
    pub async fn get_city(&self, id: &str) -> Option<CityStats> {
        self.read()
            .await?
            .cities
            .into_iter()
            .find(|city| city.id == id)
    }

    /// Memoize-with-fallback: return the cached city when present,
    /// otherwise run `compute`. Used per-city by the orchestrator so a
    /// crashed batch resumes without refetching finished cities.
    pub async fn city_or_compute<F, Fut>(&self, id: &str, compute: F) -> Result<CityStats>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CityStats>>,
    {
        if let Some(hit) = self.get_city(id).await {
            debug!("using cached data for {id}");
            return Ok(hit);
        }
        compute().await
    }

    /// Delete the persisted document. Clearing an absent cache is fine.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn info(&self) -> CacheInfo {
        match self.read().await {
            Some(doc) => CacheInfo {
                exists: true,
                cities_count: doc.cities.len(),
                last_updated: Some(doc.last_updated),
                version: Some(doc.version),
            },
            None => CacheInfo {
                exists: false,
                cities_count: 0,
                last_updated: None,
                version: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataSourceRef, PriceBreakdown};
    use tempfile::tempdir;

    fn city(id: &str, average_price: f64) -> CityStats {
        CityStats {
            id: id.to_string(),
            city_name: id.to_string(),
            country: "United States".to_string(),
            region: "North America".to_string(),
            currency: "USD".to_string(),
            local_average_price: Some(average_price),
            average_price,
            total_listings: 10,
            price_breakdown: PriceBreakdown::default(),
            last_updated: "2024-09-05T00:00:00+00:00".to_string(),
            data_source: DataSourceRef {
                url: "https://example.com/listings.csv.gz".to_string(),
                scraped_date: "2024-09-05".to_string(),
            },
            local_file_info: None,
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        let cities = vec![city("austin", 150.0), city("vienna", 92.5)];

        store.write(&cities).await.unwrap();
        let doc = store.read().await.unwrap();

        assert_eq!(doc.cities, cities);
        assert_eq!(doc.cities_count, doc.cities.len());
        assert_eq!(doc.version, CACHE_VERSION);
    }

    #[tokio::test]
    async fn missing_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nope.json"));

        assert!(store.read().await.is_none());
        assert!(store.cached_cities().await.is_empty());
        let info = store.info().await;
        assert!(!info.exists);
        assert_eq!(info.cities_count, 0);
    }

    #[tokio::test]
    async fn invalid_document_reads_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        tokio::fs::write(&path, r#"{"cities": "not an array"}"#)
            .await
            .unwrap();

        let store = CacheStore::new(&path);
        assert!(store.read().await.is_none());
    }

    #[tokio::test]
    async fn get_city_scans_by_id() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        store
            .write(&[city("austin", 150.0), city("vienna", 92.5)])
            .await
            .unwrap();

        assert_eq!(store.get_city("vienna").await.unwrap().average_price, 92.5);
        assert!(store.get_city("atlantis").await.is_none());
    }

    #[tokio::test]
    async fn city_or_compute_prefers_cache() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        store.write(&[city("austin", 150.0)]).await.unwrap();

        let hit = store
            .city_or_compute("austin", || async { panic!("fallback must not run") })
            .await
            .unwrap();
        assert_eq!(hit.average_price, 150.0);

        let computed = store
            .city_or_compute("vienna", || async { Ok(city("vienna", 92.5)) })
            .await
            .unwrap();
        assert_eq!(computed.id, "vienna");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));

        store.clear().await.unwrap();
        store.write(&[city("austin", 150.0)]).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.read().await.is_none());
    }

    #[tokio::test]
    async fn info_reports_version_and_timestamp() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        store.write(&[city("austin", 150.0)]).await.unwrap();

        let info = store.info().await;
        assert!(info.exists);
        assert_eq!(info.cities_count, 1);
        assert_eq!(info.version.as_deref(), Some(CACHE_VERSION));
        assert!(info.last_updated.is_some());
    }
}
