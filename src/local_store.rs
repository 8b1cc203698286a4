//! Local raw-data store: downloads each source's gzipped CSV, persists
//! the decompressed bytes plus a metadata sidecar, and serves them back
//! to the local processing mode.

use crate::cache::CacheStore;
use crate::error::{PipelineError, Result};
use crate::types::{CsvMetadata, PullResult, PullSummary, SourceDescriptor, StoreStatus};
use flate2::read::GzDecoder;
use reqwest::Client;
use std::collections::HashSet;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{error, info, warn};
use url::Url;

const DEFAULT_DATA_DIR: &str = "data/csvs";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
/// Throttle between downloads so the upstream host is not hammered.
const DOWNLOAD_DELAY: Duration = Duration::from_millis(500);

pub fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

pub struct LocalStore {
    dir: PathBuf,
    client: Client,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent("city-price-collector/0.1.0")
            .build()?;

        Ok(Self {
            dir: dir.into(),
            client,
        })
    }

    /// Store location from `DATA_DIR`, defaulting to `data/csvs`.
    pub fn from_env() -> Result<Self> {
        let dir = std::env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(dir)
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn csv_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.csv"))
    }

    pub fn metadata_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}_metadata.json"))
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Download one source, decompress it, and persist the CSV plus its
    /// metadata sidecar.
    pub async fn download_and_save(&self, source: &SourceDescriptor) -> Result<CsvMetadata> {
        info!("downloading {}...", source.city_name);

        let url = Url::parse(&source.url)?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let decompressed = gunzip(&body)?;

        let filename = format!("{}.csv", source.id);
        fs::write(self.csv_path(&source.id), &decompressed).await?;

        let metadata = CsvMetadata {
            id: source.id.clone(),
            city_name: source.city_name.clone(),
            country: source.country.clone(),
            region: source.region.clone(),
            original_url: source.url.clone(),
            scraped_date: source.scraped_date.clone(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            filename,
            file_size: decompressed.len() as u64,
        };
        fs::write(
            self.metadata_path(&source.id),
            serde_json::to_string_pretty(&metadata)?,
        )
        .await?;

        info!(
            "saved {} ({} KB)",
            source.city_name,
            decompressed.len() / 1024
        );
        Ok(metadata)
    }

    async fn run_pull(
        &self,
        targets: &[SourceDescriptor],
        total_sources: usize,
        total_cached: usize,
        summary_file: &str,
    ) -> Result<PullSummary> {
        self.ensure_dir().await?;

        let mut results = Vec::with_capacity(targets.len());
        let mut successful = 0;
        let mut failed = 0;

        for (index, source) in targets.iter().enumerate() {
            info!(
                "[{}/{}] processing {}...",
                index + 1,
                targets.len(),
                source.city_name
            );

            match self.download_and_save(source).await {
                Ok(metadata) => {
                    successful += 1;
                    results.push(PullResult {
                        id: source.id.clone(),
                        city_name: source.city_name.clone(),
                        success: true,
                        file_size: Some(metadata.file_size),
                        error: None,
                    });
                }
                Err(e) => {
                    error!("failed to download {}: {e}", source.city_name);
                    failed += 1;
                    results.push(PullResult {
                        id: source.id.clone(),
                        city_name: source.city_name.clone(),
                        success: false,
                        file_size: None,
                        error: Some(e.to_string()),
                    });
                }
            }

            if index + 1 < targets.len() {
                sleep(DOWNLOAD_DELAY).await;
            }
        }

        let summary = PullSummary {
            total_sources,
            total_cached,
            missing_count: targets.len(),
            successful,
            failed,
            skipped: total_sources - targets.len(),
            results,
            completed_at: chrono::Utc::now().to_rfc3339(),
        };

        let summary_path = self.dir.join(summary_file);
        fs::write(&summary_path, serde_json::to_string_pretty(&summary)?).await?;

        info!(
            "pull completed: {} successful, {} failed (summary: {})",
            summary.successful,
            summary.failed,
            summary_path.display()
        );
        Ok(summary)
    }

    /// Hard pull: download every configured source, continuing past
    /// individual failures.
    pub async fn pull_all(&self, sources: &[SourceDescriptor]) -> Result<PullSummary> {
        info!("starting hard pull of {} destinations", sources.len());
        self.run_pull(sources, sources.len(), 0, "download_summary.json")
            .await
    }

    /// Targeted pull of sources whose id is absent from the cache.
    ///
    /// The cache is trusted as ground truth: an id present there is
    /// assumed already downloaded and is skipped even if its raw CSV was
    /// removed. Clear the cache (or run a hard pull) when the two stores
    /// have been cleared independently.
    pub async fn pull_missing(
        &self,
        sources: &[SourceDescriptor],
        cache: &CacheStore,
    ) -> Result<PullSummary> {
        let cached_ids: HashSet<String> = cache
            .cached_cities()
            .await
            .into_iter()
            .map(|city| city.id)
            .collect();

        let missing: Vec<SourceDescriptor> = sources
            .iter()
            .filter(|s| !cached_ids.contains(&s.id))
            .cloned()
            .collect();

        info!(
            "cache status: {} sources, {} cached, {} missing",
            sources.len(),
            cached_ids.len(),
            missing.len()
        );

        if missing.is_empty() {
            info!("all cities are already in cache, no downloads needed");
            return Ok(PullSummary {
                total_sources: sources.len(),
                total_cached: cached_ids.len(),
                missing_count: 0,
                successful: 0,
                failed: 0,
                skipped: sources.len(),
                results: Vec::new(),
                completed_at: chrono::Utc::now().to_rfc3339(),
            });
        }

        self.run_pull(
            &missing,
            sources.len(),
            cached_ids.len(),
            "pull_missing_summary.json",
        )
        .await
    }

    /// Listing of the raw files currently on disk.
    pub async fn status(&self) -> Result<StoreStatus> {
        self.ensure_dir().await?;

        let mut csv_files = Vec::new();
        let mut metadata_files = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".csv") {
                csv_files.push(name);
            } else if name.ends_with("_metadata.json") {
                metadata_files.push(name);
            }
        }
        csv_files.sort();
        metadata_files.sort();

        Ok(StoreStatus {
            total_csvs: csv_files.len(),
            csv_files,
            metadata_files,
            directory: self.dir.display().to_string(),
        })
    }

    /// Delete every file in the store directory, including pull
    /// summaries. Returns the number of files removed.
    pub async fn clear(&self) -> Result<usize> {
        self.ensure_dir().await?;

        let mut cleared = 0;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                cleared += 1;
            }
        }

        info!("cleared {cleared} files from local storage");
        Ok(cleared)
    }

    /// Raw decompressed CSV for one source. Missing files are the
    /// per-source `LocalFileMissing` error.
    pub async fn read_csv(&self, id: &str) -> Result<String> {
        let path = self.csv_path(id);
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PipelineError::LocalFileMissing(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Metadata sidecar for one source, if present and well-formed.
    pub async fn read_metadata(&self, id: &str) -> Option<CsvMetadata> {
        let text = fs::read_to_string(self.metadata_path(id)).await.ok()?;
        match serde_json::from_str(&text) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("unreadable metadata for {id}: {e}");
                None
            }
        }
    }
}
