//! Raw-row sources: where listing rows come from.
//!
//! The orchestrator is parameterized over `RowSource` so the remote
//! (download + gunzip) and local (previously pulled CSV) pipelines share
//! one control flow.

use crate::error::{PipelineError, Result};
use crate::local_store::{gunzip, LocalStore};
use crate::types::{LocalFileInfo, RawListingRecord, SourceDescriptor};
use async_trait::async_trait;
use reqwest::Client;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Parse listing rows out of a decompressed CSV export.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<RawListingRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawListingRecord>() {
        rows.push(result?);
    }
    Ok(rows)
}

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Obtain the raw listing rows for one source.
    async fn fetch_rows(&self, source: &SourceDescriptor) -> Result<Vec<RawListingRecord>>;

    /// Batch precondition, checked once before processing begins.
    async fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// Delay inserted between sources during a batch.
    fn throttle(&self) -> Duration;

    /// Provenance of the underlying file, when the rows came from disk.
    async fn local_file_info(&self, _id: &str) -> Option<LocalFileInfo> {
        None
    }
}

/// Streams each source's gzipped CSV from its configured URL.
pub struct RemoteSource {
    client: Client,
}

impl RemoteSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("city-price-collector/0.1.0")
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RowSource for RemoteSource {
    async fn fetch_rows(&self, source: &SourceDescriptor) -> Result<Vec<RawListingRecord>> {
        let url = Url::parse(&source.url)?;
        debug!("fetching {} from {url}", source.city_name);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let decompressed = gunzip(&body)?;

        let rows = parse_rows(decompressed.as_slice())?;
        info!("fetched {} rows for {}", rows.len(), source.city_name);
        Ok(rows)
    }

    fn throttle(&self) -> Duration {
        Duration::from_millis(500)
    }
}

/// Reads previously pulled CSVs from the local file store.
pub struct LocalSource {
    store: LocalStore,
}

impl LocalSource {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }
}

#[async_trait]
impl RowSource for LocalSource {
    async fn fetch_rows(&self, source: &SourceDescriptor) -> Result<Vec<RawListingRecord>> {
        let text = self.store.read_csv(&source.id).await?;
        debug!(
            "reading local CSV for {} ({} KB)",
            source.city_name,
            text.len() / 1024
        );
        parse_rows(text.as_bytes())
    }

    /// Local mode has no remote fallback: an empty store with nothing
    /// cached means the whole run cannot proceed.
    async fn ensure_available(&self) -> Result<()> {
        let status = self.store.status().await?;
        info!("found {} local CSV files", status.total_csvs);
        if status.total_csvs == 0 {
            return Err(PipelineError::NoLocalDataAvailable);
        }
        Ok(())
    }

    fn throttle(&self) -> Duration {
        Duration::from_millis(50)
    }

    async fn local_file_info(&self, id: &str) -> Option<LocalFileInfo> {
        self.store.read_metadata(id).await.map(|m| LocalFileInfo {
            downloaded_at: m.downloaded_at,
            file_size: m.file_size,
            filename: m.filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::fs;

    #[test]
    fn parses_rows_ignoring_extra_columns() {
        let csv_text = "\
id,name,price,room_type,minimum_nights
1,Cozy flat,\"$1,250.00\",Entire home/apt,2
2,Spare room,$45.00,Private room,1
3,No price,,Shared room,1
";
        let rows = parse_rows(csv_text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].price, "$1,250.00");
        assert_eq!(rows[0].room_type, "Entire home/apt");
        assert_eq!(rows[2].price, "");
    }

    #[tokio::test]
    async fn local_source_reads_pulled_csv() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();
        fs::write(
            store.csv_path("austin"),
            "price,room_type\n$70.00,Private room\n",
        )
        .await
        .unwrap();

        let local = LocalSource::new(store);
        let source = SourceDescriptor {
            id: "austin".to_string(),
            city_name: "Austin".to_string(),
            country: "United States".to_string(),
            region: "North America".to_string(),
            url: "https://example.com/listings.csv.gz".to_string(),
            scraped_date: "2024-09-12".to_string(),
            currency: None,
        };

        let rows = local.fetch_rows(&source).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, "$70.00");
        assert!(local.ensure_available().await.is_ok());
    }

    #[tokio::test]
    async fn empty_local_store_fails_precondition() {
        let dir = tempdir().unwrap();
        let local = LocalSource::new(LocalStore::new(dir.path().join("csvs")).unwrap());

        let err = local.ensure_available().await.unwrap_err();
        assert!(matches!(err, PipelineError::NoLocalDataAvailable));
    }
}
