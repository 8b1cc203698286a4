pub mod cache;
pub mod currency;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod local_store;
pub mod processor;
pub mod serve;
pub mod sources;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use cache::CacheStore;
pub use error::{PipelineError, Result};
pub use fetch::{LocalSource, RemoteSource, RowSource};
pub use listing::{classify_room_type, parse_price, RoomCategory, ValidListing};
pub use local_store::LocalStore;
pub use processor::{debug_city, Processor};
pub use stats::aggregate;
pub use types::{
    CacheDocument, CacheInfo, CityStats, CsvMetadata, PriceBreakdown, PullSummary,
    RawListingRecord, SourceDescriptor, StoreStatus,
};

/// Initialize logging for the library
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}
