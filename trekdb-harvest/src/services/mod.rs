//! Pipeline services
//!
//! Deduplication, enrichment, caching and the harvest run that ties them
//! together. The HTTP layer in `api` only reads what these produce.

pub mod cache_writer;
pub mod cast_table;
pub mod character_deduplicator;
pub mod enrichment;
pub mod enrichment_cache;
pub mod harvester;
pub mod image_cache;
pub mod image_proxy;

pub use cache_writer::{read_json_or_default, write_json_atomic, CacheLayout};
pub use cast_table::{CastEntry, CastTable, MatchRule};
pub use character_deduplicator::{resolve_duplicates, CharacterDeduplicator, DedupReport};
pub use enrichment::{CharacterQuery, EnrichmentService};
pub use enrichment_cache::EnrichmentCache;
pub use harvester::{HarvestSummary, Harvester};
pub use image_cache::ImageCache;
pub use image_proxy::{
    FallbackCategory, FetchedImage, HttpImageFetcher, ImageFetcher, ImageProxy, ProxyOutcome,
};
