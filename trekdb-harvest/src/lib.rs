//! trekdb-harvest library interface
//!
//! Harvests Star Trek characters and series from STAPI, enriches them from
//! Memory Alpha, resolves duplicate characters and serves the results.

pub mod api;
pub mod clients;
pub mod error;
pub mod image_urls;
pub mod names;
pub mod services;
pub mod utils;
pub mod validators;

pub use crate::error::{ApiError, ApiResult, HarvestError, HarvestResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use trekdb_common::models::{CastMember, CharacterRecord, SeriesRecord};

use crate::clients::WikiLookup;
use crate::services::{
    read_json_or_default, CacheLayout, EnrichmentService, ImageFetcher, ImageProxy,
};
use crate::utils::{RequestQueue, RetryPolicy};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub characters: Arc<Vec<CharacterRecord>>,
    pub series: Arc<Vec<SeriesRecord>>,
    /// Cast lists keyed by series slug
    pub casts: Arc<BTreeMap<String, Vec<CastMember>>>,
    pub enrichment: Arc<EnrichmentService>,
    pub image_proxy: ImageProxy,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build state around in-memory data
    ///
    /// The enrichment service looks characters up in the same list.
    pub fn new(
        characters: Vec<CharacterRecord>,
        series: Vec<SeriesRecord>,
        casts: BTreeMap<String, Vec<CastMember>>,
        wiki: Arc<dyn WikiLookup>,
        fetcher: Arc<dyn ImageFetcher>,
        queue: RequestQueue,
        retry: RetryPolicy,
    ) -> Self {
        let characters = Arc::new(characters);
        let enrichment = EnrichmentService::new(characters.clone(), wiki, queue, retry);
        Self::with_enrichment(characters, series, casts, Arc::new(enrichment), fetcher)
    }

    /// Load the harvested caches under `layout`
    ///
    /// Missing files give empty lists, so a server started before the first
    /// harvest still answers.
    pub fn load(
        layout: &CacheLayout,
        wiki: Arc<dyn WikiLookup>,
        fetcher: Arc<dyn ImageFetcher>,
        queue: RequestQueue,
        retry: RetryPolicy,
    ) -> Self {
        let characters: Vec<CharacterRecord> = read_json_or_default(&layout.characters_path());
        let series: Vec<SeriesRecord> = read_json_or_default(&layout.series_path());
        let casts: BTreeMap<String, Vec<CastMember>> = read_json_or_default(&layout.cast_path());

        tracing::info!(
            characters = characters.len(),
            series = series.len(),
            casts = casts.len(),
            root = %layout.root().display(),
            "Loaded harvested data"
        );

        let characters = Arc::new(characters);
        let enrichment = EnrichmentService::new(characters.clone(), wiki, queue, retry)
            .with_cache_file(layout.enrichment_cache_path());
        Self::with_enrichment(characters, series, casts, Arc::new(enrichment), fetcher)
    }

    fn with_enrichment(
        characters: Arc<Vec<CharacterRecord>>,
        series: Vec<SeriesRecord>,
        casts: BTreeMap<String, Vec<CastMember>>,
        enrichment: Arc<EnrichmentService>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            characters,
            series: Arc::new(series),
            casts: Arc::new(casts),
            enrichment,
            image_proxy: ImageProxy::new(fetcher),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Every route answers CORS preflights and carries permissive CORS headers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::character_routes())
        .merge(api::series_routes())
        .merge(api::image_proxy_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
