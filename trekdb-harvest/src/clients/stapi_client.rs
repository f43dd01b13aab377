//! STAPI Client
//!
//! Pages through the Star Trek API search endpoints and collects every
//! character and series. Results feed an on-disk cache, not a live request,
//! so a failing page ends the crawl with whatever was gathered so far.
//!
//! # Pagination Rules
//! - Fixed page size (100)
//! - `totalPages` is re-read from every response; the largest value seen wins
//! - At least `min_pages` pages are requested even when the first response
//!   reports fewer (the API has under-reported on the first call)
//! - Hard ceiling of `max_pages` requests regardless of what the API says
//! - Results are de-duplicated by `uid` in encounter order
//!
//! # API Reference
//! - Endpoints: `{base}/character/search`, `{base}/series/search`, `{base}/series?uid=`
//! - Documentation: https://stapi.co/api-documentation

use crate::error::{HarvestError, HarvestResult};
use crate::utils::{with_retries, RetryPolicy};
use governor::{Quota, RateLimiter};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info, warn};
use trekdb_common::models::{CharacterRecord, EpisodeRecord, SeasonRef, SeriesRecord};

/// Records per page request
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pages requested even if the API reports fewer
pub const MIN_PAGES: u32 = 2;

/// Safety ceiling on page requests per crawl
pub const MAX_PAGES: u32 = 500;

/// Default timeout for STAPI requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Politeness limit towards STAPI
const REQUESTS_PER_SECOND: u32 = 5;

/// Records that carry a source-assigned uid
trait HasUid {
    fn uid(&self) -> &str;
}

impl HasUid for CharacterRecord {
    fn uid(&self) -> &str {
        &self.uid
    }
}

impl HasUid for SeriesRecord {
    fn uid(&self) -> &str {
        &self.uid
    }
}

/// STAPI Client
pub struct StapiClient {
    /// HTTP client for API requests
    http_client: Client,
    /// REST base, e.g. `https://stapi.co/api/v1/rest`
    base_url: String,
    retry: RetryPolicy,
    page_size: u32,
    min_pages: u32,
    max_pages: u32,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl StapiClient {
    /// Create a client against `base_url`
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> HarvestResult<Self> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&trekdb_common::config::get_user_agent())
            .map_err(|e| HarvestError::Validation(format!("Invalid user agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(5))
            .default_headers(headers)
            .build()
            .map_err(|e| HarvestError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            page_size: DEFAULT_PAGE_SIZE,
            min_pages: MIN_PAGES,
            max_pages: MAX_PAGES,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Override page size and page bounds
    pub fn with_page_limits(mut self, page_size: u32, min_pages: u32, max_pages: u32) -> Self {
        self.page_size = page_size.max(1);
        self.min_pages = min_pages;
        self.max_pages = max_pages.max(1);
        self
    }

    /// Every character the API will give us
    pub async fn fetch_all_characters(&self) -> Vec<CharacterRecord> {
        self.fetch_all("character/search", "characters").await
    }

    /// Every series the API will give us (without episodes)
    pub async fn fetch_all_series(&self) -> Vec<SeriesRecord> {
        self.fetch_all("series/search", "series").await
    }

    /// Episodes of one series, ordered by season then episode number
    ///
    /// Returns an empty list if the series cannot be fetched.
    pub async fn fetch_series_episodes(&self, series_uid: &str) -> Vec<EpisodeRecord> {
        let url = format!("{}/series", self.base_url);
        let operation = format!("stapi series {}", series_uid);
        let query = [("uid", series_uid.to_string())];

        let result = with_retries(&operation, self.retry, HarvestError::is_transient, || {
            self.get_json::<SeriesFullResponse>(&url, &query)
        })
        .await;

        match result {
            Ok(response) => {
                let mut episodes: Vec<EpisodeRecord> = response
                    .series
                    .map(|s| s.episodes)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(StapiEpisode::into_record)
                    .collect();
                episodes.sort_by_key(EpisodeRecord::sort_key);
                debug!(series_uid = %series_uid, episodes = episodes.len(), "Fetched series episodes");
                episodes
            }
            Err(e) => {
                warn!(series_uid = %series_uid, error = %e, "Failed to fetch series episodes");
                Vec::new()
            }
        }
    }

    /// Crawl one search resource
    async fn fetch_all<T>(&self, resource: &str, results_key: &str) -> Vec<T>
    where
        T: DeserializeOwned + HasUid,
    {
        let url = format!("{}/{}", self.base_url, resource);
        let mut seen: HashSet<String> = HashSet::new();
        let mut records: Vec<T> = Vec::new();
        let mut total_pages = 0u32;
        let mut page_number = 0u32;

        loop {
            if page_number >= self.max_pages {
                warn!(resource, pages = page_number, "Page ceiling reached, stopping crawl");
                break;
            }
            if page_number >= total_pages && page_number >= self.min_pages {
                break;
            }

            let operation = format!("stapi {} page {}", resource, page_number);
            let query = [
                ("pageNumber", page_number.to_string()),
                ("pageSize", self.page_size.to_string()),
            ];
            let result = with_retries(&operation, self.retry, HarvestError::is_transient, || {
                self.get_json::<SearchResponse>(&url, &query)
            })
            .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        resource,
                        page = page_number,
                        gathered = records.len(),
                        error = %e,
                        "Page request failed, returning partial results"
                    );
                    break;
                }
            };

            if let Some(reported) = response.page.as_ref().and_then(|p| p.total_pages) {
                total_pages = total_pages.max(reported);
            }

            let items = response.take_results(results_key);
            let received = items.len();
            for item in items {
                match serde_json::from_value::<T>(item) {
                    Ok(record) => {
                        if seen.insert(record.uid().to_string()) {
                            records.push(record);
                        }
                    }
                    Err(e) => {
                        debug!(resource, error = %e, "Skipping malformed record");
                    }
                }
            }

            debug!(
                resource,
                page = page_number,
                received,
                total_pages,
                "Fetched page"
            );

            page_number += 1;

            if received == 0 && page_number >= total_pages {
                break;
            }
        }

        info!(resource, records = records.len(), pages = page_number, "Crawl complete");
        records
    }

    /// GET + status check + JSON decode
    async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> HarvestResult<R> {
        self.rate_limiter.until_ready().await;

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| HarvestError::from_reqwest(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| HarvestError::Parse(format!("Failed to parse STAPI response from {}: {}", url, e)))
    }
}

// ============================================================================
// STAPI Response Types
// ============================================================================

/// Page block; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)] // Deserialized for completeness; only totalPages drives the crawl
struct UpstreamPage {
    page_number: Option<u32>,
    page_size: Option<u32>,
    number_of_elements: Option<u32>,
    total_elements: Option<u64>,
    total_pages: Option<u32>,
    first_page: Option<bool>,
    last_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    page: Option<UpstreamPage>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl SearchResponse {
    /// Result array under `key`; missing or non-array yields nothing
    fn take_results(mut self, key: &str) -> Vec<Value> {
        match self.rest.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeriesFullResponse {
    #[serde(default)]
    series: Option<SeriesFull>,
}

#[derive(Debug, Deserialize)]
struct SeriesFull {
    #[serde(default)]
    episodes: Vec<StapiEpisode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StapiEpisode {
    uid: Option<String>,
    title: Option<String>,
    season_number: Option<u32>,
    episode_number: Option<u32>,
    us_air_date: Option<String>,
    stardate_from: Option<f64>,
    season: Option<StapiSeason>,
}

#[derive(Debug, Deserialize)]
struct StapiSeason {
    title: Option<String>,
}

impl StapiEpisode {
    /// Episodes without uid or title are dropped
    fn into_record(self) -> Option<EpisodeRecord> {
        Some(EpisodeRecord {
            uid: self.uid?,
            title: self.title?,
            episode_number: self.episode_number,
            season: SeasonRef {
                number: self.season_number,
                title: self.season.and_then(|s| s.title),
            },
            air_date: self.us_air_date,
            stardate: self.stardate_from,
        })
    }
}
