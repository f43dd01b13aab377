//! Enrichment Service
//!
//! Adds wiki image, page URL and summary to character records. Every wiki
//! call goes through the shared [`RequestQueue`], is retried on transient
//! failures and is capped at [`WIKI_TIMEOUT`] per attempt. Enrichment is a
//! value-add: when the wiki cannot be reached the base record is returned.

use crate::clients::wiki_client::{WikiContent, WikiLookup, WIKI_TIMEOUT};
use crate::error::{HarvestError, HarvestResult};
use crate::names::prepare_lookup_name;
use crate::services::enrichment_cache::EnrichmentCache;
use crate::utils::{with_retries, RequestQueue, RetryPolicy};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use trekdb_common::models::{CharacterRecord, SeriesRecord};

/// `?uid=` / `?name=` lookup; `uid` wins when both are present
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CharacterQuery {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CharacterQuery {
    pub fn by_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            uid: None,
            name: Some(name.into()),
        }
    }

    fn uid(&self) -> Option<&str> {
        self.uid.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Neither identifier supplied
    pub fn is_empty(&self) -> bool {
        self.uid().is_none() && self.name().is_none()
    }
}

/// Enrichment Service
pub struct EnrichmentService {
    characters: Arc<Vec<CharacterRecord>>,
    wiki: Arc<dyn WikiLookup>,
    queue: RequestQueue,
    retry: RetryPolicy,
    timeout: Duration,
    cache: Mutex<EnrichmentCache>,
    cache_path: Option<PathBuf>,
}

impl EnrichmentService {
    pub fn new(
        characters: Arc<Vec<CharacterRecord>>,
        wiki: Arc<dyn WikiLookup>,
        queue: RequestQueue,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            characters,
            wiki,
            queue,
            retry,
            timeout: WIKI_TIMEOUT,
            cache: Mutex::new(EnrichmentCache::default()),
            cache_path: None,
        }
    }

    /// Persist results to `path`, starting from whatever it already holds
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = EnrichmentCache::load(&path);
        info!(path = %path.display(), entries = cache.len(), "Loaded enrichment cache");
        self.cache = Mutex::new(cache);
        self.cache_path = Some(path);
        self
    }

    /// Override the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn cache(&self) -> MutexGuard<'_, EnrichmentCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Find a character by uid, then by name, and return it enriched
    ///
    /// `Ok(None)` means no such character. An empty query is a validation error.
    pub async fn lookup(&self, query: &CharacterQuery) -> HarvestResult<Option<CharacterRecord>> {
        if query.is_empty() {
            return Err(HarvestError::Validation(
                "uid or name parameter is required".to_string(),
            ));
        }

        let cached = {
            let cache = self.cache();
            query
                .uid()
                .and_then(|uid| cache.get_by_uid(uid))
                .or_else(|| query.name().and_then(|name| cache.get_by_name(name)))
                .cloned()
        };
        if let Some(record) = cached {
            debug!(uid = %record.uid, "Enrichment cache hit");
            return Ok(Some(record));
        }

        let Some(base) = self.find_base(query) else {
            return Ok(None);
        };

        let enriched = self.enrich_record(base).await;
        if enriched.wiki_url.is_some() {
            self.remember(enriched.clone());
        }
        Ok(Some(enriched))
    }

    /// Base record from the character store; canonical records win name matches
    fn find_base(&self, query: &CharacterQuery) -> Option<CharacterRecord> {
        if let Some(uid) = query.uid() {
            if let Some(record) = self.characters.iter().find(|r| r.uid == uid) {
                return Some(record.clone());
            }
        }

        let name = query.name()?;
        let mut matches = self
            .characters
            .iter()
            .filter(|r| r.name.trim().eq_ignore_ascii_case(name));
        let first = matches.next()?;
        if first.keep {
            return Some(first.clone());
        }
        Some(matches.find(|r| r.keep).unwrap_or(first).clone())
    }

    fn remember(&self, record: CharacterRecord) {
        let snapshot = {
            let mut cache = self.cache();
            cache.insert(record);
            cache.clone()
        };

        if let Some(path) = &self.cache_path {
            if let Err(e) = snapshot.save(path) {
                warn!(path = %path.display(), error = %e, "Failed to persist enrichment cache");
            }
        }
    }

    /// Wiki content for a free-text name; `None` when the wiki is unavailable
    pub async fn wiki_content(&self, name: &str) -> Option<WikiContent> {
        let lookup_name = prepare_lookup_name(name);
        if lookup_name.is_empty() {
            return None;
        }

        let wiki = self.wiki.clone();
        let retry = self.retry;
        let timeout = self.timeout;
        let operation_name = format!("wiki lookup {}", lookup_name);

        let outcome = self
            .queue
            .run(move || async move {
                with_retries(&operation_name, retry, HarvestError::is_transient, || {
                    let wiki = wiki.clone();
                    let lookup_name = lookup_name.clone();
                    async move {
                        let attempt = async {
                            let title = wiki
                                .try_search(&lookup_name)
                                .await?
                                .unwrap_or_else(|| lookup_name.clone());
                            wiki.try_get_content(&title).await
                        };
                        tokio::time::timeout(timeout, attempt)
                            .await
                            .map_err(|_| HarvestError::Timeout(format!("wiki lookup {}", lookup_name)))?
                    }
                })
                .await
            })
            .await;

        match outcome {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(name = %name, error = %e, "Wiki enrichment failed, keeping base record");
                None
            }
        }
    }

    /// Fill wiki fields the record is missing
    pub async fn enrich_record(&self, mut record: CharacterRecord) -> CharacterRecord {
        if let Some(content) = self.wiki_content(&record.name).await {
            if record.wiki_image.is_none() {
                record.wiki_image = content.image;
            }
            if record.wiki_summary.is_none() {
                record.wiki_summary = content.summary;
            }
            record.wiki_url = Some(content.wiki_url);
        }
        record
    }

    /// Fill a series' wiki image and summary
    pub async fn enrich_series(&self, mut series: SeriesRecord) -> SeriesRecord {
        if let Some(content) = self.wiki_content(&series.title).await {
            if series.wiki_image.is_none() {
                series.wiki_image = content.image;
            }
            if series.wiki_summary.is_none() {
                series.wiki_summary = content.summary;
            }
        }
        series
    }
}
