//! Harvest pipeline
//!
//! One run of `trekdb-harvest harvest`:
//!
//! 1. Fetch every character from STAPI (an empty result aborts the run)
//! 2. Carry wiki fields over from the previous `characters.json`; records
//!    upstream no longer returned are kept as they were
//! 3. Enrich characters that still lack an image, important ones first,
//!    up to `enrich_limit`
//! 4. Download images into `images/characters/`
//! 5. Deduplicate (sets `keep` and `important`)
//! 6. Fetch series and their episodes, enrich series
//! 7. Resolve the cast table against canonical characters
//! 8. Rewrite `characters.json`, `series.json` and `series-cast.json`
//!
//! Only step 1 can fail the run; every later failure is confined to the
//! record or image it concerns.

use crate::clients::StapiClient;
use crate::error::{HarvestError, HarvestResult};
use crate::names::is_important_name;
use crate::services::cache_writer::{read_json_or_default, write_json_atomic, CacheLayout};
use crate::services::cast_table::CastTable;
use crate::services::character_deduplicator::CharacterDeduplicator;
use crate::services::enrichment::EnrichmentService;
use crate::services::image_cache::{ImageCache, CHARACTER_IMAGES_PATH};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};
use trekdb_common::models::{CharacterRecord, SeriesRecord};

/// Default cap on wiki enrichments per run
pub const DEFAULT_ENRICH_LIMIT: usize = 250;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestSummary {
    pub characters: usize,
    /// Cached records kept although this crawl did not return them
    pub retained: usize,
    pub enriched: usize,
    pub images_cached: usize,
    pub duplicate_groups: usize,
    pub suppressed: usize,
    pub series: usize,
    pub episodes: usize,
    pub cast_entries: usize,
    pub cast_unmatched: usize,
}

/// Harvest pipeline
pub struct Harvester {
    source: StapiClient,
    enrichment: EnrichmentService,
    images: ImageCache,
    layout: CacheLayout,
    cast_table: CastTable,
    deduplicator: CharacterDeduplicator,
    enrich_limit: usize,
}

impl Harvester {
    pub fn new(
        source: StapiClient,
        enrichment: EnrichmentService,
        images: ImageCache,
        layout: CacheLayout,
    ) -> Self {
        Self {
            source,
            enrichment,
            images,
            layout,
            cast_table: CastTable::default(),
            deduplicator: CharacterDeduplicator::default(),
            enrich_limit: DEFAULT_ENRICH_LIMIT,
        }
    }

    pub fn with_cast_table(mut self, cast_table: CastTable) -> Self {
        self.cast_table = cast_table;
        self
    }

    pub fn with_enrich_limit(mut self, enrich_limit: usize) -> Self {
        self.enrich_limit = enrich_limit;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Run every stage and rewrite the caches
    pub async fn run(&self) -> HarvestResult<HarvestSummary> {
        let started = Instant::now();
        let mut summary = HarvestSummary::default();

        let mut characters = self.source.fetch_all_characters().await;
        if characters.is_empty() {
            return Err(HarvestError::SourceUnavailable(
                "STAPI returned no characters".to_string(),
            ));
        }
        summary.characters = characters.len();
        info!(count = characters.len(), "Fetched characters");

        summary.retained = self.merge_previous(&mut characters);
        summary.enriched = self.enrich_characters(&mut characters).await;
        summary.images_cached = self.cache_images(&mut characters).await;

        let report = self.deduplicator.resolve_duplicates(&mut characters);
        summary.duplicate_groups = report.duplicate_groups;
        summary.suppressed = report.suppressed;

        let series = self.harvest_series().await;
        summary.series = series.len();
        summary.episodes = series.iter().map(|s| s.episodes.len()).sum();

        let casts = self.cast_table.resolve(&characters);
        summary.cast_entries = casts.values().map(Vec::len).sum();
        summary.cast_unmatched = casts
            .values()
            .flatten()
            .filter(|member| member.uid.is_none())
            .count();

        write_json_atomic(&self.layout.characters_path(), &characters)?;
        write_json_atomic(&self.layout.series_path(), &series)?;
        write_json_atomic(&self.layout.cast_path(), &casts)?;

        info!(
            characters = summary.characters,
            enriched = summary.enriched,
            images_cached = summary.images_cached,
            suppressed = summary.suppressed,
            series = summary.series,
            episodes = summary.episodes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Harvest complete"
        );

        Ok(summary)
    }

    /// Keep wiki fields from the last run and every record this crawl missed
    ///
    /// Returns how many previous records were appended unchanged.
    fn merge_previous(&self, characters: &mut Vec<CharacterRecord>) -> usize {
        let previous: Vec<CharacterRecord> = read_json_or_default(&self.layout.characters_path());
        if previous.is_empty() {
            return 0;
        }

        let mut by_uid: HashMap<String, CharacterRecord> = previous
            .into_iter()
            .map(|r| (r.uid.clone(), r))
            .collect();
        let previous_count = by_uid.len();

        let mut merged = 0usize;
        for record in characters.iter_mut() {
            if let Some(cached) = by_uid.remove(&record.uid) {
                record.retain_enrichment_from(&cached);
                merged += 1;
            }
        }

        // HashMap order is arbitrary; append in uid order
        let mut missing: Vec<CharacterRecord> = by_uid.into_values().collect();
        missing.sort_by(|a, b| a.uid.cmp(&b.uid));
        let retained = missing.len();
        characters.extend(missing);

        info!(previous = previous_count, merged, retained, "Merged previous harvest");
        retained
    }

    /// Enrich records without an image; returns how many gained wiki data
    async fn enrich_characters(&self, characters: &mut [CharacterRecord]) -> usize {
        let mut candidates: Vec<usize> = characters
            .iter()
            .enumerate()
            .filter(|(_, r)| r.wiki_image.is_none())
            .map(|(index, _)| index)
            .collect();
        // Stable: important characters first, otherwise upstream order
        candidates.sort_by_key(|&index| !is_important_name(&characters[index].name));
        candidates.truncate(self.enrich_limit);

        let mut enriched = 0usize;
        for index in candidates {
            let record = characters[index].clone();
            let updated = self.enrichment.enrich_record(record).await;
            if updated.wiki_url.is_some() {
                enriched += 1;
            }
            characters[index] = updated;
        }

        info!(enriched, limit = self.enrich_limit, "Enriched characters");
        enriched
    }

    /// Replace remote image URLs with cached local copies
    async fn cache_images(&self, characters: &mut [CharacterRecord]) -> usize {
        let mut cached = 0usize;

        for record in characters.iter_mut() {
            let Some(url) = record.wiki_image.clone() else {
                continue;
            };
            if url.starts_with(CHARACTER_IMAGES_PATH) {
                continue;
            }

            record.wiki_image = self.images.cache_character_image(record, &url).await;
            if record.wiki_image.is_some() {
                cached += 1;
            }
        }

        info!(cached, "Cached character images");
        cached
    }

    /// Fresh series with episodes; the previous list when the crawl yields nothing
    async fn harvest_series(&self) -> Vec<SeriesRecord> {
        let listed = self.source.fetch_all_series().await;
        if listed.is_empty() {
            let previous: Vec<SeriesRecord> = read_json_or_default(&self.layout.series_path());
            warn!(
                previous = previous.len(),
                "STAPI returned no series, keeping the previous series list"
            );
            return previous;
        }

        let mut series = Vec::with_capacity(listed.len());
        for mut record in listed {
            record.episodes = self.source.fetch_series_episodes(&record.uid).await;
            series.push(self.enrichment.enrich_series(record).await);
        }

        series.sort_by(|a, b| a.title.cmp(&b.title));
        info!(count = series.len(), "Harvested series");
        series
    }
}
