//! Series, episode and cast records

use crate::text::slugify;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Season an episode belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRef {
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A single episode; belongs to exactly one series and one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub uid: String,
    pub title: String,
    /// 1-based within its season
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub season: SeasonRef,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub stardate: Option<f64>,
}

impl EpisodeRecord {
    /// Ordering key: season number then episode number, unknowns last
    pub fn sort_key(&self) -> (u32, u32) {
        (
            self.season.number.unwrap_or(u32::MAX),
            self.episode_number.unwrap_or(u32::MAX),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecord {
    pub uid: String,
    pub title: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub production_start_year: Option<i32>,
    #[serde(default)]
    pub production_end_year: Option<i32>,
    #[serde(default)]
    pub seasons_count: Option<u32>,
    #[serde(default)]
    pub episodes_count: Option<u32>,
    #[serde(default)]
    pub wiki_image: Option<String>,
    #[serde(default)]
    pub wiki_summary: Option<String>,
    #[serde(default)]
    pub episodes: Vec<EpisodeRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SeriesRecord {
    /// URL slug: the abbreviation when known (`"TNG"` -> `"tng"`), else the title
    pub fn slug(&self) -> String {
        match self.abbreviation.as_deref().map(slugify) {
            Some(slug) if !slug.is_empty() => slug,
            _ => slugify(&self.title),
        }
    }
}

/// One resolved entry of a series cast list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub character_name: String,
    #[serde(default)]
    pub performer: Option<String>,
    /// Matched character uid; null when no record matched
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub wiki_image: Option<String>,
}
