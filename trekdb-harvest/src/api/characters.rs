//! Character endpoints
//!
//! - `GET /api/characters` lists harvested characters, alphabetical by name
//! - `GET /api/character?uid=|name=` returns one character, enriched on demand

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use trekdb_common::models::{CharacterFilter, CharacterRecord, PageInfo, PageRequest, SortInfo};

use crate::error::{ApiError, ApiResult, HarvestError};
use crate::services::CharacterQuery;
use super::params::lenient;
use crate::AppState;

/// Query string for the character list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterListParams {
    #[serde(default, deserialize_with = "lenient")]
    pub page_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub page_size: Option<u32>,
    pub name: Option<String>,
    pub species: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_important: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub keep: Option<bool>,
}

impl CharacterListParams {
    fn filter(&self) -> CharacterFilter {
        CharacterFilter {
            name: self.name.clone(),
            species: self.species.clone(),
            important: self.is_important,
            keep: self.keep,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterPage {
    pub page: PageInfo,
    pub sort: SortInfo,
    pub characters: Vec<CharacterRecord>,
}

/// GET /api/characters
pub async fn list_characters(
    State(state): State<AppState>,
    params: Result<Query<CharacterListParams>, QueryRejection>,
) -> ApiResult<Json<CharacterPage>> {
    let Query(params) = params?;
    let filter = params.filter();
    let mut matching: Vec<&CharacterRecord> =
        state.characters.iter().filter(|r| filter.matches(r)).collect();
    matching.sort_by_cached_key(|r| r.name.to_lowercase());

    let request = PageRequest::new(params.page_number, params.page_size);
    let (page, slice) = request.paginate(&matching);

    Ok(Json(CharacterPage {
        page,
        sort: SortInfo::ascending("name"),
        characters: slice.into_iter().cloned().collect(),
    }))
}

/// GET /api/character
///
/// 400 without `uid` or `name`, 404 when no record matches. Wiki failures
/// still return the base record.
pub async fn get_character(
    State(state): State<AppState>,
    query: Result<Query<CharacterQuery>, QueryRejection>,
) -> ApiResult<Json<CharacterRecord>> {
    let Query(query) = query?;
    match state.enrichment.lookup(&query).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(ApiError::NotFound(
            "No character matches the given uid or name".to_string(),
        )),
        Err(HarvestError::Validation(msg)) => Err(ApiError::BadRequest(msg)),
        Err(e) => Err(e.into()),
    }
}

pub fn character_routes() -> Router<AppState> {
    Router::new()
        .route("/api/characters", get(list_characters))
        .route("/api/character", get(get_character))
}
