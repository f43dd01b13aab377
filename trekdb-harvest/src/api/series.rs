//! Series endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use trekdb_common::models::{CastMember, PageInfo, PageRequest, SeriesFilter, SeriesRecord, SortInfo};

use crate::error::{ApiError, ApiResult};
use super::params::lenient;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesListParams {
    #[serde(default, deserialize_with = "lenient")]
    pub page_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub page_size: Option<u32>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesPage {
    pub page: PageInfo,
    pub sort: SortInfo,
    pub series: Vec<SeriesRecord>,
}

/// GET /api/series
pub async fn list_series(
    State(state): State<AppState>,
    params: Result<Query<SeriesListParams>, QueryRejection>,
) -> ApiResult<Json<SeriesPage>> {
    let Query(params) = params?;
    let filter = SeriesFilter {
        title: params.title.clone(),
    };
    let mut matching: Vec<&SeriesRecord> = state.series.iter().filter(|s| filter.matches(s)).collect();
    matching.sort_by_cached_key(|s| s.title.to_lowercase());

    let (page, slice) = PageRequest::new(params.page_number, params.page_size).paginate(&matching);

    Ok(Json(SeriesPage {
        page,
        sort: SortInfo::ascending("title"),
        series: slice.into_iter().cloned().collect(),
    }))
}

/// GET /api/series/:slug/cast
pub async fn get_cast(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<CastMember>>> {
    let slug = slug.to_lowercase();
    state
        .casts
        .get(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No cast list for series '{}'", slug)))
}

pub fn series_routes() -> Router<AppState> {
    Router::new()
        .route("/api/series", get(list_series))
        .route("/api/series/:slug/cast", get(get_cast))
}
