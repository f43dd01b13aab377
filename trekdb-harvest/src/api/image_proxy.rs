//! Image proxy endpoint
//!
//! `GET /api/image-proxy?url=<encoded>[&format=base64]`

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::image_urls::IMAGE_PROXY_PATH;
use crate::services::image_proxy::{ProxyOutcome, CACHE_CONTROL};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ImageProxyParams {
    pub url: Option<String>,
    /// `base64` wraps the bytes in JSON instead of returning them raw
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub content_type: String,
    pub data: String,
}

/// GET /api/image-proxy
pub async fn proxy_image(
    State(state): State<AppState>,
    params: Result<Query<ImageProxyParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let url = params
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("url parameter is required".to_string()))?;

    let as_base64 = params
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("base64"));

    let response = match state.image_proxy.proxy(url).await {
        ProxyOutcome::Forbidden => {
            return Err(ApiError::Forbidden("Image host is not allowed".to_string()))
        }
        ProxyOutcome::Fallback(path) => Redirect::temporary(path).into_response(),
        ProxyOutcome::Image(image) if as_base64 => {
            let body = EncodedImage {
                data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
                content_type: image.content_type,
            };
            (
                [(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL))],
                Json(body),
            )
                .into_response()
        }
        ProxyOutcome::Image(image) => {
            let content_type = HeaderValue::from_str(&image.content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
                ],
                image.bytes,
            )
                .into_response()
        }
    };

    Ok(response)
}

pub fn image_proxy_routes() -> Router<AppState> {
    Router::new().route(IMAGE_PROXY_PATH, get(proxy_image))
}
