//! HTTP API integration tests
//!
//! Drive the full router with `oneshot`; wiki and image fetches go to
//! in-process doubles.

mod helpers;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use helpers::{body_bytes, body_json, test_app_state, CountingFetcher, FakeWiki};
use tower::ServiceExt;
use trekdb_harvest::build_router;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_keep_filter_pagination() {
    // Given: five characters, three canonical
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    // When: first page of two, canonical only
    let response = app
        .oneshot(get("/api/characters?pageNumber=0&pageSize=2&keep=true"))
        .await
        .unwrap();

    // Then: totals count the filtered set, the page holds two, sorted by name
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"]["totalElements"], 3);
    assert_eq!(body["page"]["numberOfElements"], 2);
    assert_eq!(body["page"]["totalPages"], 2);
    assert_eq!(body["page"]["firstPage"], true);
    assert_eq!(body["page"]["lastPage"], false);

    let characters = body["characters"].as_array().unwrap();
    assert_eq!(characters.len(), 2);
    assert_eq!(characters[0]["name"], "Benjamin Sisko");
    assert_eq!(characters[1]["name"], "Kira Nerys");
    assert_eq!(body["sort"]["clauses"][0]["name"], "name");
}

#[tokio::test]
async fn test_character_name_filter_is_case_insensitive() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app.oneshot(get("/api/characters?name=SISKO")).await.unwrap();

    let body = body_json(response).await;
    assert_eq!(body["page"]["totalElements"], 2);
    assert_eq!(body["page"]["pageSize"], 20);
}

#[tokio::test]
async fn test_blank_list_params_are_ignored() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app
        .oneshot(get("/api/characters?pageNumber=&pageSize=&name=&species=&isImportant=&keep="))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"]["totalElements"], 5);
    assert_eq!(body["page"]["pageNumber"], 0);
    assert_eq!(body["page"]["pageSize"], 20);
}

#[tokio::test]
async fn test_invalid_list_params_fall_back_to_defaults() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app
        .clone()
        .oneshot(get("/api/characters?pageNumber=abc&pageSize=-3&keep=maybe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"]["pageNumber"], 0);
    assert_eq!(body["page"]["pageSize"], 20);
    assert_eq!(body["page"]["totalElements"], 5);

    let response = app.oneshot(get("/api/series?pageNumber=x&pageSize=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"]["totalElements"], 3);
}

#[tokio::test]
async fn test_series_list_and_title_filter() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app
        .clone()
        .oneshot(get("/api/series?pageSize=500"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["page"]["pageSize"], 100);
    assert_eq!(body["series"][0]["title"], "Star Trek: Deep Space Nine");

    let response = app.oneshot(get("/api/series?title=voyager")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["page"]["totalElements"], 1);
    assert_eq!(body["series"][0]["abbreviation"], "VOY");
}

#[tokio::test]
async fn test_series_cast() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app.clone().oneshot(get("/api/series/DS9/cast")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["characterName"], "Kira Nerys");
    assert_eq!(body[0]["uid"], "C3");

    let response = app.oneshot(get("/api/series/ent/cast")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_character_lookup_requires_identifier() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app.oneshot(get("/api/character")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_character_lookup_not_found() {
    let wiki = FakeWiki::reachable();
    let app = build_router(test_app_state(wiki.clone(), CountingFetcher::ok()));

    let response = app.oneshot(get("/api/character?uid=CHMA9999")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(wiki.calls(), 0);
}

#[tokio::test]
async fn test_character_lookup_enriches() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app.oneshot(get("/api/character?name=Kira%20Nerys")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["uid"], "C3");
    assert_eq!(body["wikiUrl"], "https://memory-alpha.test/wiki/Kira_Nerys");
    assert_eq!(body["wikiSummary"], "Kira_Nerys is a character.");
}

#[tokio::test]
async fn test_character_lookup_survives_wiki_outage() {
    let wiki = FakeWiki::unreachable();
    let app = build_router(test_app_state(wiki.clone(), CountingFetcher::ok()));

    let response = app.oneshot(get("/api/character?uid=C4")).await.unwrap();

    // Then: base record, no wiki fields; the network error was retried once
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Benjamin Sisko");
    assert!(body["wikiUrl"].is_null());
    assert_eq!(wiki.calls(), 2);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/character?uid=C3")
        .header(header::ORIGIN, "https://trekdb.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_headers_on_errors() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let request = Request::builder()
        .uri("/api/character")
        .header(header::ORIGIN, "https://trekdb.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_image_proxy_refuses_foreign_host() {
    let fetcher = CountingFetcher::ok();
    let app = build_router(test_app_state(FakeWiki::reachable(), fetcher.clone()));

    let response = app
        .oneshot(get("/api/image-proxy?url=https%3A%2F%2Fevil.example.com%2Fa.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_image_proxy_requires_url() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app.oneshot(get("/api/image-proxy")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_proxy_serves_bytes() {
    let fetcher = CountingFetcher::ok();
    let app = build_router(test_app_state(FakeWiki::reachable(), fetcher.clone()));

    let response = app
        .oneshot(get(
            "/api/image-proxy?url=https%3A%2F%2Fstatic.wikia.nocookie.net%2Fmemoryalpha%2Fimages%2Fa%2Fab%2FOdo.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=86400"
    );
    assert_eq!(body_bytes(response).await, vec![0x89, b'P', b'N', b'G']);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_image_proxy_base64_format() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app
        .oneshot(get(
            "/api/image-proxy?format=base64&url=https%3A%2F%2Fstatic.wikia.nocookie.net%2Fmemoryalpha%2Fimages%2Fa%2Fab%2FOdo.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["contentType"], "image/png");
    assert_eq!(body["data"], "iVBORw==");
}

#[tokio::test]
async fn test_image_proxy_redirects_on_failure() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::failing()));

    let response = app
        .oneshot(get(
            "/api/image-proxy?url=https%3A%2F%2Fstatic.wikia.nocookie.net%2Fmemoryalpha%2Fimages%2F1%2F1a%2FUSS_Enterprise.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/images/fallback/ship.png"
    );
}

#[tokio::test]
async fn test_health() {
    let app = build_router(test_app_state(FakeWiki::reachable(), CountingFetcher::ok()));

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "trekdb-harvest");
    assert_eq!(body["characters"], 5);
    assert_eq!(body["series"], 3);
}
