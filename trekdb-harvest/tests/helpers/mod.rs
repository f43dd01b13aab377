//! Shared fixtures for trekdb-harvest integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trekdb_common::models::{CastMember, CharacterRecord, SeriesRecord};
use trekdb_harvest::clients::{WikiContent, WikiLookup};
use trekdb_harvest::services::{FetchedImage, ImageFetcher};
use trekdb_harvest::utils::{RequestQueue, RetryPolicy};
use trekdb_harvest::{AppState, HarvestError, HarvestResult};

/// Wiki double answering every title, or failing every call
pub struct FakeWiki {
    pub calls: AtomicUsize,
    pub reachable: bool,
}

impl FakeWiki {
    pub fn reachable() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reachable: true,
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reachable: false,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WikiLookup for FakeWiki {
    async fn try_search(&self, name: &str) -> HarvestResult<Option<String>> {
        Ok(Some(name.replace(' ', "_")))
    }

    async fn try_get_content(&self, title: &str) -> HarvestResult<WikiContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(HarvestError::Network(format!("{} unreachable", title)));
        }
        Ok(WikiContent {
            image: Some(format!(
                "https://static.wikia.nocookie.net/memoryalpha/images/0/00/{}.jpg/revision/latest",
                title
            )),
            summary: Some(format!("{} is a character.", title)),
            wiki_url: self.page_url(title),
        })
    }

    fn page_url(&self, title: &str) -> String {
        format!("https://memory-alpha.test/wiki/{}", title)
    }
}

/// Image fetcher double that counts outbound fetches
pub struct CountingFetcher {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingFetcher {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> HarvestResult<FetchedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(HarvestError::Status {
                status: 404,
                url: url.to_string(),
            });
        }
        Ok(FetchedImage {
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
    }
}

pub fn character(uid: &str, name: &str, keep: bool) -> CharacterRecord {
    let mut record = CharacterRecord::new(uid, name);
    record.keep = keep;
    record
}

/// Five records, three of them canonical
pub fn sample_characters() -> Vec<CharacterRecord> {
    vec![
        character("C1", "Worf", true),
        character("C2", "Worf", false),
        character("C3", "Kira Nerys", true),
        character("C4", "Benjamin Sisko", true),
        character("C5", "Captain Benjamin Sisko", false),
    ]
}

pub fn sample_series() -> Vec<SeriesRecord> {
    serde_json::from_value(serde_json::json!([
        {"uid": "SEMA0000062876", "title": "Star Trek: Deep Space Nine", "abbreviation": "DS9"},
        {"uid": "SEMA0000062877", "title": "Star Trek: The Next Generation", "abbreviation": "TNG"},
        {"uid": "SEMA0000062878", "title": "Star Trek: Voyager", "abbreviation": "VOY"}
    ]))
    .unwrap()
}

pub fn sample_casts() -> BTreeMap<String, Vec<CastMember>> {
    let mut casts = BTreeMap::new();
    casts.insert(
        "ds9".to_string(),
        vec![CastMember {
            character_name: "Kira Nerys".to_string(),
            performer: Some("Nana Visitor".to_string()),
            uid: Some("C3".to_string()),
            wiki_image: None,
        }],
    );
    casts
}

/// App state over the sample data with the given doubles
pub fn test_app_state(wiki: Arc<FakeWiki>, fetcher: Arc<CountingFetcher>) -> AppState {
    AppState::new(
        sample_characters(),
        sample_series(),
        sample_casts(),
        wiki,
        fetcher,
        RequestQueue::new(Duration::from_millis(1)),
        RetryPolicy::new(2, Duration::from_millis(1)),
    )
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Serve `router` on an ephemeral local port; returns its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
