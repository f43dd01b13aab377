//! Image Proxy
//!
//! Serves remote wiki images from our own origin so pages are not broken by
//! hotlink protection. Only hosts on [`ALLOWED_HOSTS`] (or their subdomains)
//! are ever fetched; anything else is refused before a request is made.
//!
//! Redirects are followed only while they stay on the allow-list, and only
//! `image/*` bodies are relayed.
//!
//! A failed fetch never surfaces as an error to the `<img>` that asked for
//! it: the caller gets a redirect to a local placeholder picked by URL
//! keywords.

use crate::error::{HarvestError, HarvestResult};
use crate::image_urls::normalize_cdn_url;
use async_trait::async_trait;
use reqwest::{header, redirect, Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use trekdb_common::config::BROWSER_USER_AGENT;

/// Source domains the proxy may fetch from
pub const ALLOWED_HOSTS: &[&str] = &[
    "static.wikia.nocookie.net",
    "vignette.wikia.nocookie.net",
    "memory-alpha.fandom.com",
    "stapi.co",
    "upload.wikimedia.org",
];

/// Referer sent with image requests; the CDN rejects requests without one
pub const WIKI_REFERER: &str = "https://memory-alpha.fandom.com/";

/// `Cache-Control` value for proxied images (24 h)
pub const CACHE_CONTROL: &str = "public, max-age=86400";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const MAX_REDIRECTS: usize = 5;

/// Image bytes with the origin's content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    /// Content type is `image/*`
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }
}

/// Outbound image fetch, shared by the proxy and the image cache
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> HarvestResult<FetchedImage>;
}

/// Fetches images over HTTP with browser-like headers
pub struct HttpImageFetcher {
    http_client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> HarvestResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::REFERER, header::HeaderValue::from_static(WIKI_REFERER));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("image/avif,image/webp,image/*,*/*;q=0.8"),
        );

        let http_client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(allow_listed_redirects())
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| HarvestError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> HarvestResult<FetchedImage> {
        let response = self
            .http_client
            .get(url)
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

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HarvestError::from_reqwest(e, url))?;

        let image = FetchedImage {
            content_type,
            bytes: bytes.to_vec(),
        };
        if !image.is_image() {
            return Err(HarvestError::Validation(format!(
                "{} is {}, not an image",
                url, image.content_type
            )));
        }
        Ok(image)
    }
}

/// Follow a redirect only to another allowed host
///
/// A stopped redirect leaves the 3xx as the response, which `fetch` treats
/// as a failed status.
fn allow_listed_redirects() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_allowed_url(attempt.url().as_str()) {
            attempt.follow()
        } else {
            debug!(url = %attempt.url(), "Refusing redirect to disallowed host");
            attempt.stop()
        }
    })
}

/// Placeholder family used when a fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCategory {
    Character,
    Ship,
    Series,
}

impl FallbackCategory {
    /// Pick a category from keywords in the requested URL
    pub fn for_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has_any(&["ship", "uss", "starship", "vessel"]) {
            FallbackCategory::Ship
        } else if has_any(&["series", "logo", "title_card", "season"]) {
            FallbackCategory::Series
        } else {
            FallbackCategory::Character
        }
    }

    /// Site path of the placeholder image
    pub fn path(self) -> &'static str {
        match self {
            FallbackCategory::Character => "/images/fallback/character.png",
            FallbackCategory::Ship => "/images/fallback/ship.png",
            FallbackCategory::Series => "/images/fallback/series.png",
        }
    }
}

/// Result of a proxy request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOutcome {
    /// Host not allowed (or URL unparsable); nothing was fetched
    Forbidden,
    /// Upstream bytes
    Image(FetchedImage),
    /// Fetch failed; redirect here instead
    Fallback(&'static str),
}

/// Whether `url` is http(s) on an allowed host or one of its subdomains
pub fn is_allowed_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    ALLOWED_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
}

/// Image Proxy
#[derive(Clone)]
pub struct ImageProxy {
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageProxy {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Validate, normalize and fetch `url`
    pub async fn proxy(&self, url: &str) -> ProxyOutcome {
        if !is_allowed_url(url) {
            warn!(url = %url, "Image proxy refused disallowed host");
            return ProxyOutcome::Forbidden;
        }

        let target = normalize_cdn_url(url);
        let fetched = self.fetcher.fetch(&target).await.and_then(|image| {
            if image.is_image() {
                Ok(image)
            } else {
                Err(HarvestError::Validation(format!(
                    "upstream sent {}, not an image",
                    image.content_type
                )))
            }
        });

        match fetched {
            Ok(image) => {
                debug!(url = %target, bytes = image.bytes.len(), "Proxied image");
                ProxyOutcome::Image(image)
            }
            Err(e) => {
                let fallback = FallbackCategory::for_url(url);
                warn!(url = %target, error = %e, fallback = fallback.path(), "Image fetch failed");
                ProxyOutcome::Fallback(fallback.path())
            }
        }
    }
}
