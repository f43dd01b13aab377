//! Character image cache
//!
//! Downloads each character's best remote image once into
//! `images/characters/` so the static site does not depend on the wiki CDN.

use crate::image_urls::{image_extension, unproxied_url};
use crate::services::image_proxy::ImageFetcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use trekdb_common::atomic::write_atomic;
use trekdb_common::models::CharacterRecord;
use trekdb_common::text::slugify;

/// Site path the cached images are served under
pub const CHARACTER_IMAGES_PATH: &str = "/images/characters";

pub struct ImageCache {
    fetcher: Arc<dyn ImageFetcher>,
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file name: `<slug(name)>-<uid>.<ext>`
    pub fn file_name_for(record: &CharacterRecord, remote_url: &str) -> String {
        let uid: String = record
            .uid
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        let slug = slugify(&record.name);
        let stem = if slug.is_empty() { "character".to_string() } else { slug };
        format!("{}-{}.{}", stem, uid, image_extension(remote_url))
    }

    /// Cache the image at `url` (remote or proxied form) for `record`
    ///
    /// Returns the site path of the cached file. An existing file is reused
    /// without a request; every failure yields `None`.
    pub async fn cache_character_image(&self, record: &CharacterRecord, url: &str) -> Option<String> {
        let remote = unproxied_url(url).unwrap_or_else(|| url.to_string());
        if !(remote.starts_with("https://") || remote.starts_with("http://")) {
            debug!(uid = %record.uid, url = %url, "Not a remote image, skipping cache");
            return None;
        }

        let file_name = Self::file_name_for(record, &remote);
        let target = self.dir.join(&file_name);
        let public_path = format!("{}/{}", CHARACTER_IMAGES_PATH, file_name);

        if target.exists() {
            return Some(public_path);
        }

        let image = match self.fetcher.fetch(&remote).await {
            Ok(image) => image,
            Err(e) => {
                warn!(uid = %record.uid, url = %remote, error = %e, "Image download failed");
                return None;
            }
        };

        if image.bytes.is_empty() {
            warn!(uid = %record.uid, url = %remote, "Image download was empty");
            return None;
        }

        if let Err(e) = write_atomic(&target, &image.bytes) {
            warn!(path = %target.display(), error = %e, "Failed to write cached image");
            return None;
        }

        debug!(uid = %record.uid, file = %file_name, bytes = image.bytes.len(), "Cached image");
        Some(public_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HarvestError, HarvestResult};
    use crate::image_urls::proxied_url;
    use crate::services::image_proxy::FetchedImage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> HarvestResult<FetchedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HarvestError::Network(url.to_string()));
            }
            Ok(FetchedImage {
                content_type: "image/jpeg".to_string(),
                bytes: b"jpegdata".to_vec(),
            })
        }
    }

    fn cache(dir: &TempDir, fail: bool) -> (ImageCache, Arc<StubFetcher>) {
        let fetcher = Arc::new(StubFetcher {
            calls: AtomicUsize::new(0),
            fail,
        });
        (ImageCache::new(fetcher.clone(), dir.path()), fetcher)
    }

    const REMOTE: &str = "https://static.wikia.nocookie.net/memoryalpha/images/5/5e/Spock.png/revision/latest";

    #[test]
    fn test_file_name_is_deterministic() {
        let record = CharacterRecord::new("CHMA0000215045", "Mr. Spock");
        assert_eq!(
            ImageCache::file_name_for(&record, REMOTE),
            "mr-spock-CHMA0000215045.png"
        );
    }

    #[tokio::test]
    async fn test_downloads_once() {
        let dir = TempDir::new().unwrap();
        let (cache, fetcher) = cache(&dir, false);
        let record = CharacterRecord::new("A1", "Spock");

        let first = cache.cache_character_image(&record, &proxied_url(REMOTE)).await;
        assert_eq!(first.as_deref(), Some("/images/characters/spock-A1.png"));
        assert_eq!(std::fs::read(dir.path().join("spock-A1.png")).unwrap(), b"jpegdata");

        let second = cache.cache_character_image(&record, REMOTE).await;
        assert_eq!(second, first);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_yields_none() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache(&dir, true);
        let record = CharacterRecord::new("A1", "Spock");

        assert_eq!(cache.cache_character_image(&record, REMOTE).await, None);
        assert!(!dir.path().join("spock-A1.png").exists());
    }

    #[tokio::test]
    async fn test_local_paths_are_not_fetched() {
        let dir = TempDir::new().unwrap();
        let (cache, fetcher) = cache(&dir, false);
        let record = CharacterRecord::new("A1", "Spock");

        assert_eq!(
            cache.cache_character_image(&record, "/images/characters/spock-A1.png").await,
            None
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
