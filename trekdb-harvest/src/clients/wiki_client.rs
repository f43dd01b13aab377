//! Memory Alpha Client
//!
//! Looks up wiki pages and scrapes a portrait image and a summary paragraph
//! out of their HTML. The page layout is not a stable contract, so every
//! extraction step has a fallback and every failure degrades to `None`.
//!
//! # Image Candidates (first accepted wins)
//! 1. `<meta property="og:image">`
//! 2. First infobox image
//! 3. First image in the article body
//!
//! SVGs, placeholders and non-http(s) sources are rejected. The accepted URL
//! is normalized for the Fandom CDN and rewritten into the image-proxy form.

use crate::error::{HarvestError, HarvestResult};
use crate::image_urls::{absolutize, is_rejected_image, normalize_cdn_url, proxied_url};
use async_trait::async_trait;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use trekdb_common::config::BROWSER_USER_AGENT;
use trekdb_common::text::collapse_whitespace;

/// Per-request cap on wiki calls
pub const WIKI_TIMEOUT: Duration = Duration::from_secs(8);

/// Paragraphs at or below this length are boilerplate ("Redirected from...")
pub const MIN_SUMMARY_CHARS: usize = 80;

/// Result of a page lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiContent {
    /// Proxied image URL
    pub image: Option<String>,
    pub summary: Option<String>,
    pub wiki_url: String,
}

impl WikiContent {
    fn empty(wiki_url: String) -> Self {
        Self {
            image: None,
            summary: None,
            wiki_url,
        }
    }
}

/// Wiki lookups used by enrichment
///
/// The fallible methods let callers retry transient failures; the HTTP
/// client implements them against Memory Alpha and tests substitute fakes.
#[async_trait]
pub trait WikiLookup: Send + Sync {
    /// Resolve a free-text name to a page title
    async fn try_search(&self, name: &str) -> HarvestResult<Option<String>>;

    /// Fetch and scrape one page
    async fn try_get_content(&self, title: &str) -> HarvestResult<WikiContent>;

    /// Canonical page URL for `title`
    fn page_url(&self, title: &str) -> String;

    /// `try_get_content` that never fails: unreachable pages give an empty result
    async fn get_content(&self, title: &str) -> WikiContent {
        match self.try_get_content(title).await {
            Ok(content) => content,
            Err(e) => {
                debug!(title = %title, error = %e, "Wiki page unavailable");
                WikiContent::empty(self.page_url(title))
            }
        }
    }

    /// `try_search` that never fails
    async fn search(&self, name: &str) -> Option<String> {
        self.try_search(name).await.unwrap_or_else(|e| {
            debug!(name = %name, error = %e, "Wiki search failed");
            None
        })
    }
}

/// HTTP client for Memory Alpha
pub struct WikiClient {
    http_client: Client,
    base_url: String,
}

impl WikiClient {
    pub fn new(base_url: impl Into<String>) -> HarvestResult<Self> {
        let http_client = Client::builder()
            .timeout(WIKI_TIMEOUT)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| HarvestError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> HarvestResult<String> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .header(header::ACCEPT, "text/html,application/json")
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

        response
            .text()
            .await
            .map_err(|e| HarvestError::from_reqwest(e, url))
    }
}

#[async_trait]
impl WikiLookup for WikiClient {
    async fn try_search(&self, name: &str) -> HarvestResult<Option<String>> {
        let url = format!("{}/api.php", self.base_url);
        let body = self
            .get_text(
                &url,
                &[
                    ("action", "opensearch"),
                    ("search", name),
                    ("limit", "1"),
                    ("namespace", "0"),
                    ("format", "json"),
                ],
            )
            .await?;

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| HarvestError::Parse(format!("opensearch response: {}", e)))?;
        Ok(first_search_title(&parsed))
    }

    async fn try_get_content(&self, title: &str) -> HarvestResult<WikiContent> {
        let wiki_url = self.page_url(title);
        let html = self.get_text(&wiki_url, &[]).await?;
        let content = parse_page(&html, wiki_url);

        debug!(
            title = %title,
            has_image = content.image.is_some(),
            has_summary = content.summary.is_some(),
            "Scraped wiki page"
        );
        Ok(content)
    }

    fn page_url(&self, title: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.base_url,
            urlencoding::encode(&title.trim().replace(' ', "_"))
        )
    }
}

/// Title from an opensearch payload: `[query, [titles], [descriptions], [urls]]`
fn first_search_title(payload: &Value) -> Option<String> {
    payload
        .get(1)?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
        .filter(|title| !title.trim().is_empty())
}

/// Scrape image and summary from page HTML
pub fn parse_page(html: &str, wiki_url: String) -> WikiContent {
    let document = Html::parse_document(html);
    WikiContent {
        image: extract_image(&document).map(|url| proxied_url(&url)),
        summary: extract_summary(&document),
        wiki_url,
    }
}

fn selector(css: &'static str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Image attribute, preferring the lazy-load source
fn image_source(element: &ElementRef<'_>) -> Option<String> {
    let attrs = element.value();
    attrs
        .attr("data-src")
        .or_else(|| attrs.attr("src"))
        .map(str::to_string)
}

/// Normalized (not yet proxied) image URL
pub fn extract_image(document: &Html) -> Option<String> {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(og) = selector(r#"meta[property="og:image"]"#) {
        candidates.extend(
            document
                .select(&og)
                .filter_map(|el| el.value().attr("content").map(str::to_string))
                .take(1),
        );
    }

    if let Some(infobox) = selector("aside.portable-infobox img, .infobox img") {
        candidates.extend(document.select(&infobox).filter_map(|el| image_source(&el)).take(1));
    }

    if let Some(body) = selector(".mw-parser-output img") {
        candidates.extend(document.select(&body).filter_map(|el| image_source(&el)).take(1));
    }

    candidates
        .into_iter()
        .filter_map(|candidate| absolutize(&candidate))
        .find(|url| !is_rejected_image(url))
        .map(|url| normalize_cdn_url(&url))
}

/// First body paragraph longer than [`MIN_SUMMARY_CHARS`]
pub fn extract_summary(document: &Html) -> Option<String> {
    let scoped = selector(".mw-parser-output > p")?;
    let any = selector("p")?;

    let pick = |sel: &Selector| {
        document
            .select(sel)
            .map(|p| collapse_whitespace(&strip_citations(&p.text().collect::<String>())))
            .find(|text| text.chars().count() > MIN_SUMMARY_CHARS)
    };

    pick(&scoped).or_else(|| pick(&any))
}

/// Drop footnote markers like `[1]` or `[citation needed]`
fn strip_citations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        match rest[open..].find(']') {
            Some(close_rel) if close_rel <= 24 => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close_rel + 1..];
            }
            _ => {
                out.push_str(&rest[..=open]);
                rest = &rest[open + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LONG_PARAGRAPH: &str = "Spock was a half-Human, half-Vulcan Starfleet officer who served aboard the USS Enterprise under Captain Pike and later Kirk.";

    fn page(head: &str, body: &str) -> String {
        format!(
            "<html><head>{}</head><body><div class=\"mw-parser-output\">{}</div></body></html>",
            head, body
        )
    }

    #[test]
    fn test_og_image_preferred() {
        let html = page(
            r#"<meta property="og:image" content="https://static.wikia.nocookie.net/memoryalpha/images/a/ab/Spock.jpg/revision/latest?cb=1">"#,
            r#"<aside class="portable-infobox"><img src="https://static.wikia.nocookie.net/memoryalpha/images/c/cd/Other.jpg"></aside>"#,
        );
        let content = parse_page(&html, "u".to_string());
        assert_eq!(
            content.image.as_deref(),
            Some(proxied_url("https://static.wikia.nocookie.net/memoryalpha/images/a/ab/Spock.jpg/revision/latest").as_str())
        );
    }

    #[test]
    fn test_infobox_used_when_og_is_svg() {
        let html = page(
            r#"<meta property="og:image" content="https://static.wikia.nocookie.net/memoryalpha/images/1/12/Logo.svg">"#,
            r#"<aside class="portable-infobox"><img src="data:image/gif;base64,R0l" data-src="https://static.wikia.nocookie.net/memoryalpha/images/c/cd/Worf.jpg/revision/latest/scale-to-width-down/270"></aside>"#,
        );
        let document = Html::parse_document(&html);
        assert_eq!(
            extract_image(&document).as_deref(),
            Some("https://static.wikia.nocookie.net/memoryalpha/images/c/cd/Worf.jpg/revision/latest")
        );
    }

    #[test]
    fn test_only_svg_yields_no_image() {
        let html = page(
            "",
            r#"<p>x</p><img src="https://static.wikia.nocookie.net/memoryalpha/images/1/12/Insignia.svg">"#,
        );
        let content = parse_page(&html, "u".to_string());
        assert_eq!(content.image, None);
    }

    #[test]
    fn test_placeholder_rejected() {
        let html = page(
            r#"<meta property="og:image" content="https://static.wikia.nocookie.net/memoryalpha/images/placeholder.png">"#,
            "",
        );
        assert_eq!(extract_image(&Html::parse_document(&html)), None);
    }

    #[test]
    fn test_summary_skips_short_paragraphs() {
        let html = page(
            "",
            &format!("<p>Redirected from Mr. Spock</p><p>{}<sup>[1]</sup></p>", LONG_PARAGRAPH),
        );
        let summary = extract_summary(&Html::parse_document(&html)).unwrap();
        assert_eq!(summary, LONG_PARAGRAPH);
    }

    #[test]
    fn test_no_long_paragraph_yields_none() {
        let html = page("", "<p>Short.</p>");
        assert_eq!(extract_summary(&Html::parse_document(&html)), None);
    }

    #[test]
    fn test_strip_citations() {
        assert_eq!(strip_citations("Born 2230.[2] Died."), "Born 2230. Died.");
        assert_eq!(strip_citations("Array [ of things"), "Array [ of things");
    }

    #[test]
    fn test_first_search_title() {
        let payload = json!(["spock", ["Spock"], [""], ["https://memory-alpha.fandom.com/wiki/Spock"]]);
        assert_eq!(first_search_title(&payload).as_deref(), Some("Spock"));
        assert_eq!(first_search_title(&json!(["nobody", [], [], []])), None);
    }

    #[test]
    fn test_page_url_uses_underscores() {
        let client = WikiClient::new("https://memory-alpha.fandom.com/").unwrap();
        assert_eq!(
            client.page_url("Jean-Luc Picard"),
            "https://memory-alpha.fandom.com/wiki/Jean-Luc_Picard"
        );
    }
}
