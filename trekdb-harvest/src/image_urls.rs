//! Image URL rules shared by the wiki client, the image cache and the proxy
//!
//! Memory Alpha images live on the Fandom CDN (`static.wikia.nocookie.net`).
//! Its URLs come in several shapes (`.../revision/latest`,
//! `.../revision/latest/scale-to-width-down/350?cb=...`, or with no revision
//! segment at all); all of them are normalized to `.../revision/latest`.

/// Path the site serves the image proxy under
pub const IMAGE_PROXY_PATH: &str = "/api/image-proxy";

const CDN_HOST_MARKER: &str = "wikia.nocookie.net";
const REVISION_LATEST: &str = "/revision/latest";

/// Make protocol-relative URLs absolute; reject anything that is not http(s)
pub fn absolutize(url: &str) -> Option<String> {
    let url = url.trim();
    if url.starts_with("//") {
        Some(format!("https:{}", url))
    } else if url.starts_with("https://") || url.starts_with("http://") {
        Some(url.to_string())
    } else {
        None
    }
}

/// SVGs (logos, icons) and placeholder graphics are never used as portraits
pub fn is_rejected_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower.split('?').next().unwrap_or(&lower);
    path.ends_with(".svg") || path.contains(".svg/") || lower.contains("placeholder")
}

/// Normalize Fandom CDN URLs to the `/revision/latest` form; other URLs pass through
pub fn normalize_cdn_url(url: &str) -> String {
    if !url.contains(CDN_HOST_MARKER) {
        return url.to_string();
    }

    let without_query = url.split('?').next().unwrap_or(url);

    match without_query.find(REVISION_LATEST) {
        Some(pos) => without_query[..pos + REVISION_LATEST.len()].to_string(),
        None => {
            let trimmed = without_query.trim_end_matches('/');
            // Bare ".../revision/123" style segments are replaced too
            let base = match trimmed.find("/revision/") {
                Some(pos) => &trimmed[..pos],
                None => trimmed,
            };
            format!("{}{}", base, REVISION_LATEST)
        }
    }
}

/// Rewrite a remote image URL into the site's proxied form
pub fn proxied_url(url: &str) -> String {
    format!("{}?url={}", IMAGE_PROXY_PATH, urlencoding::encode(url))
}

/// Remote URL behind a proxied image link; `None` for anything else
pub fn unproxied_url(url: &str) -> Option<String> {
    let encoded = url.strip_prefix(IMAGE_PROXY_PATH)?.strip_prefix("?url=")?;
    let encoded = encoded.split('&').next().unwrap_or(encoded);
    urlencoding::decode(encoded).ok().map(|decoded| decoded.into_owned())
}

/// File extension for a cached copy of `url` (lowercase, defaults to `jpg`)
pub fn image_extension(url: &str) -> &'static str {
    let lower = url.to_lowercase();
    let path = lower
        .split('?')
        .next()
        .unwrap_or(&lower)
        .trim_end_matches(REVISION_LATEST);

    for ext in ["png", "webp", "gif", "jpeg", "jpg"] {
        if path.ends_with(&format!(".{}", ext)) {
            return match ext {
                "jpeg" => "jpg",
                "png" => "png",
                "webp" => "webp",
                "gif" => "gif",
                _ => "jpg",
            };
        }
    }
    "jpg"
}
