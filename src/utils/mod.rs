//! Utility functions and helpers.

pub mod http;
pub mod json;
pub mod normalize;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Build `base` with `query` appended as a percent-encoded path segment.
pub fn with_path_segment(base: &str, segment: &str) -> crate::error::Result<String> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| crate::error::AppError::parse(base, "URL cannot be a base"))?
        .push(segment);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "/root.html"),
            "https://example.com/root.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            resolve("https://bgm.tv/subject/1", "//lain.bgm.tv/pic/cover/l/a.jpg"),
            Some("https://lain.bgm.tv/pic/cover/l/a.jpg".to_string())
        );
    }

    #[test]
    fn test_with_path_segment_encodes() {
        assert_eq!(
            with_path_segment("https://api.bgm.tv/search/subject", "孤独 摇滚").unwrap(),
            "https://api.bgm.tv/search/subject/%E5%AD%A4%E7%8B%AC%20%E6%91%87%E6%BB%9A"
        );
    }
}
