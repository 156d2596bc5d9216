use url::Url;

/// Removes every trailing `/` from a URL string.
pub fn trim_trailing_slashes(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Canonical form used to decide whether two feed URLs are the same feed:
/// lowercased, without trailing slashes. Applying it twice is a no-op.
pub fn normalize_feed_url(url: &str) -> String {
    trim_trailing_slashes(url).to_lowercase()
}

/// Hostname of a URL, or `None` if it does not parse or has no host.
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}

/// `scheme://host[:port]` of a URL, without a trailing slash.
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str()?;
    Some(parsed.origin().ascii_serialization())
}

/// Resolves a possibly relative `href` against `base`.
///
/// Absolute hrefs are returned unchanged; protocol-relative hrefs take the
/// `https` scheme. Returns `None` if the result is not a valid URL.
pub fn resolve_href(href: &str, base: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_owned());
    }

    // SEC-014: go through the parser so the result is normalized
    if let Some(rest) = href.strip_prefix("//") {
        return Url::parse(&format!("https://{rest}")).ok().map(String::from);
    }

    Url::parse(base)
        .and_then(|b| b.join(href))
        .ok()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(
            normalize_feed_url("https://Blog.Example.com/RSS///"),
            "https://blog.example.com/rss"
        );
        assert_eq!(normalize_feed_url(""), "");
    }

    #[test]
    fn test_hostname() {
        assert_eq!(
            hostname("https://blog.ethereum.org/feed.xml").as_deref(),
            Some("blog.ethereum.org")
        );
        assert_eq!(hostname("not a url"), None);
    }

    #[test]
    fn test_origin_drops_path_and_keeps_port() {
        assert_eq!(
            origin("https://example.com/blog/post?id=1").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            origin("http://example.com:8080/x").as_deref(),
            Some("http://example.com:8080")
        );
        assert_eq!(origin("mailto:someone@example.com"), None);
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(
            resolve_href("/feed.xml", "https://example.com/blog/").as_deref(),
            Some("https://example.com/feed.xml")
        );
        assert_eq!(
            resolve_href("rss", "https://example.com/blog/").as_deref(),
            Some("https://example.com/blog/rss")
        );
        assert_eq!(
            resolve_href("//cdn.example.com/feed", "https://example.com").as_deref(),
            Some("https://cdn.example.com/feed")
        );
        assert_eq!(
            resolve_href("https://other.org/atom.xml", "https://example.com").as_deref(),
            Some("https://other.org/atom.xml")
        );
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(url in "[a-zA-Z:/.]{0,40}") {
            let once = normalize_feed_url(&url);
            prop_assert_eq!(normalize_feed_url(&once), once);
        }

        #[test]
        fn prop_normalize_ignores_case_and_trailing_slashes(
            url in "https://[a-zA-Z]{1,12}\\.com/[a-zA-Z]{0,12}",
            slashes in 0usize..4,
        ) {
            let variant = format!("{}{}", url.to_uppercase(), "/".repeat(slashes));
            prop_assert_eq!(normalize_feed_url(&variant), normalize_feed_url(&url));
        }
    }
}
