use std::fmt;
use std::time::Duration;

use super::sniff::{extract_feed_title, is_rss_or_atom};
use super::verifier::Verifier;
use crate::util::{resolve_href, trim_trailing_slashes};

/// Paths tried, in order, when a homepage advertises no feed.
pub const COMMON_FEED_PATHS: &[&str] = &[
    "/feed",
    "/feed.xml",
    "/rss",
    "/rss.xml",
    "/atom.xml",
    "/blog/rss",
    "/blog/feed",
    "/blog/rss.xml",
    "/blog/feed.xml",
    "/blog/atom.xml",
    "/index.xml",
    "/blog/index.xml",
];

/// Default per-path timeout while guessing common feed paths.
pub const COMMON_PATH_TIMEOUT: Duration = Duration::from_secs(8);

const MAX_PAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// How a homepage's feed was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    /// Advertised with `<link type="application/rss+xml" ...>`.
    LinkTag,
    /// Found by trying [`COMMON_FEED_PATHS`].
    CommonPath,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeMethod::LinkTag => "link-tag",
            ProbeMethod::CommonPath => "common-path",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub homepage: String,
    pub feed_url: Option<String>,
    pub feed_title: Option<String>,
    pub method: Option<ProbeMethod>,
}

/// Looks for the feed behind a website.
///
/// First the homepage's advertised feed links are tried in page order, then
/// each of [`COMMON_FEED_PATHS`] under the site root with `path_timeout`
/// (never looser than the verifier's own).
/// The first URL serving RSS/Atom wins. Every failure along the way is
/// swallowed; a site without a feed simply yields `feed_url: None`.
pub async fn probe_homepage(
    verifier: &Verifier,
    homepage: &str,
    path_timeout: Duration,
) -> ProbeResult {
    let base = trim_trailing_slashes(homepage);
    let mut result = ProbeResult {
        homepage: homepage.to_owned(),
        feed_url: None,
        feed_title: None,
        method: None,
    };

    match verifier.fetch_text(base, MAX_PAGE_SIZE).await {
        Ok((_, html)) => {
            for link in find_feed_links(&html, base) {
                if let Some(title) = try_feed(verifier, &link).await {
                    result.feed_url = Some(link);
                    result.feed_title = title;
                    result.method = Some(ProbeMethod::LinkTag);
                    return result;
                }
            }
        }
        Err(e) => {
            tracing::debug!(url = %base, error = %e, "Homepage fetch failed, trying common paths");
        }
    }

    let quick = verifier.with_timeout(path_timeout.min(verifier.timeout()));
    for path in COMMON_FEED_PATHS {
        let url = format!("{base}{path}");
        if let Some(title) = try_feed(&quick, &url).await {
            result.feed_url = Some(url);
            result.feed_title = title;
            result.method = Some(ProbeMethod::CommonPath);
            return result;
        }
    }

    result
}

/// `Some(title)` if `url` serves a feed.
async fn try_feed(verifier: &Verifier, url: &str) -> Option<Option<String>> {
    match verifier.fetch_text(url, MAX_PAGE_SIZE).await {
        Ok((_, body)) if is_rss_or_atom(&body) => Some(extract_feed_title(&body)),
        _ => None,
    }
}

/// Every RSS/Atom `<link>` href in the page, resolved against `base_url`,
/// in page order.
///
/// Plain string scanning: attribute order and quote style do not matter,
/// and the tag name and type match case-insensitively.
pub fn find_feed_links(html: &str, base_url: &str) -> Vec<String> {
    // ASCII-only folding keeps byte offsets valid in `html`
    let html_lower = html.to_ascii_lowercase();
    let mut links = Vec::new();
    let mut search_from = 0;

    while let Some(link_start) = html_lower[search_from..].find("<link") {
        let abs_start = search_from + link_start;
        let Some(tag_len) = html_lower[abs_start..].find('>') else {
            break;
        };
        let tag = &html_lower[abs_start..=abs_start + tag_len];

        if tag.contains("application/rss+xml") || tag.contains("application/atom+xml") {
            // href case matters, read it from the original text
            let original = &html[abs_start..=abs_start + tag_len];
            if let Some(href) = attr_value(original, "href") {
                if let Some(resolved) = resolve_href(href, base_url) {
                    links.push(resolved);
                }
            }
        }

        search_from = abs_start + tag_len + 1;
    }

    links
}

/// Value of `name=` in a tag, quoted with either `"` or `'`.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let prefix = format!("{name}=");

    let mut from = 0;
    while let Some(pos) = lower[from..].find(&prefix) {
        let at = from + pos;
        from = at + prefix.len();
        // Skip matches inside longer names, e.g. `data-href=`
        let boundary = at == 0 || lower.as_bytes()[at - 1].is_ascii_whitespace();
        if !boundary {
            continue;
        }
        let rest = &tag[from..];
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let inner = &rest[1..];
        return inner.find(quote).map(|end| &inner[..end]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::build_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn verifier() -> Verifier {
        Verifier::new(build_client().unwrap(), Duration::from_secs(5))
    }

    #[test]
    fn test_find_links_any_attribute_order() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <link href="/feed.xml" type="application/rss+xml" rel="alternate">
            <LINK rel='alternate' type='application/atom+xml' href='https://cdn.example.com/Atom.xml'>
        </head></html>"#;
        assert_eq!(
            find_feed_links(html, "https://example.com"),
            vec![
                "https://example.com/feed.xml".to_owned(),
                "https://cdn.example.com/Atom.xml".to_owned(),
            ]
        );
    }

    #[test]
    fn test_find_links_after_non_ascii_text() {
        // U+0130 grows from 2 to 3 bytes under Unicode lowercasing
        let html = "<p>\u{130}stanbul</p><link rel=\"alternate\" type=\"application/rss+xml\" href=\"/feed.xml\">";
        assert_eq!(
            find_feed_links(html, "https://example.com"),
            vec!["https://example.com/feed.xml".to_owned()]
        );

        let html = "<link title=\"\u{130}\u{130}\" type=\"application/atom+xml\" href=\"/\u{130}.xml\">";
        assert_eq!(
            find_feed_links(html, "https://example.com").len(),
            1
        );
    }

    #[test]
    fn test_find_links_ignores_data_href() {
        let html = r#"<link data-href="/wrong" type="application/rss+xml" href="/right">"#;
        assert_eq!(
            find_feed_links(html, "https://example.com/"),
            vec!["https://example.com/right".to_owned()]
        );
    }

    #[test]
    fn test_find_links_none() {
        assert!(find_feed_links("<html><body>no feeds</body></html>", "https://example.com").is_empty());
        assert!(find_feed_links("<link type=\"application/rss+xml\"", "https://example.com").is_empty());
    }

    #[tokio::test]
    async fn test_probe_prefers_link_tag() {
        let server = MockServer::start().await;
        let html = r#"<html><head>
            <link rel="alternate" type="application/rss+xml" href="/broken.xml">
            <link rel="alternate" type="application/rss+xml" href="/posts/index.xml">
        </head></html>"#;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts/index.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<rss><channel><title>Posts</title></channel></rss>"),
            )
            .mount(&server)
            .await;

        let result = probe_homepage(&verifier(), &format!("{}/", server.uri()), COMMON_PATH_TIMEOUT).await;
        assert_eq!(result.method, Some(ProbeMethod::LinkTag));
        assert_eq!(
            result.feed_url,
            Some(format!("{}/posts/index.xml", server.uri()))
        );
        assert_eq!(result.feed_title.as_deref(), Some("Posts"));
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_common_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no links</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rss.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<feed xmlns=\"x\"></feed>"))
            .mount(&server)
            .await;

        let result = probe_homepage(&verifier(), &server.uri(), COMMON_PATH_TIMEOUT).await;
        assert_eq!(result.method, Some(ProbeMethod::CommonPath));
        assert_eq!(result.feed_url, Some(format!("{}/rss.xml", server.uri())));
        assert_eq!(result.feed_title, None);
    }

    #[tokio::test]
    async fn test_probe_unreachable_homepage_finds_nothing() {
        let result = probe_homepage(&verifier(), "http://127.0.0.1:9", COMMON_PATH_TIMEOUT).await;
        assert_eq!(result.feed_url, None);
        assert_eq!(result.method, None);
        assert_eq!(result.homepage, "http://127.0.0.1:9");
    }
}
