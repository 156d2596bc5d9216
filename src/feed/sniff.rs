//! Lightweight feed recognition.
//!
//! These checks are plain substring scans, not an XML parse. The goal is a
//! fast liveness signal: a body that opens an `<rss` or `<feed` element is
//! accepted even if the rest of the document is malformed, and an HTML page
//! that happens to quote `<rss>` in a code sample is a false positive we
//! accept.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::util::clean_title;

/// Returns `true` if the body opens an RSS or Atom root element.
///
/// Matches `<rss` or `<feed` followed by whitespace or `>`; case-sensitive,
/// so `<feedburner:...>` and `<RSS>` do not count.
pub fn is_rss_or_atom(body: &str) -> bool {
    opens_element(body, "<rss") || opens_element(body, "<feed")
}

fn opens_element(body: &str, open: &str) -> bool {
    body.match_indices(open).any(|(idx, _)| {
        body[idx + open.len()..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c.is_whitespace())
    })
}

/// Text of the first `<tag>...</tag>` pair, if non-empty and free of `<`.
///
/// Only the exact opening tag without attributes is recognized, matching
/// what feeds emit for `<title>`, `<pubDate>` and `<updated>`.
fn first_element_text<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut rest = body;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let text_end = after.find('<').unwrap_or(after.len());
        let text = &after[..text_end];
        if !text.is_empty() && after[text_end..].starts_with(&close) {
            return Some(text);
        }
        rest = after;
    }
    None
}

/// The feed's title: the first `<title>` in the document, which for both
/// RSS and Atom is the channel/feed title.
pub fn extract_feed_title(body: &str) -> Option<String> {
    first_element_text(body, "title")
        .map(clean_title)
        .filter(|t| !t.is_empty())
}

/// Date of the most recent post as advertised by the feed.
///
/// Looks at the first RSS `<pubDate>`, then the first Atom `<updated>`.
/// An unparseable date counts as no date.
pub fn extract_last_post_date(body: &str) -> Option<DateTime<Utc>> {
    first_element_text(body, "pubDate")
        .and_then(parse_feed_date)
        .or_else(|| first_element_text(body, "updated").and_then(parse_feed_date))
}

/// Parses the date formats feeds use in practice: RFC 2822 (RSS), RFC 3339
/// (Atom), and a few sloppy variants of both.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // "Mon, 01 Jan 2024 00:00:00 UTC" and friends: chrono's RFC 2822 parser
    // only knows a fixed set of zone names.
    for zone in ["UTC", "Z"] {
        if let Some(naive) = s.strip_suffix(zone) {
            let naive = naive.trim_end();
            for fmt in ["%a, %d %b %Y %H:%M:%S", "%d %b %Y %H:%M:%S"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
                    return Some(dt.and_utc());
                }
            }
        }
    }

    // Atom timestamps missing their offset
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rss_and_atom_recognized() {
        assert!(is_rss_or_atom(r#"<?xml version="1.0"?><rss version="2.0"></rss>"#));
        assert!(is_rss_or_atom("<rss><channel></channel></rss>"));
        assert!(is_rss_or_atom("<feed\nxmlns=\"http://www.w3.org/2005/Atom\">"));
        assert!(is_rss_or_atom("<feed>"));
    }

    #[test]
    fn test_non_feeds_rejected() {
        assert!(!is_rss_or_atom("<html><body>Blog</body></html>"));
        assert!(!is_rss_or_atom("<feedburner:info uri=\"x\"/>"));
        assert!(!is_rss_or_atom("<RSS version=\"2.0\">"));
        assert!(!is_rss_or_atom("<rss"));
        assert!(!is_rss_or_atom(""));
    }

    #[test]
    fn test_later_match_counts() {
        assert!(is_rss_or_atom("<rssx> then <rss version=\"2.0\">"));
    }

    #[test]
    fn test_extract_title_first_occurrence() {
        let body = "<rss><channel><title> Ethereum Foundation Blog </title>\
                    <item><title>Post</title></item></channel></rss>";
        assert_eq!(
            extract_feed_title(body).as_deref(),
            Some("Ethereum Foundation Blog")
        );
    }

    #[test]
    fn test_extract_title_skips_cdata_and_attributes() {
        let body = "<feed><title type=\"text\">Typed</title>\
                    <title><![CDATA[Wrapped]]></title><title>Plain</title></feed>";
        assert_eq!(extract_feed_title(body).as_deref(), Some("Plain"));
        assert_eq!(extract_feed_title("<rss></rss>"), None);
    }

    #[test]
    fn test_extract_pub_date() {
        let body = "<rss><channel><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></channel></rss>";
        assert_eq!(
            extract_last_post_date(body),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_extract_atom_updated() {
        let body = "<feed><updated>2023-06-15T12:30:00+02:00</updated></feed>";
        assert_eq!(
            extract_last_post_date(body),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_pub_date_preferred_over_updated() {
        let body = "<feed><updated>2020-01-01T00:00:00Z</updated>\
                    <pubDate>Tue, 02 Jan 2024 00:00:00 +0000</pubDate></feed>";
        assert_eq!(
            extract_last_post_date(body),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_pub_date_falls_through_to_updated() {
        let body = "<pubDate>sometime last week</pubDate><updated>2022-03-04T05:06:07Z</updated>";
        assert_eq!(
            extract_last_post_date(body),
            Some(Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap())
        );
    }

    #[test]
    fn test_invalid_dates_are_absent() {
        assert_eq!(extract_last_post_date("<pubDate>soon</pubDate>"), None);
        assert_eq!(extract_last_post_date("<rss></rss>"), None);
    }

    #[test]
    fn test_parse_feed_date_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for raw in [
            "Mon, 01 Jan 2024 00:00:00 GMT",
            "Mon, 01 Jan 2024 00:00:00 UTC",
            "Mon, 01 Jan 2024 01:00:00 +0100",
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00.000Z",
            "2024-01-01T00:00:00",
        ] {
            assert_eq!(parse_feed_date(raw), Some(expected), "{raw}");
        }
    }
}
