use std::collections::HashSet;

use super::search::SearchHit;
use crate::feed::StoredFeed;
use crate::util::{hostname, normalize_feed_url, origin, validate_candidate_url};

/// Paths tried under the origin of every search hit.
pub const GUESSED_FEED_PATHS: &[&str] = &["/feed", "/rss", "/feed.xml", "/rss.xml", "/atom.xml"];

/// A URL worth verifying, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// Title of the search hit that produced it.
    pub hit_title: String,
    pub query: String,
}

/// Returns `url` if it already looks like a feed address.
pub fn extract_feed_url(url: &str) -> Option<&str> {
    let lower = url.to_ascii_lowercase();
    let suffix = [".xml", ".atom", ".rss"].iter().any(|s| lower.ends_with(s));
    let segment = ["/feed", "/rss", "/atom"].iter().any(|s| has_segment(&lower, s));
    (suffix || segment).then_some(url)
}

/// `needle` occurs followed by `/` or the end of the string.
fn has_segment(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let rest = &haystack[at + needle.len()..];
        rest.is_empty() || rest.starts_with('/')
    })
}

/// URLs to try for one search hit, in preference order.
pub fn candidate_urls(hit_url: &str) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(feed_url) = extract_feed_url(hit_url) {
        urls.push(feed_url.to_owned());
    }
    if let Some(base) = origin(hit_url) {
        urls.extend(GUESSED_FEED_PATHS.iter().map(|p| format!("{base}{p}")));
    }
    urls
}

/// Accumulates at most one candidate per hostname.
///
/// Hosts that already appear in the store are never proposed again, and
/// the first candidate seen for a host wins.
#[derive(Debug, Default)]
pub struct CandidateCollector {
    seen_hosts: HashSet<String>,
    existing_urls: HashSet<String>,
    candidates: Vec<Candidate>,
    allow_private_hosts: bool,
}

impl CandidateCollector {
    pub fn new(existing: &[StoredFeed]) -> Self {
        Self {
            seen_hosts: existing.iter().filter_map(|f| hostname(&f.xml_url)).collect(),
            existing_urls: existing
                .iter()
                .map(|f| normalize_feed_url(&f.xml_url))
                .collect(),
            ..Self::default()
        }
    }

    /// Skips the public-host check. Only for probing local test servers.
    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    /// Marks a host as taken, e.g. after a homepage probe found its feed.
    pub fn claim_host(&mut self, url: &str) -> bool {
        match hostname(url) {
            Some(host) => self.seen_hosts.insert(host),
            None => false,
        }
    }

    /// Whether `url` (normalized) is already in the store.
    pub fn is_known(&self, url: &str) -> bool {
        self.existing_urls.contains(&normalize_feed_url(url))
    }

    /// Adds the first acceptable candidate URL of a hit. Returns whether one
    /// was added.
    pub fn add_hit(&mut self, hit: &SearchHit, query: &str) -> bool {
        for url in candidate_urls(&hit.url) {
            if !self.allow_private_hosts {
                if let Err(e) = validate_candidate_url(&url) {
                    tracing::debug!(url = %url, error = %e, "Rejected candidate URL");
                    continue;
                }
            }
            let Some(host) = hostname(&url) else {
                continue;
            };
            if self.seen_hosts.contains(&host) || self.is_known(&url) {
                continue;
            }

            self.seen_hosts.insert(host);
            self.candidates.push(Candidate {
                url,
                hit_title: hit.title.clone(),
                query: query.to_owned(),
            });
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}
