//! Finding feeds that are not in the store yet.
//!
//! Two sources of leads:
//!
//! - homepages of registry protocols with unresolved sources, probed
//!   directly (see [`crate::feed::probe_homepage`])
//! - web search hits, turned into one candidate URL per host and verified
//!   through the bounded prober

mod candidates;
mod search;

pub use candidates::{
    candidate_urls, extract_feed_url, Candidate, CandidateCollector, GUESSED_FEED_PATHS,
};
pub use search::{BraveSearch, SearchError, SearchHit, SearchProvider, PAGE_SIZE};

use std::collections::BTreeSet;
use std::time::Duration;

use crate::feed::{
    probe_all, probe_homepage, StoredFeed, Verifier, COMMON_PATH_TIMEOUT, DEFAULT_CONCURRENCY,
};
use crate::registry::{Protocol, Source};

/// Queries run on every discovery pass.
pub const DEFAULT_QUERIES: &[&str] = &[
    "blockchain protocol blog RSS feed",
    "crypto security research RSS atom feed",
    "ethereum L2 rollup blog RSS feed",
    "web3 developer tooling blog RSS feed",
    "DeFi protocol engineering blog RSS",
];

/// Pause between consecutive search queries.
pub const QUERY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub queries: Vec<String>,
    pub concurrency: usize,
    pub query_delay: Duration,
    pub homepage_path_timeout: Duration,
    /// Accept candidates on loopback/private hosts.
    pub allow_private_hosts: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| (*q).to_owned()).collect(),
            concurrency: DEFAULT_CONCURRENCY,
            query_delay: QUERY_DELAY,
            homepage_path_timeout: COMMON_PATH_TIMEOUT,
            allow_private_hosts: false,
        }
    }
}

/// A verified feed that is not in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFeed {
    /// Feed title, falling back to the search hit title, then the URL.
    pub name: String,
    pub url: String,
    /// The search query or homepage that led to it.
    pub found_via: String,
}

/// Query targeting one unresolved registry source.
pub fn source_query(protocol: &Protocol, source: &Source) -> String {
    format!("{} {} RSS feed", protocol.name, source.kind.label())
}

/// Runs a full discovery pass.
///
/// Homepages of `unresolved` protocols are probed first; their feeds claim
/// the host. Then every query (the configured ones plus one per unresolved
/// source) is searched in turn, and the candidates are verified with at
/// most `options.concurrency` requests in flight. Only candidates serving
/// RSS/Atom are returned.
pub async fn discover<S: SearchProvider>(
    search: &S,
    verifier: &Verifier,
    existing: &[StoredFeed],
    unresolved: &[(&Protocol, &Source)],
    options: &DiscoveryOptions,
) -> Vec<DiscoveredFeed> {
    let mut collector =
        CandidateCollector::new(existing).allow_private_hosts(options.allow_private_hosts);
    let mut found = Vec::new();

    let homepages: BTreeSet<&'static str> = unresolved.iter().map(|(p, _)| p.homepage).collect();
    if !homepages.is_empty() {
        tracing::info!(homepages = homepages.len(), "Probing homepages of unresolved protocols");
    }
    let probes = probe_all(
        homepages.into_iter().collect(),
        options.concurrency,
        |homepage| probe_homepage(verifier, homepage, options.homepage_path_timeout),
    )
    .await;
    for probe in probes {
        let Some(url) = probe.feed_url else {
            continue;
        };
        if collector.is_known(&url) || !collector.claim_host(&url) {
            continue;
        }
        found.push(DiscoveredFeed {
            name: probe.feed_title.unwrap_or_else(|| url.clone()),
            found_via: match probe.method {
                Some(method) => format!("{} ({method})", probe.homepage),
                None => probe.homepage,
            },
            url,
        });
    }

    let queries: Vec<String> = options
        .queries
        .iter()
        .cloned()
        .chain(unresolved.iter().map(|(p, s)| source_query(p, s)))
        .collect();

    for (i, query) in queries.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(options.query_delay).await;
        }
        let hits = search.search(query).await;
        let before = collector.len();
        for hit in &hits {
            collector.add_hit(hit, query);
        }
        tracing::info!(
            query = %query,
            hits = hits.len(),
            candidates = collector.len() - before,
            "Searched"
        );
    }

    let candidates = collector.into_candidates();
    tracing::info!(candidates = candidates.len(), "Verifying candidate URLs");

    let mut verified = probe_all(
        candidates.into_iter().enumerate().collect(),
        options.concurrency,
        |(index, candidate)| async move {
            let result = verifier.verify_with_retry(&candidate.url).await;
            (index, candidate, result)
        },
    )
    .await;
    // Report in search order rather than completion order
    verified.sort_by_key(|(index, _, _)| *index);

    found.extend(
        verified
            .into_iter()
            .filter(|(_, _, result)| result.is_ok())
            .map(|(_, candidate, result)| DiscoveredFeed {
                name: result
                    .title
                    .or_else(|| Some(candidate.hit_title).filter(|t| !t.trim().is_empty()))
                    .unwrap_or_else(|| candidate.url.clone()),
                url: candidate.url,
                found_via: candidate.query,
            }),
    );

    tracing::info!(feeds = found.len(), "Discovery finished");
    found
}
