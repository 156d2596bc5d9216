use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::health::FeedResult;
use super::verifier::{VerifyResult, Verifier};
use crate::registry::ResolvedFeed;

/// Upper bound on simultaneous outbound fetches.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Anything that can be probed: it has a feed URL.
pub trait FeedTarget {
    fn feed_url(&self) -> &str;
}

impl FeedTarget for ResolvedFeed {
    fn feed_url(&self) -> &str {
        &self.xml_url
    }
}

impl FeedTarget for String {
    fn feed_url(&self) -> &str {
        self
    }
}

/// Runs `probe` over every item with at most `concurrency` in flight.
///
/// Every input yields exactly one output. Outputs arrive in completion
/// order, so callers must carry the item inside `R` if they need the
/// association. A failing probe does not affect its siblings; failures are
/// values of `R`, not panics.
pub async fn probe_all<T, R, F, Fut>(items: Vec<T>, concurrency: usize, probe: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = concurrency.clamp(1, total);
    let completed = AtomicUsize::new(0);
    let completed = &completed;

    stream::iter(items)
        .map(|item| {
            let pending = probe(item);
            async move {
                let out = pending.await;
                let done = completed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                tracing::debug!(done = done, total = total, "Probe finished");
                out
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await
}

/// Verifies every feed, retrying once on rate limiting.
pub async fn verify_all<F: FeedTarget>(
    verifier: &Verifier,
    feeds: Vec<F>,
    concurrency: usize,
) -> Vec<(F, VerifyResult)> {
    probe_all(feeds, concurrency, |feed| async move {
        let result = verifier.verify_with_retry(feed.feed_url()).await;
        (feed, result)
    })
    .await
}

/// Verifies and classifies every feed against the current time.
pub async fn check_all<F: FeedTarget>(
    verifier: &Verifier,
    feeds: Vec<F>,
    concurrency: usize,
) -> Vec<FeedResult<F>> {
    tracing::info!(feeds = feeds.len(), concurrency = concurrency, "Checking feeds");
    let verified = verify_all(verifier, feeds, concurrency).await;
    let now = Utc::now();
    verified
        .into_iter()
        .map(|(feed, result)| FeedResult::from_verify(feed, &result, now))
        .collect()
}
