//! Feed probing, health classification and the OPML store.
//!
//! - [`verifier`]: one HTTP fetch per URL, sniffed for RSS/Atom
//! - [`health`]: maps a verification onto dead / invalid / stale / healthy
//! - [`prober`]: bounded-concurrency fan-out over many feeds
//! - [`homepage`]: finds the feed behind a website
//! - [`opml`]: reads, generates and edits the persisted feed list
//!
//! ```ignore
//! use chainfeeds::feed::{build_client, check_all, Verifier, CHECK_TIMEOUT};
//!
//! let verifier = Verifier::new(build_client()?, CHECK_TIMEOUT);
//! let results = check_all(&verifier, feeds, 5).await;
//! ```

mod health;
mod homepage;
mod opml;
mod prober;
mod sniff;
mod verifier;

pub use health::{classify, FeedResult, Status, STALE_THRESHOLD_MS};
pub use homepage::{
    find_feed_links, probe_homepage, ProbeMethod, ProbeResult, COMMON_FEED_PATHS,
    COMMON_PATH_TIMEOUT,
};
pub use opml::{
    escape_xml, generate_opml, load, parse_opml, remove_urls, write_atomic, OpmlError, Removal,
    StoredFeed,
};
pub use prober::{check_all, probe_all, verify_all, FeedTarget, DEFAULT_CONCURRENCY};
pub use sniff::{extract_feed_title, extract_last_post_date, is_rss_or_atom, parse_feed_date};
pub use verifier::{
    build_client, VerifyError, VerifyResult, Verifier, CHECK_TIMEOUT, DISCOVERY_TIMEOUT,
    RATE_LIMIT_BACKOFF, USER_AGENT,
};
