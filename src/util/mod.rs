//! Shared helpers.
//!
//! - **URL handling**: feed-URL normalization, host/origin extraction and
//!   relative link resolution
//! - **URL validation**: SSRF guard for URLs found during discovery
//! - **Text**: sanitizing titles scraped from remote documents

mod feed_url;
mod text;
mod url_validator;

pub use feed_url::{hostname, normalize_feed_url, origin, resolve_href, trim_trailing_slashes};
pub use text::{clean_title, strip_control_chars};
pub use url_validator::{validate_candidate_url, CandidateUrlError};
