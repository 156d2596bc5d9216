use chrono::{DateTime, Utc};
use std::fmt;

use super::verifier::{VerifyError, VerifyResult};

/// A feed whose newest post is older than this is stale.
///
/// Six 30-day months, not calendar months: the boundary must not move with
/// the month lengths of the current date.
pub const STALE_THRESHOLD_MS: i64 = 6 * 30 * 24 * 60 * 60 * 1000;

/// Health of a feed after one probing pass, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    /// Unreachable, timed out, or a non-2xx response.
    Dead,
    /// Reachable, but the body is not RSS/Atom.
    Invalid,
    /// Valid feed whose last post is older than [`STALE_THRESHOLD_MS`].
    Stale,
    /// Valid feed that is recent or carries no parseable date.
    Healthy,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Healthy, Status::Stale, Status::Invalid, Status::Dead];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Healthy => "healthy",
            Status::Stale => "stale",
            Status::Invalid => "invalid",
            Status::Dead => "dead",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns exactly one status: dead > invalid > stale > healthy.
///
/// A missing last-post date is not evidence of staleness.
pub fn classify(result: &VerifyResult, now: DateTime<Utc>) -> Status {
    match &result.error {
        Some(VerifyError::NotAFeed) => Status::Invalid,
        Some(_) => Status::Dead,
        None => match result.last_post {
            Some(last) if (now - last).num_milliseconds() > STALE_THRESHOLD_MS => Status::Stale,
            _ => Status::Healthy,
        },
    }
}

/// A feed together with its classification and the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResult<F> {
    pub feed: F,
    pub status: Status,
    pub http_status: Option<u16>,
    pub last_post: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl<F> FeedResult<F> {
    pub fn from_verify(feed: F, result: &VerifyResult, now: DateTime<Utc>) -> Self {
        Self {
            feed,
            status: classify(result, now),
            http_status: result.http_status,
            last_post: result.last_post,
            error: result.error.as_ref().map(ToString::to_string),
        }
    }

    /// Last post as `YYYY-MM-DD`.
    pub fn last_post_date(&self) -> Option<String> {
        self.last_post.map(|d| d.format("%Y-%m-%d").to_string())
    }
}
