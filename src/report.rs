//! Markdown reports printed on stdout.

use chrono::NaiveDate;
use std::borrow::Cow;

use crate::discovery::DiscoveredFeed;
use crate::feed::{FeedResult, Status, StoredFeed, VerifyResult};
use crate::reconcile::DiffResult;
use crate::registry::ResolvedFeed;

/// Escapes a value for a markdown table cell.
pub fn cell(value: &str) -> Cow<'_, str> {
    if value.contains(['|', '\n', '\r']) {
        Cow::Owned(
            value
                .replace('|', "\\|")
                .replace(['\n', '\r'], " "),
        )
    } else {
        Cow::Borrowed(value)
    }
}

/// Health report: totals per status, then one table per non-empty status,
/// worst first.
pub fn health_report(results: &[FeedResult<StoredFeed>], date: NaiveDate) -> String {
    let mut lines = vec![
        "# Feed Health Check Report".to_owned(),
        String::new(),
        format!("**Date**: {date}"),
        format!("**Total feeds**: {}", results.len()),
        String::new(),
        "| Status | Count |".to_owned(),
        "|--------|-------|".to_owned(),
    ];
    for status in Status::ALL {
        let count = results.iter().filter(|r| r.status == status).count();
        lines.push(format!("| {} | {count} |", title_case(status.as_str())));
    }
    lines.push(String::new());

    for status in [Status::Dead, Status::Invalid, Status::Stale, Status::Healthy] {
        let group: Vec<_> = results.iter().filter(|r| r.status == status).collect();
        if group.is_empty() {
            continue;
        }
        let (heading, column) = match status {
            Status::Dead => ("Dead Feeds", "Error"),
            Status::Invalid => ("Invalid Feeds (not RSS/Atom)", "HTTP Status"),
            Status::Stale => ("Stale Feeds (>6 months)", "Last Post"),
            Status::Healthy => ("Healthy Feeds", "Last Post"),
        };
        lines.push(format!("## {heading}"));
        lines.push(String::new());
        lines.push(format!("| Feed | Category | {column} |"));
        lines.push(format!("|------|----------|{}|", "-".repeat(column.len() + 2)));
        for r in group {
            let detail = match status {
                Status::Dead => r.error.clone().unwrap_or_else(|| "unknown".to_owned()),
                Status::Invalid => r
                    .http_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_owned()),
                Status::Stale => r.last_post_date().unwrap_or_else(|| "unknown".to_owned()),
                Status::Healthy => r
                    .last_post_date()
                    .unwrap_or_else(|| "date unknown".to_owned()),
            };
            lines.push(format!(
                "| {} | {} | {} |",
                cell(&r.feed.name),
                cell(&r.feed.category),
                cell(&detail)
            ));
        }
        lines.push(String::new());
    }

    finish(lines)
}

/// Registry-vs-store report for `sync`. `failures` lists registry feeds
/// that did not verify; it is empty when verification was skipped.
pub fn diff_report(
    diff: &DiffResult,
    failures: &[(ResolvedFeed, VerifyResult)],
    verified: bool,
    date: NaiveDate,
) -> String {
    let mut lines = vec![
        "# Registry Sync Report".to_owned(),
        String::new(),
        format!("**Date**: {date}"),
        format!("**Added**: {}", diff.added.len()),
        format!("**Removed**: {}", diff.removed.len()),
        format!("**Unchanged**: {}", diff.unchanged),
    ];
    if verified {
        lines.push(format!("**Failed verification**: {}", failures.len()));
    }
    lines.push(String::new());

    if !diff.added.is_empty() {
        lines.extend(table_head("Added", "| Feed | Type | URL |", "|------|------|-----|"));
        for feed in &diff.added {
            lines.push(format!(
                "| {} | {} | {} |",
                cell(&feed.label),
                feed.source_type,
                cell(&feed.xml_url)
            ));
        }
        lines.push(String::new());
    }

    if !diff.removed.is_empty() {
        lines.extend(table_head("Removed", "| Feed | URL |", "|------|-----|"));
        for feed in &diff.removed {
            lines.push(format!("| {} | {} |", cell(&feed.name), cell(&feed.xml_url)));
        }
        lines.push(String::new());
    }

    if !failures.is_empty() {
        lines.extend(table_head(
            "Failed Verification",
            "| Feed | URL | Error |",
            "|------|-----|-------|",
        ));
        for (feed, result) in failures {
            let error = result
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            lines.push(format!(
                "| {} | {} | {} |",
                cell(&feed.label),
                cell(&feed.xml_url),
                cell(&error)
            ));
        }
        lines.push(String::new());
    }

    if !diff.has_changes() && failures.is_empty() {
        lines.push("Store is up to date with the registry.".to_owned());
        lines.push(String::new());
    }

    finish(lines)
}

pub fn discovery_report(found: &[DiscoveredFeed], date: NaiveDate) -> String {
    let mut lines = vec![
        "# Feed Discovery Report".to_owned(),
        String::new(),
        format!("**Date**: {date}"),
        format!("**Verified feeds**: {}", found.len()),
        String::new(),
    ];

    if found.is_empty() {
        lines.push("No new feeds found this week.".to_owned());
        lines.push(String::new());
        return finish(lines);
    }

    lines.push("| # | Feed | URL | Found via |".to_owned());
    lines.push("|---|------|-----|-----------|".to_owned());
    for (i, feed) in found.iter().enumerate() {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            i + 1,
            cell(&feed.name),
            cell(&feed.url),
            cell(&feed.found_via)
        ));
    }
    lines.push(String::new());
    finish(lines)
}

fn table_head(heading: &str, columns: &str, rule: &str) -> [String; 4] {
    [
        format!("## {heading}"),
        String::new(),
        columns.to_owned(),
        rule.to_owned(),
    ]
}

/// Every line ends with a newline, including the last.
fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
