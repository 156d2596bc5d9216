//! Diff of the registry's resolved feeds against the persisted store.
//!
//! Identity is the normalized feed URL only; labels and categories never
//! make two feeds different.

use std::collections::HashSet;
use std::path::Path;

use crate::feed::{self, StoredFeed};
use crate::registry::ResolvedFeed;
use crate::util::normalize_feed_url;

/// A persisted feed with no counterpart in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedFeed {
    pub name: String,
    pub xml_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Resolved feeds missing from the store, in registry order.
    pub added: Vec<ResolvedFeed>,
    /// Stored feeds missing from the registry, in store order.
    pub removed: Vec<RemovedFeed>,
    pub unchanged: usize,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

pub fn diff(resolved: &[ResolvedFeed], persisted: &[StoredFeed]) -> DiffResult {
    let persisted_urls: HashSet<String> = persisted
        .iter()
        .map(|f| normalize_feed_url(&f.xml_url))
        .collect();
    let resolved_urls: HashSet<String> = resolved
        .iter()
        .map(|f| normalize_feed_url(&f.xml_url))
        .collect();

    let mut result = DiffResult::default();
    for feed in resolved {
        if persisted_urls.contains(&normalize_feed_url(&feed.xml_url)) {
            result.unchanged += 1;
        } else {
            result.added.push(feed.clone());
        }
    }
    result.removed = persisted
        .iter()
        .filter(|f| !resolved_urls.contains(&normalize_feed_url(&f.xml_url)))
        .map(|f| RemovedFeed {
            name: f.name.clone(),
            xml_url: f.xml_url.clone(),
        })
        .collect();

    result
}

/// Diffs against the store at `path`.
///
/// An unreadable or corrupt store counts as empty: everything resolved is
/// reported as added and nothing as removed.
pub async fn diff_against_store(resolved: &[ResolvedFeed], path: &Path) -> DiffResult {
    let persisted = match feed::load(path).await {
        Ok(feeds) => feeds,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read feed store, treating it as empty");
            Vec::new()
        }
    };
    diff(resolved, &persisted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Category, SourceType};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn resolved(url: &str) -> ResolvedFeed {
        ResolvedFeed {
            protocol: "Ethereum".to_owned(),
            source_type: SourceType::Blog,
            label: format!("Ethereum - {url}"),
            xml_url: url.to_owned(),
            html_url: "https://ethereum.org".to_owned(),
            category: Category::L1,
        }
    }

    fn stored(url: &str) -> StoredFeed {
        StoredFeed {
            name: format!("stored {url}"),
            xml_url: url.to_owned(),
            html_url: None,
            category: "Blog".to_owned(),
        }
    }

    #[test]
    fn test_added_removed_unchanged() {
        let current = vec![
            resolved("https://a.example/feed"),
            resolved("https://b.example/feed"),
            resolved("https://c.example/feed"),
        ];
        let persisted = vec![
            stored("https://z.example/feed"),
            stored("https://B.example/feed/"),
            stored("https://y.example/feed"),
        ];

        let result = diff(&current, &persisted);
        assert_eq!(
            result.added.iter().map(|f| f.xml_url.as_str()).collect::<Vec<_>>(),
            vec!["https://a.example/feed", "https://c.example/feed"]
        );
        assert_eq!(
            result.removed,
            vec![
                RemovedFeed {
                    name: "stored https://z.example/feed".to_owned(),
                    xml_url: "https://z.example/feed".to_owned(),
                },
                RemovedFeed {
                    name: "stored https://y.example/feed".to_owned(),
                    xml_url: "https://y.example/feed".to_owned(),
                },
            ]
        );
        assert_eq!(result.unchanged, 1);
        assert!(result.has_changes());
    }

    #[test]
    fn test_labels_do_not_affect_identity() {
        let mut feed = resolved("https://a.example/feed");
        feed.label = "Renamed".to_owned();
        feed.category = Category::DeFi;
        let result = diff(&[feed], &[stored("https://a.example/feed")]);
        assert_eq!(result.unchanged, 1);
        assert!(!result.has_changes());
    }

    #[test]
    fn test_empty_store_adds_everything() {
        let current = vec![resolved("https://a.example/feed")];
        let result = diff(&current, &[]);
        assert_eq!(result.added, current);
        assert!(result.removed.is_empty());
        assert_eq!(result.unchanged, 0);
    }

    #[tokio::test]
    async fn test_missing_store_degrades_to_empty() {
        let path = std::env::temp_dir().join("chainfeeds_reconcile_missing_store.opml");
        let _ = std::fs::remove_file(&path);

        let current = vec![resolved("https://a.example/feed")];
        let result = diff_against_store(&current, &path).await;
        assert_eq!(result.added, current);
        assert!(result.removed.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_store_degrades_to_empty() {
        let path = std::env::temp_dir().join("chainfeeds_reconcile_corrupt_store.opml");
        std::fs::write(&path, "<opml><body><outline text=\"x\"></body>").unwrap();

        let current = vec![resolved("https://a.example/feed")];
        let result = diff_against_store(&current, &path).await;
        assert_eq!(result.added.len(), 1);
        assert!(result.removed.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    fn feed_url() -> impl Strategy<Value = String> {
        "[a-z]{1,8}\\.(com|org|io)/[a-z0-9/]{0,12}".prop_map(|s| format!("https://{s}"))
    }

    proptest! {
        #[test]
        fn diff_of_same_set_is_idempotent(
            urls in prop::collection::hash_set(feed_url(), 0..20),
            slashes in 0usize..3,
        ) {
            let current: Vec<ResolvedFeed> = urls.iter().map(|u| resolved(u)).collect();
            // Same set, stored with different casing and trailing slashes
            let persisted: Vec<StoredFeed> = urls
                .iter()
                .map(|u| stored(&format!("{}{}", u.to_uppercase(), "/".repeat(slashes))))
                .collect();

            let result = diff(&current, &persisted);
            prop_assert!(result.added.is_empty());
            prop_assert!(result.removed.is_empty());
            prop_assert_eq!(result.unchanged, current.len());
        }

        #[test]
        fn diff_partitions_resolved_feeds(
            current in prop::collection::vec(feed_url(), 0..15),
            persisted in prop::collection::vec(feed_url(), 0..15),
        ) {
            let current: Vec<ResolvedFeed> = current.iter().map(|u| resolved(u)).collect();
            let persisted: Vec<StoredFeed> = persisted.iter().map(|u| stored(u)).collect();
            let result = diff(&current, &persisted);
            prop_assert_eq!(result.added.len() + result.unchanged, current.len());
        }
    }
}
