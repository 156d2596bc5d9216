//! The persisted feed list: an OPML document grouped by source type.
//!
//! Reading goes through `quick-xml` so attribute order and formatting do not
//! matter. Writing emits one `<outline>` per line; the dead-feed removal
//! pass relies on that layout to drop records by raw text match.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::prober::FeedTarget;
use crate::registry::{ResolvedFeed, SourceType};

/// SEC-003: Maximum allowed nesting depth for outline elements.
const MAX_OPML_DEPTH: usize = 50;

const DOCUMENT_TITLE: &str = "blockchain-signals";

#[derive(Debug, Error)]
pub enum OpmlError {
    /// SEC-003: OPML nesting depth exceeds safety limit.
    #[error("OPML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("Failed to access feed store: {0}")]
    Io(#[from] std::io::Error),
}

/// One feed record read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFeed {
    /// `title`, falling back to `text`, then to the feed URL.
    pub name: String,
    pub xml_url: String,
    pub html_url: Option<String>,
    /// `text` of the enclosing group outline; empty at top level.
    pub category: String,
}

impl FeedTarget for StoredFeed {
    fn feed_url(&self) -> &str {
        &self.xml_url
    }
}

/// Reads and parses the store at `path`.
///
/// # Errors
///
/// [`OpmlError::Io`] if the file cannot be read, [`OpmlError::XmlParse`] or
/// [`OpmlError::MaxDepthExceeded`] if it is not a usable OPML document.
/// Individual malformed records are skipped, not reported.
pub async fn load(path: &Path) -> Result<Vec<StoredFeed>, OpmlError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_opml(&content)
}

/// Parses OPML text into feed records, in document order.
///
/// Any `<outline>` carrying `xmlUrl` is a feed; any other outline opens a
/// group whose `text` becomes the category of the feeds inside it.
pub fn parse_opml(content: &str) -> Result<Vec<StoredFeed>, OpmlError> {
    // SEC-002: quick-xml never expands DTD entities; unknown entity references
    // fail to unescape and the affected record is skipped.
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut feeds = Vec::new();
    let mut groups: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                if groups.len() >= MAX_OPML_DEPTH {
                    return Err(OpmlError::MaxDepthExceeded(MAX_OPML_DEPTH));
                }
                let outline = read_outline(&e, &reader);
                match outline.xml_url {
                    Some(_) => {
                        // A feed outline with children: still a feed, and its
                        // children belong to the current group.
                        let category = current_group(&groups).to_owned();
                        feeds.extend(outline.into_feed(&category));
                        groups.push(category);
                    }
                    None => groups.push(outline.text.unwrap_or_default()),
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"outline" => {
                let outline = read_outline(&e, &reader);
                feeds.extend(outline.into_feed(current_group(&groups)));
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"outline" => {
                groups.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpmlError::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(feeds)
}

fn current_group(groups: &[String]) -> &str {
    groups.last().map(String::as_str).unwrap_or("")
}

#[derive(Default)]
struct Outline {
    text: Option<String>,
    title: Option<String>,
    xml_url: Option<String>,
    html_url: Option<String>,
    malformed: bool,
}

impl Outline {
    fn into_feed(self, category: &str) -> Option<StoredFeed> {
        let xml_url = self.xml_url?;
        if self.malformed || xml_url.trim().is_empty() {
            tracing::warn!(url = %xml_url, "Skipping malformed feed record");
            return None;
        }
        Some(StoredFeed {
            name: self.title.or(self.text).unwrap_or_else(|| xml_url.clone()),
            xml_url,
            html_url: self.html_url.filter(|u| !u.is_empty()),
            category: category.to_owned(),
        })
    }
}

fn read_outline(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Outline {
    let mut outline = Outline::default();

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed OPML attribute");
                outline.malformed = true;
                continue;
            }
        };
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(v) => v.into_owned(),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping undecodable OPML attribute");
                outline.malformed = true;
                continue;
            }
        };
        match attr.key.as_ref() {
            b"text" => outline.text = Some(value),
            b"title" => outline.title = Some(value),
            b"xmlUrl" => outline.xml_url = Some(value),
            b"htmlUrl" => outline.html_url = Some(value),
            _ => {}
        }
    }

    outline
}

/// Escapes the four characters that are reserved inside attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders resolved feeds as the store document.
///
/// Groups follow [`SourceType::ALL`] order, empty groups are omitted, and
/// feeds inside a group are sorted by label.
pub fn generate_opml(feeds: &[ResolvedFeed]) -> String {
    let mut grouped: BTreeMap<SourceType, Vec<&ResolvedFeed>> = BTreeMap::new();
    for feed in feeds {
        grouped.entry(feed.source_type).or_default().push(feed);
    }

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_owned(),
        r#"<opml version="1.0">"#.to_owned(),
        "  <head>".to_owned(),
        format!("    <title>{DOCUMENT_TITLE}</title>"),
        "  </head>".to_owned(),
        "  <body>".to_owned(),
    ];

    for kind in SourceType::ALL {
        let Some(group) = grouped.get_mut(&kind) else {
            continue;
        };
        group.sort_by(|a, b| a.label.cmp(&b.label));

        let heading = kind.label();
        lines.push(format!(r#"    <outline text="{heading}" title="{heading}">"#));
        for feed in group.iter() {
            let text = escape_xml(&feed.label);
            lines.push(format!(
                r#"      <outline text="{text}" title="{text}" type="rss" xmlUrl="{}" htmlUrl="{}"/>"#,
                escape_xml(&feed.xml_url),
                escape_xml(&feed.html_url),
            ));
        }
        lines.push("    </outline>".to_owned());
    }

    lines.push("  </body>".to_owned());
    lines.push("</opml>".to_owned());
    lines.push(String::new());
    lines.join("\n")
}

/// Result of [`remove_urls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub content: String,
    /// Display names of the dropped records, in document order.
    pub removed: Vec<String>,
}

/// Drops every line of the store text whose `xmlUrl` attribute is exactly
/// one of `urls` (compared in escaped form, as stored).
pub fn remove_urls(content: &str, urls: &[String]) -> Removal {
    let needles: Vec<(String, &str)> = urls
        .iter()
        .map(|u| (format!(r#"xmlUrl="{}""#, escape_xml(u)), u.as_str()))
        .collect();

    let mut removed = Vec::new();
    let kept: Vec<&str> = content
        .split('\n')
        .filter(|line| {
            let Some((_, url)) = needles.iter().find(|(n, _)| line.contains(n.as_str())) else {
                return true;
            };
            let name = match attribute_value(line, "text") {
                Some(raw) => quick_xml::escape::unescape(raw)
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| raw.to_owned()),
                None => (*url).to_owned(),
            };
            removed.push(name);
            false
        })
        .collect();

    Removal {
        content: kept.join("\n"),
        removed,
    }
}

/// Raw (still escaped) value of `name="..."` in a single line of markup.
fn attribute_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(r#" {name}=""#);
    let start = line.find(&pattern)? + pattern.len();
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

/// Replaces the file at `path` with `content` atomically.
///
/// Writes a sibling temp file, syncs it, then renames it over the target,
/// so readers never observe a partially written store.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), OpmlError> {
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    // SEC-009: unpredictable temp name, created exclusively
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{random_suffix:016x}"));

    let write = || -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        #[cfg(windows)]
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        std::fs::rename(&temp_path, path)
    };

    write().map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        tracing::warn!(path = %path.display(), error = %e, "Atomic write failed");
        OpmlError::Io(e)
    })
}
