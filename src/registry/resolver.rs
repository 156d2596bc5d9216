use super::model::{Protocol, ResolvedFeed, Source, SourceType};
use crate::util::trim_trailing_slashes;

/// Path suffixes that mark a URL as a feed endpoint rather than a page.
/// Longer suffixes come first so `/feed.xml` wins over `/feed`.
const FEED_SUFFIXES: &[&str] = &[
    "/latest.rss",
    "/latest.atom",
    "/index.xml",
    "/feed.xml",
    "/rss.xml",
    "/atom.xml",
    "/feed",
    "/rss",
    "/atom",
];

/// Maps one registry source to a concrete feed.
///
/// Returns `None` when the field the source type depends on is missing
/// (`repo` for github, `url` for everything else). No I/O.
///
/// - github: `https://github.com/{org}/{repo}/releases.atom`
/// - forum / governance: Discourse-style `{base}/latest.rss`
/// - blog / security / research: the URL verbatim, with the human URL
///   guessed from its shape (see [`derive_html_url`])
pub fn resolve(protocol: &Protocol, source: &Source) -> Option<ResolvedFeed> {
    let (label, xml_url, html_url) = match source.kind {
        SourceType::Github => {
            let repo = source.repo?;
            let repo_name = repo.rsplit('/').next().unwrap_or(repo);
            (
                format!("{} - {} Releases", protocol.name, repo_name),
                format!("https://github.com/{repo}/releases.atom"),
                format!("https://github.com/{repo}/releases"),
            )
        }
        SourceType::Forum | SourceType::Governance => {
            let base = trim_trailing_slashes(source.url?);
            (
                format!("{} - {}", protocol.name, source.kind.label()),
                format!("{base}/latest.rss"),
                format!("{base}/latest"),
            )
        }
        SourceType::Blog | SourceType::Security | SourceType::Research => {
            let url = source.url?;
            (
                format!("{} - {}", protocol.name, source.kind.label()),
                url.to_owned(),
                derive_html_url(url, protocol.homepage),
            )
        }
    };

    Some(ResolvedFeed {
        protocol: protocol.name.to_owned(),
        source_type: source.kind,
        label,
        xml_url,
        html_url,
        category: protocol.category,
    })
}

/// Resolves every source of every protocol, in declaration order.
pub fn resolve_all(protocols: &[Protocol]) -> Vec<ResolvedFeed> {
    protocols
        .iter()
        .flat_map(|p| p.sources.iter().filter_map(move |s| resolve(p, s)))
        .collect()
}

/// Sources that cannot be resolved because their identifying field is
/// missing. These are the inputs for discovery.
pub fn find_unresolved(protocols: &[Protocol]) -> Vec<(&Protocol, &Source)> {
    protocols
        .iter()
        .flat_map(|p| {
            p.sources
                .iter()
                .filter(|s| !s.is_resolvable())
                .map(move |s| (p, s))
        })
        .collect()
}

/// Guesses the browsable page behind a feed URL.
///
/// Platform-hosted blogs (`medium.com/feed/<slug>`) drop the `/feed`
/// segment. Otherwise a known feed suffix is stripped from the end. When
/// neither applies the protocol homepage is used.
pub fn derive_html_url(feed_url: &str, homepage: &str) -> String {
    let cleaned = trim_trailing_slashes(feed_url);

    if let Some(idx) = cleaned.find("/feed/") {
        return format!("{}{}", &cleaned[..idx], &cleaned[idx + "/feed".len()..]);
    }

    let lower = cleaned.to_ascii_lowercase();
    for suffix in FEED_SUFFIXES {
        if lower.ends_with(suffix) {
            let stripped = &cleaned[..cleaned.len() - suffix.len()];
            if stripped.is_empty() {
                break;
            }
            return stripped.to_owned();
        }
    }

    homepage.to_owned()
}
