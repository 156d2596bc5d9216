use std::fmt;

/// Kind of publication a [`Source`] points at.
///
/// The variant decides which field of the source is required and how the
/// feed URL is derived from it (see [`crate::registry::resolve`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceType {
    Blog,
    Github,
    Forum,
    Governance,
    Security,
    Research,
}

impl SourceType {
    /// Fixed grouping order used when the store document is written.
    pub const ALL: [SourceType; 6] = [
        SourceType::Blog,
        SourceType::Github,
        SourceType::Forum,
        SourceType::Governance,
        SourceType::Security,
        SourceType::Research,
    ];

    /// Human label: the store group heading, and the suffix of non-github
    /// feed labels ("Ethereum - Blog").
    pub fn label(self) -> &'static str {
        match self {
            SourceType::Blog => "Blog",
            SourceType::Github => "Releases",
            SourceType::Forum => "Forum",
            SourceType::Governance => "Governance",
            SourceType::Security => "Security",
            SourceType::Research => "Research",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Blog => "blog",
            SourceType::Github => "github",
            SourceType::Forum => "forum",
            SourceType::Governance => "governance",
            SourceType::Security => "security",
            SourceType::Research => "research",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market segment a protocol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    L1,
    L2,
    DeFi,
    Infrastructure,
    Privacy,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::L1 => "L1",
            Category::L2 => "L2",
            Category::DeFi => "DeFi",
            Category::Infrastructure => "Infrastructure",
            Category::Privacy => "Privacy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One publication channel of a protocol.
///
/// A github source is identified by `repo` (`"org/repo"`), every other type
/// by `url`. A source missing its identifying field is a placeholder that
/// discovery is expected to fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub kind: SourceType,
    pub url: Option<&'static str>,
    pub repo: Option<&'static str>,
}

impl Source {
    pub const fn url(kind: SourceType, url: &'static str) -> Self {
        Self {
            kind,
            url: Some(url),
            repo: None,
        }
    }

    pub const fn github(repo: &'static str) -> Self {
        Self {
            kind: SourceType::Github,
            url: None,
            repo: Some(repo),
        }
    }

    /// A source whose location is not known yet.
    pub const fn unknown(kind: SourceType) -> Self {
        Self {
            kind,
            url: None,
            repo: None,
        }
    }

    /// Whether the field this source type depends on is present.
    pub fn is_resolvable(&self) -> bool {
        match self.kind {
            SourceType::Github => self.repo.is_some(),
            _ => self.url.is_some(),
        }
    }
}

/// A tracked project. Registry entries are static and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protocol {
    pub name: &'static str,
    pub slug: &'static str,
    pub homepage: &'static str,
    pub category: Category,
    pub sources: &'static [Source],
}

/// A concrete feed derived from a `(Protocol, Source)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFeed {
    pub protocol: String,
    pub source_type: SourceType,
    /// "{protocol} - {TypeLabel}" or "{protocol} - {repo} Releases"
    pub label: String,
    pub xml_url: String,
    pub html_url: String,
    pub category: Category,
}
