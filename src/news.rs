// src/news.rs
//! Input shapes produced by the collection pipeline: keyword groups of titles.

use serde::{Deserialize, Serialize};

/// Where a group of items came from. Decided by the list a group arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Hotlist,
    Rss,
}

impl SourceKind {
    /// Label used when an item carries no source name.
    pub fn default_source_name(self) -> &'static str {
        match self {
            SourceKind::Hotlist => "Hotlist",
            SourceKind::Rss => "RSS",
        }
    }

    pub fn section_heading(self) -> &'static str {
        match self {
            SourceKind::Hotlist => "### Trending hot lists",
            SourceKind::Rss => "### RSS highlights (research-augmented)",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_name: Option<String>,
}

impl NewsItem {
    pub fn new(title: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_name: Some(source_name.into()),
        }
    }

    pub fn source_or(&self, kind: SourceKind) -> &str {
        self.source_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(kind.default_source_name())
    }
}

/// Items matched by one keyword (hot lists) or collected from one feed (RSS).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsGroup {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub titles: Vec<NewsItem>,
}

impl NewsGroup {
    pub fn new(word: impl Into<String>, titles: Vec<NewsItem>) -> Self {
        Self {
            word: word.into(),
            titles,
        }
    }
}

/// Total item count across groups, blank titles included.
pub fn total_items(groups: &[NewsGroup]) -> usize {
    groups.iter().map(|g| g.titles.len()).sum()
}
