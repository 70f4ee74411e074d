// src/analyze/aggregate.rs
//! Builds the capped news block fed to the prompt.
//!
//! Order: RSS groups first (higher editorial value), then hot-list groups,
//! stopping as soon as `max_news` items are included. Research calls are
//! issued one at a time while walking.

use tracing::debug;

use crate::news::{total_items, NewsGroup, NewsItem, SourceKind};
use crate::research::ResearchClient;
use crate::text::{anon_hash, collapse_whitespace};

const RESEARCH_PREFIX: &str = "  └─ [Background]: ";

/// Rendered news lines plus the counters reported back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBlock {
    pub lines: Vec<String>,
    pub hotlist_total: usize,
    pub rss_total: usize,
    pub included: usize,
}

impl ContentBlock {
    pub fn is_empty(&self) -> bool {
        self.included == 0
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    fn start_section(&mut self, kind: SourceKind) {
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.push(kind.section_heading().to_string());
    }

    fn push_item(&mut self, kind: SourceKind, item: &NewsItem, research: Option<String>) {
        self.lines
            .push(format!("- [{}] {}", item.source_or(kind), item.title.trim()));
        // One background line per item, whatever the research text looks like.
        if let Some(extra) = research.map(|r| collapse_whitespace(&r)) {
            if !extra.is_empty() {
                self.lines.push(format!("{RESEARCH_PREFIX}{extra}"));
            }
        }
        self.included += 1;
    }
}

pub struct ContentAggregator<'a> {
    research: &'a ResearchClient,
    include_rss: bool,
}

impl<'a> ContentAggregator<'a> {
    pub fn new(research: &'a ResearchClient, include_rss: bool) -> Self {
        Self {
            research,
            include_rss,
        }
    }

    pub async fn build(
        &self,
        hotlist: &[NewsGroup],
        rss: Option<&[NewsGroup]>,
        max_news: usize,
    ) -> ContentBlock {
        let rss = rss.unwrap_or_default();
        let mut block = ContentBlock {
            hotlist_total: total_items(hotlist),
            rss_total: total_items(rss),
            ..Default::default()
        };

        if self.include_rss {
            self.walk(SourceKind::Rss, rss, max_news, &mut block).await;
        }
        if block.included < max_news {
            self.walk(SourceKind::Hotlist, hotlist, max_news, &mut block)
                .await;
        }

        debug!(
            included = block.included,
            hotlist_total = block.hotlist_total,
            rss_total = block.rss_total,
            max_news,
            "news block built"
        );
        block
    }

    async fn walk(
        &self,
        kind: SourceKind,
        groups: &[NewsGroup],
        max_news: usize,
        block: &mut ContentBlock,
    ) {
        let mut section_open = false;
        for group in groups {
            // Hot-list groups without a matched keyword carry no signal.
            if kind == SourceKind::Hotlist && group.word.trim().is_empty() {
                continue;
            }
            for item in &group.titles {
                if block.included >= max_news {
                    return;
                }
                let title = item.title.trim();
                if title.is_empty() {
                    continue;
                }
                let research = self.augment(kind, title).await;
                if !section_open {
                    block.start_section(kind);
                    section_open = true;
                }
                block.push_item(kind, item, research);
            }
        }
    }

    async fn augment(&self, kind: SourceKind, title: &str) -> Option<String> {
        let gate = self.research.gate();
        let cfg = self.research.config();
        match kind {
            SourceKind::Rss => {
                if !gate.should_trigger(title) {
                    return None;
                }
                debug!(id = %anon_hash(title), "researching rss item");
                if cfg.rss_deep_content {
                    self.research.deep_content(title).await
                } else {
                    self.research.research_text(title).await
                }
            }
            SourceKind::Hotlist => {
                if !gate.should_trigger_with(title, &cfg.hotlist_keywords) {
                    return None;
                }
                debug!(id = %anon_hash(title), "researching hot-list item");
                self.research.research_text(title).await
            }
        }
    }
}
