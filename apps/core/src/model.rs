use serde::{Deserialize, Serialize};

/// One node of the bookmark hierarchy as handed over by a bookmark source.
/// Folders carry `children`, bookmarks carry `url`; a node with neither is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn bookmark(id: &str, title: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: Some(url.to_string()),
            children: None,
        }
    }

    pub fn folder(id: &str, title: &str, children: Vec<BookmarkNode>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: None,
            children: Some(children),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub id: String,
    /// Path-qualified title; this exact string is what the matcher sees.
    pub title: String,
    pub url: String,
    pub path: Vec<String>,
}

impl BookmarkEntry {
    pub fn new(id: &str, title: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            path: Vec::new(),
        }
    }
}

/// Half-open character range `[start, end)` over a matched title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
}

impl HighlightSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub entry: std::sync::Arc<BookmarkEntry>,
    pub score: i64,
    pub highlight_spans: Vec<HighlightSpan>,
}

/// Collapses ascending character positions into contiguous spans.
pub fn spans_from_positions(positions: &[usize]) -> Vec<HighlightSpan> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut spans: Vec<HighlightSpan> = Vec::new();
    for position in sorted {
        match spans.last_mut() {
            Some(last) if last.end == position => last.end = position + 1,
            _ => spans.push(HighlightSpan::new(position, position + 1)),
        }
    }
    spans
}
