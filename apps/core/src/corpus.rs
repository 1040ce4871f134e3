use std::sync::Arc;

use crate::config::Config;
use crate::model::{BookmarkEntry, BookmarkNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    /// Joins folder names in front of a bookmark title.
    pub separator: String,
    /// Top-level folder names that are left out of qualified titles.
    pub stripped_roots: Vec<String>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            separator: crate::config::DEFAULT_PATH_SEPARATOR.to_string(),
            stripped_roots: default_stripped_roots(),
        }
    }
}

impl CorpusOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            separator: cfg.path_separator.clone(),
            stripped_roots: cfg.stripped_roots.clone(),
        }
    }

    fn is_stripped_root(&self, title: &str) -> bool {
        self.stripped_roots
            .iter()
            .any(|root| root.eq_ignore_ascii_case(title.trim()))
    }
}

pub fn default_stripped_roots() -> Vec<String> {
    vec!["Bookmarks Bar".to_string(), "Bookmarks Toolbar".to_string()]
}

/// Session-lifetime list of searchable entries, most recently discovered first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<Arc<BookmarkEntry>>,
}

impl Corpus {
    /// Wraps entries that are already in display order.
    pub fn from_entries(entries: Vec<BookmarkEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn entries(&self) -> &[Arc<BookmarkEntry>] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Arc<BookmarkEntry>> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn build(roots: &[BookmarkNode], options: &CorpusOptions) -> Corpus {
    let mut discovered = Vec::new();
    for root in roots {
        collect(root, &[], options, &mut discovered);
    }
    discovered.reverse();
    Corpus::from_entries(discovered)
}

fn collect(
    node: &BookmarkNode,
    folders: &[String],
    options: &CorpusOptions,
    out: &mut Vec<BookmarkEntry>,
) {
    if let Some(url) = node.url.as_deref().filter(|url| !url.trim().is_empty()) {
        out.push(BookmarkEntry {
            id: node.id.clone(),
            title: qualified_title(folders, &node.title, &options.separator),
            url: url.to_string(),
            path: folders.to_vec(),
        });
    }

    let Some(children) = node.children.as_ref() else {
        return;
    };

    let segment = node.title.trim();
    let skip_segment =
        segment.is_empty() || (folders.is_empty() && options.is_stripped_root(segment));
    if skip_segment {
        for child in children {
            collect(child, folders, options, out);
        }
        return;
    }

    let mut nested = folders.to_vec();
    nested.push(segment.to_string());
    for child in children {
        collect(child, &nested, options, out);
    }
}

fn qualified_title(folders: &[String], title: &str, separator: &str) -> String {
    if folders.is_empty() {
        return title.to_string();
    }
    format!("{}{separator}{title}", folders.join(separator))
}
